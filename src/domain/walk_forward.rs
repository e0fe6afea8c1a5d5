//! Walk-forward split generation.
//!
//! Rolling in-sample/out-of-sample windows with a holdout reservation at the
//! end of the data range. Pure date arithmetic, no price data involved.

use chrono::{Days, Months, NaiveDate};

/// Walk-forward window lengths in whole years. All must be positive; validated
/// at configuration construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkForwardConfig {
    pub is_years: u32,
    pub oos_years: u32,
    pub holdout_years: u32,
}

/// One in-sample/out-of-sample window pair. End dates are inclusive: each
/// window ends the day before the next one starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkForwardSplit {
    pub is_start: NaiveDate,
    pub is_end: NaiveDate,
    pub oos_start: NaiveDate,
    pub oos_end: NaiveDate,
}

fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}

fn day_before(date: NaiveDate) -> NaiveDate {
    date.checked_sub_days(Days::new(1)).unwrap_or(NaiveDate::MIN)
}

/// Generate the ordered list of walk-forward splits between `start` and `end`.
///
/// The final `holdout_years` before `end` are reserved and never covered by a
/// split. The cursor starts at `start` and rolls forward by `oos_years` after
/// each split; generation stops once a full IS+OOS window no longer fits
/// before the holdout. A span shorter than IS+OOS+holdout yields an empty
/// list; callers must handle zero splits explicitly.
pub fn create_splits(
    start: NaiveDate,
    end: NaiveDate,
    config: &WalkForwardConfig,
) -> Vec<WalkForwardSplit> {
    let is_months = config.is_years * 12;
    let oos_months = config.oos_years * 12;
    let holdout_months = config.holdout_years * 12;

    let train_end = end
        .checked_sub_months(Months::new(holdout_months))
        .unwrap_or(NaiveDate::MIN);

    let mut splits = Vec::new();
    let mut cursor = start;

    while add_months(cursor, is_months + oos_months) <= train_end {
        let oos_start = add_months(cursor, is_months);
        splits.push(WalkForwardSplit {
            is_start: cursor,
            is_end: day_before(oos_start),
            oos_start,
            oos_end: day_before(add_months(oos_start, oos_months)),
        });
        cursor = add_months(cursor, oos_months);
    }

    splits
}
