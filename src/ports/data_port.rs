//! Price data access port trait.

use crate::domain::bar::PriceSeries;
use crate::domain::error::GaptraderError;
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub trait DataPort {
    /// Validated bar series for one symbol, restricted to `[start, end]`.
    fn fetch_series(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, GaptraderError>;

    /// All symbols the source knows about, sorted.
    fn list_symbols(&self) -> Result<Vec<String>, GaptraderError>;
}

/// Load every requested symbol into a deterministically ordered map.
///
/// Symbols that load but contain no bars in range are skipped with a warning;
/// load failures propagate.
pub fn load_histories(
    port: &dyn DataPort,
    symbols: &[String],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<BTreeMap<String, PriceSeries>, GaptraderError> {
    let mut histories = BTreeMap::new();
    for symbol in symbols {
        let series = port.fetch_series(symbol, start, end)?;
        if series.is_empty() {
            eprintln!("warning: {symbol} has no bars in range, skipping");
            continue;
        }
        histories.insert(symbol.clone(), series);
    }
    Ok(histories)
}
