//! Trade execution and fill simulation.
//!
//! Entries fill on the bar after the signal at the open, adjusted by a
//! three-tier slippage model keyed on the absolute entry gap. A circuit
//! breaker rejects entries whose gap exceeds the configured guard, modelling
//! exchange trading halts. Exits are at the close `max_hold` bars after
//! entry. Fees are computed and recorded on the trade but not netted into the
//! gross return.

use crate::domain::bar::PriceSeries;
use crate::domain::trade::{SampleType, Trade, UnfilledReason, UnfilledSignal};
use chrono::NaiveDate;

/// Slippage in basis points by absolute entry-gap magnitude:
/// <2% -> gap_2pct, [2%,5%) -> gap_5pct, >=5% -> gap_high.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlippageModel {
    pub gap_2pct: f64,
    pub gap_5pct: f64,
    pub gap_high: f64,
}

impl SlippageModel {
    pub fn zero() -> Self {
        SlippageModel {
            gap_2pct: 0.0,
            gap_5pct: 0.0,
            gap_high: 0.0,
        }
    }

    pub fn bps_for_gap(&self, gap_pct: f64) -> f64 {
        let gap_abs = gap_pct.abs();
        if gap_abs < 0.02 {
            self.gap_2pct
        } else if gap_abs < 0.05 {
            self.gap_5pct
        } else {
            self.gap_high
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionConfig {
    pub circuit_guard_pct: f64,
    pub fees_bps: f64,
    pub slippage: SlippageModel,
}

impl ExecutionConfig {
    /// Zero fees, zero slippage, circuit guard disabled. Used by the
    /// detector's scoring loop, where execution frictions must not bias the
    /// parameter search.
    pub fn frictionless() -> Self {
        ExecutionConfig {
            circuit_guard_pct: f64::INFINITY,
            fees_bps: 0.0,
            slippage: SlippageModel::zero(),
        }
    }
}

/// A priced entry on the bar after a signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilledEntry {
    pub entry_index: usize,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub entry_price_adjusted: f64,
    pub entry_gap: f64,
    pub slippage_bps: f64,
}

/// Price the entry for a signal at `signal_index`.
///
/// Slippage is always adverse to a long entry, so
/// `entry_price_adjusted >= entry_price` for non-negative slippage.
pub fn fill_entry(
    series: &PriceSeries,
    signal_index: usize,
    config: &ExecutionConfig,
) -> Result<FilledEntry, UnfilledReason> {
    let entry_index = signal_index + 1;
    let (Some(signal_bar), Some(entry_bar)) = (series.get(signal_index), series.get(entry_index))
    else {
        return Err(UnfilledReason::InsufficientFutureData);
    };

    let entry_gap = (entry_bar.open - signal_bar.close) / signal_bar.close;
    if entry_gap.abs() > config.circuit_guard_pct {
        return Err(UnfilledReason::CircuitBreaker);
    }

    let slippage_bps = config.slippage.bps_for_gap(entry_gap);
    let entry_price_adjusted = entry_bar.open * (1.0 + slippage_bps / 10_000.0);

    Ok(FilledEntry {
        entry_index,
        entry_date: entry_bar.date,
        entry_price: entry_bar.open,
        entry_price_adjusted,
        entry_gap,
        slippage_bps,
    })
}

/// Close a filled entry `max_hold` bars later and produce the ledger record.
/// Callers must ensure the exit bar exists.
pub fn close_trade(
    series: &PriceSeries,
    entry: &FilledEntry,
    max_hold: usize,
    config: &ExecutionConfig,
    sample_type: SampleType,
) -> Option<Trade> {
    let exit_bar = series.get(entry.entry_index + max_hold)?;
    let exit_price = exit_bar.close;
    Some(Trade {
        symbol: series.symbol().to_string(),
        entry_date: entry.entry_date,
        exit_date: exit_bar.date,
        entry_price: entry.entry_price,
        entry_price_adjusted: entry.entry_price_adjusted,
        exit_price,
        return_pct: (exit_price - entry.entry_price_adjusted) / entry.entry_price_adjusted,
        fees_bps: config.fees_bps,
        slippage_bps: entry.slippage_bps,
        sample_type,
    })
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimulationResult {
    pub trades: Vec<Trade>,
    pub unfilled: Vec<UnfilledSignal>,
}

/// Run a boolean signal series through the fill simulator.
///
/// Signals whose exit bar would fall past the end of the series are discarded
/// outright: there is simply not enough future data, and no record is kept.
/// Circuit-breaker rejections are recorded as unfilled.
pub fn simulate(
    series: &PriceSeries,
    signals: &[bool],
    max_hold: usize,
    config: &ExecutionConfig,
    sample_type: SampleType,
) -> SimulationResult {
    let mut result = SimulationResult::default();

    for signal_index in 0..signals.len().min(series.len()) {
        if !signals[signal_index] {
            continue;
        }

        let entry_index = signal_index + 1;
        if entry_index + max_hold >= series.len() {
            continue;
        }

        match fill_entry(series, signal_index, config) {
            Ok(entry) => {
                if let Some(trade) = close_trade(series, &entry, max_hold, config, sample_type) {
                    result.trades.push(trade);
                }
            }
            Err(reason) => {
                result.unfilled.push(UnfilledSignal {
                    symbol: series.symbol().to_string(),
                    signal_date: series.get(signal_index).map(|b| b.date).unwrap_or_default(),
                    attempted_date: series.get(entry_index).map(|b| b.date),
                    reason,
                });
            }
        }
    }

    result
}
