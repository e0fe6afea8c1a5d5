//! Universe selection: liquidity/price screen frozen at a reference date.
//!
//! The universe is selected once at t0 and is immutable thereafter; no
//! later-available information may alter it. Every rejected candidate keeps
//! an exclusion reason for audit. Ranking is by descending median daily
//! turnover with ties broken by ascending symbol, so output never depends on
//! input iteration order.

use crate::domain::bar::PriceSeries;
use crate::domain::error::GaptraderError;
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub const TRADING_DAYS_PER_YEAR: usize = 252;
/// Absolute floor on valid trading days, regardless of lookback length.
pub const MIN_VALID_DAYS_FLOOR: usize = 30;
/// Required fraction of expected trading days with nonzero-volume data.
pub const MIN_COVERAGE: f64 = 0.7;

#[derive(Debug, Clone, PartialEq)]
pub struct UniverseConfig {
    pub size: usize,
    pub min_turnover: f64,
    pub min_price: f64,
    pub lookback_years: u32,
    pub exclude_symbols: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnoverStats {
    pub median_turnover: f64,
    pub mean_turnover: f64,
    pub valid_days: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExclusionReason {
    ExcludeList,
    NoDataAtFreeze,
    PriceBelowMinimum { last_close: f64 },
    InsufficientHistory { valid_days: usize, required: usize },
    TurnoverBelowMinimum { median_turnover: f64 },
}

impl ExclusionReason {
    pub fn describe(&self) -> String {
        match self {
            ExclusionReason::ExcludeList => "on exclusion list".to_string(),
            ExclusionReason::NoDataAtFreeze => "no data up to t0".to_string(),
            ExclusionReason::PriceBelowMinimum { last_close } => {
                format!("price below minimum (last close {last_close:.2})")
            }
            ExclusionReason::InsufficientHistory {
                valid_days,
                required,
            } => format!("insufficient history ({valid_days} of {required} days)"),
            ExclusionReason::TurnoverBelowMinimum { median_turnover } => {
                format!("turnover below minimum (median {median_turnover:.0})")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectedSymbol {
    pub symbol: String,
    /// 1-based liquidity rank within the snapshot.
    pub rank: usize,
    pub median_turnover: f64,
    pub valid_days: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExcludedSymbol {
    pub symbol: String,
    pub reason: ExclusionReason,
}

/// The frozen universe plus selection metadata. Created once per run at t0.
#[derive(Debug, Clone, PartialEq)]
pub struct UniverseSnapshot {
    pub t0: NaiveDate,
    pub selected: Vec<SelectedSymbol>,
    pub excluded: Vec<ExcludedSymbol>,
}

impl UniverseSnapshot {
    pub fn symbols(&self) -> Vec<&str> {
        self.selected.iter().map(|s| s.symbol.as_str()).collect()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.selected.iter().any(|s| s.symbol == symbol)
    }

    pub fn median_turnover_of(&self, symbol: &str) -> Option<f64> {
        self.selected
            .iter()
            .find(|s| s.symbol == symbol)
            .map(|s| s.median_turnover)
    }
}

/// Median daily turnover over the trailing lookback window.
///
/// The series is truncated to the last `lookback_years * 252` bars first;
/// zero-volume bars are excluded from the statistics.
pub fn compute_turnover_stats(series: &PriceSeries, lookback_years: u32) -> TurnoverStats {
    let bars = series.bars();
    let max_days = lookback_years as usize * TRADING_DAYS_PER_YEAR;
    let start = bars.len().saturating_sub(max_days);
    let window = &bars[start..];

    let mut turnovers: Vec<f64> = window
        .iter()
        .filter(|b| b.volume > 0)
        .map(|b| b.turnover())
        .collect();

    if turnovers.is_empty() {
        return TurnoverStats {
            median_turnover: 0.0,
            mean_turnover: 0.0,
            valid_days: 0,
        };
    }

    let valid_days = turnovers.len();
    let mean_turnover = turnovers.iter().sum::<f64>() / valid_days as f64;
    turnovers.sort_by(f64::total_cmp);
    let mid = valid_days / 2;
    let median_turnover = if valid_days % 2 == 0 {
        (turnovers[mid - 1] + turnovers[mid]) / 2.0
    } else {
        turnovers[mid]
    };

    TurnoverStats {
        median_turnover,
        mean_turnover,
        valid_days,
    }
}

fn required_valid_days(lookback_years: u32) -> usize {
    let expected = lookback_years as usize * TRADING_DAYS_PER_YEAR;
    MIN_VALID_DAYS_FLOOR.max((expected as f64 * MIN_COVERAGE) as usize)
}

/// Select the universe at `t0` from candidate histories.
///
/// Candidates are processed in sorted symbol order; the `BTreeMap` keying
/// guarantees the snapshot cannot depend on caller iteration order. Fails
/// only when zero symbols qualify.
pub fn select_universe(
    histories: &BTreeMap<String, PriceSeries>,
    t0: NaiveDate,
    config: &UniverseConfig,
) -> Result<UniverseSnapshot, GaptraderError> {
    let required = required_valid_days(config.lookback_years);
    let mut qualified: Vec<(String, TurnoverStats)> = Vec::new();
    let mut excluded: Vec<ExcludedSymbol> = Vec::new();

    for (symbol, series) in histories {
        if config.exclude_symbols.iter().any(|s| s == symbol) {
            excluded.push(ExcludedSymbol {
                symbol: symbol.clone(),
                reason: ExclusionReason::ExcludeList,
            });
            continue;
        }

        let history = series.up_to(t0);
        let Some(last) = history.bars().last() else {
            excluded.push(ExcludedSymbol {
                symbol: symbol.clone(),
                reason: ExclusionReason::NoDataAtFreeze,
            });
            continue;
        };

        if last.close < config.min_price {
            excluded.push(ExcludedSymbol {
                symbol: symbol.clone(),
                reason: ExclusionReason::PriceBelowMinimum {
                    last_close: last.close,
                },
            });
            continue;
        }

        let stats = compute_turnover_stats(&history, config.lookback_years);

        if stats.valid_days < required {
            excluded.push(ExcludedSymbol {
                symbol: symbol.clone(),
                reason: ExclusionReason::InsufficientHistory {
                    valid_days: stats.valid_days,
                    required,
                },
            });
            continue;
        }

        if stats.median_turnover < config.min_turnover {
            excluded.push(ExcludedSymbol {
                symbol: symbol.clone(),
                reason: ExclusionReason::TurnoverBelowMinimum {
                    median_turnover: stats.median_turnover,
                },
            });
            continue;
        }

        qualified.push((symbol.clone(), stats));
    }

    // Descending turnover, ties broken by ascending symbol.
    qualified.sort_by(|a, b| {
        b.1.median_turnover
            .total_cmp(&a.1.median_turnover)
            .then_with(|| a.0.cmp(&b.0))
    });

    for (symbol, _) in qualified.iter().skip(config.size) {
        eprintln!("Note: {symbol} qualified but fell outside the top {}", config.size);
    }

    let selected: Vec<SelectedSymbol> = qualified
        .into_iter()
        .take(config.size)
        .enumerate()
        .map(|(i, (symbol, stats))| SelectedSymbol {
            symbol,
            rank: i + 1,
            median_turnover: stats.median_turnover,
            valid_days: stats.valid_days,
        })
        .collect();

    if selected.is_empty() {
        return Err(GaptraderError::EmptyUniverse { t0 });
    }

    eprintln!(
        "Universe at {}: selected {} of {} candidates ({} excluded)",
        t0,
        selected.len(),
        histories.len(),
        excluded.len()
    );

    Ok(UniverseSnapshot {
        t0,
        selected,
        excluded,
    })
}
