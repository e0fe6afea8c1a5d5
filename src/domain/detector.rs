//! Gap-Z detector: parameter search over a grid, stateless prediction.
//!
//! `fit` is a pure function returning an immutable [`FitResult`]; there is no
//! fitted instance state, so fits can run concurrently across symbols and
//! splits without sharing anything.

use crate::domain::bar::PriceSeries;
use crate::domain::error::GaptraderError;
use crate::domain::execution::{simulate, ExecutionConfig};
use crate::domain::features::{default_min_periods, gap_z_scores};
use crate::domain::metrics::{hit_rate, median};
use crate::domain::trade::SampleType;

/// Parameter lists to grid-search. Enumeration order is canonical:
/// window (outer), then k_low, then max_hold (inner).
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorGrid {
    pub windows: Vec<usize>,
    pub k_lows: Vec<f64>,
    pub max_holds: Vec<usize>,
    pub min_hit_rate: f64,
}

impl DetectorGrid {
    /// Range checks, enforced once at construction rather than inside the
    /// search loop. The strategy is long-only on negative anomalies, so every
    /// k_low must be negative.
    pub fn validate(&self) -> Result<(), GaptraderError> {
        let invalid = |key: &str, reason: String| GaptraderError::ConfigInvalid {
            section: "detector".to_string(),
            key: key.to_string(),
            reason,
        };

        if self.windows.is_empty() || self.windows.iter().any(|&w| w == 0) {
            return Err(invalid("windows", "windows must be non-empty and positive".into()));
        }
        if self.k_lows.is_empty() || self.k_lows.iter().any(|&k| k >= 0.0) {
            return Err(invalid("k_lows", "k_low thresholds must be negative".into()));
        }
        if self.max_holds.is_empty() || self.max_holds.iter().any(|&h| h == 0) {
            return Err(invalid("max_holds", "max_hold must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.min_hit_rate) {
            return Err(invalid("min_hit_rate", "min_hit_rate must be within [0, 1]".into()));
        }
        Ok(())
    }
}

/// A fitted parameter triple. Immutable; produced by [`fit`], consumed by
/// [`predict`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorParams {
    pub window: usize,
    pub k_low: f64,
    pub max_hold: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitResult {
    pub params: DetectorParams,
    pub median_return: f64,
    pub hit_rate: f64,
    pub trades: usize,
}

/// Boolean signal series aligned with the input bars, with the underlying
/// z-score kept as the signal's score where defined.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSeries {
    pub signals: Vec<bool>,
    pub scores: Vec<Option<f64>>,
}

impl SignalSeries {
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

/// Apply the gap/z-score/threshold pipeline with explicit parameters.
/// An undefined z-score is never a signal.
pub fn predict(series: &PriceSeries, params: &DetectorParams) -> SignalSeries {
    let scores = gap_z_scores(series, params.window, default_min_periods(params.window));
    let signals = scores
        .iter()
        .map(|z| matches!(z, Some(v) if *v < params.k_low))
        .collect();
    SignalSeries { signals, scores }
}

/// Grid-search the detector parameters against an in-sample series.
///
/// Each combination is scored by simulating its signals with zero costs and
/// taking the median trade return, subject to the hit-rate floor. Ties on the
/// median resolve to the earliest combination in canonical enumeration order
/// (strictly-greater comparison, first found wins), which keeps the selection
/// reproducible even if evaluations were to run in parallel. Returns `None`
/// when no combination qualifies, a recoverable no-fit rather than an error.
pub fn fit(series: &PriceSeries, grid: &DetectorGrid) -> Option<FitResult> {
    let costs = ExecutionConfig::frictionless();
    let mut best: Option<FitResult> = None;

    for &window in &grid.windows {
        for &k_low in &grid.k_lows {
            for &max_hold in &grid.max_holds {
                let params = DetectorParams {
                    window,
                    k_low,
                    max_hold,
                };
                let signal_series = predict(series, &params);
                let result = simulate(
                    series,
                    &signal_series.signals,
                    max_hold,
                    &costs,
                    SampleType::Is,
                );
                if result.trades.is_empty() {
                    continue;
                }

                let returns: Vec<f64> =
                    result.trades.iter().map(|t| t.return_pct).collect();
                let rate = hit_rate(&returns);
                if rate < grid.min_hit_rate {
                    continue;
                }
                let Some(score) = median(&returns) else {
                    continue;
                };

                if best.as_ref().is_none_or(|b| score > b.median_return) {
                    best = Some(FitResult {
                        params,
                        median_return: score,
                        hit_rate: rate,
                        trades: returns.len(),
                    });
                }
            }
        }
    }

    best
}
