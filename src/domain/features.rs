//! Gap feature engineering: overnight gap percentage and its rolling z-score.
//!
//! "Not enough data yet" is modelled as `None`, never as a sentinel number.
//! An undefined z-score always resolves to "no signal" downstream.

use crate::domain::bar::PriceSeries;

/// Overnight gap at bar t: (open[t] - close[t-1]) / close[t-1].
/// Undefined at the first bar.
pub fn gap_percentage(series: &PriceSeries) -> Vec<Option<f64>> {
    let bars = series.bars();
    let mut gaps = Vec::with_capacity(bars.len());
    for i in 0..bars.len() {
        if i == 0 {
            gaps.push(None);
        } else {
            let prev_close = bars[i - 1].close;
            gaps.push(Some((bars[i].open - prev_close) / prev_close));
        }
    }
    gaps
}

/// Minimum defined observations required inside the rolling window before a
/// z-score is produced: floor(0.9 * window), never below 2 (a sample standard
/// deviation needs at least two points).
pub fn default_min_periods(window: usize) -> usize {
    (((window as f64) * 0.9) as usize).max(2)
}

/// Rolling z-score over the trailing `window` values.
///
/// Mean and sample (n-1) standard deviation are taken over the *defined*
/// values inside the window. The result at t is `None` when:
/// - the value at t itself is undefined,
/// - fewer than `min_periods` defined values are in the window, or
/// - the standard deviation is exactly zero.
pub fn rolling_zscore(
    values: &[Option<f64>],
    window: usize,
    min_periods: usize,
) -> Vec<Option<f64>> {
    let min_periods = min_periods.max(2);
    let mut out = Vec::with_capacity(values.len());

    for i in 0..values.len() {
        let Some(x) = values[i] else {
            out.push(None);
            continue;
        };

        let start = (i + 1).saturating_sub(window);
        let defined: Vec<f64> = values[start..=i].iter().filter_map(|v| *v).collect();
        let n = defined.len();
        if n < min_periods {
            out.push(None);
            continue;
        }

        let mean = defined.iter().sum::<f64>() / n as f64;
        let variance = defined
            .iter()
            .map(|v| {
                let d = v - mean;
                d * d
            })
            .sum::<f64>()
            / (n - 1) as f64;
        let std = variance.sqrt();

        if std == 0.0 {
            out.push(None);
        } else {
            out.push(Some((x - mean) / std));
        }
    }

    out
}

/// Gap percentage piped through the rolling z-score: the detector's feature.
pub fn gap_z_scores(series: &PriceSeries, window: usize, min_periods: usize) -> Vec<Option<f64>> {
    let gaps = gap_percentage(series);
    rolling_zscore(&gaps, window, min_periods)
}
