//! Ledger statistics shared by the detector's scoring loop and reporting.

use crate::domain::trade::{SampleType, Trade};

/// Median of a slice; `None` when empty. Even-length slices average the two
/// middle values, matching the convention used for turnover ranking.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Fraction of strictly positive returns. Zero for an empty slice.
pub fn hit_rate(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let winners = returns.iter().filter(|&&r| r > 0.0).count();
    winners as f64 / returns.len() as f64
}

/// Summary statistics over a trade ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerSummary {
    pub trades: usize,
    pub is_trades: usize,
    pub oos_trades: usize,
    pub hit_rate: f64,
    pub median_return: f64,
    pub mean_return: f64,
    pub best_return: f64,
    pub worst_return: f64,
    pub avg_hold_days: f64,
}

impl LedgerSummary {
    pub fn compute(trades: &[Trade]) -> Self {
        let returns: Vec<f64> = trades.iter().map(|t| t.return_pct).collect();
        let is_trades = trades
            .iter()
            .filter(|t| t.sample_type == SampleType::Is)
            .count();

        let (mean_return, best_return, worst_return, avg_hold_days) = if trades.is_empty() {
            (0.0, 0.0, 0.0, 0.0)
        } else {
            let mean = returns.iter().sum::<f64>() / returns.len() as f64;
            let best = returns.iter().cloned().fold(f64::MIN, f64::max);
            let worst = returns.iter().cloned().fold(f64::MAX, f64::min);
            let hold: i64 = trades
                .iter()
                .map(|t| (t.exit_date - t.entry_date).num_days())
                .sum();
            (mean, best, worst, hold as f64 / trades.len() as f64)
        };

        LedgerSummary {
            trades: trades.len(),
            is_trades,
            oos_trades: trades.len() - is_trades,
            hit_rate: hit_rate(&returns),
            median_return: median(&returns).unwrap_or(0.0),
            mean_return,
            best_return,
            worst_return,
            avg_hold_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn trade(return_pct: f64, sample_type: SampleType, hold_days: i64) -> Trade {
        let entry = date(2024, 1, 10);
        Trade {
            symbol: "ACME".into(),
            entry_date: entry,
            exit_date: entry + chrono::Days::new(hold_days as u64),
            entry_price: 100.0,
            entry_price_adjusted: 100.0,
            exit_price: 100.0 * (1.0 + return_pct),
            return_pct,
            fees_bps: 10.0,
            slippage_bps: 5.0,
            sample_type,
        }
    }

    #[test]
    fn median_empty_is_none() {
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn median_odd_count() {
        assert!((median(&[3.0, 1.0, 2.0]).unwrap() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn median_even_count_averages_middle() {
        assert!((median(&[4.0, 1.0, 3.0, 2.0]).unwrap() - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn hit_rate_counts_strict_winners() {
        assert!((hit_rate(&[0.1, -0.1, 0.0, 0.2]) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn hit_rate_empty_is_zero() {
        assert!((hit_rate(&[]) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn summary_over_empty_ledger() {
        let summary = LedgerSummary::compute(&[]);
        assert_eq!(summary.trades, 0);
        assert!((summary.median_return - 0.0).abs() < f64::EPSILON);
        assert!((summary.hit_rate - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn summary_splits_sample_types() {
        let trades = vec![
            trade(0.05, SampleType::Is, 2),
            trade(-0.02, SampleType::Oos, 4),
            trade(0.01, SampleType::Oos, 6),
        ];
        let summary = LedgerSummary::compute(&trades);
        assert_eq!(summary.trades, 3);
        assert_eq!(summary.is_trades, 1);
        assert_eq!(summary.oos_trades, 2);
        assert!((summary.hit_rate - 2.0 / 3.0).abs() < 1e-12);
        assert!((summary.median_return - 0.01).abs() < 1e-12);
        assert!((summary.best_return - 0.05).abs() < 1e-12);
        assert!((summary.worst_return - (-0.02)).abs() < 1e-12);
        assert!((summary.avg_hold_days - 4.0).abs() < f64::EPSILON);
    }
}
