//! Ledger records: filled trades, unfilled signals, open positions.

use chrono::NaiveDate;

/// Which walk-forward window a trade came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
    Is,
    Oos,
}

impl SampleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleType::Is => "IS",
            SampleType::Oos => "OOS",
        }
    }
}

/// A completed round-trip. Immutable once created; appended to the run-level
/// ledger and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub symbol: String,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_price: f64,
    pub entry_price_adjusted: f64,
    pub exit_price: f64,
    /// Gross return on the slippage-adjusted entry. Fees are recorded but not
    /// netted here; see [`Trade::return_net_of_fees`].
    pub return_pct: f64,
    pub fees_bps: f64,
    pub slippage_bps: f64,
    pub sample_type: SampleType,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.return_pct > 0.0
    }

    /// Return with entry and exit fees (at `fees_bps` of the respective
    /// prices) netted out of the gross figure.
    pub fn return_net_of_fees(&self) -> f64 {
        let entry_fee = self.entry_price_adjusted * self.fees_bps / 10_000.0;
        let exit_fee = self.exit_price * self.fees_bps / 10_000.0;
        (self.exit_price - self.entry_price_adjusted - entry_fee - exit_fee)
            / self.entry_price_adjusted
    }
}

/// Why a signal did not become a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnfilledReason {
    CircuitBreaker,
    InsufficientFutureData,
    MissingPrice,
    UnknownSymbol,
    SignalDateNotFound,
}

impl UnfilledReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnfilledReason::CircuitBreaker => "circuit_breaker",
            UnfilledReason::InsufficientFutureData => "insufficient_future_data",
            UnfilledReason::MissingPrice => "missing_price",
            UnfilledReason::UnknownSymbol => "unknown_symbol",
            UnfilledReason::SignalDateNotFound => "signal_date_not_found",
        }
    }
}

/// Audit record for a rejected or unfillable signal. Never retried.
#[derive(Debug, Clone, PartialEq)]
pub struct UnfilledSignal {
    pub symbol: String,
    pub signal_date: NaiveDate,
    pub attempted_date: Option<NaiveDate>,
    pub reason: UnfilledReason,
}

/// An open position awaiting its holding-period exit.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub signal_date: NaiveDate,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub size: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_trade() -> Trade {
        Trade {
            symbol: "ACME".into(),
            entry_date: date(2024, 1, 16),
            exit_date: date(2024, 1, 18),
            entry_price: 100.0,
            entry_price_adjusted: 100.05,
            exit_price: 105.0,
            return_pct: (105.0 - 100.05) / 100.05,
            fees_bps: 10.0,
            slippage_bps: 5.0,
            sample_type: SampleType::Oos,
        }
    }

    #[test]
    fn winner_classification() {
        let trade = sample_trade();
        assert!(trade.is_winner());

        let loser = Trade {
            return_pct: -0.01,
            ..sample_trade()
        };
        assert!(!loser.is_winner());
    }

    #[test]
    fn net_return_is_below_gross() {
        let trade = sample_trade();
        assert!(trade.return_net_of_fees() < trade.return_pct);
    }

    #[test]
    fn net_return_equals_gross_with_zero_fees() {
        let trade = Trade {
            fees_bps: 0.0,
            ..sample_trade()
        };
        assert!((trade.return_net_of_fees() - trade.return_pct).abs() < 1e-12);
    }

    #[test]
    fn net_return_nets_both_legs() {
        let trade = sample_trade();
        let entry_fee = 100.05 * 10.0 / 10_000.0;
        let exit_fee = 105.0 * 10.0 / 10_000.0;
        let expected = (105.0 - 100.05 - entry_fee - exit_fee) / 100.05;
        assert!((trade.return_net_of_fees() - expected).abs() < 1e-12);
    }

    #[test]
    fn sample_type_labels() {
        assert_eq!(SampleType::Is.as_str(), "IS");
        assert_eq!(SampleType::Oos.as_str(), "OOS");
    }

    #[test]
    fn unfilled_reason_labels_are_distinct() {
        let reasons = [
            UnfilledReason::CircuitBreaker,
            UnfilledReason::InsufficientFutureData,
            UnfilledReason::MissingPrice,
            UnfilledReason::UnknownSymbol,
            UnfilledReason::SignalDateNotFound,
        ];
        for (i, a) in reasons.iter().enumerate() {
            for b in reasons.iter().skip(i + 1) {
                assert_ne!(a.as_str(), b.as_str());
            }
        }
    }
}
