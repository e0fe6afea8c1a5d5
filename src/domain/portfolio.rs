//! Position admission control.
//!
//! A fixed-capacity scheduler over same-day candidate signals: a strict total
//! order (score desc, median turnover desc, symbol asc) ranks candidates and
//! the top `available_slots` are admitted. The ordering is total, so the
//! admitted set never depends on candidate input order and backtests stay
//! bit-reproducible.

use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioConfig {
    pub max_concurrent: usize,
    pub position_size: f64,
    pub reentry_lockout: bool,
}

/// A same-day entry candidate. `score` is the signal extremity (negated
/// z-score for the gap detector): larger means more anomalous.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSignal {
    pub symbol: String,
    pub score: f64,
}

/// Rank candidates and admit at most the number of free slots.
///
/// With re-entry lockout enabled, symbols that already have an open position
/// are dropped before ranking. Median turnover breaks score ties; symbol name
/// breaks turnover ties.
pub fn select_candidates(
    candidates: &[CandidateSignal],
    open_symbols: &BTreeSet<String>,
    median_turnover: &BTreeMap<String, f64>,
    config: &PortfolioConfig,
) -> Vec<CandidateSignal> {
    let available_slots = config.max_concurrent.saturating_sub(open_symbols.len());
    if available_slots == 0 || candidates.is_empty() {
        return Vec::new();
    }

    let mut ranked: Vec<CandidateSignal> = candidates
        .iter()
        .filter(|c| !(config.reentry_lockout && open_symbols.contains(&c.symbol)))
        .cloned()
        .collect();

    ranked.sort_by(|a, b| {
        let turnover_a = median_turnover.get(&a.symbol).copied().unwrap_or(0.0);
        let turnover_b = median_turnover.get(&b.symbol).copied().unwrap_or(0.0);
        b.score
            .total_cmp(&a.score)
            .then(turnover_b.total_cmp(&turnover_a))
            .then_with(|| a.symbol.cmp(&b.symbol))
    });

    ranked.truncate(available_slots);
    ranked
}
