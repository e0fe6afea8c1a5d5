//! Walk-forward backtest driver.
//!
//! For each split the detector is fitted per symbol on the in-sample window,
//! the fitted parameters generate out-of-sample signals, and a day-ordered
//! portfolio loop admits entries under the concurrency limit. In-sample
//! trades are re-simulated under real execution costs and recorded alongside
//! the out-of-sample ledger, tagged by sample type.

use crate::domain::bar::PriceSeries;
use crate::domain::config::Settings;
use crate::domain::detector::{fit, predict, DetectorParams};
use crate::domain::error::GaptraderError;
use crate::domain::execution::{close_trade, fill_entry, simulate};
use crate::domain::portfolio::{select_candidates, CandidateSignal};
use crate::domain::trade::{Position, SampleType, Trade, UnfilledReason, UnfilledSignal};
use crate::domain::universe::UniverseSnapshot;
use crate::domain::walk_forward::{create_splits, WalkForwardSplit};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq)]
pub struct SplitOutcome {
    pub split_index: usize,
    pub split: WalkForwardSplit,
    pub fitted_symbols: usize,
    pub no_fit_symbols: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BacktestResult {
    pub trades: Vec<Trade>,
    pub unfilled: Vec<UnfilledSignal>,
    pub splits: Vec<SplitOutcome>,
}

struct FittedSymbol {
    series: PriceSeries,
    params: DetectorParams,
}

/// Run the full walk-forward backtest over a frozen universe.
///
/// The histories map is keyed deterministically and the universe snapshot is
/// already ranked, so two runs over the same inputs produce identical
/// ledgers regardless of how the caller assembled the map.
pub fn run_backtest(
    histories: &BTreeMap<String, PriceSeries>,
    universe: &UniverseSnapshot,
    settings: &Settings,
) -> Result<BacktestResult, GaptraderError> {
    let splits = create_splits(settings.start_date, settings.end_date, &settings.walk_forward);
    if splits.is_empty() {
        return Err(GaptraderError::InsufficientData {
            split_index: 0,
            window: format!(
                "{} to {} too short for {}y IS + {}y OOS + {}y holdout",
                settings.start_date,
                settings.end_date,
                settings.walk_forward.is_years,
                settings.walk_forward.oos_years,
                settings.walk_forward.holdout_years
            ),
        });
    }

    let turnover: BTreeMap<String, f64> = universe
        .selected
        .iter()
        .map(|s| (s.symbol.clone(), s.median_turnover))
        .collect();

    let mut result = BacktestResult::default();

    for (split_index, split) in splits.iter().enumerate() {
        let mut fitted: BTreeMap<String, FittedSymbol> = BTreeMap::new();
        let mut no_fit_symbols = 0;

        for selected in &universe.selected {
            let Some(series) = histories.get(&selected.symbol) else {
                result.unfilled.push(UnfilledSignal {
                    symbol: selected.symbol.clone(),
                    signal_date: split.oos_start,
                    attempted_date: None,
                    reason: UnfilledReason::UnknownSymbol,
                });
                continue;
            };

            let is_series = series.window(split.is_start, split.is_end);
            let Some(fit_result) = fit(&is_series, &settings.grid) else {
                no_fit_symbols += 1;
                continue;
            };

            // Replay the winning parameters under real costs so the ledger
            // carries comparable in-sample trades.
            let is_signals = predict(&is_series, &fit_result.params);
            let is_sim = simulate(
                &is_series,
                &is_signals.signals,
                fit_result.params.max_hold,
                &settings.execution,
                SampleType::Is,
            );
            result.trades.extend(is_sim.trades);
            result.unfilled.extend(is_sim.unfilled);

            fitted.insert(
                selected.symbol.clone(),
                FittedSymbol {
                    series: series.clone(),
                    params: fit_result.params,
                },
            );
        }

        eprintln!(
            "Split {}/{}: IS {}..{}, OOS {}..{}, {} fitted, {} no-fit",
            split_index + 1,
            splits.len(),
            split.is_start,
            split.is_end,
            split.oos_start,
            split.oos_end,
            fitted.len(),
            no_fit_symbols
        );

        if !fitted.is_empty() {
            run_oos_window(split, &fitted, &turnover, settings, &mut result);
        }

        result.splits.push(SplitOutcome {
            split_index,
            split: *split,
            fitted_symbols: fitted.len(),
            no_fit_symbols,
        });
    }

    Ok(result)
}

/// Day-ordered portfolio loop over one out-of-sample window.
///
/// Prediction runs over each symbol's full series (rolling statistics only
/// look backward, so nothing leaks) and signal dates are then restricted to
/// the window. Matured positions release their slots before the same day's
/// admissions.
fn run_oos_window(
    split: &WalkForwardSplit,
    fitted: &BTreeMap<String, FittedSymbol>,
    turnover: &BTreeMap<String, f64>,
    settings: &Settings,
    result: &mut BacktestResult,
) {
    let mut signals_by_date: BTreeMap<NaiveDate, Vec<CandidateSignal>> = BTreeMap::new();

    for (symbol, symbol_fit) in fitted {
        let signal_series = predict(&symbol_fit.series, &symbol_fit.params);
        for (index, bar) in symbol_fit.series.bars().iter().enumerate() {
            if bar.date < split.oos_start || bar.date > split.oos_end {
                continue;
            }
            if !signal_series.signals[index] {
                continue;
            }
            let Some(z) = signal_series.scores[index] else {
                continue;
            };
            signals_by_date.entry(bar.date).or_default().push(CandidateSignal {
                symbol: symbol.clone(),
                score: -z,
            });
        }
    }

    // open positions with their scheduled exit dates
    let mut open: Vec<(Position, NaiveDate)> = Vec::new();

    for (&day, candidates) in &signals_by_date {
        open.retain(|(_, exit_date)| *exit_date > day);
        let open_symbols: BTreeSet<String> =
            open.iter().map(|(p, _)| p.symbol.clone()).collect();

        let admitted =
            select_candidates(candidates, &open_symbols, turnover, &settings.portfolio);

        for candidate in admitted {
            let symbol_fit = &fitted[&candidate.symbol];
            let series = &symbol_fit.series;

            let Some(signal_index) = series.index_of(day) else {
                result.unfilled.push(UnfilledSignal {
                    symbol: candidate.symbol.clone(),
                    signal_date: day,
                    attempted_date: None,
                    reason: UnfilledReason::SignalDateNotFound,
                });
                continue;
            };

            match fill_entry(series, signal_index, &settings.execution) {
                Err(reason) => {
                    result.unfilled.push(UnfilledSignal {
                        symbol: candidate.symbol.clone(),
                        signal_date: day,
                        attempted_date: series.get(signal_index + 1).map(|b| b.date),
                        reason,
                    });
                }
                Ok(entry) => {
                    match close_trade(
                        series,
                        &entry,
                        symbol_fit.params.max_hold,
                        &settings.execution,
                        SampleType::Oos,
                    ) {
                        Some(trade) => {
                            open.push((
                                Position {
                                    symbol: candidate.symbol.clone(),
                                    signal_date: day,
                                    entry_date: trade.entry_date,
                                    entry_price: trade.entry_price_adjusted,
                                    size: settings.portfolio.position_size,
                                },
                                trade.exit_date,
                            ));
                            result.trades.push(trade);
                        }
                        None => {
                            result.unfilled.push(UnfilledSignal {
                                symbol: candidate.symbol.clone(),
                                signal_date: day,
                                attempted_date: Some(entry.entry_date),
                                reason: UnfilledReason::MissingPrice,
                            });
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::PriceBar;
    use crate::domain::detector::DetectorGrid;
    use crate::domain::execution::{ExecutionConfig, SlippageModel};
    use crate::domain::portfolio::PortfolioConfig;
    use crate::domain::universe::{SelectedSymbol, UniverseConfig};
    use crate::domain::walk_forward::WalkForwardConfig;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Daily bars from 2020-01-01. Closes are flat at 100; `gap_days` open
    /// at 90, producing one clean -10% gap signal each.
    fn gapped_series(symbol: &str, days: usize, gap_days: &[usize]) -> PriceSeries {
        let bars = (0..days)
            .map(|i| {
                let open = if gap_days.contains(&i) { 90.0 } else { 100.0 };
                PriceBar {
                    date: date(2020, 1, 1) + chrono::Days::new(i as u64),
                    open,
                    high: 100.0,
                    low: open,
                    close: 100.0,
                    volume: 10_000,
                }
            })
            .collect();
        PriceSeries::new(symbol, bars).unwrap()
    }

    fn snapshot(symbols: &[&str]) -> UniverseSnapshot {
        UniverseSnapshot {
            t0: date(2020, 1, 1),
            selected: symbols
                .iter()
                .enumerate()
                .map(|(i, s)| SelectedSymbol {
                    symbol: s.to_string(),
                    rank: i + 1,
                    median_turnover: 1_000_000.0 - i as f64,
                    valid_days: 300,
                })
                .collect(),
            excluded: vec![],
        }
    }

    fn settings(max_concurrent: usize) -> Settings {
        Settings {
            csv_dir: "./data".to_string(),
            start_date: date(2020, 1, 1),
            end_date: date(2022, 1, 1),
            t0: date(2020, 1, 1),
            universe: UniverseConfig {
                size: 10,
                min_turnover: 0.0,
                min_price: 0.0,
                lookback_years: 1,
                exclude_symbols: vec![],
            },
            walk_forward: WalkForwardConfig {
                is_years: 1,
                oos_years: 1,
                holdout_years: 0,
            },
            grid: DetectorGrid {
                windows: vec![3],
                k_lows: vec![-1.0],
                max_holds: vec![1],
                min_hit_rate: 0.0,
            },
            execution: ExecutionConfig {
                circuit_guard_pct: 0.15,
                fees_bps: 10.0,
                slippage: SlippageModel {
                    gap_2pct: 5.0,
                    gap_5pct: 10.0,
                    gap_high: 20.0,
                },
            },
            portfolio: PortfolioConfig {
                max_concurrent,
                position_size: 10_000.0,
                reentry_lockout: true,
            },
        }
    }

    fn histories(entries: Vec<PriceSeries>) -> BTreeMap<String, PriceSeries> {
        entries
            .into_iter()
            .map(|s| (s.symbol().to_string(), s))
            .collect()
    }

    #[test]
    fn produces_is_and_oos_trades() {
        // Gaps at 50/100/150 fall in 2020 (IS), 400/450 in 2021 (OOS).
        let data = histories(vec![gapped_series("AAA", 730, &[50, 100, 150, 400, 450])]);
        let result = run_backtest(&data, &snapshot(&["AAA"]), &settings(5)).unwrap();

        assert_eq!(result.splits.len(), 1);
        assert_eq!(result.splits[0].fitted_symbols, 1);

        let is_trades: Vec<_> = result
            .trades
            .iter()
            .filter(|t| t.sample_type == SampleType::Is)
            .collect();
        let oos_trades: Vec<_> = result
            .trades
            .iter()
            .filter(|t| t.sample_type == SampleType::Oos)
            .collect();
        assert_eq!(is_trades.len(), 3);
        assert_eq!(oos_trades.len(), 2);
        for trade in &oos_trades {
            assert!(trade.entry_date > date(2020, 12, 31));
        }
    }

    #[test]
    fn oos_trades_carry_real_costs() {
        let data = histories(vec![gapped_series("AAA", 730, &[50, 100, 400])]);
        let result = run_backtest(&data, &snapshot(&["AAA"]), &settings(5)).unwrap();

        let oos = result
            .trades
            .iter()
            .find(|t| t.sample_type == SampleType::Oos)
            .unwrap();
        // Zero entry gap lands in the tightest slippage tier.
        assert!((oos.slippage_bps - 5.0).abs() < f64::EPSILON);
        assert!((oos.fees_bps - 10.0).abs() < f64::EPSILON);
        assert!(oos.entry_price_adjusted > oos.entry_price);
    }

    #[test]
    fn deterministic_across_runs() {
        let data = histories(vec![
            gapped_series("AAA", 730, &[50, 100, 400]),
            gapped_series("BBB", 730, &[60, 110, 410]),
        ]);
        let universe = snapshot(&["AAA", "BBB"]);
        let first = run_backtest(&data, &universe, &settings(5)).unwrap();
        let second = run_backtest(&data, &universe, &settings(5)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn concurrency_limit_caps_same_day_entries() {
        // Both symbols gap on day 400; one slot means one entry.
        let data = histories(vec![
            gapped_series("AAA", 730, &[50, 100, 400]),
            gapped_series("BBB", 730, &[60, 110, 400]),
        ]);
        let result = run_backtest(&data, &snapshot(&["AAA", "BBB"]), &settings(1)).unwrap();

        let oos_trades: Vec<_> = result
            .trades
            .iter()
            .filter(|t| t.sample_type == SampleType::Oos)
            .collect();
        assert_eq!(oos_trades.len(), 1);
    }

    #[test]
    fn too_short_span_is_an_error() {
        let data = histories(vec![gapped_series("AAA", 730, &[50])]);
        let mut cfg = settings(5);
        cfg.end_date = date(2021, 1, 1); // one year: no IS+OOS fits
        let result = run_backtest(&data, &snapshot(&["AAA"]), &cfg);
        assert!(matches!(
            result,
            Err(GaptraderError::InsufficientData { .. })
        ));
    }

    #[test]
    fn universe_symbol_without_data_is_recorded() {
        let data = histories(vec![gapped_series("AAA", 730, &[50, 100, 400])]);
        let result = run_backtest(&data, &snapshot(&["AAA", "GHOST"]), &settings(5)).unwrap();
        assert!(result
            .unfilled
            .iter()
            .any(|u| u.symbol == "GHOST" && u.reason == UnfilledReason::UnknownSymbol));
    }

    #[test]
    fn no_fit_symbol_is_counted_not_fatal() {
        // BBB never gaps: nothing to fit on.
        let data = histories(vec![
            gapped_series("AAA", 730, &[50, 100, 400]),
            gapped_series("BBB", 730, &[]),
        ]);
        let result = run_backtest(&data, &snapshot(&["AAA", "BBB"]), &settings(5)).unwrap();
        assert_eq!(result.splits[0].fitted_symbols, 1);
        assert_eq!(result.splits[0].no_fit_symbols, 1);
    }
}
