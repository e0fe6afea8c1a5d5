#![allow(dead_code)]

use chrono::NaiveDate;
use gaptrader::domain::bar::{PriceBar, PriceSeries};
use gaptrader::domain::config::Settings;
use gaptrader::domain::detector::DetectorGrid;
use gaptrader::domain::error::GaptraderError;
use gaptrader::domain::execution::{ExecutionConfig, SlippageModel};
use gaptrader::domain::portfolio::PortfolioConfig;
use gaptrader::domain::universe::UniverseConfig;
use gaptrader::domain::walk_forward::WalkForwardConfig;
use gaptrader::ports::data_port::DataPort;
use std::collections::BTreeMap;

pub struct MockDataPort {
    pub bars: BTreeMap<String, Vec<PriceBar>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            bars: BTreeMap::new(),
        }
    }

    pub fn with_series(mut self, series: &PriceSeries) -> Self {
        self.bars
            .insert(series.symbol().to_string(), series.bars().to_vec());
        self
    }

    pub fn list_symbols_sorted(&self) -> Vec<String> {
        self.bars.keys().cloned().collect()
    }
}

impl DataPort for MockDataPort {
    fn fetch_series(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, GaptraderError> {
        let bars = self
            .bars
            .get(symbol)
            .ok_or_else(|| GaptraderError::NoData {
                symbol: symbol.to_string(),
            })?
            .iter()
            .filter(|b| b.date >= start && b.date <= end)
            .cloned()
            .collect();
        Ok(PriceSeries::new(symbol, bars)?)
    }

    fn list_symbols(&self) -> Result<Vec<String>, GaptraderError> {
        Ok(self.bars.keys().cloned().collect())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Daily calendar bars from 2020-01-01 with flat closes at 100 and the
/// given per-day opens (default 100). Days listed in `gap_days` open at 90,
/// a clean -10% overnight gap.
pub fn gapped_series(symbol: &str, days: usize, gap_days: &[usize], volume: i64) -> PriceSeries {
    series_with_opens(
        symbol,
        days,
        |i| if gap_days.contains(&i) { 90.0 } else { 100.0 },
        volume,
    )
}

pub fn series_with_opens(
    symbol: &str,
    days: usize,
    open_for: impl Fn(usize) -> f64,
    volume: i64,
) -> PriceSeries {
    let bars = (0..days)
        .map(|i| {
            let open = open_for(i);
            PriceBar {
                date: date(2020, 1, 1) + chrono::Days::new(i as u64),
                open,
                high: open.max(100.0),
                low: open.min(100.0),
                close: 100.0,
                volume,
            }
        })
        .collect();
    PriceSeries::new(symbol, bars).unwrap()
}

/// Two calendar years of data, one IS/OOS split, a single-cell grid.
pub fn test_settings() -> Settings {
    Settings {
        csv_dir: "./data".to_string(),
        start_date: date(2020, 1, 1),
        end_date: date(2022, 1, 1),
        t0: date(2021, 12, 31),
        universe: UniverseConfig {
            size: 10,
            min_turnover: 10_000.0,
            min_price: 5.0,
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
            max_concurrent: 5,
            position_size: 10_000.0,
            reentry_lockout: true,
        },
    }
}
