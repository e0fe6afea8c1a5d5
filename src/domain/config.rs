//! Typed run settings parsed and validated from the configuration port.
//!
//! Every field is checked before a run starts so that a bad config fails
//! fast with the section and key named, instead of surfacing as a panic
//! mid-backtest.

use crate::domain::detector::DetectorGrid;
use crate::domain::error::GaptraderError;
use crate::domain::execution::{ExecutionConfig, SlippageModel};
use crate::domain::portfolio::PortfolioConfig;
use crate::domain::universe::UniverseConfig;
use crate::domain::walk_forward::WalkForwardConfig;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub csv_dir: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Universe freeze date. Selection uses only data up to and including t0.
    pub t0: NaiveDate,
    pub universe: UniverseConfig,
    pub walk_forward: WalkForwardConfig,
    pub grid: DetectorGrid,
    pub execution: ExecutionConfig,
    pub portfolio: PortfolioConfig,
}

impl Settings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, GaptraderError> {
        let csv_dir = require_string(config, "data", "csv_dir")?;
        let start_date = parse_date(config, "data", "start_date")?;
        let end_date = parse_date(config, "data", "end_date")?;
        if start_date >= end_date {
            return Err(invalid(
                "data",
                "start_date",
                "start_date must be before end_date",
            ));
        }

        let t0 = parse_date(config, "run", "t0")?;
        if t0 < start_date || t0 > end_date {
            return Err(invalid(
                "run",
                "t0",
                "t0 must fall within [start_date, end_date]",
            ));
        }

        let settings = Settings {
            csv_dir,
            start_date,
            end_date,
            t0,
            universe: parse_universe(config)?,
            walk_forward: parse_walk_forward(config)?,
            grid: parse_grid(config)?,
            execution: parse_execution(config)?,
            portfolio: parse_portfolio(config)?,
        };
        Ok(settings)
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> GaptraderError {
    GaptraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn require_string(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<String, GaptraderError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(GaptraderError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn parse_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<NaiveDate, GaptraderError> {
    let raw = require_string(config, section, key)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|_| invalid(section, key, "expected a YYYY-MM-DD date"))
}

fn parse_usize_list(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: &str,
) -> Result<Vec<usize>, GaptraderError> {
    let raw = config
        .get_string(section, key)
        .unwrap_or_else(|| default.to_string());
    raw.split(',')
        .map(|s| {
            s.trim()
                .parse::<usize>()
                .map_err(|_| invalid(section, key, "expected a comma-separated integer list"))
        })
        .collect()
}

fn parse_f64_list(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: &str,
) -> Result<Vec<f64>, GaptraderError> {
    let raw = config
        .get_string(section, key)
        .unwrap_or_else(|| default.to_string());
    raw.split(',')
        .map(|s| {
            s.trim()
                .parse::<f64>()
                .map_err(|_| invalid(section, key, "expected a comma-separated number list"))
        })
        .collect()
}

fn parse_universe(config: &dyn ConfigPort) -> Result<UniverseConfig, GaptraderError> {
    let size = config.get_int("universe", "size", 50);
    if size < 1 {
        return Err(invalid("universe", "size", "size must be at least 1"));
    }
    let min_turnover = config.get_double("universe", "min_turnover", 1_000_000.0);
    if min_turnover < 0.0 {
        return Err(invalid(
            "universe",
            "min_turnover",
            "min_turnover must be non-negative",
        ));
    }
    let min_price = config.get_double("universe", "min_price", 5.0);
    if min_price < 0.0 {
        return Err(invalid(
            "universe",
            "min_price",
            "min_price must be non-negative",
        ));
    }
    let lookback_years = config.get_int("universe", "lookback_years", 2);
    if lookback_years < 1 {
        return Err(invalid(
            "universe",
            "lookback_years",
            "lookback_years must be at least 1",
        ));
    }

    let exclude_symbols = config
        .get_string("universe", "exclude")
        .map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    Ok(UniverseConfig {
        size: size as usize,
        min_turnover,
        min_price,
        lookback_years: lookback_years as u32,
        exclude_symbols,
    })
}

fn parse_walk_forward(config: &dyn ConfigPort) -> Result<WalkForwardConfig, GaptraderError> {
    let is_years = config.get_int("walk_forward", "is_years", 3);
    let oos_years = config.get_int("walk_forward", "oos_years", 1);
    let holdout_years = config.get_int("walk_forward", "holdout_years", 1);

    if is_years < 1 {
        return Err(invalid(
            "walk_forward",
            "is_years",
            "is_years must be at least 1",
        ));
    }
    if oos_years < 1 {
        return Err(invalid(
            "walk_forward",
            "oos_years",
            "oos_years must be at least 1",
        ));
    }
    if holdout_years < 0 {
        return Err(invalid(
            "walk_forward",
            "holdout_years",
            "holdout_years must be non-negative",
        ));
    }

    Ok(WalkForwardConfig {
        is_years: is_years as u32,
        oos_years: oos_years as u32,
        holdout_years: holdout_years as u32,
    })
}

fn parse_grid(config: &dyn ConfigPort) -> Result<DetectorGrid, GaptraderError> {
    let grid = DetectorGrid {
        windows: parse_usize_list(config, "detector", "windows", "21,63")?,
        k_lows: parse_f64_list(config, "detector", "k_lows", "-1.5,-2.0,-2.5")?,
        max_holds: parse_usize_list(config, "detector", "max_holds", "1,2,3,5")?,
        min_hit_rate: config.get_double("detector", "min_hit_rate", 0.45),
    };
    grid.validate()?;
    Ok(grid)
}

fn parse_execution(config: &dyn ConfigPort) -> Result<ExecutionConfig, GaptraderError> {
    let circuit_guard_pct = config.get_double("execution", "circuit_guard_pct", 0.10);
    if circuit_guard_pct <= 0.0 {
        return Err(invalid(
            "execution",
            "circuit_guard_pct",
            "circuit_guard_pct must be positive",
        ));
    }
    let fees_bps = config.get_double("execution", "fees_bps", 10.0);
    if fees_bps < 0.0 {
        return Err(invalid("execution", "fees_bps", "fees_bps must be non-negative"));
    }

    let slippage = SlippageModel {
        gap_2pct: config.get_double("execution", "slippage_gap_2pct", 5.0),
        gap_5pct: config.get_double("execution", "slippage_gap_5pct", 10.0),
        gap_high: config.get_double("execution", "slippage_gap_high", 20.0),
    };
    for (key, bps) in [
        ("slippage_gap_2pct", slippage.gap_2pct),
        ("slippage_gap_5pct", slippage.gap_5pct),
        ("slippage_gap_high", slippage.gap_high),
    ] {
        if bps < 0.0 {
            return Err(invalid("execution", key, "slippage must be non-negative"));
        }
    }

    Ok(ExecutionConfig {
        circuit_guard_pct,
        fees_bps,
        slippage,
    })
}

fn parse_portfolio(config: &dyn ConfigPort) -> Result<PortfolioConfig, GaptraderError> {
    let max_concurrent = config.get_int("portfolio", "max_concurrent", 5);
    if max_concurrent < 1 {
        return Err(invalid(
            "portfolio",
            "max_concurrent",
            "max_concurrent must be at least 1",
        ));
    }
    let position_size = config.get_double("portfolio", "position_size", 10_000.0);
    if position_size <= 0.0 {
        return Err(invalid(
            "portfolio",
            "position_size",
            "position_size must be positive",
        ));
    }

    Ok(PortfolioConfig {
        max_concurrent: max_concurrent as usize,
        position_size,
        reentry_lockout: config.get_bool("portfolio", "reentry_lockout", true),
    })
}
