//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::run_backtest;
use crate::domain::bar::PriceSeries;
use crate::domain::config::Settings;
use crate::domain::error::GaptraderError;
use crate::domain::metrics::LedgerSummary;
use crate::domain::universe::{select_universe, UniverseSnapshot};
use crate::domain::walk_forward::create_splits;
use crate::ports::data_port::{load_histories, DataPort};
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "gaptrader", about = "Walk-forward gap anomaly backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the walk-forward backtest and write CSV reports
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Report directory (default ./report)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Select and print the universe at the configured freeze date
    SelectUniverse {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the walk-forward split schedule
    Splits {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest { config, output } => run_full_backtest(&config, output.as_deref()),
        Command::SelectUniverse { config } => run_select_universe(&config),
        Command::Splits { config } => run_splits(&config),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = GaptraderError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn load_settings(config_path: &PathBuf) -> Result<Settings, ExitCode> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    Settings::from_config(&adapter).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn load_market(
    settings: &Settings,
) -> Result<(BTreeMap<String, PriceSeries>, UniverseSnapshot), GaptraderError> {
    let data_port = CsvAdapter::new(PathBuf::from(&settings.csv_dir));
    let symbols = data_port.list_symbols()?;
    eprintln!("Found {} symbols in {}", symbols.len(), settings.csv_dir);

    let histories = load_histories(&data_port, &symbols, settings.start_date, settings.end_date)?;
    let universe = select_universe(&histories, settings.t0, &settings.universe)?;
    Ok((histories, universe))
}

fn run_full_backtest(config_path: &PathBuf, output: Option<&std::path::Path>) -> ExitCode {
    let settings = match load_settings(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let (histories, universe) = match load_market(&settings) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let result = match run_backtest(&histories, &universe, &settings) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let summary = LedgerSummary::compute(&result.trades);
    eprintln!("\n=== Ledger Summary ===");
    eprintln!("Trades:        {} ({} IS, {} OOS)", summary.trades, summary.is_trades, summary.oos_trades);
    eprintln!("Hit Rate:      {:.1}%", summary.hit_rate * 100.0);
    eprintln!("Median Return: {:.3}%", summary.median_return * 100.0);
    eprintln!("Mean Return:   {:.3}%", summary.mean_return * 100.0);
    eprintln!("Best / Worst:  {:.3}% / {:.3}%", summary.best_return * 100.0, summary.worst_return * 100.0);
    eprintln!("Avg Hold:      {:.1} days", summary.avg_hold_days);
    eprintln!("Unfilled:      {}", result.unfilled.len());

    let output_dir = output
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("report"));
    match CsvReportAdapter.write(&result, &universe, &output_dir) {
        Ok(()) => {
            eprintln!("\nReports written to: {}", output_dir.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_select_universe(config_path: &PathBuf) -> ExitCode {
    let settings = match load_settings(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let (_, universe) = match load_market(&settings) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    for selected in &universe.selected {
        println!(
            "{:>4}  {:<10} turnover {:>14.0}  valid days {}",
            selected.rank, selected.symbol, selected.median_turnover, selected.valid_days
        );
    }
    eprintln!(
        "{} selected, {} excluded",
        universe.selected.len(),
        universe.excluded.len()
    );
    ExitCode::SUCCESS
}

fn run_splits(config_path: &PathBuf) -> ExitCode {
    let settings = match load_settings(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let splits = create_splits(settings.start_date, settings.end_date, &settings.walk_forward);
    if splits.is_empty() {
        eprintln!(
            "error: {} to {} is too short for the configured windows",
            settings.start_date, settings.end_date
        );
        return ExitCode::from(4);
    }

    for (i, split) in splits.iter().enumerate() {
        println!(
            "split {:>2}: IS {} .. {}  OOS {} .. {}",
            i + 1,
            split.is_start,
            split.is_end,
            split.oos_start,
            split.oos_end
        );
    }
    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    match load_settings(config_path) {
        Ok(settings) => {
            eprintln!(
                "Config validated: {} symbols universe, {}y IS / {}y OOS / {}y holdout, grid {}x{}x{}",
                settings.universe.size,
                settings.walk_forward.is_years,
                settings.walk_forward.oos_years,
                settings.walk_forward.holdout_years,
                settings.grid.windows.len(),
                settings.grid.k_lows.len(),
                settings.grid.max_holds.len()
            );
            ExitCode::SUCCESS
        }
        Err(code) => code,
    }
}
