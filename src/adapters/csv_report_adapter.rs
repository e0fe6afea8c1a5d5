//! CSV report adapter. Writes the trade ledger, unfilled signals, and the
//! universe snapshot as separate files in the output directory.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::GaptraderError;
use crate::domain::metrics::LedgerSummary;
use crate::domain::universe::UniverseSnapshot;
use crate::ports::report_port::ReportPort;
use std::fs;
use std::path::Path;

pub struct CsvReportAdapter;

fn csv_err(path: &Path, e: csv::Error) -> GaptraderError {
    GaptraderError::DataFormat {
        file: path.display().to_string(),
        reason: e.to_string(),
    }
}

impl CsvReportAdapter {
    fn write_trades(&self, result: &BacktestResult, path: &Path) -> Result<(), GaptraderError> {
        let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_err(path, e))?;
        wtr.write_record([
            "symbol",
            "sample",
            "entry_date",
            "exit_date",
            "entry_price",
            "entry_price_adjusted",
            "exit_price",
            "return_pct",
            "return_net_of_fees",
            "fees_bps",
            "slippage_bps",
        ])
        .map_err(|e| csv_err(path, e))?;

        for trade in &result.trades {
            wtr.write_record([
                trade.symbol.clone(),
                trade.sample_type.as_str().to_string(),
                trade.entry_date.to_string(),
                trade.exit_date.to_string(),
                format!("{:.4}", trade.entry_price),
                format!("{:.4}", trade.entry_price_adjusted),
                format!("{:.4}", trade.exit_price),
                format!("{:.6}", trade.return_pct),
                format!("{:.6}", trade.return_net_of_fees()),
                format!("{:.2}", trade.fees_bps),
                format!("{:.2}", trade.slippage_bps),
            ])
            .map_err(|e| csv_err(path, e))?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_unfilled(&self, result: &BacktestResult, path: &Path) -> Result<(), GaptraderError> {
        let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_err(path, e))?;
        wtr.write_record(["symbol", "signal_date", "attempted_date", "reason"])
            .map_err(|e| csv_err(path, e))?;

        for unfilled in &result.unfilled {
            wtr.write_record([
                unfilled.symbol.clone(),
                unfilled.signal_date.to_string(),
                unfilled
                    .attempted_date
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
                unfilled.reason.as_str().to_string(),
            ])
            .map_err(|e| csv_err(path, e))?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_universe(
        &self,
        universe: &UniverseSnapshot,
        path: &Path,
    ) -> Result<(), GaptraderError> {
        let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_err(path, e))?;
        wtr.write_record(["symbol", "status", "rank", "median_turnover", "valid_days", "reason"])
            .map_err(|e| csv_err(path, e))?;

        for selected in &universe.selected {
            wtr.write_record([
                selected.symbol.clone(),
                "selected".to_string(),
                selected.rank.to_string(),
                format!("{:.2}", selected.median_turnover),
                selected.valid_days.to_string(),
                String::new(),
            ])
            .map_err(|e| csv_err(path, e))?;
        }
        for excluded in &universe.excluded {
            wtr.write_record([
                excluded.symbol.clone(),
                "excluded".to_string(),
                String::new(),
                String::new(),
                String::new(),
                excluded.reason.describe(),
            ])
            .map_err(|e| csv_err(path, e))?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_summary(&self, result: &BacktestResult, path: &Path) -> Result<(), GaptraderError> {
        let summary = LedgerSummary::compute(&result.trades);
        let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_err(path, e))?;
        wtr.write_record(["metric", "value"])
            .map_err(|e| csv_err(path, e))?;

        let rows = [
            ("trades", summary.trades.to_string()),
            ("is_trades", summary.is_trades.to_string()),
            ("oos_trades", summary.oos_trades.to_string()),
            ("hit_rate", format!("{:.4}", summary.hit_rate)),
            ("median_return", format!("{:.6}", summary.median_return)),
            ("mean_return", format!("{:.6}", summary.mean_return)),
            ("best_return", format!("{:.6}", summary.best_return)),
            ("worst_return", format!("{:.6}", summary.worst_return)),
            ("avg_hold_days", format!("{:.2}", summary.avg_hold_days)),
            ("unfilled_signals", result.unfilled.len().to_string()),
            ("splits", result.splits.len().to_string()),
        ];
        for (metric, value) in rows {
            wtr.write_record([metric.to_string(), value])
                .map_err(|e| csv_err(path, e))?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        universe: &UniverseSnapshot,
        output_dir: &Path,
    ) -> Result<(), GaptraderError> {
        fs::create_dir_all(output_dir)?;
        self.write_trades(result, &output_dir.join("trades.csv"))?;
        self.write_unfilled(result, &output_dir.join("unfilled.csv"))?;
        self.write_universe(universe, &output_dir.join("universe.csv"))?;
        self.write_summary(result, &output_dir.join("summary.csv"))?;
        Ok(())
    }
}
