//! Report output port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::GaptraderError;
use crate::domain::universe::UniverseSnapshot;
use std::path::Path;

/// Port for persisting run output: the trade ledger, unfilled signals, and
/// the universe snapshot that produced them.
pub trait ReportPort {
    fn write(
        &self,
        result: &BacktestResult,
        universe: &UniverseSnapshot,
        output_dir: &Path,
    ) -> Result<(), GaptraderError>;
}
