//! Domain error types.
//!
//! Structural problems (bad configuration, empty universe) halt the run.
//! Per-symbol, per-signal, and per-split failures are captured as data by the
//! modules that encounter them and the run proceeds.

use crate::domain::bar::SeriesError;

/// Top-level error type for gaptrader.
#[derive(Debug, thiserror::Error)]
pub enum GaptraderError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no symbols passed universe selection at {t0}")]
    EmptyUniverse { t0: chrono::NaiveDate },

    #[error("no usable bars for split {split_index} ({window})")]
    InsufficientData { split_index: usize, window: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("bad data in {file}: {reason}")]
    DataFormat { file: String, reason: String },

    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&GaptraderError> for std::process::ExitCode {
    fn from(err: &GaptraderError) -> Self {
        let code: u8 = match err {
            GaptraderError::Io(_) => 1,
            GaptraderError::ConfigParse { .. }
            | GaptraderError::ConfigMissing { .. }
            | GaptraderError::ConfigInvalid { .. } => 2,
            GaptraderError::EmptyUniverse { .. } => 3,
            GaptraderError::NoData { .. }
            | GaptraderError::DataFormat { .. }
            | GaptraderError::InsufficientData { .. }
            | GaptraderError::Series(_) => 4,
        };
        std::process::ExitCode::from(code)
    }
}
