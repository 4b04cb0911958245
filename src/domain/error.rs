//! Domain error types.

use crate::domain::universe::UniverseError;

/// Top-level error type for growthfolio.
#[derive(Debug, thiserror::Error)]
pub enum GrowthfolioError {
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

    #[error(transparent)]
    Universe(#[from] UniverseError),

    #[error("retrieval failed for {ticker}: {reason}")]
    Retrieval { ticker: String, reason: String },

    /// Price data that no retry will produce, e.g. a missing or malformed file.
    #[error("no usable price data for {ticker}: {reason}")]
    PriceUnavailable { ticker: String, reason: String },

    #[error("{stage}: no dates common to all of [{}]", tickers.join(", "))]
    EmptyAlignment { stage: String, tickers: Vec<String> },

    #[error("degenerate growth distribution over {survivors} estimate(s)")]
    DegenerateDistribution { survivors: usize },

    #[error("{stage}: have {rows} rows, need at least {minimum}")]
    InsufficientData {
        stage: String,
        rows: usize,
        minimum: usize,
    },

    #[error("weight table {path}: {reason}")]
    WeightTable { path: String, reason: String },

    #[error("growth estimates {path}: {reason}")]
    GrowthSource { path: String, reason: String },

    #[error("growth cache error: {reason}")]
    Cache { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&GrowthfolioError> for std::process::ExitCode {
    fn from(err: &GrowthfolioError) -> Self {
        let code: u8 = match err {
            GrowthfolioError::Io(_) => 1,
            GrowthfolioError::ConfigParse { .. }
            | GrowthfolioError::ConfigMissing { .. }
            | GrowthfolioError::ConfigInvalid { .. } => 2,
            GrowthfolioError::Retrieval { .. }
            | GrowthfolioError::PriceUnavailable { .. }
            | GrowthfolioError::WeightTable { .. }
            | GrowthfolioError::GrowthSource { .. }
            | GrowthfolioError::Cache { .. } => 3,
            GrowthfolioError::Universe(_) => 4,
            GrowthfolioError::EmptyAlignment { .. }
            | GrowthfolioError::DegenerateDistribution { .. }
            | GrowthfolioError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
