//! Ticker universe sources: an inline list or a symbols file.

use crate::domain::error::GrowthfolioError;
use crate::domain::universe::{parse_tickers, Universe};
use crate::ports::universe_port::UniverseSource;
use std::fs;
use std::path::PathBuf;

/// Tickers given inline, e.g. `tickers = AAPL, MSFT` in the config.
pub struct ListUniverseSource {
    tickers: String,
}

impl ListUniverseSource {
    pub fn new(tickers: impl Into<String>) -> Self {
        Self {
            tickers: tickers.into(),
        }
    }
}

impl UniverseSource for ListUniverseSource {
    fn universe(&self) -> Result<Universe, GrowthfolioError> {
        Ok(parse_tickers(&self.tickers)?)
    }
}

/// Symbols file, one ticker per line or comma separated. Lines starting with
/// `#` are comments.
pub struct FileUniverseSource {
    path: PathBuf,
}

impl FileUniverseSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl UniverseSource for FileUniverseSource {
    fn universe(&self) -> Result<Universe, GrowthfolioError> {
        let content = fs::read_to_string(&self.path)?;
        let body: String = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(parse_tickers(&body)?)
    }
}
