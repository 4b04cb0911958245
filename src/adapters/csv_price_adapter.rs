//! Price histories from per-ticker CSV files.
//!
//! Files are named `<TICKER>.csv` and carry a header row in the layout of a
//! Yahoo Finance daily download:
//!
//! ```text
//! Date,Open,High,Low,Close,Adj Close,Volume
//! ```
//!
//! Only `Date` and `Adj Close` are read. Rows whose adjusted close is `null`,
//! empty or non-numeric are skipped. A missing file, missing column or bad
//! date is [`GrowthfolioError::PriceUnavailable`]; other read failures are
//! [`GrowthfolioError::Retrieval`].

use crate::domain::error::GrowthfolioError;
use crate::domain::price::{PriceBar, PriceSeries};
use crate::domain::universe::Universe;
use crate::ports::price_port::PricePort;
use crate::ports::universe_port::UniverseSource;
use chrono::NaiveDate;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::debug;

const DATE_COLUMN: &str = "Date";
const ADJ_CLOSE_COLUMN: &str = "Adj Close";

pub struct CsvPriceAdapter {
    base_path: PathBuf,
}

impl CsvPriceAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }

    fn unavailable(ticker: &str, reason: String) -> GrowthfolioError {
        GrowthfolioError::PriceUnavailable {
            ticker: ticker.to_string(),
            reason,
        }
    }

    fn retrieval_error(ticker: &str, reason: String) -> GrowthfolioError {
        GrowthfolioError::Retrieval {
            ticker: ticker.to_string(),
            reason,
        }
    }
}

impl PricePort for CsvPriceAdapter {
    fn history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, GrowthfolioError> {
        let path = self.csv_path(ticker);
        let mut rdr = csv::Reader::from_path(&path).map_err(|e| {
            let reason = format!("failed to read {}: {}", path.display(), e);
            match e.kind() {
                csv::ErrorKind::Io(io) if io.kind() == io::ErrorKind::NotFound => {
                    Self::unavailable(ticker, reason)
                }
                _ => Self::retrieval_error(ticker, reason),
            }
        })?;

        let headers = rdr
            .headers()
            .map_err(|e| Self::retrieval_error(ticker, format!("CSV header error: {}", e)))?
            .clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| Self::unavailable(ticker, format!("missing {} column", name)))
        };
        let date_col = column(DATE_COLUMN)?;
        let adj_col = column(ADJ_CLOSE_COLUMN)?;

        let mut bars = Vec::new();
        let mut skipped = 0usize;

        for result in rdr.records() {
            let record = result
                .map_err(|e| Self::retrieval_error(ticker, format!("CSV parse error: {}", e)))?;

            let date_str = record.get(date_col).unwrap_or_default().trim();
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                Self::unavailable(ticker, format!("invalid date {:?}: {}", date_str, e))
            })?;

            if date < start || date > end {
                continue;
            }

            match record.get(adj_col).map(str::trim).map(str::parse::<f64>) {
                Some(Ok(adj_close)) if adj_close.is_finite() => {
                    bars.push(PriceBar { date, adj_close })
                }
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            debug!(%ticker, skipped, "skipped rows without an adjusted close");
        }

        Ok(PriceSeries::new(ticker, bars))
    }
}

impl UniverseSource for CsvPriceAdapter {
    /// Every ticker with a price file in the base directory.
    fn universe(&self) -> Result<Universe, GrowthfolioError> {
        let entries = fs::read_dir(&self.base_path)?;

        let mut tickers = Vec::new();
        for entry in entries {
            let name = entry?.file_name();
            let name = name.to_string_lossy();
            if let Some(ticker) = name.strip_suffix(".csv") {
                tickers.push(ticker.to_string());
            }
        }

        Ok(Universe::new(tickers)?)
    }
}
