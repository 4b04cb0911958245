//! Weight table persisted as CSV.
//!
//! ```text
//! ticker,weights
//! AAPL,0.1873
//! MSFT,-0.0412
//! ```
//!
//! The reader takes the ticker from the first column, upper-cased like the
//! universe, and finds the weight column by its `weights` header, so tables
//! with extra columns still load.
//! Writes go to a temporary file in the same directory that is then renamed
//! over the table; readers never observe a partial table.

use crate::domain::error::GrowthfolioError;
use crate::domain::weights::WeightVector;
use crate::ports::weight_store::WeightStore;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

const WEIGHT_COLUMN: &str = "weights";

#[derive(Serialize)]
struct WeightRow<'a> {
    ticker: &'a str,
    weights: f64,
}

pub struct CsvWeightStore {
    path: PathBuf,
}

impl CsvWeightStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn table_error(&self, reason: impl Into<String>) -> GrowthfolioError {
        GrowthfolioError::WeightTable {
            path: self.path.display().to_string(),
            reason: reason.into(),
        }
    }
}

impl WeightStore for CsvWeightStore {
    fn load(&self) -> Result<Option<WeightVector>, GrowthfolioError> {
        let mut rdr = match csv::Reader::from_path(&self.path) {
            Ok(rdr) => rdr,
            Err(e) => {
                return match e.kind() {
                    csv::ErrorKind::Io(io) if io.kind() == io::ErrorKind::NotFound => Ok(None),
                    _ => Err(self.table_error(e.to_string())),
                };
            }
        };

        let headers = rdr
            .headers()
            .map_err(|e| self.table_error(format!("CSV header error: {}", e)))?
            .clone();
        let weight_col = headers
            .iter()
            .position(|h| h.trim() == WEIGHT_COLUMN)
            .ok_or_else(|| self.table_error(format!("missing {} column", WEIGHT_COLUMN)))?;

        let mut weights = BTreeMap::new();
        for (line, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.table_error(format!("CSV parse error: {}", e)))?;
            let ticker = record.get(0).unwrap_or_default().trim().to_uppercase();
            if ticker.is_empty() {
                continue;
            }
            let raw = record.get(weight_col).unwrap_or_default().trim();
            let weight: f64 = raw.parse().map_err(|_| {
                self.table_error(format!("row {}: invalid weight {:?} for {}", line + 2, raw, ticker))
            })?;
            weights.insert(ticker, weight);
        }

        Ok(Some(WeightVector::from_table(weights)))
    }

    fn save(&self, weights: &WeightVector) -> Result<(), GrowthfolioError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        {
            let mut wtr = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(tmp.as_file_mut());
            wtr.write_record(["ticker", WEIGHT_COLUMN])
                .map_err(|e| self.table_error(e.to_string()))?;
            for (ticker, weight) in weights.iter() {
                wtr.serialize(WeightRow {
                    ticker,
                    weights: weight,
                })
                .map_err(|e| self.table_error(e.to_string()))?;
            }
            wtr.flush()?;
        }
        tmp.as_file_mut().flush()?;
        tmp.persist(&self.path)
            .map_err(|e| self.table_error(e.to_string()))?;

        info!(path = %self.path.display(), tickers = weights.len(), "wrote weight table");
        Ok(())
    }
}
