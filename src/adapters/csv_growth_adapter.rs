//! Growth estimates served from a `ticker,g` CSV file.
//!
//! The file is the output of an external forecasting step. An empty, `null`
//! or `nan` cell means the forecaster produced no estimate for that ticker;
//! a ticker absent from the file is treated the same way.

use crate::domain::error::GrowthfolioError;
use crate::ports::growth_port::GrowthPort;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

pub struct CsvGrowthAdapter {
    estimates: HashMap<String, Option<f64>>,
}

impl CsvGrowthAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, GrowthfolioError> {
        let path = path.as_ref();
        let table_error = |reason: String| GrowthfolioError::GrowthSource {
            path: path.display().to_string(),
            reason,
        };

        let mut rdr = csv::Reader::from_path(path).map_err(|e| table_error(e.to_string()))?;
        let mut estimates = HashMap::new();

        for result in rdr.records() {
            let record = result.map_err(|e| table_error(format!("CSV parse error: {}", e)))?;
            let ticker = record.get(0).unwrap_or_default().trim().to_uppercase();
            if ticker.is_empty() {
                continue;
            }
            let estimate = record.get(1).and_then(parse_estimate);
            estimates.insert(ticker, estimate);
        }

        info!(path = %path.display(), tickers = estimates.len(), "loaded growth estimates");
        Ok(Self { estimates })
    }

    pub fn from_map(estimates: HashMap<String, Option<f64>>) -> Self {
        Self { estimates }
    }
}

fn parse_estimate(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|g| g.is_finite())
}

impl GrowthPort for CsvGrowthAdapter {
    fn estimate(&self, ticker: &str) -> Result<Option<f64>, GrowthfolioError> {
        Ok(self.estimates.get(ticker).copied().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn growth_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn reads_estimates() {
        let file = growth_file("ticker,g\nAAPL,0.062\nmsft,0.041\nNVDA,\nTSLA,nan\n");
        let adapter = CsvGrowthAdapter::from_file(file.path()).unwrap();

        assert_eq!(adapter.estimate("AAPL").unwrap(), Some(0.062));
        assert_eq!(adapter.estimate("MSFT").unwrap(), Some(0.041));
        assert_eq!(adapter.estimate("NVDA").unwrap(), None);
        assert_eq!(adapter.estimate("TSLA").unwrap(), None);
    }

    #[test]
    fn absent_ticker_has_no_estimate() {
        let adapter = CsvGrowthAdapter::from_map(HashMap::from([("AAPL".to_string(), Some(0.1))]));
        assert_eq!(adapter.estimate("IBM").unwrap(), None);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(CsvGrowthAdapter::from_file("/nonexistent/growth.csv").is_err());
    }
}
