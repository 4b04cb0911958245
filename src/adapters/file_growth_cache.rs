//! Growth mappings cached on disk, one CSV per universe key.
//!
//! Entry files live at `<dir>/growth-<key>.csv` with a `ticker,g` header; an
//! empty `g` cell records a ticker without an estimate.

use crate::domain::error::GrowthfolioError;
use crate::domain::growth::GrowthMapping;
use crate::ports::growth_cache::GrowthCache;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tracing::debug;

#[derive(Debug, Serialize, Deserialize)]
struct GrowthRow {
    ticker: String,
    g: Option<f64>,
}

pub struct FileGrowthCache {
    dir: PathBuf,
}

impl FileGrowthCache {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("growth-{}.csv", key))
    }

    fn cache_error(reason: impl std::fmt::Display) -> GrowthfolioError {
        GrowthfolioError::Cache {
            reason: reason.to_string(),
        }
    }
}

impl GrowthCache for FileGrowthCache {
    fn get(&self, key: &str) -> Result<Option<GrowthMapping>, GrowthfolioError> {
        let path = self.entry_path(key);
        let mut rdr = match csv::Reader::from_path(&path) {
            Ok(rdr) => rdr,
            Err(e) => {
                return match e.kind() {
                    csv::ErrorKind::Io(io) if io.kind() == io::ErrorKind::NotFound => Ok(None),
                    _ => Err(Self::cache_error(e)),
                };
            }
        };

        let mut entries = Vec::new();
        for result in rdr.deserialize::<GrowthRow>() {
            let row = result
                .map_err(|e| Self::cache_error(format!("{}: {}", path.display(), e)))?;
            entries.push((row.ticker, row.g));
        }

        debug!(%key, tickers = entries.len(), "growth cache hit");
        Ok(Some(entries.into_iter().collect()))
    }

    fn put(&self, key: &str, mapping: &GrowthMapping) -> Result<(), GrowthfolioError> {
        fs::create_dir_all(&self.dir)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        {
            let mut wtr = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(tmp.as_file_mut());
            wtr.write_record(["ticker", "g"]).map_err(Self::cache_error)?;
            for (ticker, g) in mapping.iter() {
                wtr.serialize(GrowthRow {
                    ticker: ticker.to_string(),
                    g,
                })
                .map_err(Self::cache_error)?;
            }
            wtr.flush()?;
        }
        tmp.as_file_mut().flush()?;
        tmp.persist(self.entry_path(key)).map_err(Self::cache_error)?;
        Ok(())
    }

    fn invalidate(&self, key: &str) -> Result<bool, GrowthfolioError> {
        match fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn mapping() -> GrowthMapping {
        vec![
            ("AAPL".to_string(), Some(0.062)),
            ("IBM".to_string(), None),
            ("MSFT".to_string(), Some(-0.013)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn miss_then_hit() {
        let dir = TempDir::new().unwrap();
        let cache = FileGrowthCache::new(dir.path().join("cache"));

        assert!(cache.get("abc").unwrap().is_none());
        cache.put("abc", &mapping()).unwrap();
        assert_eq!(cache.get("abc").unwrap(), Some(mapping()));
        assert!(cache.get("other").unwrap().is_none());
    }

    #[test]
    fn invalidate_removes_entry() {
        let dir = TempDir::new().unwrap();
        let cache = FileGrowthCache::new(dir.path().to_path_buf());

        cache.put("abc", &mapping()).unwrap();
        assert!(cache.invalidate("abc").unwrap());
        assert!(!cache.invalidate("abc").unwrap());
        assert!(cache.get("abc").unwrap().is_none());
    }

    #[test]
    fn corrupt_entry_is_an_error() {
        let dir = TempDir::new().unwrap();
        let cache = FileGrowthCache::new(dir.path().to_path_buf());
        fs::write(dir.path().join("growth-abc.csv"), "ticker,g\nAAPL,fast\n").unwrap();

        assert!(matches!(cache.get("abc"), Err(GrowthfolioError::Cache { .. })));
    }
}
