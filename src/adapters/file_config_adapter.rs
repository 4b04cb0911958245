//! INI file configuration adapter.

use crate::domain::error::GrowthfolioError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, GrowthfolioError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| GrowthfolioError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, GrowthfolioError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| GrowthfolioError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_deref()
            .and_then(Self::parse_bool)
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_sections() {
        let content = r#"
[universe]
tickers = AAPL, MSFT, NVDA

[data]
prices_dir = /var/lib/growthfolio/prices
max_retries = 3

[backtest]
years = 2
initial_value = 250.5
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("universe", "tickers"),
            Some("AAPL, MSFT, NVDA".to_string())
        );
        assert_eq!(adapter.get_int("data", "max_retries", 0), 3);
        assert_eq!(adapter.get_int("backtest", "years", 1), 2);
        assert_eq!(adapter.get_double("backtest", "initial_value", 100.0), 250.5);
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[data]\nprices_dir = prices\n").unwrap();
        assert_eq!(adapter.get_string("data", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_default_for_missing_or_non_numeric() {
        let adapter = FileConfigAdapter::from_string("[data]\nmax_retries = lots\n").unwrap();
        assert_eq!(adapter.get_int("data", "max_retries", 2), 2);
        assert_eq!(adapter.get_int("data", "retry_delay_ms", 500), 500);
    }

    #[test]
    fn get_double_returns_default_for_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\ninitial_value = not_a_number\n").unwrap();
        assert_eq!(adapter.get_double("backtest", "initial_value", 100.0), 100.0);
    }

    #[test]
    fn get_bool_accepts_common_spellings() {
        let adapter =
            FileConfigAdapter::from_string("[data]\na = true\nb = yes\nc = 1\nd = off\ne = maybe\n")
                .unwrap();
        assert!(adapter.get_bool("data", "a", false));
        assert!(adapter.get_bool("data", "b", false));
        assert!(adapter.get_bool("data", "c", false));
        assert!(!adapter.get_bool("data", "d", true));
        assert!(adapter.get_bool("data", "e", true));
        assert!(!adapter.get_bool("data", "missing", false));
    }

    #[test]
    fn require_string_rejects_blank_values() {
        let adapter = FileConfigAdapter::from_string("[data]\nprices_dir =   \n").unwrap();
        let err = adapter.require_string("data", "prices_dir").unwrap_err();
        assert!(matches!(err, GrowthfolioError::ConfigMissing { key, .. } if key == "prices_dir"));
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[data]\nweights_file = /tmp/weights.csv\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("data", "weights_file"),
            Some("/tmp/weights.csv".to_string())
        );
    }

    #[test]
    fn from_file_reports_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/growthfolio.ini");
        assert!(matches!(
            result,
            Err(GrowthfolioError::ConfigParse { file, .. }) if file.contains("growthfolio.ini")
        ));
    }
}
