//! Configuration validation.
//!
//! Checks every field a run reads before any data is touched.

use crate::domain::error::GrowthfolioError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), GrowthfolioError> {
    validate_universe(config)?;
    validate_data(config)?;
    validate_backtest(config)?;
    Ok(())
}

pub fn validate_universe(config: &dyn ConfigPort) -> Result<(), GrowthfolioError> {
    let tickers = config.get_string("universe", "tickers");
    let file = config.get_string("universe", "file");
    let from_prices = config.get_bool("universe", "from_prices", false);

    match (tickers, file) {
        (Some(t), _) if !t.trim().is_empty() => Ok(()),
        (_, Some(f)) if !f.trim().is_empty() => Ok(()),
        _ if from_prices => Ok(()),
        _ => Err(GrowthfolioError::ConfigMissing {
            section: "universe".to_string(),
            key: "tickers".to_string(),
        }),
    }
}

pub fn validate_data(config: &dyn ConfigPort) -> Result<(), GrowthfolioError> {
    config.require_string("data", "prices_dir")?;
    config.require_string("data", "growth_file")?;

    if config.get_int("data", "max_retries", 0) < 0 {
        return Err(invalid("data", "max_retries", "max_retries must be non-negative"));
    }
    if config.get_int("data", "retry_delay_ms", 0) < 0 {
        return Err(invalid(
            "data",
            "retry_delay_ms",
            "retry_delay_ms must be non-negative",
        ));
    }
    Ok(())
}

pub fn validate_backtest(config: &dyn ConfigPort) -> Result<(), GrowthfolioError> {
    if config.get_int("backtest", "years", 1) < 1 {
        return Err(invalid("backtest", "years", "years must be at least 1"));
    }
    if config.get_double("backtest", "initial_value", 100.0) <= 0.0 {
        return Err(invalid(
            "backtest",
            "initial_value",
            "initial_value must be positive",
        ));
    }
    validate_dates(config)?;
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), GrowthfolioError> {
    let start = optional_date(config, "start_date")?;
    let end = optional_date(config, "end_date")?;

    match (start, end) {
        (None, Some(_)) => Err(GrowthfolioError::ConfigMissing {
            section: "backtest".to_string(),
            key: "start_date".to_string(),
        }),
        (Some(s), Some(e)) if s >= e => Err(invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        )),
        _ => Ok(()),
    }
}

/// Parses an optional `[backtest]` date; blank counts as absent.
pub fn optional_date(
    config: &dyn ConfigPort,
    field: &str,
) -> Result<Option<NaiveDate>, GrowthfolioError> {
    match config.get_string("backtest", field) {
        Some(s) if !s.trim().is_empty() => parse_date(s.trim(), "backtest", field).map(Some),
        _ => Ok(None),
    }
}

pub fn parse_date(value: &str, section: &str, field: &str) -> Result<NaiveDate, GrowthfolioError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| invalid(section, field, &format!("invalid {field} format, expected YYYY-MM-DD")))
}

fn invalid(section: &str, key: &str, reason: &str) -> GrowthfolioError {
    GrowthfolioError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
