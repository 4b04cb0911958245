//! Tail-risk metrics over a portfolio gross-return column.
//!
//! Inputs are gross returns centered near 1.0. The conventions below are
//! kept literally:
//!
//! - Parametric VaR(c) = std(gross) * PHI^-1(c/100), with the sample standard
//!   deviation taken on gross values.
//! - ES(c) = (mean(gross) - 1) + std(gross) * exp(-u^2/2) / ((1 - c/100) * sqrt(2*pi)),
//!   u = PHI^-1(c/100).
//! - HVaR(c) = |net[round(c/100 * n)]| with net returns sorted descending and
//!   round-half-to-even rounding. An index of `n` is clamped to `n - 1`.
//! - min = min(gross) - 1
//! - min_max_range = (max(gross) - min(gross)) - 1
//!
//! `min_max_range` and the gross-based dispersion differ from textbook
//! definitions; they are reproduced as-is.

use crate::domain::aligned::AlignedReturnSeries;
use crate::domain::error::GrowthfolioError;
use statrs::distribution::{ContinuousCDF, Normal};
use statrs::statistics::Statistics;
use std::f64::consts::PI;

pub const MIN_RISK_ROWS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskMetrics {
    pub var95: f64,
    pub var99: f64,
    pub es975: f64,
    pub hvar95: f64,
    pub hvar99: f64,
    pub min: f64,
    pub min_max_range: f64,
}

impl RiskMetrics {
    /// Computes every metric from a gross-return column.
    pub fn compute(gross: &[f64]) -> Result<Self, GrowthfolioError> {
        if gross.len() < MIN_RISK_ROWS {
            return Err(GrowthfolioError::InsufficientData {
                stage: "risk metrics".to_string(),
                rows: gross.len(),
                minimum: MIN_RISK_ROWS,
            });
        }

        let lo = gross.min();
        let hi = gross.max();

        Ok(RiskMetrics {
            var95: parametric_var(gross, 95.0),
            var99: parametric_var(gross, 99.0),
            es975: expected_shortfall(gross, 97.5),
            hvar95: historical_var(gross, 95.0),
            hvar99: historical_var(gross, 99.0),
            min: lo - 1.0,
            min_max_range: (hi - lo) - 1.0,
        })
    }

    /// Metrics over the "Portfolio" column of `series`, base row included.
    pub fn from_series(series: &AlignedReturnSeries) -> Result<Self, GrowthfolioError> {
        Self::compute(&series.portfolio())
    }

    /// `(name, value)` pairs in a fixed order.
    pub fn entries(&self) -> [(&'static str, f64); 7] {
        [
            ("var95", self.var95),
            ("var99", self.var99),
            ("hvar95", self.hvar95),
            ("hvar99", self.hvar99),
            ("es975", self.es975),
            ("min", self.min),
            ("min_max_range", self.min_max_range),
        ]
    }
}

fn quantile(confidence: f64) -> f64 {
    Normal::standard().inverse_cdf(confidence / 100.0)
}

pub fn parametric_var(gross: &[f64], confidence: f64) -> f64 {
    gross.std_dev() * quantile(confidence)
}

pub fn expected_shortfall(gross: &[f64], confidence: f64) -> f64 {
    let mu = gross.mean() - 1.0;
    let sigma = gross.std_dev();
    let x = confidence / 100.0;
    let u = quantile(confidence);
    mu + sigma * ((-u * u / 2.0).exp() / ((1.0 - x) * (2.0 * PI).sqrt()))
}

pub fn historical_var(gross: &[f64], confidence: f64) -> f64 {
    if gross.is_empty() {
        return f64::NAN;
    }
    let mut net: Vec<f64> = gross.iter().map(|g| g - 1.0).collect();
    net.sort_by(|a, b| b.total_cmp(a));

    let idx = (confidence / 100.0 * net.len() as f64).round_ties_even() as usize;
    net[idx.min(net.len() - 1)].abs()
}
