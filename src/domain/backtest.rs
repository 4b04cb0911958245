//! Backtest of a weight vector over a historical window.
//!
//! Resolves the window to concrete dates, fetches one price history per
//! weighted ticker through the [`PricePort`], and hands them to
//! [`aggregate_returns`]. A ticker whose retrieval fails, or that returns no
//! bars, is dropped from the run and reported in
//! [`BacktestResult::skipped`]; the rest of the universe proceeds. Weighted
//! tickers outside the universe are reported there too.

use crate::domain::aligned::{aggregate_returns, AlignedReturnSeries, DEFAULT_INITIAL_VALUE};
use crate::domain::error::GrowthfolioError;
use crate::domain::universe::{SkipReason, SkippedTicker};
use crate::domain::weights::WeightVector;
use crate::ports::price_port::PricePort;
use chrono::{Duration, NaiveDate};
use tracing::{info, warn};

const DAYS_PER_YEAR: i64 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacktestWindow {
    /// `years * 365` days back from today, ending today.
    Lookback { years: u32 },
    /// Explicit start; the end defaults to today.
    Range {
        start: NaiveDate,
        end: Option<NaiveDate>,
    },
}

impl BacktestWindow {
    /// Concrete `(start, end)` dates relative to `today`.
    pub fn resolve(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        match *self {
            BacktestWindow::Lookback { years } => {
                (today - Duration::days(i64::from(years) * DAYS_PER_YEAR), today)
            }
            BacktestWindow::Range { start, end } => (start, end.unwrap_or(today)),
        }
    }
}

impl Default for BacktestWindow {
    fn default() -> Self {
        BacktestWindow::Lookback { years: 1 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub window: BacktestWindow,
    pub initial_value: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            window: BacktestWindow::default(),
            initial_value: DEFAULT_INITIAL_VALUE,
        }
    }
}

/// A return series together with the weights that produced it.
#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub series: AlignedReturnSeries,
    /// Weights restricted to the tickers present in `series`.
    pub weights: WeightVector,
    pub skipped: Vec<SkippedTicker>,
}

/// Backtests `weights` over the tickers of `universe` that carry a weight.
pub fn run_backtest(
    prices: &dyn PricePort,
    universe: &[String],
    weights: &WeightVector,
    config: &BacktestConfig,
    today: NaiveDate,
) -> Result<BacktestResult, GrowthfolioError> {
    let (start_date, end_date) = config.window.resolve(today);
    if start_date >= end_date {
        return Err(GrowthfolioError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "start_date".to_string(),
            reason: format!("window start {start_date} is not before end {end_date}"),
        });
    }

    let mut skipped = Vec::new();
    for (ticker, _) in weights.iter() {
        if !universe.iter().any(|t| t == ticker) {
            warn!(%ticker, "weighted ticker is not in the universe");
            skipped.push(SkippedTicker {
                ticker: ticker.to_string(),
                reason: SkipReason::NotInUniverse,
            });
        }
    }

    let candidates: Vec<&String> = universe.iter().filter(|t| weights.contains(t)).collect();
    info!(
        tickers = candidates.len(),
        %start_date,
        %end_date,
        "running backtest"
    );

    let mut histories = Vec::with_capacity(candidates.len());

    for ticker in candidates {
        match prices.history(ticker, start_date, end_date) {
            Ok(series) if series.is_empty() => {
                warn!(%ticker, "skipping ticker with no price data");
                skipped.push(SkippedTicker {
                    ticker: ticker.clone(),
                    reason: SkipReason::NoPriceData,
                });
            }
            Ok(series) => histories.push(series),
            Err(e) => {
                warn!(%ticker, error = %e, "skipping ticker after retrieval failure");
                skipped.push(SkippedTicker {
                    ticker: ticker.clone(),
                    reason: SkipReason::RetrievalFailed(e.to_string()),
                });
            }
        }
    }

    if !skipped.is_empty() {
        info!(
            used = histories.len(),
            dropped = skipped.len(),
            "backtesting reduced universe"
        );
    }

    let series = aggregate_returns(weights, &histories, config.initial_value).map_err(|e| match e {
        GrowthfolioError::EmptyAlignment { stage, .. } => GrowthfolioError::EmptyAlignment {
            stage,
            tickers: weights.tickers(),
        },
        other => other,
    })?;
    let used = weights.restricted_to(series.tickers());

    Ok(BacktestResult {
        start_date,
        end_date,
        series,
        weights: used,
        skipped,
    })
}
