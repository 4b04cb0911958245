//! Aligned portfolio return series.
//!
//! Price histories are merged on the strict intersection of their dates: a
//! date missing from any one ticker is dropped for all of them. Over the
//! surviving dates each ticker's period return is the percentage change in
//! adjusted close, and the portfolio gross return is the product of the
//! weighted factors:
//!
//! ```text
//! factor[t] = r[t] * w[t] + 1
//! portfolio = prod(factor[t])
//! dollars   = initial_value * cumprod(portfolio)
//! ```
//!
//! The first common date is the base row: it has no period returns, a
//! gross return of exactly 1.0 and a value of `initial_value`.

use crate::domain::error::GrowthfolioError;
use crate::domain::price::PriceSeries;
use crate::domain::weights::WeightVector;
use chrono::NaiveDate;
use std::borrow::Borrow;
use std::collections::BTreeSet;
use tracing::{debug, info};

pub const DEFAULT_INITIAL_VALUE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnRow {
    pub date: NaiveDate,
    /// Period return per ticker, in column order. `None` on the base row.
    pub returns: Option<Vec<f64>>,
    /// Gross portfolio return for the period.
    pub portfolio: f64,
    /// Cumulative portfolio value.
    pub portfolio_dollars: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlignedReturnSeries {
    tickers: Vec<String>,
    rows: Vec<ReturnRow>,
}

impl AlignedReturnSeries {
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn rows(&self) -> &[ReturnRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    /// The "Portfolio" gross-return column, base row included.
    pub fn portfolio(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.portfolio).collect()
    }

    /// The "Portfolio_Dollars" column.
    pub fn portfolio_dollars(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.portfolio_dollars).collect()
    }

    pub fn final_value(&self) -> Option<f64> {
        self.rows.last().map(|r| r.portfolio_dollars)
    }

    /// Period returns of one ticker, `None` on the base row.
    pub fn ticker_returns(&self, ticker: &str) -> Option<Vec<Option<f64>>> {
        let col = self.tickers.iter().position(|t| t == ticker)?;
        Some(
            self.rows
                .iter()
                .map(|r| r.returns.as_ref().map(|rs| rs[col]))
                .collect(),
        )
    }
}

/// Dates present in every series, ascending. Empty when `series` is empty.
pub fn common_timeline<S: Borrow<PriceSeries>>(series: &[S]) -> Vec<NaiveDate> {
    let Some((first, rest)) = series.split_first() else {
        return Vec::new();
    };
    let first: &PriceSeries = first.borrow();
    let dates: BTreeSet<NaiveDate> = first
        .bars
        .iter()
        .map(|b| b.date)
        .filter(|&d| {
            rest.iter().all(|s| {
                let s: &PriceSeries = s.borrow();
                s.contains(d)
            })
        })
        .collect();
    dates.into_iter().collect()
}

/// Builds the aligned return series for the weighted constituents.
///
/// Histories for tickers without a weight are ignored. An empty common
/// timeline is an [`GrowthfolioError::EmptyAlignment`] error.
pub fn aggregate_returns(
    weights: &WeightVector,
    histories: &[PriceSeries],
    initial_value: f64,
) -> Result<AlignedReturnSeries, GrowthfolioError> {
    let constituents: Vec<&PriceSeries> = histories
        .iter()
        .filter(|s| {
            let weighted = weights.contains(&s.ticker);
            if !weighted {
                debug!(ticker = %s.ticker, "ignoring history without a weight");
            }
            weighted
        })
        .collect();

    let tickers: Vec<String> = constituents.iter().map(|s| s.ticker.clone()).collect();
    let timeline = common_timeline(&constituents);

    if timeline.is_empty() {
        return Err(GrowthfolioError::EmptyAlignment {
            stage: "aggregate returns".to_string(),
            tickers,
        });
    }

    let column_weights: Vec<f64> = tickers
        .iter()
        .map(|t| weights.get(t).unwrap_or(0.0))
        .collect();

    let mut rows = Vec::with_capacity(timeline.len());
    rows.push(ReturnRow {
        date: timeline[0],
        returns: None,
        portfolio: 1.0,
        portfolio_dollars: initial_value,
    });

    let mut cumulative = 1.0;
    for pair in timeline.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);

        let returns: Vec<f64> = constituents
            .iter()
            .map(|s| {
                let p0 = s.adj_close(prev).unwrap_or(f64::NAN);
                let p1 = s.adj_close(curr).unwrap_or(f64::NAN);
                p1 / p0 - 1.0
            })
            .collect();

        let portfolio: f64 = returns
            .iter()
            .zip(&column_weights)
            .map(|(r, w)| r * w + 1.0)
            .product();
        cumulative *= portfolio;

        rows.push(ReturnRow {
            date: curr,
            returns: Some(returns),
            portfolio,
            portfolio_dollars: cumulative * initial_value,
        });
    }

    info!(
        tickers = tickers.len(),
        rows = rows.len(),
        "aggregated portfolio returns"
    );

    Ok(AlignedReturnSeries { tickers, rows })
}
