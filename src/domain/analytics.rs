//! Numeric portfolio analytics: performance against a benchmark, growth
//! ranking and weight ranking. Rendering is left to the caller.

use crate::domain::backtest::BacktestResult;
use crate::domain::growth::GrowthMapping;
use crate::domain::price::PriceSeries;
use chrono::NaiveDate;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct PerformancePoint {
    pub date: NaiveDate,
    pub portfolio_dollars: f64,
    /// Benchmark value on the same date, if the benchmark traded that day.
    pub benchmark_dollars: Option<f64>,
    /// `portfolio_dollars - benchmark_dollars` where both exist.
    pub excess_dollars: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioAnalytics {
    pub benchmark: Option<String>,
    pub performance: Vec<PerformancePoint>,
    /// Present growth estimates, highest first.
    pub growth_ranking: Vec<(String, f64)>,
    /// Applied weights, most short first.
    pub weight_ranking: Vec<(String, f64)>,
}

impl PortfolioAnalytics {
    pub fn compute(
        growth: &GrowthMapping,
        backtest: &BacktestResult,
        benchmark: Option<&PriceSeries>,
        initial_value: f64,
    ) -> Self {
        let benchmark_values: HashMap<NaiveDate, f64> = benchmark
            .map(|b| benchmark_performance(b, initial_value).into_iter().collect())
            .unwrap_or_default();

        let performance = backtest
            .series
            .rows()
            .iter()
            .map(|row| {
                let benchmark_dollars = benchmark_values.get(&row.date).copied();
                PerformancePoint {
                    date: row.date,
                    portfolio_dollars: row.portfolio_dollars,
                    benchmark_dollars,
                    excess_dollars: benchmark_dollars.map(|b| row.portfolio_dollars - b),
                }
            })
            .collect();

        PortfolioAnalytics {
            benchmark: benchmark.map(|b| b.ticker.clone()),
            performance,
            growth_ranking: growth.ranked_desc(),
            weight_ranking: backtest.weights.sorted_ascending(),
        }
    }

    /// Final excess value over the benchmark, when both end on the same date.
    pub fn final_excess(&self) -> Option<f64> {
        self.performance.last().and_then(|p| p.excess_dollars)
    }
}

/// Benchmark value curve: compounded daily changes starting at `initial_value`.
/// The first bar has no prior price and counts as a zero change.
pub fn benchmark_performance(series: &PriceSeries, initial_value: f64) -> Vec<(NaiveDate, f64)> {
    let mut value = initial_value;
    let mut prev: Option<f64> = None;

    series
        .bars
        .iter()
        .map(|bar| {
            if let Some(p0) = prev {
                value *= (bar.adj_close / p0 - 1.0) + 1.0;
            }
            prev = Some(bar.adj_close);
            (bar.date, value)
        })
        .collect()
}
