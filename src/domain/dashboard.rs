//! Portfolio dashboard: runs the whole pipeline and holds its results.
//!
//! growth inference -> weights -> backtest -> risk metrics -> analytics
//!
//! A persisted weight table takes precedence over freshly derived weights
//! until [`PortfolioDashboard::refresh_weights`] overwrites it, or the
//! dashboard is built with [`PortfolioDashboard::build_refreshed`].

use crate::domain::analytics::PortfolioAnalytics;
use crate::domain::aligned::AlignedReturnSeries;
use crate::domain::backtest::{run_backtest, BacktestConfig, BacktestResult, BacktestWindow};
use crate::domain::error::GrowthfolioError;
use crate::domain::growth::{infer_growth, infer_growth_cached, GrowthInference};
use crate::domain::risk::RiskMetrics;
use crate::domain::universe::Universe;
use crate::domain::weights::{derive_weights, WeightVector};
use crate::ports::growth_cache::GrowthCache;
use crate::ports::growth_port::GrowthPort;
use crate::ports::price_port::PricePort;
use crate::ports::weight_store::WeightStore;
use chrono::NaiveDate;
use tracing::{info, warn};

#[derive(Clone, Copy)]
pub struct DashboardPorts<'a> {
    pub growth: &'a dyn GrowthPort,
    pub prices: &'a dyn PricePort,
    pub weight_store: &'a dyn WeightStore,
    pub growth_cache: Option<&'a dyn GrowthCache>,
}

#[derive(Debug, Clone, Default)]
pub struct DashboardConfig {
    pub backtest: BacktestConfig,
    /// Ticker compared against in analytics, e.g. `DJIA`.
    pub benchmark: Option<String>,
    /// Fan growth estimation out over the rayon pool.
    pub parallel: bool,
}

pub struct PortfolioDashboard<'a> {
    ports: DashboardPorts<'a>,
    config: DashboardConfig,
    universe: Universe,
    today: NaiveDate,
    growth: GrowthInference,
    weights: WeightVector,
    backtest: BacktestResult,
    risk: RiskMetrics,
    analytics: PortfolioAnalytics,
}

struct Evaluation {
    backtest: BacktestResult,
    risk: RiskMetrics,
    analytics: PortfolioAnalytics,
}

impl<'a> PortfolioDashboard<'a> {
    pub fn build(
        ports: DashboardPorts<'a>,
        universe: Universe,
        config: DashboardConfig,
        today: NaiveDate,
    ) -> Result<Self, GrowthfolioError> {
        let growth = Self::infer(&ports, &universe, config.parallel)?;

        let weights = match ports.weight_store.load()? {
            Some(stored) => {
                info!(tickers = stored.len(), "using persisted weight table");
                stored
            }
            None => {
                let derived = derive_weights(&growth.mapping);
                ports.weight_store.save(&derived)?;
                derived
            }
        };

        Self::assemble(ports, universe, config, today, growth, weights)
    }

    /// Like [`build`](Self::build), but ignores any persisted table and cached
    /// growth: estimates are re-inferred and the derived weights overwrite the
    /// table before the backtest runs.
    pub fn build_refreshed(
        ports: DashboardPorts<'a>,
        universe: Universe,
        config: DashboardConfig,
        today: NaiveDate,
    ) -> Result<Self, GrowthfolioError> {
        let (growth, weights) = Self::rederive(&ports, &universe, config.parallel)?;
        Self::assemble(ports, universe, config, today, growth, weights)
    }

    fn assemble(
        ports: DashboardPorts<'a>,
        universe: Universe,
        config: DashboardConfig,
        today: NaiveDate,
        growth: GrowthInference,
        weights: WeightVector,
    ) -> Result<Self, GrowthfolioError> {
        let eval = Self::evaluate(&ports, &universe, &growth, &weights, &config, today)?;

        Ok(Self {
            ports,
            config,
            universe,
            today,
            growth,
            weights,
            backtest: eval.backtest,
            risk: eval.risk,
            analytics: eval.analytics,
        })
    }

    /// Drops the cache entry, re-infers growth and stores the new weights.
    fn rederive(
        ports: &DashboardPorts<'a>,
        universe: &Universe,
        parallel: bool,
    ) -> Result<(GrowthInference, WeightVector), GrowthfolioError> {
        if let Some(cache) = ports.growth_cache {
            cache.invalidate(&universe.key())?;
        }
        let growth = Self::infer(ports, universe, parallel)?;
        let weights = derive_weights(&growth.mapping);
        ports.weight_store.save(&weights)?;
        info!(tickers = weights.len(), "weight table refreshed");
        Ok((growth, weights))
    }

    fn infer(
        ports: &DashboardPorts<'a>,
        universe: &Universe,
        parallel: bool,
    ) -> Result<GrowthInference, GrowthfolioError> {
        match ports.growth_cache {
            Some(cache) => infer_growth_cached(ports.growth, cache, universe, parallel),
            None => Ok(infer_growth(ports.growth, universe, parallel)),
        }
    }

    fn evaluate(
        ports: &DashboardPorts<'a>,
        universe: &Universe,
        growth: &GrowthInference,
        weights: &WeightVector,
        config: &DashboardConfig,
        today: NaiveDate,
    ) -> Result<Evaluation, GrowthfolioError> {
        let backtest = run_backtest(ports.prices, universe.tickers(), weights, &config.backtest, today)?;
        let risk = RiskMetrics::from_series(&backtest.series)?;

        let benchmark = config.benchmark.as_deref().and_then(|ticker| {
            match ports
                .prices
                .history(ticker, backtest.start_date, backtest.end_date)
            {
                Ok(series) => Some(series),
                Err(e) => {
                    warn!(%ticker, error = %e, "benchmark unavailable");
                    None
                }
            }
        });

        let analytics = PortfolioAnalytics::compute(
            &growth.mapping,
            &backtest,
            benchmark.as_ref(),
            config.backtest.initial_value,
        );

        Ok(Evaluation {
            backtest,
            risk,
            analytics,
        })
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    pub fn growth(&self) -> &GrowthInference {
        &self.growth
    }

    /// The weights the dashboard is running with.
    pub fn weights(&self) -> &WeightVector {
        &self.weights
    }

    /// The backtest series paired with the weights actually applied.
    pub fn backtest(&self) -> &BacktestResult {
        &self.backtest
    }

    pub fn risk_metrics(&self) -> &RiskMetrics {
        &self.risk
    }

    pub fn analytics(&self) -> &PortfolioAnalytics {
        &self.analytics
    }

    /// Returns of the persisted weight table between `start` and `end`
    /// (today when `None`).
    pub fn portfolio_returns(
        &self,
        start: NaiveDate,
        end: Option<NaiveDate>,
    ) -> Result<AlignedReturnSeries, GrowthfolioError> {
        let weights = self
            .ports
            .weight_store
            .load()?
            .unwrap_or_else(|| self.weights.clone());
        let config = BacktestConfig {
            window: BacktestWindow::Range { start, end },
            initial_value: self.config.backtest.initial_value,
        };
        let result = run_backtest(self.ports.prices, &weights.tickers(), &weights, &config, self.today)?;
        Ok(result.series)
    }

    /// Recomputes growth and weights, overwrites the weight table and
    /// re-runs the backtest with the new weights.
    pub fn refresh_weights(&mut self) -> Result<&WeightVector, GrowthfolioError> {
        let (growth, weights) = Self::rederive(&self.ports, &self.universe, self.config.parallel)?;

        let eval = Self::evaluate(
            &self.ports,
            &self.universe,
            &growth,
            &weights,
            &self.config,
            self.today,
        )?;

        self.growth = growth;
        self.weights = weights;
        self.backtest = eval.backtest;
        self.risk = eval.risk;
        self.analytics = eval.analytics;
        Ok(&self.weights)
    }
}
