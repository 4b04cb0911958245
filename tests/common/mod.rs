#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use growthfolio::domain::error::GrowthfolioError;
use growthfolio::domain::growth::GrowthMapping;
pub use growthfolio::domain::price::{PriceBar, PriceSeries};
use growthfolio::domain::weights::WeightVector;
use growthfolio::ports::growth_cache::GrowthCache;
use growthfolio::ports::growth_port::GrowthPort;
use growthfolio::ports::price_port::PricePort;
use growthfolio::ports::weight_store::WeightStore;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct MockPricePort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
    pub calls: Cell<usize>,
}

impl MockPricePort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            calls: Cell::new(0),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl PricePort for MockPricePort {
    fn history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, GrowthfolioError> {
        self.calls.set(self.calls.get() + 1);
        if let Some(reason) = self.errors.get(ticker) {
            return Err(GrowthfolioError::Retrieval {
                ticker: ticker.to_string(),
                reason: reason.clone(),
            });
        }
        let bars = self
            .data
            .get(ticker)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start && b.date <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(PriceSeries::new(ticker, bars))
    }
}

pub struct MockGrowthPort {
    pub estimates: HashMap<String, Option<f64>>,
    pub errors: HashMap<String, String>,
    pub calls: AtomicUsize,
}

impl MockGrowthPort {
    pub fn new() -> Self {
        Self {
            estimates: HashMap::new(),
            errors: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_estimate(mut self, ticker: &str, g: f64) -> Self {
        self.estimates.insert(ticker.to_string(), Some(g));
        self
    }

    pub fn without_estimate(mut self, ticker: &str) -> Self {
        self.estimates.insert(ticker.to_string(), None);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl GrowthPort for MockGrowthPort {
    fn estimate(&self, ticker: &str) -> Result<Option<f64>, GrowthfolioError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = self.errors.get(ticker) {
            return Err(GrowthfolioError::Retrieval {
                ticker: ticker.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self.estimates.get(ticker).copied().flatten())
    }
}

#[derive(Default)]
pub struct MemoryWeightStore {
    pub table: RefCell<Option<WeightVector>>,
    pub saves: Cell<usize>,
}

impl MemoryWeightStore {
    pub fn with_table(weights: WeightVector) -> Self {
        Self {
            table: RefCell::new(Some(weights)),
            saves: Cell::new(0),
        }
    }
}

impl WeightStore for MemoryWeightStore {
    fn load(&self) -> Result<Option<WeightVector>, GrowthfolioError> {
        Ok(self.table.borrow().clone())
    }

    fn save(&self, weights: &WeightVector) -> Result<(), GrowthfolioError> {
        *self.table.borrow_mut() = Some(weights.clone());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryGrowthCache {
    pub entries: RefCell<HashMap<String, GrowthMapping>>,
}

impl GrowthCache for MemoryGrowthCache {
    fn get(&self, key: &str) -> Result<Option<GrowthMapping>, GrowthfolioError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn put(&self, key: &str, mapping: &GrowthMapping) -> Result<(), GrowthfolioError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), mapping.clone());
        Ok(())
    }

    fn invalidate(&self, key: &str) -> Result<bool, GrowthfolioError> {
        Ok(self.entries.borrow_mut().remove(key).is_some())
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn make_bar(date_str: &str, adj_close: f64) -> PriceBar {
    PriceBar {
        date: date(date_str),
        adj_close,
    }
}

/// Consecutive daily bars from `start`, compounding the given daily returns
/// from a price of 100.
pub fn bars_from_returns(start: &str, returns: &[f64]) -> Vec<PriceBar> {
    let first = date(start);
    let mut price = 100.0;
    let mut bars = vec![PriceBar {
        date: first,
        adj_close: price,
    }];
    for (i, r) in returns.iter().enumerate() {
        price *= 1.0 + r;
        bars.push(PriceBar {
            date: first + Duration::days(i as i64 + 1),
            adj_close: price,
        });
    }
    bars
}
