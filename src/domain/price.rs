//! Adjusted-close price history for a single ticker.

use chrono::NaiveDate;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub adj_close: f64,
}

/// Date-ordered price history for one ticker, indexed by date.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    pub ticker: String,
    pub bars: Vec<PriceBar>,
    date_index: HashMap<NaiveDate, usize>,
}

impl PriceSeries {
    /// Sorts the bars by date. A repeated date keeps its last bar in the index.
    pub fn new(ticker: impl Into<String>, mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|b| b.date);
        let date_index = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.date, i))
            .collect();
        Self {
            ticker: ticker.into(),
            bars,
            date_index,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.date_index.contains_key(&date)
    }

    pub fn adj_close(&self, date: NaiveDate) -> Option<f64> {
        self.date_index.get(&date).map(|&i| self.bars[i].adj_close)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }
}
