//! Price-retrieval collaborator port.

use crate::domain::error::GrowthfolioError;
use crate::domain::price::PriceSeries;
use chrono::NaiveDate;

pub trait PricePort {
    /// Adjusted-close history for `ticker` within `[start, end]`, ordered by date.
    fn history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, GrowthfolioError>;
}
