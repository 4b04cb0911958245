//! Persisted weight table port.

use crate::domain::error::GrowthfolioError;
use crate::domain::weights::WeightVector;

pub trait WeightStore {
    /// Returns `None` when no table has been persisted yet.
    fn load(&self) -> Result<Option<WeightVector>, GrowthfolioError>;

    /// Replaces the whole table.
    fn save(&self, weights: &WeightVector) -> Result<(), GrowthfolioError>;
}
