//! Growth-mapping cache port, keyed by universe identity.

use crate::domain::error::GrowthfolioError;
use crate::domain::growth::GrowthMapping;

/// Staleness is the caller's concern: entries live until `invalidate`.
pub trait GrowthCache {
    fn get(&self, key: &str) -> Result<Option<GrowthMapping>, GrowthfolioError>;

    fn put(&self, key: &str, mapping: &GrowthMapping) -> Result<(), GrowthfolioError>;

    /// Removes the entry for `key`. Returns whether one existed.
    fn invalidate(&self, key: &str) -> Result<bool, GrowthfolioError>;
}
