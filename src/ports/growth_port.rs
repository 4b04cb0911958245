//! Growth-estimation collaborator port.

use crate::domain::error::GrowthfolioError;

/// Maps a ticker to its inferred sustainable growth rate.
///
/// `Ok(None)` means the estimator ran but could not produce a value
/// (insufficient data, no convergence). `Err` means the call itself failed.
/// Implementations must be `Sync` so the orchestrator can fan out calls.
pub trait GrowthPort: Sync {
    fn estimate(&self, ticker: &str) -> Result<Option<f64>, GrowthfolioError>;
}
