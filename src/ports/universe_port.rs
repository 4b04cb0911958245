//! Ticker-universe collaborator port.

use crate::domain::error::GrowthfolioError;
use crate::domain::universe::Universe;

pub trait UniverseSource {
    fn universe(&self) -> Result<Universe, GrowthfolioError>;
}
