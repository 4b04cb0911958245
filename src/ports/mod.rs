//! Port traits for the external collaborators the pipeline consumes.

pub mod config_port;
pub mod growth_cache;
pub mod growth_port;
pub mod price_port;
pub mod universe_port;
pub mod weight_store;
