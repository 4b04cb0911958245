//! Concrete adapter implementations for ports.

pub mod csv_growth_adapter;
pub mod csv_price_adapter;
pub mod csv_series_writer;
pub mod csv_weight_store;
pub mod file_config_adapter;
pub mod file_growth_cache;
pub mod file_universe_adapter;
pub mod retrying_price_port;
