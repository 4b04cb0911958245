//! Core domain types and logic.

pub mod aligned;
pub mod analytics;
pub mod backtest;
pub mod config_validation;
pub mod dashboard;
pub mod error;
pub mod growth;
pub mod price;
pub mod risk;
pub mod universe;
pub mod weights;
