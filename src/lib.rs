//! growthfolio: growth-weighted long/short portfolio builder.
//!
//! Per-ticker growth estimates are standardized into signed weights,
//! backtested over a historical window and summarized with tail-risk metrics.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], command dispatch in [`cli`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
