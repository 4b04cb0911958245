//! Zero-investment weight derivation.
//!
//! Present growth estimates are standardized to z-scores with the sample
//! mean and sample standard deviation, mapped through the standard normal
//! CDF, and shifted by one half:
//!
//! ```text
//! z = (g - mean) / std
//! w = PHI(z) - 0.5
//! ```
//!
//! Weights therefore lie in (-0.5, 0.5), increase strictly with growth, and
//! only approximately net to zero because PHI is non-linear.
//!
//! With fewer than two estimates, or zero (or non-finite) dispersion, the
//! z-score is undefined. [`derive_weights`] then assigns 0.0 to every
//! surviving ticker; [`derive_weights_strict`] reports
//! [`GrowthfolioError::DegenerateDistribution`] instead.

use crate::domain::error::GrowthfolioError;
use crate::domain::growth::GrowthMapping;
use statrs::distribution::{ContinuousCDF, Normal};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Ticker -> weight. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightVector {
    weights: BTreeMap<String, f64>,
}

impl WeightVector {
    /// Wraps an already-computed table, e.g. one read back from disk.
    pub fn from_table(weights: BTreeMap<String, f64>) -> Self {
        Self { weights }
    }

    pub fn get(&self, ticker: &str) -> Option<f64> {
        self.weights.get(ticker).copied()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.weights.contains_key(ticker)
    }

    pub fn tickers(&self) -> Vec<String> {
        self.weights.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(t, w)| (t.as_str(), *w))
    }

    /// Sum of weights; near zero for a balanced book.
    pub fn net_exposure(&self) -> f64 {
        self.weights.values().sum()
    }

    /// Sum of absolute weights.
    pub fn gross_exposure(&self) -> f64 {
        self.weights.values().map(|w| w.abs()).sum()
    }

    /// A new vector holding only the listed tickers that carry a weight.
    pub fn restricted_to(&self, tickers: &[String]) -> Self {
        Self {
            weights: tickers
                .iter()
                .filter_map(|t| self.weights.get(t).map(|&w| (t.clone(), w)))
                .collect(),
        }
    }

    /// Weights sorted ascending (most short first).
    pub fn sorted_ascending(&self) -> Vec<(String, f64)> {
        let mut sorted: Vec<(String, f64)> =
            self.weights.iter().map(|(t, w)| (t.clone(), *w)).collect();
        sorted.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        sorted
    }
}

fn dispersion(values: &[f64]) -> Option<(f64, f64)> {
    if values.len() < 2 {
        return None;
    }
    let mean = values.mean();
    let std = values.std_dev();
    if std.is_finite() && std > 0.0 {
        Some((mean, std))
    } else {
        None
    }
}

fn transform(present: &[(&str, f64)], mean: f64, std: f64) -> WeightVector {
    let normal = Normal::standard();
    let weights = present
        .iter()
        .map(|&(ticker, g)| {
            let z = (g - mean) / std;
            (ticker.to_string(), normal.cdf(z) - 0.5)
        })
        .collect();
    WeightVector { weights }
}

/// Derives weights over the tickers with a present estimate.
///
/// Degenerate inputs fall back to an all-zero vector over the survivors.
pub fn derive_weights(growth: &GrowthMapping) -> WeightVector {
    let present: Vec<(&str, f64)> = growth.present().collect();
    let values: Vec<f64> = present.iter().map(|&(_, g)| g).collect();

    match dispersion(&values) {
        Some((mean, std)) => {
            let weights = transform(&present, mean, std);
            info!(
                tickers = weights.len(),
                excluded = growth.len() - weights.len(),
                net = weights.net_exposure(),
                "derived weights"
            );
            weights
        }
        None => {
            warn!(
                survivors = present.len(),
                "degenerate growth distribution, assigning zero weights"
            );
            WeightVector {
                weights: present.iter().map(|&(t, _)| (t.to_string(), 0.0)).collect(),
            }
        }
    }
}

/// Like [`derive_weights`], but fails on a degenerate distribution.
pub fn derive_weights_strict(growth: &GrowthMapping) -> Result<WeightVector, GrowthfolioError> {
    let present: Vec<(&str, f64)> = growth.present().collect();
    let values: Vec<f64> = present.iter().map(|&(_, g)| g).collect();

    let (mean, std) = dispersion(&values).ok_or(GrowthfolioError::DegenerateDistribution {
        survivors: present.len(),
    })?;
    Ok(transform(&present, mean, std))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn mapping(entries: &[(&str, Option<f64>)]) -> GrowthMapping {
        entries.iter().map(|(t, g)| (t.to_string(), *g)).collect()
    }

    #[test]
    fn absent_estimates_are_excluded_not_zeroed() {
        let growth = mapping(&[("A", Some(0.01)), ("B", None), ("C", Some(0.05))]);
        let weights = derive_weights(&growth);

        assert_eq!(weights.len(), 2);
        assert!(!weights.contains("B"));
        assert_eq!(weights.get("B"), None);
    }

    #[test]
    fn known_values() {
        // mean = 0.02, sample std = 0.01 -> z = -1, 0, 1
        let growth = mapping(&[("A", Some(0.01)), ("B", Some(0.02)), ("C", Some(0.03))]);
        let weights = derive_weights(&growth);

        assert_relative_eq!(weights.get("A").unwrap(), 0.158_655_253_931_457 - 0.5, epsilon = 1e-9);
        assert_relative_eq!(weights.get("B").unwrap(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(weights.get("C").unwrap(), 0.841_344_746_068_543 - 0.5, epsilon = 1e-9);
        assert_relative_eq!(weights.net_exposure(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn ticker_at_mean_gets_zero() {
        let growth = mapping(&[("A", Some(-0.02)), ("B", Some(0.04)), ("M", Some(0.01))]);
        let weights = derive_weights(&growth);
        assert_relative_eq!(weights.get("M").unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn all_equal_estimates_fall_back_to_zero() {
        let growth = mapping(&[("A", Some(0.03)), ("B", Some(0.03)), ("C", Some(0.03))]);
        let weights = derive_weights(&growth);

        assert_eq!(weights.len(), 3);
        assert!(weights.iter().all(|(_, w)| w == 0.0));
    }

    #[test]
    fn single_survivor_falls_back_to_zero() {
        let growth = mapping(&[("A", Some(0.03)), ("B", None)]);
        let weights = derive_weights(&growth);

        assert_eq!(weights.len(), 1);
        assert_eq!(weights.get("A"), Some(0.0));
    }

    #[test]
    fn no_survivors_gives_empty_vector() {
        let growth = mapping(&[("A", None), ("B", None)]);
        assert!(derive_weights(&growth).is_empty());
    }

    #[test]
    fn strict_reports_degenerate_distribution() {
        let growth = mapping(&[("A", Some(0.03)), ("B", Some(0.03))]);
        let result = derive_weights_strict(&growth);
        assert!(matches!(
            result,
            Err(GrowthfolioError::DegenerateDistribution { survivors: 2 })
        ));
    }

    #[test]
    fn strict_matches_lenient_on_regular_input() {
        let growth = mapping(&[("A", Some(0.01)), ("B", Some(0.06)), ("C", Some(0.02))]);
        assert_eq!(derive_weights_strict(&growth).unwrap(), derive_weights(&growth));
    }

    #[test]
    fn restricted_to_keeps_listed_tickers() {
        let growth = mapping(&[("A", Some(0.01)), ("B", Some(0.06)), ("C", Some(0.02))]);
        let weights = derive_weights(&growth);
        let reduced = weights.restricted_to(&["C".to_string(), "A".to_string(), "Z".to_string()]);

        assert_eq!(reduced.tickers(), vec!["A", "C"]);
        assert_eq!(reduced.get("A"), weights.get("A"));
    }

    #[test]
    fn sorted_ascending_orders_by_weight() {
        let growth = mapping(&[("A", Some(0.05)), ("B", Some(-0.01)), ("C", Some(0.02))]);
        let sorted = derive_weights(&growth).sorted_ascending();
        let tickers: Vec<&str> = sorted.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(tickers, vec!["B", "C", "A"]);
    }

    proptest! {
        #[test]
        fn weights_bounded_and_monotonic(values in prop::collection::btree_set(-500i32..500, 2..40)) {
            let growth: GrowthMapping = values
                .iter()
                .enumerate()
                .map(|(i, v)| (format!("T{i:03}"), Some(*v as f64 / 1000.0)))
                .collect();
            let weights = derive_weights(&growth);

            prop_assert_eq!(weights.len(), values.len());

            let mut by_growth: Vec<(f64, f64)> = growth
                .present()
                .map(|(t, g)| (g, weights.get(t).unwrap()))
                .collect();
            by_growth.sort_by(|a, b| a.0.total_cmp(&b.0));

            for (_, w) in &by_growth {
                prop_assert!(*w > -0.5 && *w < 0.5);
            }
            for pair in by_growth.windows(2) {
                prop_assert!(pair[1].1 > pair[0].1);
            }
        }
    }
}
