//! Growth inference across the ticker universe.
//!
//! Drives the external [`GrowthPort`] once per ticker and collects a
//! ticker -> optional growth mapping. A failed or non-finite estimate becomes
//! an absent value for that ticker; it never aborts the batch.

use crate::domain::error::GrowthfolioError;
use crate::domain::universe::{SkipReason, SkippedTicker, Universe};
use crate::ports::growth_cache::GrowthCache;
use crate::ports::growth_port::GrowthPort;
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Ticker -> growth estimate, `None` where no usable estimate exists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GrowthMapping {
    estimates: BTreeMap<String, Option<f64>>,
}

impl GrowthMapping {
    pub fn get(&self, ticker: &str) -> Option<Option<f64>> {
        self.estimates.get(ticker).copied()
    }

    pub fn len(&self) -> usize {
        self.estimates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.estimates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.estimates.iter().map(|(t, g)| (t.as_str(), *g))
    }

    /// Tickers with a present estimate, in ticker order.
    pub fn present(&self) -> impl Iterator<Item = (&str, f64)> {
        self.estimates
            .iter()
            .filter_map(|(t, g)| g.map(|g| (t.as_str(), g)))
    }

    pub fn missing(&self) -> Vec<&str> {
        self.estimates
            .iter()
            .filter(|(_, g)| g.is_none())
            .map(|(t, _)| t.as_str())
            .collect()
    }

    /// True when every ticker of `universe` has an entry (present or absent).
    pub fn covers(&self, universe: &Universe) -> bool {
        universe
            .tickers()
            .iter()
            .all(|t| self.estimates.contains_key(t))
    }

    /// Present estimates, highest growth first.
    pub fn ranked_desc(&self) -> Vec<(String, f64)> {
        let mut ranked: Vec<(String, f64)> = self
            .present()
            .map(|(t, g)| (t.to_string(), g))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }
}

impl FromIterator<(String, Option<f64>)> for GrowthMapping {
    fn from_iter<I: IntoIterator<Item = (String, Option<f64>)>>(iter: I) -> Self {
        Self {
            estimates: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GrowthInference {
    pub mapping: GrowthMapping,
    pub skipped: Vec<SkippedTicker>,
    pub from_cache: bool,
}

fn estimate_one(port: &dyn GrowthPort, ticker: &str) -> Result<f64, SkipReason> {
    match port.estimate(ticker) {
        Ok(Some(g)) if g.is_finite() => Ok(g),
        Ok(Some(_)) => Err(SkipReason::NonFiniteEstimate),
        Ok(None) => Err(SkipReason::MissingEstimate),
        Err(e) => Err(SkipReason::RetrievalFailed(e.to_string())),
    }
}

/// Estimates growth for every ticker in `universe`.
///
/// Work is batched by first letter; with `parallel` each batch fans out over
/// the rayon pool. The resulting mapping covers the whole universe either way.
pub fn infer_growth(port: &dyn GrowthPort, universe: &Universe, parallel: bool) -> GrowthInference {
    let mut estimates = BTreeMap::new();
    let mut skipped = Vec::new();

    for (letter, batch) in universe.batches_by_letter() {
        debug!(%letter, tickers = batch.len(), "estimating growth batch");

        let outcomes: Vec<(&str, Result<f64, SkipReason>)> = if parallel {
            batch
                .par_iter()
                .map(|&t| (t, estimate_one(port, t)))
                .collect()
        } else {
            batch.iter().map(|&t| (t, estimate_one(port, t))).collect()
        };

        for (ticker, outcome) in outcomes {
            match outcome {
                Ok(g) => {
                    estimates.insert(ticker.to_string(), Some(g));
                }
                Err(reason) => {
                    warn!(%ticker, %reason, "excluding ticker from weighting");
                    estimates.insert(ticker.to_string(), None);
                    skipped.push(SkippedTicker {
                        ticker: ticker.to_string(),
                        reason,
                    });
                }
            }
        }
    }

    info!(
        tickers = universe.count(),
        estimated = universe.count() - skipped.len(),
        "growth inference complete"
    );

    GrowthInference {
        mapping: GrowthMapping { estimates },
        skipped,
        from_cache: false,
    }
}

/// Like [`infer_growth`], but serves and fills `cache` under the universe key.
///
/// A cached mapping that does not cover the universe is ignored and replaced.
pub fn infer_growth_cached(
    port: &dyn GrowthPort,
    cache: &dyn GrowthCache,
    universe: &Universe,
    parallel: bool,
) -> Result<GrowthInference, GrowthfolioError> {
    let key = universe.key();

    if let Some(mapping) = cache.get(&key)? {
        if mapping.covers(universe) {
            info!(%key, tickers = mapping.len(), "using cached growth estimates");
            let skipped = mapping
                .missing()
                .into_iter()
                .map(|t| SkippedTicker {
                    ticker: t.to_string(),
                    reason: SkipReason::MissingEstimate,
                })
                .collect();
            return Ok(GrowthInference {
                mapping,
                skipped,
                from_cache: true,
            });
        }
        warn!(%key, "cached growth estimates do not cover universe, recomputing");
    }

    let inference = infer_growth(port, universe, parallel);
    cache.put(&key, &inference.mapping)?;
    Ok(inference)
}
