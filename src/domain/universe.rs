//! Ticker universe and per-ticker skip bookkeeping.
//!
//! The universe is a flat, sorted collection of unique upper-case symbols.
//! Letter grouping exists only to batch work and never changes what a
//! stage produces.

use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Universe {
    tickers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in ticker list")]
    EmptyToken,

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),

    #[error("ticker universe is empty")]
    Empty,
}

impl Universe {
    /// Builds a universe from raw symbols, rejecting blanks and duplicates.
    pub fn new<I, S>(symbols: I) -> Result<Self, UniverseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut tickers = Vec::new();

        for symbol in symbols {
            let ticker = symbol.as_ref().trim().to_uppercase();
            if ticker.is_empty() {
                return Err(UniverseError::EmptyToken);
            }
            if !seen.insert(ticker.clone()) {
                return Err(UniverseError::DuplicateTicker(ticker));
            }
            tickers.push(ticker);
        }

        if tickers.is_empty() {
            return Err(UniverseError::Empty);
        }
        tickers.sort();
        Ok(Self { tickers })
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn count(&self) -> usize {
        self.tickers.len()
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.tickers.binary_search_by(|t| t.as_str().cmp(ticker)).is_ok()
    }

    /// Groups tickers by first character for batched work.
    pub fn batches_by_letter(&self) -> BTreeMap<char, Vec<&str>> {
        let mut batches: BTreeMap<char, Vec<&str>> = BTreeMap::new();
        for ticker in &self.tickers {
            let letter = ticker.chars().next().unwrap_or('_');
            batches.entry(letter).or_default().push(ticker);
        }
        batches
    }

    /// Stable identity of the ticker set: hex SHA-256 of the sorted symbols.
    pub fn key(&self) -> String {
        let mut hasher = Sha256::new();
        for ticker in &self.tickers {
            hasher.update(ticker.as_bytes());
            hasher.update(b"\n");
        }
        hex::encode(hasher.finalize())
    }
}

/// Parses a comma- or newline-separated ticker list.
pub fn parse_tickers(input: &str) -> Result<Universe, UniverseError> {
    let tokens: Vec<&str> = input
        .split(|c: char| c == ',' || c == '\n')
        .map(str::trim)
        .collect();

    // A trailing separator (e.g. final newline in a file) is not an empty token.
    let end = tokens
        .iter()
        .rposition(|t| !t.is_empty())
        .map_or(0, |i| i + 1);

    Universe::new(&tokens[..end])
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedTicker {
    pub ticker: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The growth collaborator had no estimate.
    MissingEstimate,
    /// The growth collaborator returned NaN or infinity.
    NonFiniteEstimate,
    /// The collaborator call failed outright.
    RetrievalFailed(String),
    /// Price retrieval succeeded but returned no bars.
    NoPriceData,
    /// Carries a weight but is not part of the current universe.
    NotInUniverse,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingEstimate => write!(f, "no growth estimate"),
            SkipReason::NonFiniteEstimate => write!(f, "non-finite growth estimate"),
            SkipReason::RetrievalFailed(reason) => write!(f, "retrieval failed: {reason}"),
            SkipReason::NoPriceData => write!(f, "no price data"),
            SkipReason::NotInUniverse => write!(f, "not in universe"),
        }
    }
}
