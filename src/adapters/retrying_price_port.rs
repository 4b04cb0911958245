//! Bounded-retry wrapper around any [`PricePort`].
//!
//! Retrieval and I/O failures are retried up to `max_retries` times with a
//! fixed delay. Missing or malformed price data is returned at once. Successive calls through one wrapper are spaced at least
//! `min_interval` apart.

use crate::domain::error::GrowthfolioError;
use crate::domain::price::PriceSeries;
use crate::ports::price_port::PricePort;
use chrono::NaiveDate;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
    pub min_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            delay: Duration::from_millis(500),
            min_interval: Duration::ZERO,
        }
    }
}

pub struct RetryingPricePort<P> {
    inner: P,
    policy: RetryPolicy,
    last_call: Mutex<Option<Instant>>,
}

impl<P: PricePort> RetryingPricePort<P> {
    pub fn new(inner: P, policy: RetryPolicy) -> Self {
        Self {
            inner,
            policy,
            last_call: Mutex::new(None),
        }
    }

    fn throttle(&self) {
        let mut last = self.last_call.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.policy.min_interval {
                thread::sleep(self.policy.min_interval - elapsed);
            }
        }
        *last = Some(Instant::now());
    }
}

fn is_transient(err: &GrowthfolioError) -> bool {
    matches!(
        err,
        GrowthfolioError::Retrieval { .. } | GrowthfolioError::Io(_)
    )
}

impl<P: PricePort> PricePort for RetryingPricePort<P> {
    fn history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, GrowthfolioError> {
        let mut retries = 0;
        loop {
            self.throttle();
            match self.inner.history(ticker, start, end) {
                Ok(series) => return Ok(series),
                Err(e) if is_transient(&e) && retries < self.policy.max_retries => {
                    retries += 1;
                    warn!(
                        %ticker,
                        attempt = retries,
                        max_retries = self.policy.max_retries,
                        error = %e,
                        "price retrieval failed, retrying"
                    );
                    thread::sleep(self.policy.delay);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::csv_price_adapter::CsvPriceAdapter;
    use std::cell::Cell;

    struct Flaky {
        failures: u32,
        calls: Cell<u32>,
        fatal: bool,
        missing: bool,
    }

    impl Flaky {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: Cell::new(0),
                fatal: false,
                missing: false,
            }
        }
    }

    impl PricePort for Flaky {
        fn history(
            &self,
            ticker: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<PriceSeries, GrowthfolioError> {
            let n = self.calls.get() + 1;
            self.calls.set(n);
            if self.fatal {
                return Err(GrowthfolioError::ConfigMissing {
                    section: "data".into(),
                    key: "prices_dir".into(),
                });
            }
            if self.missing {
                return Err(GrowthfolioError::PriceUnavailable {
                    ticker: ticker.to_string(),
                    reason: "no such file".into(),
                });
            }
            if n <= self.failures {
                return Err(GrowthfolioError::Retrieval {
                    ticker: ticker.to_string(),
                    reason: "timeout".into(),
                });
            }
            Ok(PriceSeries::new(ticker, vec![]))
        }
    }

    fn quick(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            delay: Duration::ZERO,
            min_interval: Duration::ZERO,
        }
    }

    fn window() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        )
    }

    #[test]
    fn recovers_within_retry_budget() {
        let port = RetryingPricePort::new(Flaky::new(2), quick(2));
        let (s, e) = window();
        assert!(port.history("AAPL", s, e).is_ok());
        assert_eq!(port.inner.calls.get(), 3);
    }

    #[test]
    fn gives_up_after_budget() {
        let port = RetryingPricePort::new(Flaky::new(5), quick(2));
        let (s, e) = window();
        let result = port.history("AAPL", s, e);
        assert!(matches!(result, Err(GrowthfolioError::Retrieval { .. })));
        assert_eq!(port.inner.calls.get(), 3);
    }

    #[test]
    fn non_transient_errors_are_not_retried() {
        let mut flaky = Flaky::new(0);
        flaky.fatal = true;
        let port = RetryingPricePort::new(flaky, quick(3));
        let (s, e) = window();
        assert!(port.history("AAPL", s, e).is_err());
        assert_eq!(port.inner.calls.get(), 1);
    }

    #[test]
    fn unavailable_prices_are_not_retried() {
        let mut flaky = Flaky::new(0);
        flaky.missing = true;
        let port = RetryingPricePort::new(flaky, quick(3));
        let (s, e) = window();

        let result = port.history("XYZ", s, e);
        assert!(matches!(result, Err(GrowthfolioError::PriceUnavailable { .. })));
        assert_eq!(port.inner.calls.get(), 1);
    }

    #[test]
    fn missing_price_file_fails_without_delay() {
        let dir = tempfile::TempDir::new().unwrap();
        let policy = RetryPolicy {
            max_retries: 3,
            delay: Duration::from_secs(5),
            min_interval: Duration::ZERO,
        };
        let port = RetryingPricePort::new(CsvPriceAdapter::new(dir.path().to_path_buf()), policy);
        let (s, e) = window();

        let started = Instant::now();
        assert!(port.history("XYZ", s, e).is_err());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn calls_are_spaced_by_min_interval() {
        let policy = RetryPolicy {
            min_interval: Duration::from_millis(20),
            ..quick(0)
        };
        let port = RetryingPricePort::new(Flaky::new(0), policy);
        let (s, e) = window();

        let started = Instant::now();
        for _ in 0..3 {
            port.history("AAPL", s, e).unwrap();
        }
        assert!(started.elapsed() >= Duration::from_millis(40));
    }
}
