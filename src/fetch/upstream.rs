use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};

use crate::records::QuoteRecord;
use crate::utils::{Clock, TokioClock};

use super::{FetchFailure, QuoteQuery, QuoteSource, RateGate, DEFAULT_MAX_RETRIES};

/// Retry schedule for retryable upstream failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    /// Rate-limited attempt `n` waits `n * rate_limit_step`.
    pub rate_limit_step: Duration,
    pub transient_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::with_max_retries(DEFAULT_MAX_RETRIES)
    }
}

impl RetryPolicy {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            rate_limit_step: Duration::from_secs(2),
            transient_delay: Duration::from_secs(1),
        }
    }

    /// Delay before the retry that follows failed attempt `attempt` (1-based).
    pub fn backoff(&self, attempt: u32, failure: &FetchFailure) -> Duration {
        match failure {
            FetchFailure::RateLimited => self.rate_limit_step * attempt,
            FetchFailure::Transient(_) => self.transient_delay,
            _ => Duration::ZERO,
        }
    }
}

/// Gated, retrying access to a [`QuoteSource`].
pub struct UpstreamClient {
    source: Arc<dyn QuoteSource>,
    gate: Arc<RateGate>,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
}

impl UpstreamClient {
    pub fn new(source: Arc<dyn QuoteSource>, gate: Arc<RateGate>, policy: RetryPolicy) -> Self {
        Self::with_clock(source, gate, policy, Arc::new(TokioClock))
    }

    pub fn with_clock(
        source: Arc<dyn QuoteSource>,
        gate: Arc<RateGate>,
        policy: RetryPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            gate,
            clock,
            policy,
        }
    }

    /// Fetch `query`, retrying rate limits and transient faults.
    ///
    /// Every attempt first passes the rate gate for the query's symbol. An
    /// empty answer is reported as [`FetchFailure::Empty`] and never retried.
    pub async fn fetch(&self, query: &QuoteQuery) -> Result<Vec<QuoteRecord>, FetchFailure> {
        let max_retries = self.policy.max_retries;
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.gate.acquire(&query.symbol).await;

            let failure = match self.source.fetch(query).await {
                Ok(records) if records.is_empty() => {
                    return Err(FetchFailure::empty(query.kind.label(), &query.symbol));
                }
                Ok(records) => return Ok(records),
                Err(failure) if !failure.is_retryable() => {
                    debug!("{} fetch for {} failed: {failure}", query.kind.label(), query.symbol);
                    return Err(failure);
                }
                Err(failure) => failure,
            };

            if attempt > max_retries {
                warn!(
                    "Giving up on {} after {attempt} attempts: {failure}",
                    query.symbol
                );
                return Err(FetchFailure::RetriesExhausted {
                    symbol: query.symbol.clone(),
                    last: Box::new(failure),
                });
            }

            let delay = self.policy.backoff(attempt, &failure);
            warn!(
                "Attempt {attempt} for {} failed ({failure}); retrying in {delay:?}",
                query.symbol
            );
            self.clock.sleep(delay).await;
        }
    }
}
