use std::time::Duration;

use thiserror::Error;

pub mod decode;
pub mod orchestrator;
pub mod rate_gate;
pub mod request;
pub mod source;
pub mod upstream;

#[cfg(test)]
pub(crate) mod testing;

pub use orchestrator::FetchOrchestrator;
pub use rate_gate::RateGate;
pub use source::{QuoteKind, QuoteQuery, QuoteSource, RestQuoteSource};
pub use upstream::{RetryPolicy, UpstreamClient};

/// Minimum gap between two upstream calls for the same symbol.
pub const DEFAULT_RATE_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_RETRIES: u32 = 2;
/// Default concurrency guard applied when fanning out a batch.
pub const DEFAULT_WORKERS: usize = 3;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Trailing window used to find the latest price.
pub const PRICE_WINDOW_DAYS: i64 = 7;
/// Trailing window used when a history request omits its bounds.
pub const HISTORY_WINDOW_DAYS: i64 = 30;

#[inline]
pub fn ensure_worker_limit(limit: usize) -> usize {
    limit.max(1)
}

/// Why a single symbol could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("{0}")]
    Empty(String),
    #[error("Upstream provider is rate limiting requests, retry later")]
    RateLimited,
    #[error("Upstream provider temporarily unavailable: {0}")]
    Transient(String),
    #[error("Timed out waiting for upstream data")]
    Timeout,
    #[error("{0}")]
    Other(String),
    /// Retryable failure that persisted through every allowed attempt.
    #[error("max retries exceeded for {symbol} (last error: {last})")]
    RetriesExhausted {
        symbol: String,
        last: Box<FetchFailure>,
    },
}

/// Field-less discriminant of [`FetchFailure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Empty,
    RateLimited,
    Transient,
    Timeout,
    Other,
}

impl FetchFailure {
    pub fn empty(what: &str, symbol: &str) -> Self {
        FetchFailure::Empty(format!("No {what} data for {symbol}"))
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            FetchFailure::Empty(_) => FailureKind::Empty,
            FetchFailure::RateLimited => FailureKind::RateLimited,
            FetchFailure::Transient(_) => FailureKind::Transient,
            FetchFailure::Timeout => FailureKind::Timeout,
            FetchFailure::Other(_) => FailureKind::Other,
            FetchFailure::RetriesExhausted { last, .. } => last.kind(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchFailure::RateLimited | FetchFailure::Transient(_)
        )
    }
}

/// Infrastructure fault of the worker pool itself. Not attributable to any
/// symbol, so a batch hitting it reports no partial result.
#[derive(Debug, Error)]
pub enum OrchestratorFault {
    #[error("Fetch worker failed: {0}")]
    Worker(String),
    #[error("Fetch worker pool closed unexpectedly")]
    PoolClosed,
}

impl From<tokio::task::JoinError> for OrchestratorFault {
    fn from(err: tokio::task::JoinError) -> Self {
        OrchestratorFault::Worker(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_rate_limits_and_transient_errors_retry() {
        assert!(FetchFailure::RateLimited.is_retryable());
        assert!(FetchFailure::Transient("503".into()).is_retryable());
        assert!(!FetchFailure::empty("price", "ACB").is_retryable());
        assert!(!FetchFailure::Other("bad symbol".into()).is_retryable());
        assert!(!FetchFailure::Timeout.is_retryable());
    }

    #[test]
    fn exhausted_retries_keep_the_last_kind() {
        let exhausted = FetchFailure::RetriesExhausted {
            symbol: "ACB".into(),
            last: Box::new(FetchFailure::RateLimited),
        };

        assert_eq!(exhausted.kind(), FailureKind::RateLimited);
        assert!(!exhausted.is_retryable());
        assert!(exhausted
            .to_string()
            .starts_with("max retries exceeded for ACB (last error: "));
    }

    #[test]
    fn worker_limit_is_at_least_one() {
        assert_eq!(ensure_worker_limit(0), 1);
        assert_eq!(ensure_worker_limit(4), 4);
    }
}
