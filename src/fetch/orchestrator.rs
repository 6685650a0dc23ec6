use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{timeout_at, Instant};

use crate::records::{merge, BatchResult, DateRange, FetchOutcome, Symbol};
use crate::utils::today;

use super::{
    ensure_worker_limit, FetchFailure, OrchestratorFault, QuoteKind, QuoteQuery, UpstreamClient,
    PRICE_WINDOW_DAYS,
};

/// Fans a batch of symbols out to the upstream client under a worker cap.
pub struct FetchOrchestrator {
    upstream: Arc<UpstreamClient>,
    workers: usize,
    request_timeout: Duration,
}

impl FetchOrchestrator {
    pub fn new(upstream: Arc<UpstreamClient>, workers: usize, request_timeout: Duration) -> Self {
        Self {
            upstream,
            workers: ensure_worker_limit(workers),
            request_timeout,
        }
    }

    /// Fetch the latest price of every symbol.
    ///
    /// Produces exactly one outcome per distinct symbol. Symbols still in
    /// flight when the request deadline passes are aborted and reported as
    /// [`FetchFailure::Timeout`]. A worker that panics or loses the pool
    /// fails the whole batch.
    pub async fn run(&self, symbols: &[Symbol]) -> Result<BatchResult, OrchestratorFault> {
        let deadline = Instant::now() + self.request_timeout;
        let range = DateRange::trailing(today(), PRICE_WINDOW_DAYS);
        let semaphore = Arc::new(Semaphore::new(self.workers));

        let mut requested = Vec::with_capacity(symbols.len());
        let mut seen = HashSet::with_capacity(symbols.len());
        let mut tasks = JoinSet::new();

        for symbol in symbols {
            if !seen.insert(symbol.as_str()) {
                continue;
            }
            requested.push(symbol.clone());

            let semaphore = Arc::clone(&semaphore);
            let upstream = Arc::clone(&self.upstream);
            let query = QuoteQuery::new(symbol.clone(), QuoteKind::History, range);

            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| OrchestratorFault::PoolClosed)?;
                Ok::<_, OrchestratorFault>(latest_price(&upstream, query).await)
            });
        }

        info!(
            "Dispatching {} symbols with {} workers",
            requested.len(),
            self.workers
        );

        let mut outcomes = Vec::with_capacity(requested.len());
        loop {
            match timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(joined)) => {
                    let outcome = joined
                        .map_err(OrchestratorFault::from)
                        .and_then(|inner| inner)
                        .map_err(|fault| {
                            warn!("Batch aborted: {fault}");
                            fault
                        })?;
                    outcomes.push(outcome);
                }
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        "Batch deadline of {:?} expired with {} fetches in flight",
                        self.request_timeout,
                        tasks.len()
                    );
                    tasks.abort_all();
                    break;
                }
            }
        }

        let finished: HashSet<String> = outcomes
            .iter()
            .map(|outcome| outcome.symbol().to_string())
            .collect();
        let timed_out: Vec<FetchOutcome> = requested
            .into_iter()
            .filter(|symbol| !finished.contains(symbol))
            .map(|symbol| FetchOutcome::Failure {
                symbol,
                failure: FetchFailure::Timeout,
            })
            .collect();
        outcomes.extend(timed_out);

        Ok(merge(outcomes))
    }
}

async fn latest_price(upstream: &UpstreamClient, query: QuoteQuery) -> FetchOutcome {
    match upstream.fetch(&query).await {
        Ok(mut records) => match records.pop() {
            Some(record) => FetchOutcome::Success {
                symbol: query.symbol,
                record,
            },
            None => FetchOutcome::Failure {
                failure: FetchFailure::empty(query.kind.label(), &query.symbol),
                symbol: query.symbol,
            },
        },
        Err(failure) => FetchOutcome::Failure {
            symbol: query.symbol,
            failure,
        },
    }
}
