use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::time::Instant;

use crate::records::QuoteRecord;
use crate::utils::Clock;

use super::{FetchFailure, QuoteQuery, QuoteSource};

pub(crate) fn sample_record(symbol: &str, close: f64) -> QuoteRecord {
    json!({ "symbol": symbol, "time": "2024-01-05", "close": close })
        .as_object()
        .cloned()
        .unwrap_or_default()
}

pub(crate) enum Step {
    Records(Vec<QuoteRecord>),
    Fail(FetchFailure),
    Hang,
    Panic,
}

/// In-memory provider answering from per-symbol scripts and recording calls.
/// Symbols without a remaining script step get one sample record.
pub(crate) struct ScriptedSource {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    calls: Mutex<Vec<(String, Instant)>>,
    latency: Duration,
}

impl ScriptedSource {
    pub(crate) fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            latency: Duration::ZERO,
        }
    }

    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub(crate) fn script(self, symbol: &str, steps: Vec<Step>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(symbol.to_string(), steps.into());
        self
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn calls_for(&self, symbol: &str) -> usize {
        self.call_times(symbol).len()
    }

    pub(crate) fn call_times(&self, symbol: &str) -> Vec<Instant> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(called, _)| called == symbol)
            .map(|(_, at)| *at)
            .collect()
    }
}

#[async_trait]
impl QuoteSource for ScriptedSource {
    async fn fetch(&self, query: &QuoteQuery) -> Result<Vec<QuoteRecord>, FetchFailure> {
        self.calls
            .lock()
            .unwrap()
            .push((query.symbol.clone(), Instant::now()));

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&query.symbol)
            .and_then(VecDeque::pop_front);

        match step {
            Some(Step::Records(records)) => Ok(records),
            Some(Step::Fail(failure)) => Err(failure),
            Some(Step::Hang) => std::future::pending().await,
            Some(Step::Panic) => panic!("scripted panic for {}", query.symbol),
            None => Ok(vec![sample_record(&query.symbol, 10.0)]),
        }
    }
}

/// Clock that only moves when told to. Sleeping jumps straight to the
/// deadline and records it.
pub(crate) struct ManualClock {
    now: Mutex<Instant>,
    sleeps: Mutex<Vec<Instant>>,
}

impl ManualClock {
    pub(crate) fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }

    pub(crate) fn sleeps(&self) -> Vec<Instant> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap()
    }

    async fn sleep_until(&self, deadline: Instant) {
        self.sleeps.lock().unwrap().push(deadline);
        let mut now = self.now.lock().unwrap();
        if deadline > *now {
            *now = deadline;
        }
    }
}
