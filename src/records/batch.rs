use std::collections::BTreeMap;

use log::warn;

use super::{FetchOutcome, QuoteRecord, Symbol};

/// Partitioned outcome of a batch fetch.
///
/// `success_count + failure_count == total_requested` always holds; a symbol
/// appears in at most one of the two maps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResult {
    pub successes: BTreeMap<Symbol, QuoteRecord>,
    pub failures: BTreeMap<Symbol, String>,
    pub total_requested: usize,
    pub success_count: usize,
    pub failure_count: usize,
}

impl BatchResult {
    pub fn is_complete_failure(&self) -> bool {
        self.total_requested > 0 && self.success_count == 0
    }
}

/// Fold per-symbol outcomes into a [`BatchResult`].
///
/// Pure and order-independent for well-formed input (one outcome per symbol).
/// A repeated symbol keeps its success if it has one, otherwise its first
/// failure.
pub fn merge<I>(outcomes: I) -> BatchResult
where
    I: IntoIterator<Item = FetchOutcome>,
{
    let mut successes = BTreeMap::new();
    let mut failures = BTreeMap::new();

    for outcome in outcomes {
        match outcome {
            FetchOutcome::Success { symbol, record } => {
                if successes.contains_key(&symbol) {
                    warn!("Duplicate success outcome for {symbol} ignored");
                    continue;
                }
                failures.remove(&symbol);
                successes.insert(symbol, record);
            }
            FetchOutcome::Failure { symbol, failure } => {
                if successes.contains_key(&symbol) || failures.contains_key(&symbol) {
                    warn!("Duplicate failure outcome for {symbol} ignored");
                    continue;
                }
                failures.insert(symbol, failure.to_string());
            }
        }
    }

    let success_count = successes.len();
    let failure_count = failures.len();

    BatchResult {
        successes,
        failures,
        total_requested: success_count + failure_count,
        success_count,
        failure_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchFailure;
    use serde_json::json;

    fn record(close: f64) -> QuoteRecord {
        json!({ "time": "2024-01-05", "close": close })
            .as_object()
            .cloned()
            .unwrap()
    }

    fn success(symbol: &str, close: f64) -> FetchOutcome {
        FetchOutcome::Success {
            symbol: symbol.to_string(),
            record: record(close),
        }
    }

    fn failure(symbol: &str, failure: FetchFailure) -> FetchOutcome {
        FetchOutcome::Failure {
            symbol: symbol.to_string(),
            failure,
        }
    }

    #[test]
    fn merge_is_order_independent() {
        let forward = merge(vec![
            success("ACB", 25.4),
            failure("FPT", FetchFailure::empty("price", "FPT")),
        ]);
        let backward = merge(vec![
            failure("FPT", FetchFailure::empty("price", "FPT")),
            success("ACB", 25.4),
        ]);

        assert_eq!(forward, backward);
        assert_eq!(forward.total_requested, 2);
        assert_eq!(forward.success_count, 1);
        assert_eq!(forward.failure_count, 1);
        assert_eq!(forward.failures["FPT"], "No price data for FPT");
    }

    #[test]
    fn counters_match_partitions() {
        let result = merge(vec![
            success("ACB", 1.0),
            success("VCB", 2.0),
            failure("HPG", FetchFailure::RateLimited),
            failure("MWG", FetchFailure::Timeout),
        ]);

        assert_eq!(
            result.success_count + result.failure_count,
            result.total_requested
        );
        assert_eq!(result.successes.len(), 2);
        assert_eq!(result.failures.len(), 2);
        assert!(!result.is_complete_failure());
    }

    #[test]
    fn success_wins_over_duplicate_failure() {
        let a = merge(vec![
            failure("ACB", FetchFailure::Timeout),
            success("ACB", 1.0),
        ]);
        let b = merge(vec![
            success("ACB", 1.0),
            failure("ACB", FetchFailure::Timeout),
        ]);

        assert_eq!(a, b);
        assert_eq!(a.total_requested, 1);
        assert!(a.failures.is_empty());
    }

    #[test]
    fn empty_input_yields_empty_result() {
        let result = merge(Vec::new());
        assert_eq!(result, BatchResult::default());
        assert!(!result.is_complete_failure());
    }
}
