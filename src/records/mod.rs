use chrono::{Duration, NaiveDate};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{AppError, Result};
use crate::fetch::FetchFailure;

pub mod batch;

pub use batch::{merge, BatchResult};

/// Uppercase ticker identifier.
pub type Symbol = String;

/// Provider-defined record. Only emptiness is ever inspected.
pub type QuoteRecord = Map<String, Value>;

/// Trim and uppercase a raw ticker. Returns `None` for blank input.
pub fn normalize_symbol(raw: &str) -> Option<Symbol> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}

/// Tickers are limited to ASCII letters, digits, `.`, `_` and `-` so they can
/// be substituted into provider URLs verbatim.
pub fn is_valid_symbol(symbol: &str) -> bool {
    !symbol.is_empty()
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Inclusive calendar date range with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(AppError::invalid_request(format!(
                "start date {start} is after end date {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Window of `days` days ending on `end`.
    pub fn trailing(end: NaiveDate, days: i64) -> Self {
        Self {
            start: end - Duration::days(days.max(0)),
            end,
        }
    }

    pub fn single_day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

/// Result of fetching one symbol. Exactly one per requested symbol.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Success { symbol: Symbol, record: QuoteRecord },
    Failure { symbol: Symbol, failure: FetchFailure },
}

impl FetchOutcome {
    pub fn symbol(&self) -> &str {
        match self {
            FetchOutcome::Success { symbol, .. } | FetchOutcome::Failure { symbol, .. } => symbol,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn normalizes_symbols() {
        assert_eq!(normalize_symbol("  acb "), Some("ACB".to_string()));
        assert_eq!(normalize_symbol("   "), None);
    }

    #[test]
    fn symbols_cannot_carry_url_syntax() {
        assert!(is_valid_symbol("ACB"));
        assert!(is_valid_symbol("BRK.B"));
        assert!(is_valid_symbol("VN30F1M-2"));
        assert!(!is_valid_symbol(""));
        assert!(!is_valid_symbol("ACB/../ADMIN"));
        assert!(!is_valid_symbol("ACB?END=2099-01-01#"));
        assert!(!is_valid_symbol("ACB%2F"));
        assert!(!is_valid_symbol("A CB"));
    }

    #[test]
    fn rejects_inverted_ranges() {
        let err = DateRange::new(date("2024-02-10"), date("2024-02-01")).unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));

        let range = DateRange::new(date("2024-02-01"), date("2024-02-01")).unwrap();
        assert_eq!(range.start(), range.end());
    }

    #[test]
    fn trailing_window_spans_requested_days() {
        let range = DateRange::trailing(date("2024-03-31"), 30);
        assert_eq!(range.start(), date("2024-03-01"));
        assert_eq!(range.end(), date("2024-03-31"));
    }

    #[test]
    fn serializes_range_as_iso_dates() {
        let range = DateRange::trailing(date("2024-01-08"), 7);
        let json = serde_json::to_value(range).unwrap();
        assert_eq!(json["start"], "2024-01-01");
        assert_eq!(json["end"], "2024-01-08");
    }
}
