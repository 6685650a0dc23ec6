use std::collections::HashSet;

use thiserror::Error;

use crate::records::{is_valid_symbol, normalize_symbol, Symbol};

/// Default ceiling on distinct symbols per batch request.
pub const DEFAULT_MAX_SYMBOLS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("Please provide stock symbols, e.g. ?symbols=ACB,FPT,VCB")]
    NoSymbolsProvided,
    #[error("Invalid stock symbol `{0}`: only letters, digits, '.', '_' and '-' are allowed")]
    InvalidSymbol(String),
    #[error("Too many symbols: {count} requested, at most {max} allowed per request")]
    TooManySymbols { count: usize, max: usize },
}

/// Validates and bounds the symbol list of a batch request.
#[derive(Debug, Clone, Copy)]
pub struct BatchAdmission {
    max_symbols: usize,
}

impl Default for BatchAdmission {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SYMBOLS)
    }
}

impl BatchAdmission {
    pub fn new(max_symbols: usize) -> Self {
        Self { max_symbols }
    }

    pub fn max_symbols(&self) -> usize {
        self.max_symbols
    }

    /// Split on commas, trim, drop blanks, uppercase and coalesce duplicates,
    /// keeping the order of first occurrence.
    pub fn parse(&self, raw: Option<&str>) -> Vec<Symbol> {
        let Some(raw) = raw else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        raw.split(',')
            .filter_map(normalize_symbol)
            .filter(|symbol| seen.insert(symbol.clone()))
            .collect()
    }

    pub fn validate(&self, symbols: &[Symbol]) -> Result<(), AdmissionError> {
        if symbols.is_empty() {
            return Err(AdmissionError::NoSymbolsProvided);
        }
        if let Some(invalid) = symbols.iter().find(|symbol| !is_valid_symbol(symbol)) {
            return Err(AdmissionError::InvalidSymbol(invalid.clone()));
        }
        if symbols.len() > self.max_symbols {
            return Err(AdmissionError::TooManySymbols {
                count: symbols.len(),
                max: self.max_symbols,
            });
        }
        Ok(())
    }

    pub fn admit(&self, raw: Option<&str>) -> Result<Vec<Symbol>, AdmissionError> {
        let symbols = self.parse(raw);
        self.validate(&symbols)?;
        Ok(symbols)
    }
}
