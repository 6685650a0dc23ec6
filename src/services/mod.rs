pub mod admission;
pub mod quotes;

pub use admission::{AdmissionError, BatchAdmission, DEFAULT_MAX_SYMBOLS};
pub use quotes::{QuoteService, SymbolRecord, SymbolSeries};
