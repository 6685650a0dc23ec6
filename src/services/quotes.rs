use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use crate::config::GatewayConfig;
use crate::error::{AppError, Result};
use crate::fetch::{
    FetchFailure, FetchOrchestrator, QuoteKind, QuoteQuery, QuoteSource, RateGate, RetryPolicy,
    UpstreamClient, HISTORY_WINDOW_DAYS, PRICE_WINDOW_DAYS,
};
use crate::records::{
    is_valid_symbol, normalize_symbol, BatchResult, DateRange, QuoteRecord, Symbol,
};
use crate::utils::{parse_date, today};

use super::{AdmissionError, BatchAdmission};

/// One record for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolRecord {
    pub symbol: Symbol,
    pub record: QuoteRecord,
}

/// Ordered records for one symbol, with the period they cover when bounded.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolSeries {
    pub symbol: Symbol,
    pub period: Option<DateRange>,
    pub records: Vec<QuoteRecord>,
}

/// Request-facing entry points over the fetch pipeline.
pub struct QuoteService {
    upstream: Arc<UpstreamClient>,
    orchestrator: FetchOrchestrator,
    admission: BatchAdmission,
    request_timeout: Duration,
}

impl QuoteService {
    pub fn new(
        upstream: Arc<UpstreamClient>,
        admission: BatchAdmission,
        workers: usize,
        request_timeout: Duration,
    ) -> Self {
        let orchestrator = FetchOrchestrator::new(Arc::clone(&upstream), workers, request_timeout);
        Self {
            upstream,
            orchestrator,
            admission,
            request_timeout,
        }
    }

    /// Wire gate, retry policy and limits from configuration around `source`.
    pub fn from_config(config: &GatewayConfig, source: Arc<dyn QuoteSource>) -> Self {
        let gate = Arc::new(RateGate::new(config.rate_interval()));
        let upstream = Arc::new(UpstreamClient::new(
            source,
            gate,
            RetryPolicy::with_max_retries(config.max_retries),
        ));
        Self::new(
            upstream,
            BatchAdmission::new(config.max_symbols),
            config.workers,
            config.request_timeout(),
        )
    }

    pub fn admission(&self) -> &BatchAdmission {
        &self.admission
    }

    /// Latest price for every symbol in a comma-separated list.
    ///
    /// Per-symbol failures land in the result; only admission errors and
    /// worker-pool faults fail the call.
    pub async fn batch_prices(&self, raw_symbols: Option<&str>) -> Result<BatchResult> {
        let symbols = self.admission.admit(raw_symbols).map_err(|err| {
            debug!("Rejected batch request {raw_symbols:?}: {err}");
            AppError::from(err)
        })?;

        info!("Concurrent price request for: {}", symbols.join(", "));
        let result = self.orchestrator.run(&symbols).await?;
        if result.is_complete_failure() {
            warn!("No symbol in batch {} could be fetched", symbols.join(","));
        }
        info!(
            "Batch finished: {}/{} succeeded",
            result.success_count, result.total_requested
        );
        Ok(result)
    }

    pub async fn overview(&self, symbol: &str) -> Result<SymbolRecord> {
        let symbol = require_symbol(symbol)?;
        let records = self
            .fetch_single(&symbol, QuoteKind::Overview, DateRange::single_day(today()))
            .await?;
        first_record(symbol, records, QuoteKind::Overview)
    }

    pub async fn latest_price(&self, symbol: &str) -> Result<SymbolRecord> {
        let symbol = require_symbol(symbol)?;
        let range = DateRange::trailing(today(), PRICE_WINDOW_DAYS);
        let mut records = self.fetch_single(&symbol, QuoteKind::History, range).await?;
        match records.pop() {
            Some(record) => Ok(SymbolRecord { symbol, record }),
            None => Err(FetchFailure::empty(QuoteKind::History.label(), &symbol).into()),
        }
    }

    /// Historical series; each missing bound defaults independently to the
    /// trailing window ending today.
    pub async fn history(
        &self,
        symbol: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<SymbolSeries> {
        let symbol = require_symbol(symbol)?;
        let default_window = DateRange::trailing(today(), HISTORY_WINDOW_DAYS);
        let start = match start {
            Some(raw) => parse_bound("start", raw)?,
            None => default_window.start(),
        };
        let end = match end {
            Some(raw) => parse_bound("end", raw)?,
            None => default_window.end(),
        };
        let period = DateRange::new(start, end)?;

        let records = self.fetch_single(&symbol, QuoteKind::History, period).await?;
        Ok(SymbolSeries {
            symbol,
            period: Some(period),
            records,
        })
    }

    pub async fn company(&self, symbol: &str) -> Result<SymbolRecord> {
        let symbol = require_symbol(symbol)?;
        let records = self
            .fetch_single(&symbol, QuoteKind::Company, DateRange::single_day(today()))
            .await?;
        first_record(symbol, records, QuoteKind::Company)
    }

    pub async fn intraday(&self, symbol: &str) -> Result<SymbolSeries> {
        let symbol = require_symbol(symbol)?;
        let records = self
            .fetch_single(&symbol, QuoteKind::Intraday, DateRange::single_day(today()))
            .await?;
        Ok(SymbolSeries {
            symbol,
            period: None,
            records,
        })
    }

    async fn fetch_single(
        &self,
        symbol: &str,
        kind: QuoteKind,
        range: DateRange,
    ) -> Result<Vec<QuoteRecord>> {
        let query = QuoteQuery::new(symbol, kind, range);
        match tokio::time::timeout(self.request_timeout, self.upstream.fetch(&query)).await {
            Ok(result) => result.map_err(AppError::from),
            Err(_) => Err(FetchFailure::Timeout.into()),
        }
    }
}

fn require_symbol(raw: &str) -> Result<Symbol> {
    let symbol = normalize_symbol(raw)
        .ok_or_else(|| AppError::invalid_request("Stock symbol must not be empty"))?;
    if !is_valid_symbol(&symbol) {
        return Err(AdmissionError::InvalidSymbol(symbol).into());
    }
    Ok(symbol)
}

fn parse_bound(name: &str, raw: &str) -> Result<chrono::NaiveDate> {
    parse_date(raw).map_err(|_| {
        AppError::invalid_request(format!(
            "Invalid {name} date `{raw}`, expected YYYY-MM-DD"
        ))
    })
}

fn first_record(symbol: Symbol, records: Vec<QuoteRecord>, kind: QuoteKind) -> Result<SymbolRecord> {
    match records.into_iter().next() {
        Some(record) => Ok(SymbolRecord { symbol, record }),
        None => Err(FetchFailure::empty(kind.label(), &symbol).into()),
    }
}
