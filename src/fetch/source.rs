use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::config::ProviderConfig;
use crate::error::{Context, Result};
use crate::records::{DateRange, QuoteRecord, Symbol};

use super::decode::extract_records;
use super::request::prepare_request;
use super::FetchFailure;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuoteKind {
    Overview,
    History,
    Company,
    Intraday,
}

impl QuoteKind {
    /// Noun used in user-facing "no data" messages.
    pub fn label(self) -> &'static str {
        match self {
            QuoteKind::Overview => "overview",
            QuoteKind::History => "price",
            QuoteKind::Company => "company",
            QuoteKind::Intraday => "intraday",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteQuery {
    pub symbol: Symbol,
    pub kind: QuoteKind,
    pub range: DateRange,
}

impl QuoteQuery {
    pub fn new(symbol: impl Into<Symbol>, kind: QuoteKind, range: DateRange) -> Self {
        Self {
            symbol: symbol.into(),
            kind,
            range,
        }
    }
}

/// Opaque market-data provider.
///
/// Implementations classify their own faults: a recognisable throttling
/// signal must come back as [`FetchFailure::RateLimited`], faults worth
/// retrying as [`FetchFailure::Transient`]. An empty `Vec` means the provider
/// answered but had no data.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch(&self, query: &QuoteQuery) -> std::result::Result<Vec<QuoteRecord>, FetchFailure>;
}

/// Provider reached over HTTP through per-kind URL templates.
pub struct RestQuoteSource {
    client: Client,
    config: ProviderConfig,
}

impl RestQuoteSource {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to construct provider HTTP client")?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl QuoteSource for RestQuoteSource {
    async fn fetch(&self, query: &QuoteQuery) -> std::result::Result<Vec<QuoteRecord>, FetchFailure> {
        let template = self.config.endpoints.template(query.kind);
        let prepared = prepare_request(template, &self.config.headers, query)
            .map_err(|err| FetchFailure::Other(err.to_string()))?;

        debug!("GET {} for {}", prepared.url, query.symbol);

        let response = self
            .client
            .get(&prepared.url)
            .headers(prepared.headers)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body, query));
        }

        let body: Value = response.json().await.map_err(|err| {
            FetchFailure::Other(format!(
                "Failed to decode provider response for {}: {err}",
                query.symbol
            ))
        })?;

        extract_records(&body, &self.config.data_path)
    }
}

/// Map a non-success HTTP status onto the failure taxonomy.
pub fn classify_status(status: StatusCode, body: &str, query: &QuoteQuery) -> FetchFailure {
    match status {
        StatusCode::TOO_MANY_REQUESTS => FetchFailure::RateLimited,
        StatusCode::NOT_FOUND => FetchFailure::empty(query.kind.label(), &query.symbol),
        StatusCode::REQUEST_TIMEOUT => {
            FetchFailure::Transient(format!("provider returned status {status}"))
        }
        status if status.is_server_error() => {
            FetchFailure::Transient(format!("provider returned status {status}"))
        }
        status => {
            let snippet: String = body.chars().take(200).collect();
            FetchFailure::Other(format!(
                "Request for {} failed with status {status}: {snippet}",
                query.symbol
            ))
        }
    }
}

pub fn classify_transport(err: reqwest::Error) -> FetchFailure {
    if err.is_timeout() || err.is_connect() {
        FetchFailure::Transient(err.to_string())
    } else {
        FetchFailure::Other(err.to_string())
    }
}
