use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;

use crate::fetch::{
    QuoteKind, DEFAULT_MAX_RETRIES, DEFAULT_RATE_INTERVAL, DEFAULT_REQUEST_TIMEOUT, DEFAULT_WORKERS,
};
use crate::services::DEFAULT_MAX_SYMBOLS;

pub mod loader;
pub mod validator;

pub use loader::{load, load_from_env, CONFIG_PATH_ENV};
pub use validator::validate_config;

const DEFAULT_PROVIDER_BASE: &str = "http://127.0.0.1:8000/quote";

/// URL template per kind of provider lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointTemplates {
    pub overview: String,
    pub history: String,
    pub company: String,
    pub intraday: String,
}

impl EndpointTemplates {
    pub fn template(&self, kind: QuoteKind) -> &str {
        match kind {
            QuoteKind::Overview => &self.overview,
            QuoteKind::History => &self.history,
            QuoteKind::Company => &self.company,
            QuoteKind::Intraday => &self.intraday,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderConfig {
    pub timeout_secs: u64,
    /// Header values may reference environment variables as `${NAME}`.
    pub headers: HashMap<String, String>,
    /// Object keys leading from the response root to the record array.
    pub data_path: Vec<String>,
    pub endpoints: EndpointTemplates,
}

impl ProviderConfig {
    pub fn builtin() -> Self {
        Self {
            timeout_secs: 10,
            headers: HashMap::new(),
            data_path: vec!["data".to_string()],
            endpoints: EndpointTemplates {
                overview: format!("{DEFAULT_PROVIDER_BASE}/{{symbol}}/overview"),
                history: format!(
                    "{DEFAULT_PROVIDER_BASE}/{{symbol}}/history?start={{start}}&end={{end}}"
                ),
                company: format!("{DEFAULT_PROVIDER_BASE}/{{symbol}}/company"),
                intraday: format!("{DEFAULT_PROVIDER_BASE}/{{symbol}}/intraday?date={{end}}"),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayConfig {
    pub bind_address: String,
    pub rate_interval_ms: u64,
    pub max_retries: u32,
    pub workers: usize,
    pub max_symbols: usize,
    pub request_timeout_secs: u64,
    pub provider: ProviderConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::builtin()
    }
}

impl GatewayConfig {
    pub fn builtin() -> Self {
        Self {
            bind_address: "127.0.0.1:5000".to_string(),
            rate_interval_ms: DEFAULT_RATE_INTERVAL.as_millis() as u64,
            max_retries: DEFAULT_MAX_RETRIES,
            workers: DEFAULT_WORKERS,
            max_symbols: DEFAULT_MAX_SYMBOLS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            provider: ProviderConfig::builtin(),
        }
    }

    pub fn rate_interval(&self) -> Duration {
        Duration::from_millis(self.rate_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_matches_documented_defaults() {
        let config = GatewayConfig::builtin();
        assert_eq!(config.rate_interval(), Duration::from_millis(500));
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.workers, 3);
        assert_eq!(config.max_symbols, 10);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        validate_config(&config).expect("builtin config is valid");
    }

    #[test]
    fn selects_template_by_kind() {
        let endpoints = ProviderConfig::builtin().endpoints;
        assert!(endpoints.template(QuoteKind::History).contains("{start}"));
        assert!(endpoints.template(QuoteKind::Company).ends_with("/company"));
    }
}
