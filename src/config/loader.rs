use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{AppError, Context, Result};

use super::{validator, GatewayConfig};

/// Environment variable naming an optional JSON configuration file.
pub const CONFIG_PATH_ENV: &str = "QUOTE_GATEWAY_CONFIG";

const BIND_ENV: &str = "QUOTE_GATEWAY_BIND";
const RATE_INTERVAL_ENV: &str = "QUOTE_GATEWAY_RATE_INTERVAL_MS";
const MAX_RETRIES_ENV: &str = "QUOTE_GATEWAY_MAX_RETRIES";
const WORKERS_ENV: &str = "QUOTE_GATEWAY_WORKERS";
const MAX_SYMBOLS_ENV: &str = "QUOTE_GATEWAY_MAX_SYMBOLS";
const REQUEST_TIMEOUT_ENV: &str = "QUOTE_GATEWAY_REQUEST_TIMEOUT_SECS";

/// Load configuration from the process environment.
pub fn load_from_env() -> Result<GatewayConfig> {
    let path = std::env::var(CONFIG_PATH_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty());
    load(path.as_deref().map(Path::new), |name| std::env::var(name).ok())
}

/// Built-in defaults, then the optional JSON file, then environment overrides.
/// The merged result is validated before it is returned.
pub fn load<F>(path: Option<&Path>, env: F) -> Result<GatewayConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = GatewayConfig::builtin();

    if let Some(path) = path {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read gateway config at {}", path.display()))?;
        let raw: RawGatewayConfig = serde_json::from_str(&json)
            .with_context(|| format!("failed to parse gateway config at {}", path.display()))?;
        raw.apply(&mut config);
    }

    apply_env_overrides(&mut config, env)?;
    validator::validate_config(&config)?;

    Ok(config)
}

fn apply_env_overrides<F>(config: &mut GatewayConfig, env: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(bind) = env(BIND_ENV) {
        config.bind_address = bind.trim().to_string();
    }
    if let Some(value) = env(RATE_INTERVAL_ENV) {
        config.rate_interval_ms = parse_override(RATE_INTERVAL_ENV, &value)?;
    }
    if let Some(value) = env(MAX_RETRIES_ENV) {
        config.max_retries = parse_override(MAX_RETRIES_ENV, &value)?;
    }
    if let Some(value) = env(WORKERS_ENV) {
        config.workers = parse_override(WORKERS_ENV, &value)?;
    }
    if let Some(value) = env(MAX_SYMBOLS_ENV) {
        config.max_symbols = parse_override(MAX_SYMBOLS_ENV, &value)?;
    }
    if let Some(value) = env(REQUEST_TIMEOUT_ENV) {
        config.request_timeout_secs = parse_override(REQUEST_TIMEOUT_ENV, &value)?;
    }
    Ok(())
}

fn parse_override<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::message(format!("Invalid value `{value}` for {name}")))
}

#[derive(Debug, Default, Deserialize)]
struct RawGatewayConfig {
    bind_address: Option<String>,
    rate_interval_ms: Option<u64>,
    max_retries: Option<u32>,
    workers: Option<usize>,
    max_symbols: Option<usize>,
    request_timeout_secs: Option<u64>,
    provider: Option<RawProviderConfig>,
}

impl RawGatewayConfig {
    fn apply(self, config: &mut GatewayConfig) {
        if let Some(bind) = self.bind_address {
            config.bind_address = bind;
        }
        if let Some(value) = self.rate_interval_ms {
            config.rate_interval_ms = value;
        }
        if let Some(value) = self.max_retries {
            config.max_retries = value;
        }
        if let Some(value) = self.workers {
            config.workers = value;
        }
        if let Some(value) = self.max_symbols {
            config.max_symbols = value;
        }
        if let Some(value) = self.request_timeout_secs {
            config.request_timeout_secs = value;
        }
        if let Some(provider) = self.provider {
            provider.apply(config);
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawProviderConfig {
    timeout_secs: Option<u64>,
    headers: Option<HashMap<String, String>>,
    data_path: Option<Vec<String>>,
    endpoints: Option<RawEndpoints>,
}

impl RawProviderConfig {
    fn apply(self, config: &mut GatewayConfig) {
        let provider = &mut config.provider;
        if let Some(value) = self.timeout_secs {
            provider.timeout_secs = value;
        }
        if let Some(headers) = self.headers {
            provider.headers = headers;
        }
        if let Some(path) = self.data_path {
            provider.data_path = path;
        }
        if let Some(endpoints) = self.endpoints {
            let target = &mut provider.endpoints;
            if let Some(value) = endpoints.overview {
                target.overview = value;
            }
            if let Some(value) = endpoints.history {
                target.history = value;
            }
            if let Some(value) = endpoints.company {
                target.company = value;
            }
            if let Some(value) = endpoints.intraday {
                target.intraday = value;
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawEndpoints {
    overview: Option<String>,
    history: Option<String>,
    company: Option<String>,
    intraday: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write_config(name: &str, body: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "quote-gateway-{}-{name}.json",
            std::process::id()
        ));
        let mut file = fs::File::create(&path).expect("create temp config");
        file.write_all(body.as_bytes()).expect("write temp config");
        path
    }

    #[test]
    fn defaults_without_file_or_env() {
        let config = load(None, no_env).expect("defaults load");
        assert_eq!(config, GatewayConfig::builtin());
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let path = write_config(
            "partial",
            r#"{
                "workers": 6,
                "provider": {
                    "data_path": [],
                    "headers": {"X-Api-Key": "${PROVIDER_KEY}"},
                    "endpoints": {"company": "https://p.example/{symbol}/profile"}
                }
            }"#,
        );

        let config = load(Some(&path), no_env).expect("partial config loads");
        let _ = fs::remove_file(&path);

        assert_eq!(config.workers, 6);
        assert_eq!(config.max_symbols, 10);
        assert!(config.provider.data_path.is_empty());
        assert_eq!(
            config.provider.endpoints.company,
            "https://p.example/{symbol}/profile"
        );
        assert_eq!(
            config.provider.endpoints.history,
            GatewayConfig::builtin().provider.endpoints.history
        );
    }

    #[test]
    fn environment_wins_over_file() {
        let path = write_config("env", r#"{"max_symbols": 20, "workers": 4}"#);
        let env = |name: &str| match name {
            MAX_SYMBOLS_ENV => Some("5".to_string()),
            RATE_INTERVAL_ENV => Some(" 250 ".to_string()),
            BIND_ENV => Some("0.0.0.0:8080".to_string()),
            _ => None,
        };

        let config = load(Some(&path), env).expect("config loads");
        let _ = fs::remove_file(&path);

        assert_eq!(config.max_symbols, 5);
        assert_eq!(config.workers, 4);
        assert_eq!(config.rate_interval_ms, 250);
        assert_eq!(config.bind_address, "0.0.0.0:8080");
    }

    #[test]
    fn rejects_unparseable_override() {
        let env = |name: &str| (name == WORKERS_ENV).then(|| "many".to_string());
        let err = load(None, env).unwrap_err();
        assert!(err.to_string().contains(WORKERS_ENV), "{err}");
    }

    #[test]
    fn rejects_invalid_merged_config() {
        let env = |name: &str| (name == WORKERS_ENV).then(|| "0".to_string());
        let err = load(None, env).unwrap_err();
        assert!(err.to_string().contains("workers"), "{err}");
    }

    #[test]
    fn reports_missing_file() {
        let err = load(Some(Path::new("/definitely/not/here.json")), no_env).unwrap_err();
        assert!(err.to_string().contains("failed to read gateway config"));
    }
}
