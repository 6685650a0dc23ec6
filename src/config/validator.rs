use crate::error::{AppError, Result};

use super::{EndpointTemplates, GatewayConfig};

/// Check the merged configuration, reporting every problem at once.
pub fn validate_config(config: &GatewayConfig) -> Result<()> {
    let mut issues = Vec::new();

    if config.bind_address.trim().is_empty() {
        issues.push("bind_address must not be empty".to_string());
    }
    if config.workers == 0 {
        issues.push("workers must be at least 1".to_string());
    }
    if config.max_symbols == 0 {
        issues.push("max_symbols must be at least 1".to_string());
    }
    if config.request_timeout_secs == 0 {
        issues.push("request_timeout_secs must be greater than zero".to_string());
    }
    if config.provider.timeout_secs == 0 {
        issues.push("provider.timeout_secs must be greater than zero".to_string());
    }
    for key in &config.provider.data_path {
        if key.trim().is_empty() {
            issues.push("provider.data_path must not contain empty keys".to_string());
            break;
        }
    }

    validate_endpoints(&config.provider.endpoints, &mut issues);

    if issues.is_empty() {
        Ok(())
    } else {
        Err(AppError::message(format!(
            "Invalid gateway configuration: {}",
            issues.join("; ")
        )))
    }
}

fn validate_endpoints(endpoints: &EndpointTemplates, issues: &mut Vec<String>) {
    let named = [
        ("overview", &endpoints.overview),
        ("history", &endpoints.history),
        ("company", &endpoints.company),
        ("intraday", &endpoints.intraday),
    ];

    for (name, template) in named {
        if template.trim().is_empty() {
            issues.push(format!("provider.endpoints.{name} must not be empty"));
        } else if !template.contains("{symbol}") && !template.contains("{symbol_lower}") {
            issues.push(format!(
                "provider.endpoints.{name} must contain a {{symbol}} placeholder"
            ));
        }
    }

    for placeholder in ["{start}", "{end}"] {
        if !endpoints.history.contains(placeholder) {
            issues.push(format!(
                "provider.endpoints.history must contain a {placeholder} placeholder"
            ));
        }
    }
}
