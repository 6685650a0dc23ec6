use std::collections::HashMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::{AppError, Context, Result};
use crate::records::is_valid_symbol;
use crate::utils::format_date;

use super::QuoteQuery;

#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub url: String,
    pub headers: HeaderMap,
}

/// Render the endpoint template for `query` and resolve configured headers.
///
/// Templates may use `{symbol}`, `{symbol_lower}`, `{start}` and `{end}`.
pub fn prepare_request(
    template: &str,
    headers: &HashMap<String, String>,
    query: &QuoteQuery,
) -> Result<PreparedRequest> {
    if !is_valid_symbol(&query.symbol) {
        return Err(AppError::message(format!(
            "Refusing to build provider URL for malformed symbol `{}`",
            query.symbol
        )));
    }

    let start = format_date(query.range.start());
    let end = format_date(query.range.end());
    let symbol_lower = query.symbol.to_lowercase();

    let replacements: HashMap<&str, &str> = HashMap::from([
        ("symbol", query.symbol.as_str()),
        ("symbol_lower", symbol_lower.as_str()),
        ("start", start.as_str()),
        ("end", end.as_str()),
    ]);

    let url = render_template(template, &replacements)?;
    let headers = build_headers(headers)?;

    Ok(PreparedRequest { url, headers })
}

/// Substitute `${NAME}` with the value of environment variable `NAME`.
pub fn expand_env_vars(value: &str) -> Result<String> {
    let mut result = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(open) = rest.find("${") {
        result.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let close = after.find('}').ok_or_else(|| {
            AppError::message("Unterminated environment placeholder in header")
        })?;
        let name = &after[..close];
        if name.is_empty() {
            return Err(AppError::message(
                "Encountered empty environment placeholder in header",
            ));
        }
        let resolved = std::env::var(name).with_context(|| {
            format!("Environment variable {name} required by provider header is not set")
        })?;
        result.push_str(&resolved);
        rest = &after[close + 1..];
    }

    result.push_str(rest);
    Ok(result)
}

fn render_template(template: &str, replacements: &HashMap<&str, &str>) -> Result<String> {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        result.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after.find('}').ok_or_else(|| {
            AppError::message(format!("Unterminated placeholder in template: {template}"))
        })?;
        let key = &after[..close];
        let value = replacements.get(key).ok_or_else(|| {
            AppError::message(format!(
                "No replacement provided for placeholder `{{{key}}}` in template"
            ))
        })?;
        result.push_str(value);
        rest = &after[close + 1..];
    }

    result.push_str(rest);
    Ok(result)
}

fn build_headers(headers: &HashMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .with_context(|| format!("Invalid header name: {key}"))?;
        let expanded = expand_env_vars(value)?;
        let header_value = HeaderValue::from_str(&expanded)
            .with_context(|| format!("Invalid header value for {key}"))?;
        map.insert(name, header_value);
    }
    Ok(map)
}
