use serde_json::Value;

use crate::records::QuoteRecord;

use super::FetchFailure;

/// Follow `path` (object keys) from the response root.
pub fn walk_json_path<'a>(root: &'a Value, path: &[String]) -> Result<&'a Value, FetchFailure> {
    let mut cursor = root;
    for key in path {
        cursor = cursor.get(key).ok_or_else(|| {
            FetchFailure::Other(format!(
                "Missing key `{key}` while navigating provider response"
            ))
        })?;
    }
    Ok(cursor)
}

/// Decode a provider body into records.
///
/// The value at `data_path` may be an array of objects, a single object, or
/// `null` (no data).
pub fn extract_records(root: &Value, data_path: &[String]) -> Result<Vec<QuoteRecord>, FetchFailure> {
    match walk_json_path(root, data_path)? {
        Value::Null => Ok(Vec::new()),
        Value::Object(object) => Ok(vec![object.clone()]),
        Value::Array(rows) => rows
            .iter()
            .map(|row| {
                row.as_object().cloned().ok_or_else(|| {
                    FetchFailure::Other(format!(
                        "Unexpected non-object row in provider response: {row}"
                    ))
                })
            })
            .collect(),
        other => Err(FetchFailure::Other(format!(
            "Unexpected provider payload: {other}"
        ))),
    }
}
