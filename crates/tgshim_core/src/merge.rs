//! Merging of per-module terragrunt outputs into one JSON object.
//!
//! `terragrunt run-all output -json` prints one JSON document per module.
//! kitchen-terraform expects a single object, so the documents (slurped into
//! an array by `jq -s`) are overlaid in order. The overlay is shallow: a key
//! present in several documents takes the value from the last one.

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{ShimError, ShimResult};

/// Overlay the objects of a slurped document array.
///
/// Blank input (nothing to slurp) yields an empty object.
pub fn merge_outputs(slurped: &str) -> ShimResult<Map<String, Value>> {
    if slurped.trim().is_empty() {
        return Ok(Map::new());
    }

    let documents = match serde_json::from_str::<Value>(slurped)? {
        Value::Array(documents) => documents,
        other => {
            return Err(ShimError::InvalidOutput(format!(
                "expected an array of documents, got {}",
                kind(&other)
            )))
        }
    };

    let mut merged = Map::new();
    for (index, document) in documents.into_iter().enumerate() {
        let fields = match document {
            Value::Object(fields) => fields,
            other => {
                return Err(ShimError::InvalidOutput(format!(
                    "document {} is {}, expected an object",
                    index,
                    kind(&other)
                )))
            }
        };

        for (key, value) in fields {
            if let Some(previous) = merged.insert(key.clone(), value) {
                if merged.get(&key) != Some(&previous) {
                    warn!("Output {} from document {} overrides an earlier value", key, index);
                }
            }
        }
    }

    Ok(merged)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
