//! Parsing and validation of model output

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::schema::ChartSchema;
use crate::types::ChartSpec;

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)```").expect("fence pattern is valid")
});

/// Turns raw model text into a validated [`ChartSpec`]
///
/// Model output is untrusted: nothing leaves this parser unless every field
/// passed the schema.
#[derive(Debug, Clone)]
pub struct OutputParser {
    schema: Arc<ChartSchema>,
}

impl OutputParser {
    /// Create a parser for a schema
    pub fn new(schema: Arc<ChartSchema>) -> Self {
        Self { schema }
    }

    /// Schema the parser validates against
    pub fn schema(&self) -> &ChartSchema {
        &self.schema
    }

    /// Extract, validate and convert the chart spec in `raw`
    pub fn parse(&self, raw: &str) -> Result<ChartSpec> {
        let payload = extract_json_payload(raw)
            .ok_or_else(|| Error::schema("no JSON object found in model output"))?;

        let mut value: Value = serde_json::from_str(payload)
            .map_err(|e| Error::schema(format!("model output is not valid JSON: {}", e)))?;

        let violations = self.schema.validate(&mut value);
        if !violations.is_empty() {
            let details: Vec<String> = violations.iter().map(|v| v.to_string()).collect();
            tracing::debug!("Rejected model output: {}", details.join("; "));
            return Err(Error::schema(format!(
                "{} violation(s): {}",
                violations.len(),
                details.join("; ")
            )));
        }

        let spec: ChartSpec = serde_json::from_value(value)
            .map_err(|e| Error::schema(format!("output does not match chart spec: {}", e)))?;

        spec.check_invariants().map_err(Error::schema)?;

        Ok(spec)
    }
}

/// Locate the JSON object in model output
///
/// Prefers the first fenced code block holding an object, then falls back to
/// the outermost `{ ... }` span.
pub fn extract_json_payload(raw: &str) -> Option<&str> {
    for captures in FENCED_BLOCK.captures_iter(raw) {
        if let Some(body) = captures.get(1) {
            let body = body.as_str().trim();
            if body.starts_with('{') {
                return Some(body);
            }
        }
    }

    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}
