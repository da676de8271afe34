use crate::error::ReviewError;
use crate::service::ResultPayload;
use crate::util::base_name;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::warn;

/// One issue extracted from a completed job, ready to be filed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// 1-based position in the result list.
    pub ordinal: usize,
    pub source_label: String,
    pub title: String,
    pub body: String,
}

impl Finding {
    pub fn new(ordinal: usize, source_label: &str, body: String) -> Self {
        Self {
            ordinal,
            source_label: source_label.to_string(),
            title: format!("Issue #{} in file: {}", ordinal, base_name(source_label)),
            body,
        }
    }
}

/// Never fails: an unusable payload is logged and yields no findings.
pub fn translate(payload: &ResultPayload, source_label: &str) -> Vec<Finding> {
    match parse_findings(payload) {
        Ok(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| Finding::new(i + 1, source_label, render_body(item)))
            .collect(),
        Err(err) => {
            warn!("{}: {err}", base_name(source_label));
            Vec::new()
        }
    }
}

pub fn parse_findings(payload: &ResultPayload) -> Result<Vec<serde_json::Value>, ReviewError> {
    let raw = payload
        .result_text()
        .ok_or_else(|| ReviewError::Translation("missing textual `result` field".into()))?;
    let body = strip_code_fence(raw);
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Array(items)) => Ok(items),
        Ok(other) => Err(ReviewError::Translation(format!(
            "expected a JSON array, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(ReviewError::Translation(format!("invalid JSON format: {e}"))),
    }
}

/// Removes a surrounding ```lang ... ``` fence; other text is returned trimmed.
pub fn strip_code_fence(raw: &str) -> &str {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let re = FENCE.get_or_init(|| {
        Regex::new(r"(?s)\A\s*```[A-Za-z0-9_+\-]*[ \t]*\r?\n?(.*?)\s*```\s*\z")
            .expect("fence pattern is valid")
    });
    match re.captures(raw).and_then(|c| c.get(1)) {
        Some(m) => m.as_str().trim(),
        None => raw.trim(),
    }
}

fn render_body(item: serde_json::Value) -> String {
    match item {
        serde_json::Value::String(s) => s,
        other => serde_json::to_string_pretty(&other).unwrap_or_else(|_| other.to_string()),
    }
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
