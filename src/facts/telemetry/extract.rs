//! Readers for Prometheus query responses.
//!
//! All readers are lenient: anything that does not look like a successful vector result
//! yields zero or an empty map.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

const UNKNOWN_LABEL: &str = "unknown";

/// Accepted and rejected edit counts, keyed by tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EditDecisions {
    pub accept: BTreeMap<String, f64>,
    pub reject: BTreeMap<String, f64>,
}

fn result_vector(response: &Value) -> Option<&Vec<Value>> {
    if response.get("status").and_then(Value::as_str) != Some("success") {
        return None;
    }

    response.pointer("/data/result").and_then(Value::as_array)
}

fn sample_value(item: &Value) -> f64 {
    item.pointer("/value/1")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| !v.is_nan())
        .unwrap_or(0.0)
}

fn label<'a>(item: &'a Value, name: &str) -> &'a str {
    item.get("metric")
        .and_then(|m| m.get(name))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(UNKNOWN_LABEL)
}

/// Value of the first sample, or zero.
#[must_use]
pub fn extract_scalar(response: &Value) -> f64 {
    result_vector(response).and_then(|r| r.first()).map_or(0.0, sample_value)
}

/// Sample values keyed by the given label. Samples without the label are filed under `unknown`.
#[must_use]
pub fn extract_by_label(response: &Value, label_name: &str) -> BTreeMap<String, f64> {
    result_vector(response)
        .map(|items| items.iter().map(|item| (label(item, label_name).to_string(), sample_value(item))).collect())
        .unwrap_or_default()
}

/// Split samples labelled with `tool` and `decision` into accept and reject tallies.
#[must_use]
pub fn extract_edit_decisions(response: &Value) -> EditDecisions {
    let mut decisions = EditDecisions::default();

    for item in result_vector(response).into_iter().flatten() {
        let tally = match label(item, "decision") {
            "accept" => &mut decisions.accept,
            "reject" => &mut decisions.reject,
            _ => continue,
        };

        let _ = tally.insert(label(item, "tool").to_string(), sample_value(item));
    }

    decisions
}
