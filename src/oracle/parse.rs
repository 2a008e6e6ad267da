//! Tolerant parsing of LLM verdicts.
//!
//! Backends wrap JSON in code fences or prose, spell numbers as strings and
//! rename fields. Anything that cannot be read as a verdict is
//! [`OracleError::Malformed`].

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::error::{OracleError, OracleResult};
use super::types::OracleVerdict;

const QUALIFIED_KEYS: &[&str] = &["qualified", "is_qualified", "relevant", "is_relevant"];
const SCORE_KEYS: &[&str] = &["score", "relevance_score", "relevance"];
const PROBABILITY_KEYS: &[&str] = &["probability", "relevance_probability", "confidence"];

/// Parses a raw oracle reply into a normalized verdict.
pub fn parse_verdict(raw: &str) -> OracleResult<OracleVerdict> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(OracleError::EmptyResponse);
    }

    let object = extract_object(raw)?;

    let qualified = lookup(&object, QUALIFIED_KEYS)
        .and_then(as_bool)
        .unwrap_or(false);
    let score = lookup(&object, SCORE_KEYS).and_then(as_f32);
    let probability = lookup(&object, PROBABILITY_KEYS).and_then(as_f32);

    if score.is_none() && probability.is_none() && lookup(&object, QUALIFIED_KEYS).is_none() {
        return Err(OracleError::Malformed {
            reason: "no qualified, score or probability field".to_string(),
        });
    }

    let summary = object
        .get("summary")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();

    let tags = match object.get("tags") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        _ => Vec::new(),
    };

    let entities = match object.get("entities") {
        Some(Value::Object(fields)) => fields
            .iter()
            .filter_map(|(k, v)| entity_value(v).map(|v| (k.clone(), v)))
            .collect(),
        _ => BTreeMap::new(),
    };

    Ok(OracleVerdict {
        qualified,
        score: score.unwrap_or(0.0),
        probability: probability.unwrap_or(0.0),
        summary,
        tags,
        entities,
    }
    .normalized())
}

fn extract_object(raw: &str) -> OracleResult<Map<String, Value>> {
    let start = raw.find('{');
    let end = raw.rfind('}');
    let slice = match (start, end) {
        (Some(start), Some(end)) if end > start => &raw[start..=end],
        _ => {
            return Err(OracleError::Malformed {
                reason: "no JSON object in response".to_string(),
            });
        }
    };

    match serde_json::from_str::<Value>(slice) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(OracleError::Malformed {
            reason: "response is not a JSON object".to_string(),
        }),
        Err(e) => Err(OracleError::Malformed {
            reason: e.to_string(),
        }),
    }
}

fn lookup<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| object.get(*key)).filter(|v| !v.is_null())
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|n| n != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Some(true),
            "false" | "no" | "n" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn as_f32(value: &Value) -> Option<f32> {
    match value {
        Value::Number(n) => n.as_f64().map(|n| n as f32),
        Value::String(s) => {
            let s = s.trim();
            match s.strip_suffix('%') {
                Some(percent) => percent.trim().parse::<f32>().ok().map(|p| p / 100.0),
                None => s.trim_end_matches("/10").trim().parse().ok(),
            }
        }
        _ => None,
    }
}

fn entity_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Array(items) => {
            let joined = items
                .iter()
                .filter_map(entity_value)
                .collect::<Vec<_>>()
                .join("; ");
            (!joined.is_empty()).then_some(joined)
        }
        other => Some(other.to_string()),
    }
}
