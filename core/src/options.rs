use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CompanionError, Result};

/// One runtime parameter in the shape the automation service executes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedOption {
    pub name: String,
    pub values: Vec<String>,
}

/// Flatten UI-originated runtime options into `{name, values}` pairs.
///
/// `raw` may be `null`, an array of option entries, or an object whose values
/// are option entries. Selectbox entries carry either `values.value` (single)
/// or `values: [{value}, ...]` (multi); every other entry contributes its
/// `value`, defaulting to the empty string.
pub fn normalize_options(raw: &Value) -> Result<Vec<NormalizedOption>> {
    let entries: Vec<&Value> = match raw {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => enumeration_order(map),
        other => {
            return Err(CompanionError::InvalidOption {
                index: 0,
                reason: format!("expected an object or array of options, got {other}"),
            });
        }
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| normalize_entry(index, entry))
        .collect()
}

fn normalize_entry(index: usize, entry: &Value) -> Result<NormalizedOption> {
    let invalid = |reason: &str| CompanionError::InvalidOption {
        index,
        reason: reason.to_string(),
    };

    let values = if entry.get("control").and_then(Value::as_str) == Some("selectbox") {
        match entry.get("values") {
            Some(Value::Object(single)) if is_present(single.get("value")) => {
                vec![scalar_text(single.get("value"))]
            }
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| scalar_text(item.get("value")))
                .collect(),
            _ => return Err(invalid("selectbox values must be {value} or [{value}, ...]")),
        }
    } else {
        vec![scalar_text(entry.get("value"))]
    };

    let name = entry
        .get("option")
        .and_then(|option| option.get("name"))
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("missing option.name"))?;

    Ok(NormalizedOption {
        name: name.to_string(),
        values,
    })
}

/// Object values in the order a browser enumerates keys: array-index-like
/// keys ascending, then the rest in insertion order.
fn enumeration_order(map: &Map<String, Value>) -> Vec<&Value> {
    let mut indexed: Vec<(u32, &Value)> = Vec::new();
    let mut named: Vec<&Value> = Vec::new();
    for (key, value) in map {
        match array_index(key) {
            Some(i) => indexed.push((i, value)),
            None => named.push(value),
        }
    }
    indexed.sort_by_key(|(i, _)| *i);
    indexed.into_iter().map(|(_, v)| v).chain(named).collect()
}

fn array_index(key: &str) -> Option<u32> {
    let parsed: u32 = key.parse().ok()?;
    (parsed != u32::MAX && parsed.to_string() == key).then_some(parsed)
}

fn is_present(value: Option<&Value>) -> bool {
    value.is_some_and(|v| !v.is_null())
}

fn scalar_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
