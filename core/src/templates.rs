use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CompanionError, Result};

const METADATA_PREFIX: &str = "template_metadata_";
const TEXT_PREFIX: &str = "template_text_";
pub const TEMPLATE_DESCRIPTION: &str = "Maintained by the ServiceNow Tools script.";

/// A canned note offered by the legacy host template store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub title: Value,
    pub description: String,
    pub content: Value,
}

#[derive(Debug, Deserialize)]
struct TemplateMetadata {
    id: Value,
    #[serde(default)]
    title: Value,
}

/// Decode the host's template dump: a JSON object (delivered as a string)
/// whose `template_metadata_*` entries are themselves JSON strings.
pub fn parse_templates(dump: &str) -> Result<Vec<Template>> {
    let store: Map<String, Value> = serde_json::from_str(dump)?;
    let mut templates = Vec::new();
    for (key, raw) in &store {
        if !key.starts_with(METADATA_PREFIX) {
            continue;
        }
        let raw = raw.as_str().ok_or_else(|| {
            CompanionError::MalformedResponse(format!("{key} is not a JSON string"))
        })?;
        let metadata: TemplateMetadata = serde_json::from_str(raw)?;
        let text_key = format!("{TEXT_PREFIX}{}", id_text(&metadata.id));
        templates.push(Template {
            title: metadata.title,
            description: TEMPLATE_DESCRIPTION.to_string(),
            content: store.get(&text_key).cloned().unwrap_or(Value::Null),
        });
    }
    Ok(templates)
}

fn id_text(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
