use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SYMPTOM: &str = "symptom";
pub const STEPS_TO_REPRODUCE: &str = "steps_to_reproduce";
pub const DATA_COLLECTED: &str = "data_collected";

/// Per-case structured note kept by the case-assistant backend, exactly as
/// the backend returned it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PulseRecord(Value);

impl PulseRecord {
    pub fn new(raw: Value) -> Self {
        PulseRecord(raw)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    pub fn into_raw(self) -> Value {
        self.0
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    /// Field rendered as text: strings as-is, other values as JSON.
    pub fn field_text(&self, name: &str) -> Option<Cow<'_, str>> {
        match self.field(name)? {
            Value::String(s) => Some(Cow::Borrowed(s)),
            other => Some(Cow::Owned(other.to_string())),
        }
    }

    pub fn symptom(&self) -> Option<Cow<'_, str>> {
        self.field_text(SYMPTOM)
    }

    pub fn steps_to_reproduce(&self) -> Option<Cow<'_, str>> {
        self.field_text(STEPS_TO_REPRODUCE)
    }

    pub fn data_collected(&self) -> Option<Cow<'_, str>> {
        self.field_text(DATA_COLLECTED)
    }
}

/// Outcome of reading a case's pulse.
#[derive(Debug, Clone, PartialEq)]
pub enum PulseLookup {
    Found(PulseRecord),
    /// The backend knows the case but no pulse was written yet.
    NotYetCreated,
    /// Transport failure or an unrecognised reply.
    Unavailable,
}

impl PulseLookup {
    /// Interpret a `/case/pulse/{id}` reply.
    pub fn from_reply(reply: Value) -> Self {
        let Value::Array(items) = reply else {
            tracing::warn!("pulse reply is not an array");
            return PulseLookup::Unavailable;
        };
        match items.into_iter().next() {
            Some(first) => PulseLookup::Found(PulseRecord::new(first)),
            None => PulseLookup::NotYetCreated,
        }
    }

    pub fn record(&self) -> Option<&PulseRecord> {
        match self {
            PulseLookup::Found(record) => Some(record),
            _ => None,
        }
    }
}

pub fn pulse_path(case_id: &str) -> String {
    format!("/case/pulse/{case_id}")
}

/// Plain text of a `<p>…</p>` wrapped pulse field.
pub fn pulse_field_text(field: &str) -> String {
    let inner: String = field.chars().skip(3).collect();
    drop_last_chars(&inner, 4)
}

/// Plain-text bullet list from the markup of `steps_to_reproduce`.
pub fn pulse_steps_text(steps: &str) -> String {
    drop_last_chars(steps, 4)
        .replace("<li>", "\r\n-")
        .replace("</li>", "")
        .replace("<p>", "")
        .replace("</p>", "")
        .replace("&gt;", ">")
        .replace("<ol>", "")
        .replace("</ol>", "")
}

fn drop_last_chars(s: &str, n: usize) -> String {
    let keep = s.chars().count().saturating_sub(n);
    s.chars().take(keep).collect()
}
