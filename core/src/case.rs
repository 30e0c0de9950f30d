use serde::Deserialize;
use serde_json::Value;

use crate::pulse::PulseLookup;

/// Fields the case notifier should include in updates.
pub const CASE_FIELDS_OF_INTEREST: [&str; 2] = ["communication", "headers"];

const TITLE_PREVIEW_CHARS: usize = 25;

/// Notification delivered by the host when the open case changes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaseUpdate {
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub headers: Value,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseUpdateKind {
    NewCase,
    NoCase,
    Changed,
}

impl CaseUpdate {
    pub fn kind(&self) -> CaseUpdateKind {
        match self.types.first().map(String::as_str) {
            Some("newcase") => CaseUpdateKind::NewCase,
            Some("nocase") => CaseUpdateKind::NoCase,
            _ => CaseUpdateKind::Changed,
        }
    }
}

/// The case currently shown next to the notepad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseContext {
    pub id: String,
    pub number: Option<String>,
    pub title: String,
}

impl CaseContext {
    fn from_update(update: &CaseUpdate) -> Option<Self> {
        let id = match update.id.as_ref()? {
            Value::String(s) if !s.is_empty() => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        let number = update
            .headers
            .pointer("/data/number")
            .and_then(|n| match n {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            });
        Some(Self {
            id,
            number,
            title: update.title.clone().unwrap_or_default(),
        })
    }

    /// `"<number> - <title preview>..."`, as shown in the notepad header.
    pub fn label(&self) -> String {
        let preview: String = self.title.chars().take(TITLE_PREVIEW_CHARS).collect();
        format!(
            "{} - {preview}...",
            self.number.as_deref().unwrap_or(&self.id)
        )
    }
}

/// Label for an optional case.
pub fn case_label(case: Option<&CaseContext>) -> String {
    case.map_or_else(|| "no case".to_string(), CaseContext::label)
}

/// What the caller should do after a case notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseTransition {
    Ignored,
    Cleared,
    /// A new case is current; fetch its pulse.
    Opened { case_id: String },
}

/// Current case and its pulse. Pulse replies are accepted only for the case
/// they were requested for, so a slow reply cannot overwrite a newer case.
#[derive(Debug, Default)]
pub struct CaseTracker {
    case: Option<CaseContext>,
    pulse: Option<PulseLookup>,
}

impl CaseTracker {
    pub fn apply_update(&mut self, update: &CaseUpdate) -> CaseTransition {
        match update.kind() {
            CaseUpdateKind::NewCase => CaseTransition::Ignored,
            CaseUpdateKind::NoCase => {
                self.case = None;
                self.pulse = None;
                CaseTransition::Cleared
            }
            CaseUpdateKind::Changed => match CaseContext::from_update(update) {
                Some(context) => {
                    let case_id = context.id.clone();
                    self.case = Some(context);
                    self.pulse = None;
                    CaseTransition::Opened { case_id }
                }
                None => {
                    tracing::warn!("case update without a usable id, ignoring");
                    CaseTransition::Ignored
                }
            },
        }
    }

    /// Store `lookup` if `case_id` is still the open case; returns whether it was kept.
    pub fn accept_pulse(&mut self, case_id: &str, lookup: PulseLookup) -> bool {
        match &self.case {
            Some(current) if current.id == case_id => {
                self.pulse = Some(lookup);
                true
            }
            _ => {
                tracing::debug!(case_id, "discarding pulse for a case that is no longer open");
                false
            }
        }
    }

    pub fn case(&self) -> Option<&CaseContext> {
        self.case.as_ref()
    }

    pub fn pulse(&self) -> Option<&PulseLookup> {
        self.pulse.as_ref()
    }
}
