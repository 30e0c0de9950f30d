use crate::error::{CompanionError, Result};
use crate::pulse::{PulseRecord, pulse_field_text, pulse_steps_text};

pub const POSITION_KEY: &str = "pulse_notepad_default_position";
pub const MODE_KEY: &str = "pulse_notepad_default_mode";
pub const CONTENT_KEY: &str = "pulse_notepad_textarea_content";

const DEFAULT_LEFT: &str = "100px";
const DEFAULT_TOP: &str = "200px";

/// String key-value persistence owned by the host (browser local storage or a file).
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub left: String,
    pub top: String,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            left: DEFAULT_LEFT.to_string(),
            top: DEFAULT_TOP.to_string(),
        }
    }
}

impl Position {
    /// Parse the stored `"left,top"` pair; anything else is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split(',');
        let left = parts.next()?.trim();
        let top = parts.next()?.trim();
        Some(Self {
            left: left.to_string(),
            top: top.to_string(),
        })
    }

    fn encode(&self) -> String {
        format!("{},{}", self.left, self.top)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NotepadMode {
    Minimized,
    #[default]
    Maximized,
}

impl NotepadMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotepadMode::Minimized => "minimized",
            NotepadMode::Maximized => "maximized",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            NotepadMode::Minimized => NotepadMode::Maximized,
            NotepadMode::Maximized => NotepadMode::Minimized,
        }
    }
}

/// Pulse fields the notepad can copy from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseSection {
    Symptom,
    Steps,
    DataCollected,
}

impl PulseSection {
    pub fn heading(&self) -> &'static str {
        match self {
            PulseSection::Symptom => "SYMPTOM",
            PulseSection::Steps => "STEPS",
            PulseSection::DataCollected => "DATA COLLECTED",
        }
    }

    fn text(&self, pulse: &PulseRecord) -> String {
        let field = match self {
            PulseSection::Symptom => pulse.symptom(),
            PulseSection::Steps => pulse.steps_to_reproduce(),
            PulseSection::DataCollected => pulse.data_collected(),
        };
        let Some(field) = field else {
            return String::new();
        };
        match self {
            PulseSection::Steps => pulse_steps_text(&field),
            _ => pulse_field_text(&field),
        }
    }
}

/// Notepad state backed by a [`KeyValueStore`]. Every mutation is persisted
/// immediately.
pub struct Notepad<S: KeyValueStore> {
    store: S,
    position: Position,
    mode: NotepadMode,
    content: String,
}

impl<S: KeyValueStore> Notepad<S> {
    /// Load persisted state, falling back to defaults for missing or malformed keys.
    pub fn load(store: S) -> Self {
        let position = store
            .get(POSITION_KEY)
            .filter(|raw| !raw.is_empty())
            .and_then(|raw| Position::parse(&raw))
            .unwrap_or_default();
        let mode = match store.get(MODE_KEY).as_deref() {
            Some("minimized") => NotepadMode::Minimized,
            _ => NotepadMode::Maximized,
        };
        let content = store.get(CONTENT_KEY).unwrap_or_default();
        Self {
            store,
            position,
            mode,
            content,
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn mode(&self) -> NotepadMode {
        self.mode
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn set_position(&mut self, position: Position) -> Result<()> {
        if position.left.contains(',') || position.top.contains(',') {
            return Err(CompanionError::Store(format!(
                "position component may not contain ',': {}",
                position.encode()
            )));
        }
        self.store.set(POSITION_KEY, &position.encode())?;
        self.position = position;
        Ok(())
    }

    pub fn set_mode(&mut self, mode: NotepadMode) -> Result<()> {
        self.store.set(MODE_KEY, mode.as_str())?;
        self.mode = mode;
        Ok(())
    }

    pub fn set_content(&mut self, content: impl Into<String>) -> Result<()> {
        let content = content.into();
        self.store.set(CONTENT_KEY, &content)?;
        self.content = content;
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        self.set_content(String::new())
    }

    /// Append `\r\n<HEADING>\r\n<text>` for one pulse field.
    pub fn append_section(&mut self, section: PulseSection, pulse: &PulseRecord) -> Result<()> {
        let appended = format!(
            "{}\r\n{}\r\n{}",
            self.content,
            section.heading(),
            section.text(pulse)
        );
        self.set_content(appended)
    }
}
