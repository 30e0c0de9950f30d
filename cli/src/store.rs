use std::io::Write;
use std::path::PathBuf;

use casepad_core::CompanionError;
use casepad_core::notepad::KeyValueStore;
use serde_json::{Map, Value};

pub fn default_store_path() -> PathBuf {
    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("casepad");
    config_dir.join("notepad.json")
}

/// Notepad key-value store persisted as one flat JSON object.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn load(&self) -> Map<String, Value> {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|data| serde_json::from_str(&data).ok())
            .unwrap_or_default()
    }

    fn save(&self, map: &Map<String, Value>) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(map)?;
        let mut file = std::fs::File::create(&self.path)?;
        file.write_all(data.as_bytes())?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.load()
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CompanionError> {
        let mut map = self.load();
        map.insert(key.to_string(), Value::String(value.to_string()));
        self.save(&map).map_err(|e| {
            CompanionError::Store(format!("{}: {e}", self.path.display()))
        })
    }
}
