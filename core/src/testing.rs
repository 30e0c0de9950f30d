//! In-memory host bridge for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::bridge::{BusyIndicator, HostBridge};
use crate::error::BridgeError;

type Scripted = Result<Value, String>;

/// Replays queued replies per event name and records everything it was sent.
/// Unscripted events answer `null`. Every send suspends once before replying.
#[derive(Default)]
pub struct ScriptedBridge {
    replies: Mutex<HashMap<String, VecDeque<Scripted>>>,
    sent: Mutex<Vec<(String, Option<Value>)>>,
    version: Mutex<Option<String>>,
}

impl ScriptedBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, event: &str, value: Value) {
        self.push(event, Ok(value));
    }

    pub fn fail(&self, event: &str, message: &str) {
        self.push(event, Err(message.to_string()));
    }

    pub fn set_version(&self, version: &str) {
        *self.version.lock().unwrap() = Some(version.to_string());
    }

    pub fn count(&self, event: &str) -> usize {
        self.sent.lock().unwrap().iter().filter(|(e, _)| e == event).count()
    }

    pub fn payloads(&self, event: &str) -> Vec<Option<Value>> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(e, _)| e == event)
            .map(|(_, p)| p.clone())
            .collect()
    }

    fn push(&self, event: &str, reply: Scripted) {
        self.replies
            .lock()
            .unwrap()
            .entry(event.to_string())
            .or_default()
            .push_back(reply);
    }
}

#[async_trait]
impl HostBridge for ScriptedBridge {
    async fn send(&self, event: &str, payload: Option<Value>) -> Result<Value, BridgeError> {
        self.sent.lock().unwrap().push((event.to_string(), payload));
        // Suspend once so concurrent callers interleave.
        tokio::task::yield_now().await;
        let next = self
            .replies
            .lock()
            .unwrap()
            .get_mut(event)
            .and_then(|queue| queue.pop_front());
        match next {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(BridgeError::Transport(message)),
            None => Ok(Value::Null),
        }
    }

    async fn host_version(&self) -> Result<String, BridgeError> {
        self.version
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| BridgeError::Transport("version unavailable".to_string()))
    }
}

/// Counts show/hide calls.
#[derive(Default)]
pub struct CountingIndicator {
    pub calls: Mutex<Vec<&'static str>>,
}

impl BusyIndicator for CountingIndicator {
    fn show(&self) {
        self.calls.lock().unwrap().push("show");
    }

    fn hide(&self) {
        self.calls.lock().unwrap().push("hide");
    }
}
