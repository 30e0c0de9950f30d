use async_trait::async_trait;
use casepad_core::BusyIndicator;
use casepad_core::HostBridge;
use casepad_core::error::BridgeError;
use serde::Deserialize;
use serde_json::Value;

/// Host bridge reached over HTTP.
///
/// `POST <base>/events/<event>` carries the payload as the JSON body and
/// returns the host's reply; `GET <base>/system-info` reports the host version.
pub struct HttpBridge {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct SystemInfo {
    version: String,
}

impl HttpBridge {
    pub fn new(base_url: &str) -> Result<Self, String> {
        let trimmed = base_url.trim_end_matches('/');
        url::Url::parse(trimmed).map_err(|e| format!("Invalid bridge URL '{base_url}': {e}"))?;
        Ok(Self {
            base_url: trimmed.to_string(),
            client: reqwest::Client::new(),
        })
    }

    fn event_url(&self, event: &str) -> String {
        format!("{}/events/{event}", self.base_url)
    }
}

#[async_trait]
impl HostBridge for HttpBridge {
    async fn send(&self, event: &str, payload: Option<Value>) -> Result<Value, BridgeError> {
        let resp = self
            .client
            .post(self.event_url(event))
            .json(&payload.unwrap_or(Value::Null))
            .send()
            .await
            .map_err(|e| BridgeError::Transport(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| BridgeError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(BridgeError::Host {
                event: event.to_string(),
                message: format!("HTTP {}: {text}", status.as_u16()),
            });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| BridgeError::Host {
            event: event.to_string(),
            message: format!("non-JSON reply: {e}"),
        })
    }

    async fn host_version(&self) -> Result<String, BridgeError> {
        let resp = self
            .client
            .get(format!("{}/system-info", self.base_url))
            .send()
            .await
            .map_err(|e| BridgeError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(BridgeError::Host {
                event: "system-info".to_string(),
                message: format!("HTTP {}", resp.status().as_u16()),
            });
        }
        let info: SystemInfo = resp.json().await.map_err(|e| BridgeError::Host {
            event: "system-info".to_string(),
            message: e.to_string(),
        })?;
        Ok(info.version)
    }
}

/// Reports automation-service activity in the log instead of a spinner.
pub struct LogBusyIndicator;

impl BusyIndicator for LogBusyIndicator {
    fn show(&self) {
        tracing::info!("waiting for guided-engineering service");
    }

    fn hide(&self) {
        tracing::debug!("guided-engineering call finished");
    }
}
