use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};

use crate::bridge::{BusyGuard, BusyIndicator, HostBridge, events};
use crate::config::ServiceConfig;
use crate::error::Result;
use crate::token::TokenSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// Envelope the host expects for `engine-request`.
#[derive(Debug, Serialize)]
struct EngineRequest<'a> {
    service: &'a str,
    method: Method,
    #[serde(skip_serializing_if = "Option::is_none")]
    env: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a Value>,
    path: &'a str,
    headers: Value,
}

/// Sends authenticated requests to one backend service through the host bridge.
pub struct RequestGateway {
    bridge: Arc<dyn HostBridge>,
    service: ServiceConfig,
    env: Option<String>,
    token: TokenSlot,
    busy: Option<Arc<dyn BusyIndicator>>,
}

impl RequestGateway {
    pub fn new(bridge: Arc<dyn HostBridge>, service: ServiceConfig, env: Option<String>) -> Self {
        let token = TokenSlot::new(service.token_service.clone(), service.token_policy);
        Self {
            bridge,
            service,
            env,
            token,
            busy: None,
        }
    }

    /// Show `indicator` for the duration of every request.
    pub fn with_busy_indicator(mut self, indicator: Arc<dyn BusyIndicator>) -> Self {
        self.busy = Some(indicator);
        self
    }

    pub fn backend(&self) -> &str {
        &self.service.backend
    }

    pub async fn get(&self, path: &str) -> Result<Value> {
        self.send(path, Method::Get, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.send(path, Method::Post, Some(body)).await
    }

    /// Resolve a token and forward the request. Bridge errors propagate as-is.
    pub async fn send(&self, path: &str, method: Method, body: Option<&Value>) -> Result<Value> {
        let _busy = self.busy.as_deref().map(BusyGuard::show);

        let token = self.token.get_token(self.bridge.as_ref(), self.env.as_deref()).await?;
        let headers = match token {
            Some(token) => json!({ "Authorization": format!("Bearer {token}") }),
            // Broker gave no token: the Authorization header is omitted.
            None => json!({}),
        };

        let request = EngineRequest {
            service: &self.service.backend,
            method,
            env: self.env.as_deref(),
            body,
            path,
            headers,
        };

        tracing::debug!(
            service = %self.service.backend,
            method = method.as_str(),
            path,
            "engine request"
        );
        let payload = serde_json::to_value(&request)?;
        let reply = self.bridge.send(events::ENGINE_REQUEST, Some(payload)).await?;
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::TokenPolicy;
    use crate::testing::{CountingIndicator, ScriptedBridge};

    fn gateway(bridge: &Arc<ScriptedBridge>, env: Option<&str>) -> RequestGateway {
        RequestGateway::new(
            bridge.clone(),
            ServiceConfig::case_assistant(),
            env.map(str::to_string),
        )
    }

    #[tokio::test]
    async fn attaches_bearer_token_and_envelope() {
        let bridge = Arc::new(ScriptedBridge::new());
        bridge.reply(events::SSO_REQUEST, json!({ "token": "abc" }));
        bridge.reply(events::ENGINE_REQUEST, json!({ "ok": true }));

        let reply = gateway(&bridge, Some("test"))
            .post("/case/pulse/42", &json!({ "symptom": "s" }))
            .await
            .unwrap();
        assert_eq!(reply, json!({ "ok": true }));

        let sent = bridge.payloads(events::ENGINE_REQUEST);
        assert_eq!(
            sent[0],
            Some(json!({
                "service": "backend-case-assistant",
                "method": "POST",
                "env": "test",
                "body": { "symptom": "s" },
                "path": "/case/pulse/42",
                "headers": { "Authorization": "Bearer abc" }
            }))
        );
    }

    #[tokio::test]
    async fn get_omits_body_and_env() {
        let bridge = Arc::new(ScriptedBridge::new());
        bridge.reply(events::SSO_REQUEST, json!({ "token": "abc" }));

        gateway(&bridge, None).get("/case/pulse/1").await.unwrap();

        let sent = bridge.payloads(events::ENGINE_REQUEST)[0].clone().unwrap();
        assert!(sent.get("body").is_none());
        assert!(sent.get("env").is_none());
        assert_eq!(sent["method"], "GET");
    }

    #[tokio::test]
    async fn session_token_reused_across_requests() {
        let bridge = Arc::new(ScriptedBridge::new());
        bridge.reply(events::SSO_REQUEST, json!({ "token": "abc" }));

        let gw = gateway(&bridge, None);
        gw.get("/a").await.unwrap();
        gw.get("/b").await.unwrap();
        assert_eq!(bridge.count(events::SSO_REQUEST), 1);
        assert_eq!(bridge.count(events::ENGINE_REQUEST), 2);
    }

    #[tokio::test]
    async fn busy_indicator_hidden_after_failure() {
        let bridge = Arc::new(ScriptedBridge::new());
        bridge.reply(events::SSO_REQUEST, json!({ "token": "ge" }));
        bridge.fail(events::ENGINE_REQUEST, "connection reset");

        let indicator = Arc::new(CountingIndicator::default());
        let gw = RequestGateway::new(bridge.clone(), ServiceConfig::guided_engineering(), None)
            .with_busy_indicator(indicator.clone());

        assert!(gw.get("/automations/history/1").await.is_err());
        assert_eq!(*indicator.calls.lock().unwrap(), vec!["show", "hide"]);
    }

    #[tokio::test]
    async fn missing_token_sends_without_authorization() {
        let bridge = Arc::new(ScriptedBridge::new());
        let service = ServiceConfig {
            token_policy: TokenPolicy::EveryCall,
            ..ServiceConfig::case_assistant()
        };
        let gw = RequestGateway::new(bridge.clone(), service, None);

        gw.get("/x").await.unwrap();
        let sent = bridge.payloads(events::ENGINE_REQUEST)[0].clone().unwrap();
        assert_eq!(sent["headers"], json!({}));
    }
}
