use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;

use crate::bridge::{HostBridge, events};
use crate::config::TokenPolicy;
use crate::error::Result;

#[derive(Debug, Deserialize)]
struct SsoReply {
    #[serde(default)]
    token: Option<String>,
}

/// Single-slot bearer token holder for one backend service.
///
/// With [`TokenPolicy::Session`] the first token the SSO broker hands out is
/// reused until the slot is dropped; expiry is never checked. With
/// [`TokenPolicy::EveryCall`] the broker is asked on every lookup and nothing
/// is stored.
pub struct TokenSlot {
    token_service: String,
    policy: TokenPolicy,
    cached: Mutex<Option<String>>,
}

impl TokenSlot {
    pub fn new(token_service: impl Into<String>, policy: TokenPolicy) -> Self {
        Self {
            token_service: token_service.into(),
            policy,
            cached: Mutex::new(None),
        }
    }

    pub fn token_service(&self) -> &str {
        &self.token_service
    }

    /// Resolve a token, fetching from the broker when the slot is empty.
    /// `Ok(None)` means the broker answered without a token.
    pub async fn get_token(
        &self,
        bridge: &dyn HostBridge,
        env: Option<&str>,
    ) -> Result<Option<String>> {
        if self.policy == TokenPolicy::EveryCall {
            return self.fetch(bridge, env).await;
        }

        // Held across the fetch: concurrent first uses share one broker call.
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(Some(token.clone()));
        }

        let token = self.fetch(bridge, env).await?;
        if token.is_some() {
            *cached = token.clone();
        }
        Ok(token)
    }

    async fn fetch(&self, bridge: &dyn HostBridge, env: Option<&str>) -> Result<Option<String>> {
        let mut payload = json!({ "service": self.token_service });
        if let Some(env) = env {
            payload["env"] = json!(env);
        }

        tracing::debug!(token_service = %self.token_service, "requesting bearer token");
        let reply = bridge.send(events::SSO_REQUEST, Some(payload)).await?;
        let token = serde_json::from_value::<SsoReply>(reply)
            .ok()
            .and_then(|r| r.token)
            .filter(|t| !t.is_empty());

        if token.is_none() {
            tracing::warn!(token_service = %self.token_service, "SSO broker returned no token");
        }
        Ok(token)
    }
}
