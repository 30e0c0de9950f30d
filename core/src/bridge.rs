use async_trait::async_trait;
use serde_json::Value;

use crate::error::BridgeError;

/// Host event names understood by the bridge.
pub mod events {
    pub const ENGINE_REQUEST: &str = "engine-request";
    pub const SSO_REQUEST: &str = "engine-sso-request";
    pub const TRACK_ANALYTICS: &str = "engine-logger-track-hana";
    pub const OPEN_POPUP_WINDOW: &str = "browserwindow-isewindow-popupwindow-open";
    pub const GET_TEMPLATES: &str = "engine-case-get-templates";
}

/// Messaging port into the host application. Every backend call, token
/// request and UI side effect leaves the core through this trait.
#[async_trait]
pub trait HostBridge: Send + Sync {
    /// Deliver `event` with an optional JSON payload and return the host's reply.
    async fn send(&self, event: &str, payload: Option<Value>) -> Result<Value, BridgeError>;

    /// Version string of the host application (e.g. `1.6.44`).
    async fn host_version(&self) -> Result<String, BridgeError>;
}

/// Visual "working" signal owned by the UI layer.
pub trait BusyIndicator: Send + Sync {
    fn show(&self);
    fn hide(&self);
}

/// Shows the indicator on creation and hides it when dropped, whatever path
/// the surrounding call takes.
pub struct BusyGuard<'a> {
    indicator: &'a dyn BusyIndicator,
}

impl<'a> BusyGuard<'a> {
    pub fn show(indicator: &'a dyn BusyIndicator) -> Self {
        indicator.show();
        Self { indicator }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.indicator.hide();
    }
}
