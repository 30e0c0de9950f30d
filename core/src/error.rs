use thiserror::Error;

/// Failure reported by the host bridge itself, before any backend semantics apply.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The bridge could not be reached or the exchange broke mid-flight.
    #[error("bridge transport failed: {0}")]
    Transport(String),
    /// The host answered, but rejected the event.
    #[error("host rejected '{event}': {message}")]
    Host { event: String, message: String },
}

/// Every error the orchestration core surfaces to its callers.
#[derive(Debug, Error)]
pub enum CompanionError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    /// An automation runtime option could not be normalized.
    #[error("runtime option #{index} is invalid: {reason}")]
    InvalidOption { index: usize, reason: String },
    #[error("invalid version string '{0}'")]
    InvalidVersion(String),
    /// A backend reply did not have the shape the caller relies on.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The persisted notepad store could not be written.
    #[error("notepad store failed: {0}")]
    Store(String),
}

impl CompanionError {
    /// Machine-readable code, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            CompanionError::Bridge(BridgeError::Transport(_)) => codes::BRIDGE_UNAVAILABLE,
            CompanionError::Bridge(BridgeError::Host { .. }) => codes::HOST_REJECTED,
            CompanionError::InvalidOption { .. } => codes::INVALID_OPTION,
            CompanionError::InvalidVersion(_) => codes::INVALID_VERSION,
            CompanionError::MalformedResponse(_) => codes::MALFORMED_RESPONSE,
            CompanionError::Json(_) => codes::INVALID_JSON,
            CompanionError::Store(_) => codes::STORE_FAILED,
        }
    }
}

pub type Result<T, E = CompanionError> = std::result::Result<T, E>;

/// Error codes used across the core and the CLI
pub mod codes {
    pub const BRIDGE_UNAVAILABLE: &str = "bridge_unavailable";
    pub const HOST_REJECTED: &str = "host_rejected";
    pub const INVALID_OPTION: &str = "invalid_option";
    pub const INVALID_VERSION: &str = "invalid_version";
    pub const MALFORMED_RESPONSE: &str = "malformed_response";
    pub const INVALID_JSON: &str = "invalid_json";
    pub const STORE_FAILED: &str = "store_failed";
}
