//! Orchestration core of the casepad case notepad: authenticated requests to
//! the case-assistant and guided-engineering backends through an injected
//! host bridge, pulse access, automation payloads and history ordering.

pub mod bridge;
pub mod case;
pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod history;
pub mod notepad;
pub mod options;
pub mod pulse;
pub mod templates;
pub mod token;
pub mod version;

#[cfg(test)]
mod testing;

pub use bridge::{BusyIndicator, HostBridge};
pub use client::{CompanionClient, GuidedEngineering, HistoryReply};
pub use config::CompanionConfig;
pub use error::{BridgeError, CompanionError};
pub use pulse::{PulseLookup, PulseRecord};
