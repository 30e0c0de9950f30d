pub mod automation;
pub mod case;
pub mod host;
pub mod notepad;
pub mod pulse;
