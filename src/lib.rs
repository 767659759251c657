//! Core of the warden bot: configuration and the per-guild voice session
//! machinery shared by the command surface and the gateway event handler.

pub mod config;
pub mod voice;

/// Boxed error used at the command and event boundaries.
pub type Error = Box<dyn std::error::Error + Send + Sync>;
