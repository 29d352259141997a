//! Kairos - auditory inspection of forensic text
//!
//! Reads pasted logs or buffers aloud through a text-to-speech engine.
//! Input is sanitized before it reaches the engine, and at most one audit
//! plays at a time on a background thread so the interface stays responsive.

pub mod audit;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod platform;
pub mod sanitize;
pub mod shell;
pub mod speech;

pub use error::{KairosError, Result, SpeakError};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "kairos";
