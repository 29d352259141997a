//! Error types for Kairos

use std::io;
use thiserror::Error;

/// Failure while synthesizing a single audit run
///
/// Travels inside `AuditEvent::RunFinished`, so it is cheap to clone.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpeakError {
    #[error("speech backend failed: {0}")]
    Backend(String),

    #[error("speech backend panicked: {0}")]
    Panicked(String),
}

/// Main error type for Kairos
#[derive(Error, Debug)]
pub enum KairosError {
    #[error("Speech engine initialization failed: {0}")]
    Init(String),

    #[error("Input buffer is empty")]
    EmptyInput,

    #[error("An audit is already in progress")]
    Busy,

    #[error("Playback rate {wpm} WPM is outside {min}..={max}")]
    RateOutOfRange { wpm: i64, min: u16, max: u16 },

    #[error("Speech synthesis error: {0}")]
    Speak(#[from] SpeakError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("INI parse error: {0}")]
    IniParse(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Other(String),
}

impl KairosError {
    /// Runtime failure reported by a speech backend
    pub fn backend(msg: impl Into<String>) -> Self {
        KairosError::Speak(SpeakError::Backend(msg.into()))
    }

    /// Whether the process must stop after surfacing this error
    pub fn is_fatal(&self) -> bool {
        matches!(self, KairosError::Init(_))
    }
}

/// Result type alias for Kairos operations
pub type Result<T> = std::result::Result<T, KairosError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_init_is_fatal() {
        assert!(KairosError::Init("no backend".into()).is_fatal());
        assert!(!KairosError::EmptyInput.is_fatal());
        assert!(!KairosError::Busy.is_fatal());
        assert!(!KairosError::Speak(SpeakError::Backend("x".into())).is_fatal());
    }

    #[test]
    fn test_rate_message() {
        let err = KairosError::RateOutOfRange { wpm: 50, min: 100, max: 400 };
        assert_eq!(err.to_string(), "Playback rate 50 WPM is outside 100..=400");
    }
}
