//! Audit request and playback rate

use crate::{KairosError, Result};
use std::fmt;

/// Slowest accepted playback rate in words per minute
pub const MIN_RATE: u16 = 100;
/// Fastest accepted playback rate in words per minute
pub const MAX_RATE: u16 = 400;
/// Default operational speed
pub const DEFAULT_RATE: u16 = 200;

/// A playback rate known to lie in `MIN_RATE..=MAX_RATE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Rate(u16);

impl Rate {
    /// Validate a rate in words per minute
    ///
    /// Out-of-range values are rejected rather than clamped.
    pub fn new(wpm: i64) -> Result<Self> {
        if (MIN_RATE as i64..=MAX_RATE as i64).contains(&wpm) {
            Ok(Self(wpm as u16))
        } else {
            Err(KairosError::RateOutOfRange {
                wpm,
                min: MIN_RATE,
                max: MAX_RATE,
            })
        }
    }

    pub fn wpm(self) -> u16 {
        self.0
    }
}

impl Default for Rate {
    fn default() -> Self {
        Self(DEFAULT_RATE)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} WPM", self.0)
    }
}

/// One submission from the operator: raw buffer text plus a rate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRequest {
    raw_text: String,
    rate: Rate,
}

impl AuditRequest {
    /// Build a request, rejecting blank text and out-of-range rates
    pub fn new(raw_text: impl Into<String>, wpm: i64) -> Result<Self> {
        let raw_text = raw_text.into();
        if raw_text.trim().is_empty() {
            return Err(KairosError::EmptyInput);
        }

        Ok(Self {
            raw_text,
            rate: Rate::new(wpm)?,
        })
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn rate(&self) -> Rate {
        self.rate
    }
}
