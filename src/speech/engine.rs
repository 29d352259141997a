//! The single speech engine handle
//!
//! `Engine` owns the process-wide synthesizer. It is created once at
//! startup and handed to the audit coordinator, which moves it onto the
//! worker thread of whichever run is active.

use super::synth::{create_synth, BackendPreference, Synth};
use crate::audit::Rate;
use crate::error::SpeakError;
use crate::{KairosError, Result};
use log::{debug, info};

/// Output volume used for every audit
pub const UNITY_VOLUME: f32 = 1.0;

/// Owner of the live connection to the speech backend
pub struct Engine {
    synth: Box<dyn Synth>,
}

impl Engine {
    /// Acquire a backend and set unity volume
    ///
    /// Any failure here is a `KairosError::Init`; callers treat it as fatal.
    pub fn initialize(preference: BackendPreference) -> Result<Self> {
        let synth = create_synth(preference)?;
        Self::from_synth(synth)
    }

    /// Wrap an already constructed synthesizer
    pub fn from_synth(mut synth: Box<dyn Synth>) -> Result<Self> {
        synth.set_volume(UNITY_VOLUME).map_err(|e| {
            KairosError::Init(format!("{} backend rejected unity volume: {}", synth.name(), e))
        })?;

        info!("Speech engine ready ({} backend)", synth.name());
        Ok(Self { synth })
    }

    /// Name of the backend in use
    pub fn backend_name(&self) -> &'static str {
        self.synth.name()
    }

    /// Set playback rate for the next utterance
    pub fn configure(&mut self, rate: Rate) -> std::result::Result<(), SpeakError> {
        debug!("Configuring engine for {} WPM", rate.wpm());
        self.synth.set_rate(rate.wpm()).map_err(into_speak_error)
    }

    /// Speak text, blocking until playback completes
    pub fn speak(&mut self, text: &str) -> std::result::Result<(), SpeakError> {
        if text.trim().is_empty() {
            debug!("Nothing left to speak after sanitization");
            return Ok(());
        }

        self.synth.speak_and_wait(text).map_err(into_speak_error)
    }
}

fn into_speak_error(e: KairosError) -> SpeakError {
    match e {
        KairosError::Speak(inner) => inner,
        other => SpeakError::Backend(other.to_string()),
    }
}
