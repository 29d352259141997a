//! Speech synthesizer abstraction
//!
//! Every backend implements `Synth`. Audits only ever need three things
//! from a backend: a rate, a volume, and a blocking "speak this".

use crate::platform::is_wsl;
use crate::{KairosError, Result};
use log::info;
use std::fmt;
use std::str::FromStr;

/// Speech synthesizer trait
///
/// Implementations are moved onto the worker thread of each audit run,
/// hence the `Send` bound.
pub trait Synth: Send {
    /// Short backend name for logs and status output
    fn name(&self) -> &'static str;

    /// Set playback rate in words per minute
    fn set_rate(&mut self, wpm: u16) -> Result<()>;

    /// Set output volume, 0.0 (silent) to 1.0 (unity)
    fn set_volume(&mut self, volume: f32) -> Result<()>;

    /// Speak text and block until playback has finished
    fn speak_and_wait(&mut self, text: &str) -> Result<()>;
}

/// Which backend family to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendPreference {
    /// espeak-ng first on WSL, the native engine first elsewhere
    #[default]
    Auto,
    /// The platform engine through the `tts` crate
    Native,
    /// espeak-ng through PulseAudio
    Espeak,
}

impl FromStr for BackendPreference {
    type Err = KairosError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "native" | "tts" => Ok(Self::Native),
            "espeak" | "espeak-ng" => Ok(Self::Espeak),
            other => Err(KairosError::Config(format!(
                "unknown speech backend '{}' (expected auto, native or espeak)",
                other
            ))),
        }
    }
}

impl fmt::Display for BackendPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Auto => "auto",
            Self::Native => "native",
            Self::Espeak => "espeak",
        };
        f.write_str(name)
    }
}

type Constructor = fn() -> Result<Box<dyn Synth>>;

fn native() -> Result<Box<dyn Synth>> {
    use super::backends::native::NativeSynth;
    Ok(Box::new(NativeSynth::new()?))
}

fn espeak() -> Result<Box<dyn Synth>> {
    use super::backends::espeak::EspeakSynth;
    Ok(Box::new(EspeakSynth::new()?))
}

/// Backends to try, in order, for a preference on this host
fn candidates(preference: BackendPreference, wsl: bool) -> Vec<(&'static str, Constructor)> {
    match preference {
        BackendPreference::Native => vec![("native", native as Constructor)],
        BackendPreference::Espeak => vec![("espeak", espeak as Constructor)],
        // WSLg routes audio through PulseAudio; speech-dispatcher is rarely set up there
        BackendPreference::Auto if wsl => vec![
            ("espeak", espeak as Constructor),
            ("native", native as Constructor),
        ],
        BackendPreference::Auto => vec![
            ("native", native as Constructor),
            ("espeak", espeak as Constructor),
        ],
    }
}

/// Create a speech synthesizer for the given preference
///
/// Tries each candidate backend in turn and returns the first one that
/// initializes. When none does, the collected failures are reported as a
/// single `KairosError::Init`.
pub fn create_synth(preference: BackendPreference) -> Result<Box<dyn Synth>> {
    let wsl = is_wsl();
    if wsl {
        info!("Detected WSL environment");
    }

    let mut failures = Vec::new();
    for (name, construct) in candidates(preference, wsl) {
        info!("Trying {} speech backend...", name);
        match construct() {
            Ok(synth) => {
                info!("✓ Initialized {} backend", synth.name());
                return Ok(synth);
            }
            Err(e) => {
                info!("✗ {} backend unavailable: {}", name, e);
                failures.push(format!("{}: {}", name, e));
            }
        }
    }

    Err(KairosError::Init(format!(
        "no speech backend available (preference '{}'). Tried:\n  {}\n\
         Install speech-dispatcher or espeak-ng (sudo apt install espeak-ng)",
        preference,
        failures.join("\n  ")
    )))
}
