//! Speech synthesis system

pub mod backends;
pub mod engine;
pub mod synth;

pub use engine::{Engine, UNITY_VOLUME};
pub use synth::{create_synth, BackendPreference, Synth};
