//! Scripted speech backends shared by the integration tests

#![allow(dead_code)]

use kairos::speech::Synth;
use kairos::{KairosError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Upper bound for anything a test waits on
pub const TIMEOUT: Duration = Duration::from_secs(5);

/// Observations made by a scripted backend
#[derive(Default)]
pub struct Probe {
    pub calls: Mutex<Vec<String>>,
    active: AtomicUsize,
    pub max_active: AtomicUsize,
}

impl Probe {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

/// Backend that records every call and plays instantly
///
/// Text containing `FAIL` makes `speak_and_wait` return an error.
pub struct RecordingSynth {
    probe: Arc<Probe>,
}

impl RecordingSynth {
    pub fn new() -> (Self, Arc<Probe>) {
        let probe = Arc::new(Probe::default());
        (Self { probe: probe.clone() }, probe)
    }
}

impl Synth for RecordingSynth {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn set_rate(&mut self, wpm: u16) -> Result<()> {
        self.probe.record(format!("rate {}", wpm));
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<()> {
        self.probe.record(format!("volume {}", volume));
        Ok(())
    }

    fn speak_and_wait(&mut self, text: &str) -> Result<()> {
        self.probe.record(format!("speak {}", text));
        if text.contains("FAIL") {
            return Err(KairosError::backend("audio sink disappeared"));
        }
        Ok(())
    }
}

/// Backend whose playback lasts until the test releases it
pub struct GatedSynth {
    probe: Arc<Probe>,
    release: Receiver<()>,
}

impl GatedSynth {
    /// Returns the synth, its probe, and the sender that ends one playback
    pub fn new() -> (Self, Arc<Probe>, Sender<()>) {
        let probe = Arc::new(Probe::default());
        let (tx, rx) = mpsc::channel();
        (
            Self {
                probe: probe.clone(),
                release: rx,
            },
            probe,
            tx,
        )
    }
}

impl Synth for GatedSynth {
    fn name(&self) -> &'static str {
        "gated"
    }

    fn set_rate(&mut self, wpm: u16) -> Result<()> {
        self.probe.record(format!("rate {}", wpm));
        Ok(())
    }

    fn set_volume(&mut self, _volume: f32) -> Result<()> {
        Ok(())
    }

    fn speak_and_wait(&mut self, text: &str) -> Result<()> {
        let active = self.probe.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.probe.max_active.fetch_max(active, Ordering::SeqCst);
        self.probe.record(format!("speak {}", text));

        let released = self.release.recv_timeout(TIMEOUT);
        self.probe.active.fetch_sub(1, Ordering::SeqCst);

        released.map_err(|_| KairosError::backend("test never released playback"))
    }
}
