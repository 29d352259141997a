//! Native TTS backend using the tts crate
//!
//! The `tts` crate fronts Speech Dispatcher on Linux, AVFoundation on
//! macOS and SAPI/WinRT on Windows. Its `speak` call only enqueues, so
//! blocking playback is built on top: utterance end/stop callbacks where
//! the platform has them, `is_speaking` polling otherwise.

use crate::audit::{DEFAULT_RATE, MAX_RATE, MIN_RATE};
use crate::speech::Synth;
use crate::{KairosError, Result};
use log::{debug, error, warn};
use std::fmt;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tts::{Tts as TtsCrate, UtteranceId};

/// How often playback state is polled while waiting
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long a polled utterance may take to start playing
const START_GRACE: Duration = Duration::from_secs(5);

/// Fixed part of the playback deadline
const PLAYBACK_SLACK: Duration = Duration::from_secs(30);

/// Per-character part of the playback deadline; at MIN_RATE speech
/// runs near ten characters per second
const PLAYBACK_PER_CHAR: Duration = Duration::from_millis(150);

/// Utterance lifecycle notification from the backend
#[derive(Debug, Clone, PartialEq, Eq)]
enum Playback<K> {
    Ended(K),
    Stopped(K),
}

/// Comparable form of an utterance id
///
/// `UtteranceId` has no `PartialEq` on every platform, but always has `Debug`.
type UtteranceKey = String;

fn utterance_key(id: &UtteranceId) -> UtteranceKey {
    format!("{:?}", id)
}

/// Native TTS backend using the tts crate
pub struct NativeSynth {
    tts: TtsCrate,

    /// Backend rate range as (min, normal, max)
    rate_range: (f32, f32, f32),

    /// End/stop notifications, when the backend supports callbacks
    playback: Option<Receiver<Playback<UtteranceKey>>>,
}

impl NativeSynth {
    /// Create a new native TTS synthesizer
    ///
    /// Fails when the platform can report neither utterance callbacks
    /// nor playback state, since playback could not be waited on.
    pub fn new() -> Result<Self> {
        debug!("Creating native TTS backend");

        let tts = TtsCrate::default()
            .map_err(|e| KairosError::Init(format!("Failed to initialize TTS: {}", e)))?;
        let rate_range = (tts.min_rate(), tts.normal_rate(), tts.max_rate());

        let features = tts.supported_features();
        let playback = if features.utterance_callbacks {
            Some(Self::register_callbacks(&tts)?)
        } else if features.is_speaking {
            debug!("No utterance callbacks, falling back to polling");
            None
        } else {
            return Err(KairosError::Init(
                "TTS backend cannot report when playback ends".to_string(),
            ));
        };

        debug!("Native TTS backend created, rate range {:?}", rate_range);
        Ok(Self {
            tts,
            rate_range,
            playback,
        })
    }

    /// Route utterance end/stop callbacks into a channel
    fn register_callbacks(tts: &TtsCrate) -> Result<Receiver<Playback<UtteranceKey>>> {
        let (tx, rx) = mpsc::channel();
        let stop_tx = tx.clone();

        tts.on_utterance_end(Some(Box::new(move |id: UtteranceId| {
            let _ = tx.send(Playback::Ended(utterance_key(&id)));
        })))
        .map_err(|e| KairosError::Init(format!("Failed to register end callback: {}", e)))?;

        tts.on_utterance_stop(Some(Box::new(move |id: UtteranceId| {
            let _ = stop_tx.send(Playback::Stopped(utterance_key(&id)));
        })))
        .map_err(|e| KairosError::Init(format!("Failed to register stop callback: {}", e)))?;

        Ok(rx)
    }

    /// Map words per minute onto the backend's own rate scale
    ///
    /// Anchors are MIN_RATE -> min, DEFAULT_RATE -> normal and
    /// MAX_RATE -> max, interpolated linearly in between.
    fn convert_rate(wpm: u16, (min, normal, max): (f32, f32, f32)) -> f32 {
        let wpm = wpm.clamp(MIN_RATE, MAX_RATE) as f32;
        let (low, mid, high) = (MIN_RATE as f32, DEFAULT_RATE as f32, MAX_RATE as f32);

        if wpm >= mid {
            normal + (max - normal) * (wpm - mid) / (high - mid)
        } else {
            min + (normal - min) * (wpm - low) / (mid - low)
        }
    }

    fn is_speaking(&self) -> Result<bool> {
        self.tts
            .is_speaking()
            .map_err(|e| KairosError::backend(format!("Failed to query playback: {}", e)))
    }
}

/// Upper bound on how long `text` may take to play
fn playback_budget(text: &str) -> Duration {
    let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
    PLAYBACK_SLACK.saturating_add(PLAYBACK_PER_CHAR.saturating_mul(chars))
}

/// Block until the backend reports the end of utterance `id`
///
/// Notifications for other utterances are skipped. A stop, a missed
/// deadline or a dropped channel is an error.
fn wait_for_utterance<K>(events: &Receiver<Playback<K>>, id: &K, budget: Duration) -> Result<()>
where
    K: PartialEq + fmt::Debug,
{
    let deadline = Instant::now() + budget;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match events.recv_timeout(remaining) {
            Ok(Playback::Ended(done)) if &done == id => return Ok(()),
            Ok(Playback::Stopped(stopped)) if &stopped == id => {
                return Err(KairosError::backend(format!(
                    "Utterance {:?} was stopped before it finished",
                    id
                )));
            }
            Ok(other) => debug!("Ignoring notification for another utterance: {:?}", other),
            Err(RecvTimeoutError::Timeout) => {
                return Err(KairosError::backend(format!(
                    "Utterance {:?} did not finish within {:?}",
                    id, budget
                )));
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(KairosError::backend("Playback callbacks were unregistered"));
            }
        }
    }
}

/// Poll `is_speaking` until playback has started and then stopped
///
/// Playback that never starts within `start_grace` is an error, not a
/// finished utterance.
fn poll_until_done(
    mut is_speaking: impl FnMut() -> Result<bool>,
    start_grace: Duration,
    interval: Duration,
    budget: Duration,
) -> Result<()> {
    let started = Instant::now();
    while !is_speaking()? {
        if started.elapsed() >= start_grace {
            return Err(KairosError::backend(format!(
                "Utterance never started playing within {:?}",
                start_grace
            )));
        }
        thread::sleep(interval);
    }

    while is_speaking()? {
        if started.elapsed() >= budget {
            return Err(KairosError::backend(format!(
                "Utterance did not finish within {:?}",
                budget
            )));
        }
        thread::sleep(interval);
    }

    debug!("Utterance finished after {:?}", started.elapsed());
    Ok(())
}

impl Synth for NativeSynth {
    fn name(&self) -> &'static str {
        "native"
    }

    fn set_rate(&mut self, wpm: u16) -> Result<()> {
        if !self.tts.supported_features().rate {
            warn!("Rate control not supported on this platform");
            return Ok(());
        }

        let converted = Self::convert_rate(wpm, self.rate_range);
        debug!("Setting rate to {} WPM (backend rate {})", wpm, converted);
        self.tts
            .set_rate(converted)
            .map_err(|e| KairosError::backend(format!("Failed to set rate: {}", e)))?;

        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<()> {
        if !self.tts.supported_features().volume {
            warn!("Volume control not supported on this platform");
            return Ok(());
        }

        let converted = volume.clamp(0.0, 1.0) * self.tts.max_volume();
        debug!("Setting volume to {}", converted);
        self.tts
            .set_volume(converted)
            .map_err(|e| KairosError::backend(format!("Failed to set volume: {}", e)))?;

        Ok(())
    }

    fn speak_and_wait(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }

        // Drop notifications left over from an earlier utterance
        if let Some(events) = &self.playback {
            while events.try_recv().is_ok() {}
        }

        debug!("Speaking {} chars", text.len());
        let id = self.tts.speak(text, false).map_err(|e| {
            error!("Failed to speak: {}", e);
            KairosError::backend(format!("Speak failed: {}", e))
        })?;

        let budget = playback_budget(text);
        match (&self.playback, id) {
            (Some(events), Some(id)) => wait_for_utterance(events, &utterance_key(&id), budget),
            _ => {
                warn!("No utterance id to wait on, polling playback state");
                poll_until_done(|| self.is_speaking(), START_GRACE, POLL_INTERVAL, budget)
            }
        }
    }
}
