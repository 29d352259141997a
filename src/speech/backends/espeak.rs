//! espeak-ng backend routed through PulseAudio
//!
//! This is the most reliable path on WSL with WSLg, where PulseAudio is
//! exposed at /mnt/wslg/PulseServer and speech-dispatcher is usually
//! missing. Each utterance runs one espeak-ng process that is waited on,
//! so `speak_and_wait` blocks for exactly the playback duration.
//!
//! Dependencies:
//! - espeak-ng (install with: sudo apt install espeak-ng)
//! - PulseAudio client libraries (usually pre-installed with WSLg)

use crate::platform::{is_wsl, pulse_server};
use crate::speech::Synth;
use crate::{KairosError, Result};
use log::{debug, error, info, warn};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

/// espeak-ng amplitude that corresponds to unity gain
const UNITY_AMPLITUDE: f32 = 100.0;

/// espeak-ng's own default speed in WPM
const ESPEAK_DEFAULT_SPEED: u16 = 175;

/// espeak-ng backend
pub struct EspeakSynth {
    /// Rate in words per minute, passed straight to `-s`
    speed: u16,

    /// Amplitude for `-a`
    amplitude: u16,

    /// PulseAudio server handed to each child process
    pulse_server: Option<PathBuf>,

    /// Path to espeak-ng
    espeak_path: String,
}

impl EspeakSynth {
    /// Create a new espeak-ng synthesizer
    ///
    /// Fails when espeak-ng is not installed, or on WSL when no
    /// PulseAudio server can be found.
    pub fn new() -> Result<Self> {
        debug!("Creating espeak-ng backend");

        let pulse_server = pulse_server();
        match &pulse_server {
            Some(server) => info!("Routing speech to PulseAudio server {}", server.display()),
            None if is_wsl() => {
                warn!("WSLg PulseAudio server not found");
                warn!("Make sure WSLg is installed and running, or set PULSE_SERVER");
                return Err(KairosError::Init(
                    "PulseAudio server not found. Install WSLg or set PULSE_SERVER.".to_string(),
                ));
            }
            None => debug!("Using default PulseAudio configuration"),
        }

        let espeak_path = Self::find_espeak()?;
        debug!("Found espeak-ng at: {}", espeak_path);

        Ok(Self {
            speed: ESPEAK_DEFAULT_SPEED,
            amplitude: UNITY_AMPLITUDE as u16,
            pulse_server,
            espeak_path,
        })
    }

    /// Find espeak-ng executable
    fn find_espeak() -> Result<String> {
        for path in ["espeak-ng", "/usr/bin/espeak-ng"] {
            if let Ok(status) = Command::new(path)
                .arg("--version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
            {
                if status.success() {
                    return Ok(path.to_string());
                }
            }
        }

        Err(KairosError::Init(
            "espeak-ng not found. Install with: sudo apt install espeak-ng".to_string(),
        ))
    }

    /// Convert a 0.0-1.0 volume to espeak amplitude (0-200, 100 is unity)
    fn volume_to_amplitude(volume: f32) -> u16 {
        (volume.clamp(0.0, 2.0) * UNITY_AMPLITUDE).round() as u16
    }

    /// Write `text` to the child's stdin and close it
    ///
    /// If the child stops reading (e.g. it already exited), it is killed
    /// and reaped before the error is returned.
    fn feed_stdin(child: &mut Child, text: &str) -> Result<()> {
        let Some(mut stdin) = child.stdin.take() else {
            return Ok(());
        };

        if let Err(e) = stdin.write_all(text.as_bytes()) {
            drop(stdin);
            let _ = child.kill();
            match child.wait() {
                Ok(status) => debug!("espeak-ng reaped after failed write: {}", status),
                Err(wait_err) => warn!("Failed to reap espeak-ng: {}", wait_err),
            }
            return Err(KairosError::backend(format!("Failed to send text: {}", e)));
        }

        // Dropping stdin closes the pipe so espeak-ng sees EOF
        Ok(())
    }

    /// Arguments for one utterance; text itself is fed on stdin
    fn args(&self) -> Vec<String> {
        vec![
            "-s".to_string(),
            self.speed.to_string(),
            "-a".to_string(),
            self.amplitude.to_string(),
            "--stdin".to_string(),
        ]
    }
}

impl Synth for EspeakSynth {
    fn name(&self) -> &'static str {
        "espeak"
    }

    fn set_rate(&mut self, wpm: u16) -> Result<()> {
        debug!("Setting speed to {} WPM", wpm);
        self.speed = wpm;
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<()> {
        self.amplitude = Self::volume_to_amplitude(volume);
        debug!("Setting amplitude to {}", self.amplitude);
        Ok(())
    }

    fn speak_and_wait(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }

        let mut cmd = Command::new(&self.espeak_path);
        cmd.args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        if let Some(server) = &self.pulse_server {
            cmd.env("PULSE_SERVER", server);
        }

        let mut child = cmd.spawn().map_err(|e| {
            error!("Failed to spawn espeak-ng: {}", e);
            KairosError::backend(format!("Failed to start espeak-ng: {}", e))
        })?;
        debug!("espeak-ng process started with PID {}", child.id());

        Self::feed_stdin(&mut child, text)?;

        let output = child
            .wait_with_output()
            .map_err(|e| KairosError::backend(format!("Failed to wait for espeak-ng: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KairosError::backend(format!(
                "espeak-ng exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        debug!("espeak-ng finished");
        Ok(())
    }
}
