//! Configuration management

use crate::audit::Rate;
use crate::speech::BackendPreference;
use crate::{KairosError, Result};
use ini::Ini;
use log::{debug, warn};
use std::path::{Path, PathBuf};

/// Application configuration
///
/// Backed by an INI file, `~/.kairos.cfg` unless a path is given.
pub struct Config {
    ini: Ini,
    path: PathBuf,
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_path())
    }

    /// Load configuration from `path`
    ///
    /// A missing file is not an error: defaults are used in memory and
    /// nothing is written until `save` is called.
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        debug!("Loading config from {:?}", path);

        if !path.exists() {
            warn!("Config file {:?} not found, using defaults", path);
            return Ok(Self::defaults(path));
        }

        let ini = Ini::load_from_file(&path)
            .map_err(|e| KairosError::IniParse(format!("Failed to load config: {}", e)))?;
        Ok(Self { ini, path })
    }

    /// Built-in defaults, saved to `path` on request
    pub fn defaults(path: impl Into<PathBuf>) -> Self {
        Self {
            ini: Self::default_config(),
            path: path.into(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        debug!("Saving config to {:?}", self.path);
        self.ini
            .write_to_file(&self.path)
            .map_err(|e| KairosError::Config(format!("Failed to save config: {}", e)))
    }

    /// `~/.kairos.cfg`, or `./.kairos.cfg` without a home directory
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".kairos.cfg")
    }

    /// Expose the config file path for display
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn default_config() -> Ini {
        let mut ini = Ini::new();

        ini.with_section(Some("speech")).set("backend", "auto");

        ini.with_section(Some("audit"))
            .set("default_rate", Rate::default().wpm().to_string());

        ini
    }

    /// Get a string value from config
    pub fn get_string(&self, section: &str, key: &str, default: &str) -> String {
        self.ini
            .get_from(Some(section), key)
            .unwrap_or(default)
            .to_string()
    }

    /// Get an integer value from config
    pub fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.ini
            .get_from(Some(section), key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Set a value in config
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.ini.with_section(Some(section)).set(key, value);
    }

    /// Which speech backend to initialize
    pub fn backend(&self) -> BackendPreference {
        let raw = self.get_string("speech", "backend", "auto");
        raw.parse().unwrap_or_else(|e| {
            warn!("{}, using auto", e);
            BackendPreference::Auto
        })
    }

    /// Playback rate the shell starts with
    pub fn default_rate(&self) -> Rate {
        let wpm = self.get_int("audit", "default_rate", i64::from(Rate::default().wpm()));
        Rate::new(wpm).unwrap_or_else(|e| {
            warn!("Ignoring configured default_rate: {}", e);
            Rate::default()
        })
    }
}
