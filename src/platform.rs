//! Host detection for audio routing

use std::fs;
use std::path::{Path, PathBuf};

/// PulseAudio socket exposed by WSLg
pub const WSLG_PULSE_SERVER: &str = "/mnt/wslg/PulseServer";

/// Detect if running in WSL (Windows Subsystem for Linux)
///
/// Checks for WSL-specific indicators in /proc/version and environment variables.
pub fn is_wsl() -> bool {
    if let Ok(contents) = fs::read_to_string("/proc/version") {
        if mentions_wsl(&contents) {
            return true;
        }
    }

    std::env::var("WSL_DISTRO_NAME").is_ok()
}

fn mentions_wsl(proc_version: &str) -> bool {
    let lower = proc_version.to_lowercase();
    lower.contains("microsoft") || lower.contains("wsl")
}

/// Locate the PulseAudio server speech output should be routed to
///
/// An explicit `PULSE_SERVER` wins; otherwise the WSLg socket is used when
/// present. `None` means the client library default applies.
pub fn pulse_server() -> Option<PathBuf> {
    if let Some(server) = std::env::var_os("PULSE_SERVER") {
        return Some(PathBuf::from(server));
    }

    let wslg = Path::new(WSLG_PULSE_SERVER);
    wslg.exists().then(|| wslg.to_path_buf())
}
