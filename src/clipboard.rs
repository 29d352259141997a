//! Clipboard integration

use crate::{KairosError, Result};
use arboard::Clipboard;
use log::debug;

/// Get text from system clipboard
pub fn get_from_clipboard() -> Result<String> {
    debug!("Getting text from clipboard");

    let mut clipboard = Clipboard::new()
        .map_err(|e| KairosError::Clipboard(format!("Failed to open clipboard: {}", e)))?;

    let text = clipboard
        .get_text()
        .map_err(|e| KairosError::Clipboard(format!("Failed to read clipboard: {}", e)))?;

    debug!("Read {} chars from clipboard", text.len());
    Ok(text)
}
