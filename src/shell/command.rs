//! Operator input parsing
//!
//! Lines starting with `:` are commands, everything else is buffer text.
//! A leading `::` escapes a literal colon.

use crate::{KairosError, Result};

/// Shell commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Trigger an audit of the buffer
    Run,
    /// Change playback rate (WPM, validated by the shell)
    Rate(i64),
    /// Append clipboard contents to the buffer
    Paste,
    /// Print the buffer
    Show,
    /// Empty the buffer
    Clear,
    /// Print rate, backend and trigger state
    Status,
    /// Store the current rate as the configured default
    Save,
    Help,
    Quit,
}

/// One parsed line of operator input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Text(String),
    Command(Command),
}

pub const HELP: &str = "\
Paste or type text to fill the forensic input buffer, then:
  :run        execute audit (speak the buffer)
  :rate N     set playback rate, 100-400 WPM
  :paste      append clipboard contents
  :show       print the buffer
  :clear      empty the buffer
  :status     show rate and engine state
  :save       remember the current rate
  :help       show this help
  :quit       exit
Start a line with :: to enter text beginning with a colon.";

/// Parse a single line of input
pub fn parse_line(line: &str) -> Result<Input> {
    if let Some(literal) = line.strip_prefix("::") {
        return Ok(Input::Text(format!(":{}", literal)));
    }

    let Some(command) = line.strip_prefix(':') else {
        return Ok(Input::Text(line.to_string()));
    };

    let mut words = command.split_whitespace();
    let name = words.next().unwrap_or("");
    let arg = words.next();

    let parsed = match (name, arg) {
        ("run" | "r" | "audit", None) => Command::Run,
        ("rate", Some(value)) => Command::Rate(value.parse().map_err(|_| {
            KairosError::Other(format!("'{}' is not a number of words per minute", value))
        })?),
        ("rate", None) => return Err(KairosError::Other("usage: :rate N".to_string())),
        ("paste" | "p", None) => Command::Paste,
        ("show", None) => Command::Show,
        ("clear", None) => Command::Clear,
        ("status", None) => Command::Status,
        ("save", None) => Command::Save,
        ("help" | "h" | "?", None) => Command::Help,
        ("quit" | "q" | "exit", None) => Command::Quit,
        _ => {
            return Err(KairosError::Other(format!(
                "unknown command ':{}' (try :help)",
                command.trim()
            )))
        }
    };

    if words.next().is_some() {
        return Err(KairosError::Other(format!("too many arguments: ':{}'", command.trim())));
    }

    Ok(Input::Command(parsed))
}
