//! Sanitization layer between untrusted forensic text and the speech backend
//!
//! Speech backends may treat some symbol sequences as markup or control
//! directives. Everything outside a small allow-list is stripped before
//! text is handed to a synthesizer.

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches every character that is not allowed through to the backend
static DISALLOWED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^A-Za-z0-9\s.,!?\-]").expect("sanitizer pattern is valid")
});

/// Remove every character that is not an ASCII letter or digit,
/// whitespace, or one of `. , ! ? -`
pub fn clean(text: &str) -> String {
    DISALLOWED.replace_all(text, "").into_owned()
}
