//! Per-version escaping of header names and values.
//!
//! 1.0 has no escaping at all. 1.1 defines `\\`, `\n` and `\c`; 1.2 adds
//! `\r`. Whether a given frame's headers are escaped at all is decided by
//! [`crate::spec::escape_excluded`]; the functions here only transform text.

use thiserror::Error;

use crate::spec::Version;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UnescapeError {
    #[error("undefined escape sequence: \\{0}")]
    UnknownSequence(char),

    #[error("incomplete escape sequence at end of input")]
    Truncated,
}

/// Escape every escapable character in `text` for the given version.
/// Returns the input unchanged under 1.0.
pub fn escape(version: Version, text: &str) -> String {
    if version == Version::V1_0 {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            ':' => out.push_str("\\c"),
            '\r' if version == Version::V1_2 => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out
}

/// Reverse [`escape`]. Under 1.0 the input passes through untouched; under
/// 1.1 and 1.2 an unknown or truncated sequence is an error.
pub fn unescape(version: Version, text: &str) -> Result<String, UnescapeError> {
    if version == Version::V1_0 {
        return Ok(text.to_string());
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('c') => out.push(':'),
            Some('r') if version == Version::V1_2 => out.push('\r'),
            Some(other) => return Err(UnescapeError::UnknownSequence(other)),
            None => return Err(UnescapeError::Truncated),
        }
    }
    Ok(out)
}
