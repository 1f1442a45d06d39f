//! Newline normalization on decoded text.
//!
//! Normalization always operates on the decoded `String`, never on raw
//! bytes, so multi-byte sequences can never be split.

use std::borrow::Cow;

/// Requested newline treatment for the converted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NewlineNormalization {
    /// Leave line endings exactly as decoded.
    #[default]
    None,
    /// Normalize every line ending to LF.
    Unix,
    /// Normalize every line ending to CRLF.
    Windows,
}

impl NewlineNormalization {
    pub fn from_flag(flag: &str) -> Option<Self> {
        match flag {
            "none" => Some(NewlineNormalization::None),
            "unix" => Some(NewlineNormalization::Unix),
            "windows" => Some(NewlineNormalization::Windows),
            _ => None,
        }
    }
}

/// Apply the requested normalization. Lone CR, LF and CRLF all count as one
/// line ending.
pub fn normalize(text: &str, style: NewlineNormalization) -> Cow<'_, str> {
    match style {
        NewlineNormalization::None => Cow::Borrowed(text),
        NewlineNormalization::Unix => {
            if !text.contains('\r') {
                return Cow::Borrowed(text);
            }
            Cow::Owned(to_unix(text))
        }
        NewlineNormalization::Windows => {
            if is_all_crlf(text) {
                return Cow::Borrowed(text);
            }
            let unix = to_unix(text);
            Cow::Owned(unix.replace('\n', "\r\n"))
        }
    }
}

fn to_unix(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            out.push('\n');
        } else {
            out.push(ch);
        }
    }
    out
}

fn is_all_crlf(text: &str) -> bool {
    let bytes = text.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'\n' && (i == 0 || bytes[i - 1] != b'\r') {
            return false;
        }
        if b == b'\r' && bytes.get(i + 1) != Some(&b'\n') {
            return false;
        }
    }
    true
}
