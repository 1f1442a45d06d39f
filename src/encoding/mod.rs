//! Encoding engine: detection, safe decoding and re-encoding of subtitle
//! byte streams.
//!
//! Everything here treats the file as an opaque text blob. `encoding_rs`
//! supplies the legacy code pages and the UTF family decoders; UTF-16 and
//! UTF-32 output (which encoding_rs does not provide) is serialized by hand
//! in [`wide`].

pub mod bom;
pub mod decode;
pub mod detect;
pub mod encode;
pub mod eol;
pub mod wide;

pub use decode::DecodedText;
pub use detect::EncodingGuess;

use crate::error::ConvertError;

/// A concrete text encoding.
///
/// Wraps the `encoding_rs` statics and adds the UTF-32 variants, which
/// encoding_rs has no support for but whose BOMs must still be honored.
/// Comparison is cheap: the `encoding_rs` statics are unique per encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Rs(&'static encoding_rs::Encoding),
    Utf32Le,
    Utf32Be,
}

pub static UTF_8: TextEncoding = TextEncoding::Rs(encoding_rs::UTF_8);
pub static UTF_16LE: TextEncoding = TextEncoding::Rs(encoding_rs::UTF_16LE);
pub static UTF_16BE: TextEncoding = TextEncoding::Rs(encoding_rs::UTF_16BE);

impl TextEncoding {
    /// Resolve a user-supplied label (case-insensitive, WHATWG labels plus
    /// the UTF-32 spellings) into an encoding.
    pub fn for_label(label: &str) -> Option<TextEncoding> {
        let trimmed = label.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "utf-32" | "utf32" | "utf-32le" | "utf32le" => Some(TextEncoding::Utf32Le),
            "utf-32be" | "utf32be" => Some(TextEncoding::Utf32Be),
            _ => encoding_rs::Encoding::for_label(trimmed.as_bytes()).map(TextEncoding::Rs),
        }
    }

    /// Canonical name, e.g. `UTF-8`, `windows-1256`, `UTF-32LE`.
    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Rs(enc) => enc.name(),
            TextEncoding::Utf32Le => "UTF-32LE",
            TextEncoding::Utf32Be => "UTF-32BE",
        }
    }
}

impl std::fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolve a label or fail with `UnknownEncoding`.
pub fn resolve_label(label: &str) -> crate::error::Result<TextEncoding> {
    TextEncoding::for_label(label).ok_or_else(|| ConvertError::UnknownEncoding(label.to_string()))
}

/// The candidate encodings considered by the detector, in canonical priority
/// order (the order doubles as the deterministic tie-breaker).
///
/// UTF-8 first, then the single-byte code pages common in subtitle
/// distribution, then the CJK multi-byte sets, then BOM-less UTF-16.
static DEFAULT_CANDIDATES: [TextEncoding; 10] = [
    TextEncoding::Rs(encoding_rs::UTF_8),
    TextEncoding::Rs(encoding_rs::WINDOWS_1252),
    TextEncoding::Rs(encoding_rs::WINDOWS_1256),
    TextEncoding::Rs(encoding_rs::WINDOWS_1251),
    TextEncoding::Rs(encoding_rs::BIG5),
    TextEncoding::Rs(encoding_rs::GBK),
    TextEncoding::Rs(encoding_rs::SHIFT_JIS),
    TextEncoding::Rs(encoding_rs::EUC_KR),
    TextEncoding::Rs(encoding_rs::UTF_16LE),
    TextEncoding::Rs(encoding_rs::UTF_16BE),
];

/// Rank of an encoding in the canonical priority order; unknown encodings
/// sort last.
pub fn canonical_rank(encoding: TextEncoding) -> usize {
    DEFAULT_CANDIDATES
        .iter()
        .position(|candidate| *candidate == encoding)
        .unwrap_or(DEFAULT_CANDIDATES.len())
}

/// An explicit, extensible set of candidate encodings for detection.
#[derive(Debug, Clone)]
pub struct CandidateSet {
    candidates: Vec<TextEncoding>,
}

impl CandidateSet {
    pub fn new(candidates: Vec<TextEncoding>) -> Self {
        CandidateSet { candidates }
    }

    pub fn push(&mut self, encoding: TextEncoding) {
        if !self.candidates.contains(&encoding) {
            self.candidates.push(encoding);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = TextEncoding> + '_ {
        self.candidates.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

impl Default for CandidateSet {
    fn default() -> Self {
        CandidateSet {
            candidates: DEFAULT_CANDIDATES.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_resolution() {
        assert_eq!(TextEncoding::for_label("utf-8"), Some(UTF_8));
        assert_eq!(TextEncoding::for_label("UTF8"), Some(UTF_8));
        assert_eq!(
            TextEncoding::for_label("cp1256"),
            Some(TextEncoding::Rs(encoding_rs::WINDOWS_1256))
        );
        assert_eq!(
            TextEncoding::for_label("big5"),
            Some(TextEncoding::Rs(encoding_rs::BIG5))
        );
        assert_eq!(TextEncoding::for_label("utf-32le"), Some(TextEncoding::Utf32Le));
        assert_eq!(TextEncoding::for_label("no-such-encoding"), None);
    }

    #[test]
    fn test_canonical_rank_is_stable() {
        assert_eq!(canonical_rank(UTF_8), 0);
        assert!(canonical_rank(UTF_8) < canonical_rank(UTF_16LE));
        assert_eq!(canonical_rank(TextEncoding::Utf32Le), DEFAULT_CANDIDATES.len());
    }

    #[test]
    fn test_candidate_set_deduplicates() {
        let mut set = CandidateSet::default();
        let before = set.len();
        set.push(UTF_8);
        assert_eq!(set.len(), before);
    }
}
