//! Re-encoding of validated text into the target encoding.

use std::borrow::Cow;

use super::bom::bom_bytes;
use super::eol::{self, NewlineNormalization};
use super::{wide, TextEncoding};
use crate::error::{ConvertError, Result};

/// What to do when the target encoding cannot represent a codepoint.
/// The default rejects, so a detector error can never be papered over by
/// silent substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplacementPolicy {
    #[default]
    Reject,
    /// Replace unmappable codepoints with `?`.
    Substitute,
}

/// Serialize `text` into `target`, applying newline normalization first.
///
/// Normalization happens on the decoded text, never on raw bytes, so a
/// multi-byte sequence can never be split. UTF-16/UTF-32 output starts with
/// a BOM; UTF-8 output never does.
pub fn encode(
    text: &str,
    target: TextEncoding,
    newline: NewlineNormalization,
    policy: ReplacementPolicy,
) -> Result<Vec<u8>> {
    let normalized = eol::normalize(text, newline);

    let body = match target {
        t if t == super::UTF_16LE => wide::encode_utf16(&normalized, false),
        t if t == super::UTF_16BE => wide::encode_utf16(&normalized, true),
        TextEncoding::Utf32Le => wide::encode_utf32(&normalized, false),
        TextEncoding::Utf32Be => wide::encode_utf32(&normalized, true),
        TextEncoding::Rs(enc) => {
            let (bytes, _, had_unmappable) = enc.encode(&normalized);
            if !had_unmappable {
                bytes.into_owned()
            } else {
                match policy {
                    ReplacementPolicy::Reject => {
                        let offender = first_unencodable(&normalized, enc);
                        return Err(ConvertError::UnencodableCharacter {
                            character: offender,
                            codepoint: offender as u32,
                            encoding: enc.name(),
                        });
                    }
                    ReplacementPolicy::Substitute => {
                        let substituted = substitute_unencodable(&normalized, enc);
                        let (bytes, _, _) = enc.encode(&substituted);
                        bytes.into_owned()
                    }
                }
            }
        }
    };

    let bom = bom_bytes(target);
    if bom.is_empty() {
        return Ok(body);
    }
    let mut out = Vec::with_capacity(bom.len() + body.len());
    out.extend_from_slice(bom);
    out.extend_from_slice(&body);
    Ok(out)
}

fn can_encode(ch: char, enc: &'static encoding_rs::Encoding) -> bool {
    let mut buf = [0u8; 4];
    let (_, _, had_unmappable) = enc.encode(ch.encode_utf8(&mut buf));
    !had_unmappable
}

fn first_unencodable(text: &str, enc: &'static encoding_rs::Encoding) -> char {
    text.chars()
        .find(|&ch| !can_encode(ch, enc))
        .unwrap_or('\u{FFFD}')
}

/// Replace every unmappable codepoint with `?`.
///
/// encoding_rs itself substitutes HTML numeric references, which subtitle
/// players would render literally.
fn substitute_unencodable(text: &Cow<'_, str>, enc: &'static encoding_rs::Encoding) -> String {
    text.chars()
        .map(|ch| if can_encode(ch, enc) { ch } else { '?' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{UTF_16LE, UTF_8};

    #[test]
    fn test_utf8_output_has_no_bom() {
        let bytes = encode("Hello", UTF_8, NewlineNormalization::None, ReplacementPolicy::Reject)
            .unwrap();
        assert_eq!(bytes, b"Hello");
    }

    #[test]
    fn test_utf16le_output_has_bom() {
        let bytes = encode("Hi", UTF_16LE, NewlineNormalization::None, ReplacementPolicy::Reject)
            .unwrap();
        assert_eq!(bytes, vec![0xFF, 0xFE, 0x48, 0x00, 0x69, 0x00]);
    }

    #[test]
    fn test_newline_normalization_applies_before_encoding() {
        let bytes = encode(
            "a\r\nb",
            UTF_8,
            NewlineNormalization::Unix,
            ReplacementPolicy::Reject,
        )
        .unwrap();
        assert_eq!(bytes, b"a\nb");
    }

    #[test]
    fn test_unencodable_is_rejected_by_default() {
        let target = crate::encoding::TextEncoding::Rs(encoding_rs::WINDOWS_1252);
        let result = encode("中文", target, NewlineNormalization::None, ReplacementPolicy::Reject);
        match result {
            Err(ConvertError::UnencodableCharacter { character, .. }) => {
                assert_eq!(character, '中');
            }
            other => panic!("expected UnencodableCharacter, got {other:?}"),
        }
    }

    #[test]
    fn test_substitute_policy_uses_question_mark() {
        let target = crate::encoding::TextEncoding::Rs(encoding_rs::WINDOWS_1252);
        let bytes = encode(
            "ok 中 ok",
            target,
            NewlineNormalization::None,
            ReplacementPolicy::Substitute,
        )
        .unwrap();
        assert_eq!(bytes, b"ok ? ok");
    }

    #[test]
    fn test_legacy_round_trip() {
        let target = crate::encoding::TextEncoding::Rs(encoding_rs::WINDOWS_1256);
        let bytes = encode("سلام", target, NewlineNormalization::None, ReplacementPolicy::Reject)
            .unwrap();
        let decoded = crate::encoding::decode::decode_strict(&bytes, target).unwrap();
        assert_eq!(decoded, "سلام");
    }
}
