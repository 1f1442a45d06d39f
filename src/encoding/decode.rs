//! Safe decoding: strict first, fallbacks in order, lossy only on request.

use super::bom::detect_bom;
use super::{wide, EncodingGuess, TextEncoding};
use crate::error::{ConvertError, Result};

/// Text decoded from a byte stream, together with the encoding that produced
/// it and whether lossy substitution was required. Transient: exists only
/// between the decode and re-encode steps.
#[derive(Debug, Clone)]
pub struct DecodedText {
    pub text: String,
    pub encoding: TextEncoding,
    /// True when the decode substituted replacement markers for byte
    /// sequences invalid under `encoding`. Callers may reject such results.
    pub lossy: bool,
}

/// Decode `bytes` using the guessed encoding and its fallbacks.
///
/// Strict decoding is attempted with the primary guess, then with each
/// fallback in order. When every strict attempt fails: if `lossy_allowed`,
/// one final lossy decode runs with the primary guess and the result is
/// flagged; otherwise `DecodeExhausted` is returned. A leading BOM matching
/// the attempted encoding is never part of the text.
pub fn decode(bytes: &[u8], guess: &EncodingGuess, lossy_allowed: bool) -> Result<DecodedText> {
    let mut attempted = 0usize;
    for candidate in std::iter::once(guess.encoding).chain(guess.fallbacks.iter().copied()) {
        attempted += 1;
        if let Some(text) = decode_strict(bytes, candidate) {
            return Ok(DecodedText {
                text,
                encoding: candidate,
                lossy: false,
            });
        }
    }

    if lossy_allowed {
        let (text, _) = decode_lossy(bytes, guess.encoding);
        return Ok(DecodedText {
            text,
            encoding: guess.encoding,
            lossy: true,
        });
    }

    Err(ConvertError::DecodeExhausted { attempted })
}

/// Bytes with a BOM for `encoding` stripped, if present.
fn payload_for(bytes: &[u8], encoding: TextEncoding) -> &[u8] {
    match detect_bom(bytes) {
        Some(bom) if bom.encoding == encoding => &bytes[bom.length..],
        _ => bytes,
    }
}

/// Strict decode: `None` on any byte sequence invalid for the encoding.
pub fn decode_strict(bytes: &[u8], encoding: TextEncoding) -> Option<String> {
    let payload = payload_for(bytes, encoding);
    match encoding {
        TextEncoding::Rs(enc) => enc
            .decode_without_bom_handling_and_without_replacement(payload)
            .map(|cow| cow.into_owned()),
        TextEncoding::Utf32Le => wide::decode_utf32_strict(payload, false),
        TextEncoding::Utf32Be => wide::decode_utf32_strict(payload, true),
    }
}

/// Lossy decode: invalid sequences become U+FFFD. Returns the text and
/// whether any substitution happened.
pub fn decode_lossy(bytes: &[u8], encoding: TextEncoding) -> (String, bool) {
    let payload = payload_for(bytes, encoding);
    match encoding {
        TextEncoding::Rs(enc) => {
            let (text, had_errors) = enc.decode_without_bom_handling(payload);
            (text.into_owned(), had_errors)
        }
        TextEncoding::Utf32Le => wide::decode_utf32_lossy(payload, false),
        TextEncoding::Utf32Be => wide::decode_utf32_lossy(payload, true),
    }
}
