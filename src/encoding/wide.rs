//! Hand-rolled UTF-16/UTF-32 serialization and UTF-16 stream heuristics.
//!
//! encoding_rs decodes UTF-16 but refuses to encode it (its output encoding
//! is UTF-8 per the WHATWG spec), and knows nothing of UTF-32, so the wide
//! encodings are handled here.

/// Serialize text as UTF-16 code units, little or big endian, without a BOM.
pub fn encode_utf16(text: &str, big_endian: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for unit in text.encode_utf16() {
        let bytes = if big_endian {
            unit.to_be_bytes()
        } else {
            unit.to_le_bytes()
        };
        out.extend_from_slice(&bytes);
    }
    out
}

/// Serialize text as UTF-32 code units, without a BOM.
pub fn encode_utf32(text: &str, big_endian: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 4);
    for ch in text.chars() {
        let bytes = if big_endian {
            (ch as u32).to_be_bytes()
        } else {
            (ch as u32).to_le_bytes()
        };
        out.extend_from_slice(&bytes);
    }
    out
}

/// Strict UTF-32 decode. Fails on trailing bytes or invalid scalar values.
pub fn decode_utf32_strict(bytes: &[u8], big_endian: bool) -> Option<String> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    let mut out = String::with_capacity(bytes.len() / 4);
    for chunk in bytes.chunks_exact(4) {
        let value = if big_endian {
            u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])
        } else {
            u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])
        };
        out.push(char::from_u32(value)?);
    }
    Some(out)
}

/// Lossy UTF-32 decode: invalid scalar values and trailing bytes become
/// replacement characters. Returns the text and whether substitution ran.
pub fn decode_utf32_lossy(bytes: &[u8], big_endian: bool) -> (String, bool) {
    let mut out = String::with_capacity(bytes.len() / 4);
    let mut had_errors = false;
    for chunk in bytes.chunks_exact(4) {
        let value = if big_endian {
            u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])
        } else {
            u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])
        };
        match char::from_u32(value) {
            Some(ch) => out.push(ch),
            None => {
                out.push('\u{FFFD}');
                had_errors = true;
            }
        }
    }
    if bytes.len() % 4 != 0 {
        out.push('\u{FFFD}');
        had_errors = true;
    }
    (out, had_errors)
}

/// Plausibility factor in [0,1] that `bytes` are BOM-less UTF-16.
///
/// Subtitle text in UTF-16 is dominated by characters below U+0100, so the
/// high byte of most code units is NUL: at odd indices for little endian,
/// even indices for big endian. A stream with no such pattern is almost
/// certainly not UTF-16.
pub fn utf16_pattern_factor(bytes: &[u8], big_endian: bool) -> f32 {
    if bytes.len() < 4 || bytes.len() % 2 != 0 {
        return 0.0;
    }
    let mut high_nul = 0usize;
    for (i, &b) in bytes.iter().enumerate() {
        let is_high_byte = if big_endian { i % 2 == 0 } else { i % 2 == 1 };
        if is_high_byte && b == 0 {
            high_nul += 1;
        }
    }
    let ratio = high_nul as f32 / (bytes.len() / 2) as f32;
    ratio.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_utf16_le() {
        assert_eq!(encode_utf16("Hi", false), vec![0x48, 0x00, 0x69, 0x00]);
    }

    #[test]
    fn test_encode_utf16_be() {
        assert_eq!(encode_utf16("Hi", true), vec![0x00, 0x48, 0x00, 0x69]);
    }

    #[test]
    fn test_utf32_round_trip() {
        let text = "中文 ok";
        let bytes = encode_utf32(text, false);
        assert_eq!(decode_utf32_strict(&bytes, false).unwrap(), text);
    }

    #[test]
    fn test_decode_utf32_strict_rejects_invalid_scalar() {
        // 0x00110000 is beyond the Unicode range.
        let bytes = 0x0011_0000u32.to_le_bytes();
        assert!(decode_utf32_strict(&bytes, false).is_none());
    }

    #[test]
    fn test_decode_utf32_lossy_flags_substitution() {
        let mut bytes = 0x0011_0000u32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&(b'a' as u32).to_le_bytes());
        let (text, had_errors) = decode_utf32_lossy(&bytes, false);
        assert_eq!(text, "\u{FFFD}a");
        assert!(had_errors);
    }

    #[test]
    fn test_utf16_pattern_factor_le() {
        let bytes = encode_utf16("subtitle line", false);
        assert!(utf16_pattern_factor(&bytes, false) > 0.9);
        assert!(utf16_pattern_factor(&bytes, true) < 0.1);
    }

    #[test]
    fn test_utf16_pattern_factor_plain_ascii() {
        assert_eq!(utf16_pattern_factor(b"abcdef", false), 0.0);
    }
}
