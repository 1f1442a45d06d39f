//! Byte order mark detection.

use super::TextEncoding;

/// A byte order mark found at the start of a stream: the encoding it declares
/// and how many bytes it occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bom {
    pub encoding: TextEncoding,
    pub length: usize,
}

/// Detect a BOM at the start of `bytes`.
///
/// The UTF-32 checks must run before UTF-16: `FF FE 00 00` starts with the
/// UTF-16LE mark.
pub fn detect_bom(bytes: &[u8]) -> Option<Bom> {
    if bytes.len() >= 4 {
        if bytes[0] == 0xFF && bytes[1] == 0xFE && bytes[2] == 0x00 && bytes[3] == 0x00 {
            return Some(Bom {
                encoding: TextEncoding::Utf32Le,
                length: 4,
            });
        }
        if bytes[0] == 0x00 && bytes[1] == 0x00 && bytes[2] == 0xFE && bytes[3] == 0xFF {
            return Some(Bom {
                encoding: TextEncoding::Utf32Be,
                length: 4,
            });
        }
    }

    if bytes.len() >= 3 && bytes[0] == 0xEF && bytes[1] == 0xBB && bytes[2] == 0xBF {
        return Some(Bom {
            encoding: super::UTF_8,
            length: 3,
        });
    }

    if bytes.len() >= 2 {
        if bytes[0] == 0xFF && bytes[1] == 0xFE {
            return Some(Bom {
                encoding: super::UTF_16LE,
                length: 2,
            });
        }
        if bytes[0] == 0xFE && bytes[1] == 0xFF {
            return Some(Bom {
                encoding: super::UTF_16BE,
                length: 2,
            });
        }
    }

    None
}

/// The BOM bytes an encoding conventionally writes, if any.
///
/// UTF-8 output carries no BOM; the wide encodings always do.
pub fn bom_bytes(encoding: TextEncoding) -> &'static [u8] {
    match encoding {
        TextEncoding::Rs(enc) if enc == encoding_rs::UTF_16LE => &[0xFF, 0xFE],
        TextEncoding::Rs(enc) if enc == encoding_rs::UTF_16BE => &[0xFE, 0xFF],
        TextEncoding::Utf32Le => &[0xFF, 0xFE, 0x00, 0x00],
        TextEncoding::Utf32Be => &[0x00, 0x00, 0xFE, 0xFF],
        _ => &[],
    }
}
