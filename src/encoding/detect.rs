//! Source encoding detection.
//!
//! A BOM settles the question outright. Otherwise every candidate encoding is
//! scored on the text it would decode to: strict decodability, absence of
//! control garbage, and how well the non-ASCII characters match the script
//! the candidate exists to represent (Unicode ranges plus a compact table of
//! that script's most frequent characters, standing in for full language
//! models). The scores are composed multiplicatively, so one bad axis sinks
//! a candidate.

use std::cmp::Ordering;

use super::bom::detect_bom;
use super::{canonical_rank, wide, CandidateSet, TextEncoding};
use crate::error::{ConvertError, Result};

/// Confidence reported for a pure-ASCII stream: the bytes are valid in
/// virtually any encoding, so the target itself is guessed, weakly.
pub const ASCII_CONFIDENCE: f32 = 0.5;

/// Below this composite score a candidate is not even worth guessing.
const MIN_GUESS_SCORE: f32 = 0.2;

/// Candidates scoring at least this much become fallbacks.
const MIN_FALLBACK_SCORE: f32 = 0.35;

/// How many fallback candidates to keep.
const MAX_FALLBACKS: usize = 3;

/// Scoring reads at most this much of the stream; statistics converge long
/// before subtitle files end.
const MAX_SAMPLE: usize = 64 * 1024;

/// Weight of the script-affinity axis relative to its neutral floor.
const AFFINITY_FLOOR: f32 = 0.55;

/// Frequent-character coverage is partial even for perfect text, so hits are
/// boosted before clamping.
const FREQUENT_BOOST: f32 = 1.5;

/// A Latin-script stream should stay mostly ASCII; above this non-ASCII
/// density the candidate is probably mis-decoding a foreign script into
/// accented letters.
const SPARSE_SCRIPT_MAX_DENSITY: f32 = 0.4;

/// A ranked best guess at the source encoding.
#[derive(Debug, Clone)]
pub struct EncodingGuess {
    pub encoding: TextEncoding,
    /// Composite confidence in `[0, 1]`. 1.0 means a BOM or an explicit
    /// caller override; anything else is statistical.
    pub confidence: f32,
    /// Remaining candidates worth trying, best first.
    pub fallbacks: Vec<TextEncoding>,
}

impl EncodingGuess {
    /// A guess that is not a guess: BOM hit or caller override.
    pub fn certain(encoding: TextEncoding) -> Self {
        EncodingGuess {
            encoding,
            confidence: 1.0,
            fallbacks: Vec::new(),
        }
    }
}

/// Infer the most likely source encoding of `bytes`.
///
/// Fails only on empty input or when no candidate reaches the minimum score.
/// Pure ASCII input returns a low-confidence guess of `target` instead of an
/// error, since ASCII-subset text is valid in virtually any encoding.
pub fn detect(
    bytes: &[u8],
    target: TextEncoding,
    candidates: &CandidateSet,
) -> Result<EncodingGuess> {
    if bytes.is_empty() {
        return Err(ConvertError::Detection("輸入內容為空".to_string()));
    }

    if let Some(bom) = detect_bom(bytes) {
        return Ok(EncodingGuess::certain(bom.encoding));
    }

    // The ASCII check must cover the whole stream: a legacy byte past the
    // scoring sample would otherwise slip through as a no-op.
    if bytes.iter().all(|&b| b < 0x80) {
        return Ok(EncodingGuess {
            encoding: target,
            confidence: ASCII_CONFIDENCE,
            fallbacks: Vec::new(),
        });
    }

    let sample = &bytes[..bytes.len().min(MAX_SAMPLE)];

    let mut scored: Vec<(TextEncoding, f32)> = candidates
        .iter()
        .map(|candidate| (candidate, score_candidate(sample, candidate)))
        .filter(|(_, score)| *score > 0.0)
        .collect();

    scored.sort_by(|a, b| compare_candidates(a, b, target));

    let Some(&(best, best_score)) = scored.first() else {
        return Err(ConvertError::Detection(
            "沒有任何候選編碼可以解讀此內容".to_string(),
        ));
    };
    if best_score < MIN_GUESS_SCORE {
        return Err(ConvertError::Detection(format!(
            "最佳候選 {best} 的分數 {best_score:.2} 低於下限"
        )));
    }

    let fallbacks = scored
        .iter()
        .skip(1)
        .filter(|(_, score)| *score >= MIN_FALLBACK_SCORE)
        .take(MAX_FALLBACKS)
        .map(|(encoding, _)| *encoding)
        .collect();

    Ok(EncodingGuess {
        encoding: best,
        confidence: best_score.min(1.0),
        fallbacks,
    })
}

/// Descending score; near-ties prefer the target (cheapest no-op), then the
/// fixed canonical priority order. Deterministic regardless of candidate
/// insertion order.
fn compare_candidates(
    a: &(TextEncoding, f32),
    b: &(TextEncoding, f32),
    target: TextEncoding,
) -> Ordering {
    const EPSILON: f32 = 1e-3;
    if (a.1 - b.1).abs() > EPSILON {
        return b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal);
    }
    let a_is_target = a.0 == target;
    let b_is_target = b.0 == target;
    b_is_target
        .cmp(&a_is_target)
        .then_with(|| canonical_rank(a.0).cmp(&canonical_rank(b.0)))
}

/// Composite score in `[0, 1]` for one candidate over the sampled bytes.
fn score_candidate(sample: &[u8], candidate: TextEncoding) -> f32 {
    let text = match candidate {
        TextEncoding::Rs(enc) => {
            match enc.decode_without_bom_handling_and_without_replacement(sample) {
                Some(text) => text.into_owned(),
                None => enc.decode_without_bom_handling(sample).0.into_owned(),
            }
        }
        TextEncoding::Utf32Le | TextEncoding::Utf32Be => {
            let big_endian = candidate == TextEncoding::Utf32Be;
            match wide::decode_utf32_strict(sample, big_endian) {
                Some(text) => text,
                None => wide::decode_utf32_lossy(sample, big_endian).0,
            }
        }
    };

    let stats = CharStats::scan(&text, script_profile(candidate));
    if stats.total == 0 {
        return 0.0;
    }

    let good_frac = stats.good() as f32 / stats.total as f32;
    let affinity = stats.affinity();
    let mut score = good_frac * (AFFINITY_FLOOR + (1.0 - AFFINITY_FLOOR) * affinity);

    // BOM-less UTF-16 is only credible when the byte stream shows the
    // alternating high-byte NUL pattern of mostly-Latin code units.
    if candidate == super::UTF_16LE {
        score *= wide::utf16_pattern_factor(sample, false);
    } else if candidate == super::UTF_16BE {
        score *= wide::utf16_pattern_factor(sample, true);
    }

    score
}

/// Character tallies over one candidate's decoded text.
struct CharStats {
    total: usize,
    replacement: usize,
    control: usize,
    non_ascii: usize,
    range_hits: usize,
    frequent_hits: usize,
    profiled: bool,
    dense_script: bool,
}

impl CharStats {
    fn scan(text: &str, profile: Option<&ScriptProfile>) -> CharStats {
        let mut stats = CharStats {
            total: 0,
            replacement: 0,
            control: 0,
            non_ascii: 0,
            range_hits: 0,
            frequent_hits: 0,
            profiled: profile.is_some(),
            dense_script: profile.map(|p| p.dense).unwrap_or(true),
        };
        for ch in text.chars() {
            stats.total += 1;
            if ch == '\u{FFFD}' {
                stats.replacement += 1;
                continue;
            }
            if is_suspicious_control(ch) {
                stats.control += 1;
                continue;
            }
            if (ch as u32) > 0x7F {
                stats.non_ascii += 1;
                if let Some(profile) = profile {
                    if profile.contains_range(ch) {
                        stats.range_hits += 1;
                    }
                    if profile.frequent.contains(&ch) {
                        stats.frequent_hits += 1;
                    }
                }
            }
        }
        stats
    }

    fn good(&self) -> usize {
        self.total - self.replacement - self.control
    }

    /// Script affinity in `[0, 1]`; neutral (1.0) for unprofiled candidates
    /// (the UTF family) and for text with no non-ASCII characters at all.
    fn affinity(&self) -> f32 {
        if !self.profiled || self.non_ascii == 0 {
            return 1.0;
        }
        let range_frac = self.range_hits as f32 / self.non_ascii as f32;
        let frequent_frac = self.frequent_hits as f32 / self.non_ascii as f32;
        let mut affinity = 0.5 * range_frac + 0.5 * (frequent_frac * FREQUENT_BOOST).min(1.0);
        if !self.dense_script {
            let density = self.non_ascii as f32 / self.good().max(1) as f32;
            if density > SPARSE_SCRIPT_MAX_DENSITY {
                affinity *= 0.5;
            }
        }
        affinity
    }
}

/// C0 (except tab/newline/carriage return), DEL, C1 and the BMP
/// noncharacters: printable subtitle text has no business containing these.
fn is_suspicious_control(ch: char) -> bool {
    let code = ch as u32;
    (code < 0x20 && !matches!(ch, '\t' | '\n' | '\r'))
        || (0x7F..=0x9F).contains(&code)
        || code == 0xFFFE
        || code == 0xFFFF
}

/// Expected Unicode ranges and most frequent characters for the script a
/// legacy code page exists to represent.
struct ScriptProfile {
    ranges: &'static [(u32, u32)],
    frequent: &'static [char],
    /// Whether running text in this script is predominantly non-ASCII.
    /// Latin-script code pages are sparse: accents decorate mostly-ASCII
    /// text, so a high non-ASCII density speaks against them.
    dense: bool,
}

impl ScriptProfile {
    fn contains_range(&self, ch: char) -> bool {
        let code = ch as u32;
        self.ranges.iter().any(|&(lo, hi)| (lo..=hi).contains(&code))
    }
}

static LATIN: ScriptProfile = ScriptProfile {
    ranges: &[
        (0x00C0, 0x00FF),
        (0x0100, 0x017F),
        (0x2013, 0x2026),
        (0x00AB, 0x00BB),
    ],
    frequent: &[
        'é', 'è', 'ê', 'à', 'â', 'ç', 'ä', 'ö', 'ü', 'ß', 'ñ', 'á', 'í', 'ó', 'ú', 'ã', 'õ',
        'ì', 'ù', 'î',
    ],
    dense: false,
};

static ARABIC: ScriptProfile = ScriptProfile {
    ranges: &[(0x0600, 0x06FF), (0x0750, 0x077F), (0xFE70, 0xFEFF)],
    frequent: &[
        'ا', 'ل', 'ي', 'م', 'و', 'ن', 'ر', 'ت', 'ب', 'ة', 'د', 'ه', 'س', 'ع', 'ف', 'ق', 'ك',
        'ح', 'ج', 'ط',
    ],
    dense: true,
};

static CYRILLIC: ScriptProfile = ScriptProfile {
    ranges: &[(0x0400, 0x04FF)],
    frequent: &[
        'о', 'е', 'а', 'и', 'н', 'т', 'с', 'р', 'в', 'л', 'к', 'м', 'д', 'п', 'у', 'я', 'ы',
        'ь', 'г', 'з',
    ],
    dense: true,
};

static TRADITIONAL_CHINESE: ScriptProfile = ScriptProfile {
    ranges: &[(0x4E00, 0x9FFF), (0x3000, 0x303F), (0xFF01, 0xFF5E)],
    frequent: &[
        '的', '一', '是', '不', '了', '人', '我', '在', '有', '他', '這', '個', '們', '中',
        '來', '上', '大', '為', '和', '你',
    ],
    dense: true,
};

static SIMPLIFIED_CHINESE: ScriptProfile = ScriptProfile {
    ranges: &[(0x4E00, 0x9FFF), (0x3000, 0x303F), (0xFF01, 0xFF5E)],
    frequent: &[
        '的', '一', '是', '不', '了', '人', '我', '在', '有', '他', '这', '个', '们', '中',
        '来', '上', '大', '为', '和', '你',
    ],
    dense: true,
};

static JAPANESE: ScriptProfile = ScriptProfile {
    ranges: &[
        (0x3040, 0x30FF),
        (0x4E00, 0x9FFF),
        (0x3000, 0x303F),
        (0xFF01, 0xFF9F),
    ],
    frequent: &[
        'の', 'に', 'は', 'を', 'た', 'が', 'で', 'て', 'と', 'し', 'れ', 'さ', 'る', 'い',
        'ま', 'す', 'ト', 'ス', 'ン', 'ー',
    ],
    dense: true,
};

static KOREAN: ScriptProfile = ScriptProfile {
    ranges: &[(0xAC00, 0xD7AF), (0x1100, 0x11FF), (0x3130, 0x318F)],
    frequent: &[
        '이', '다', '의', '가', '에', '는', '을', '하', '고', '지', '서', '요', '한', '니',
        '로', '어', '게', '습', '보', '스',
    ],
    dense: true,
};

fn script_profile(candidate: TextEncoding) -> Option<&'static ScriptProfile> {
    let TextEncoding::Rs(enc) = candidate else {
        return None;
    };
    if enc == encoding_rs::WINDOWS_1252 {
        Some(&LATIN)
    } else if enc == encoding_rs::WINDOWS_1256 {
        Some(&ARABIC)
    } else if enc == encoding_rs::WINDOWS_1251 {
        Some(&CYRILLIC)
    } else if enc == encoding_rs::BIG5 {
        Some(&TRADITIONAL_CHINESE)
    } else if enc == encoding_rs::GBK {
        Some(&SIMPLIFIED_CHINESE)
    } else if enc == encoding_rs::SHIFT_JIS {
        Some(&JAPANESE)
    } else if enc == encoding_rs::EUC_KR {
        Some(&KOREAN)
    } else {
        None
    }
}
