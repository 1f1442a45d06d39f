use std::path::{Path, PathBuf};

use crate::encoding::encode::ReplacementPolicy;
use crate::encoding::eol::NewlineNormalization;
use crate::encoding::{CandidateSet, TextEncoding, UTF_8};
use crate::error::ConvertError;

/// Fixed, enumerated conversion options with explicit defaults. Validated
/// when the request is built, never discovered at call time.
#[derive(Clone)]
pub struct ConversionOptions {
    pub target_encoding: TextEncoding,
    pub source_override: Option<TextEncoding>,
    pub backup_original: bool,
    pub lossy_fallback_allowed: bool,
    pub newline: NewlineNormalization,
    pub replacement: ReplacementPolicy,
    pub candidates: CandidateSet,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        ConversionOptions {
            target_encoding: UTF_8,
            source_override: None,
            backup_original: true,
            lossy_fallback_allowed: false,
            newline: NewlineNormalization::None,
            replacement: ReplacementPolicy::default(),
            candidates: CandidateSet::default(),
        }
    }
}

/// One file to convert, with the resolved options and output naming.
#[derive(Clone)]
pub struct ConversionRequest {
    pub source: PathBuf,
    /// Explicit output path; wins over everything else.
    pub output_path: Option<PathBuf>,
    /// Directory to place the converted file in instead of the source's.
    pub output_dir: Option<PathBuf>,
    /// Extra name part inserted before the extension.
    pub suffix: Option<String>,
    /// Sequence number inserted before the suffix (batch sequence naming).
    pub sequence: Option<usize>,
    pub options: ConversionOptions,
}

impl ConversionRequest {
    pub fn new(source: impl Into<PathBuf>, options: ConversionOptions) -> Self {
        ConversionRequest {
            source: source.into(),
            output_path: None,
            output_dir: None,
            suffix: None,
            sequence: None,
            options,
        }
    }

    /// Whether the converted bytes will replace the source file itself.
    pub fn is_in_place(&self) -> bool {
        self.output_path.is_none()
            && self.output_dir.is_none()
            && self.suffix.is_none()
            && self.sequence.is_none()
    }
}

/// Terminal state of one file's conversion. The failed variants carry the
/// error that stopped the pipeline.
#[derive(Debug)]
pub enum Outcome {
    Success,
    SkippedAlreadyTarget,
    FailedDetection(ConvertError),
    FailedDecode(ConvertError),
    FailedEncode(ConvertError),
    FailedWrite(ConvertError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success | Outcome::SkippedAlreadyTarget)
    }

    pub fn error(&self) -> Option<&ConvertError> {
        match self {
            Outcome::Success | Outcome::SkippedAlreadyTarget => None,
            Outcome::FailedDetection(err)
            | Outcome::FailedDecode(err)
            | Outcome::FailedEncode(err)
            | Outcome::FailedWrite(err) => Some(err),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Outcome::Success => "成功".to_string(),
            Outcome::SkippedAlreadyTarget => "已是目標編碼，跳過".to_string(),
            Outcome::FailedDetection(err) => format!("偵測失敗：{err}"),
            Outcome::FailedDecode(err) => format!("解碼失敗：{err}"),
            Outcome::FailedEncode(err) => format!("編碼失敗：{err}"),
            Outcome::FailedWrite(err) => format!("寫入失敗：{err}"),
        }
    }
}

/// Everything a caller learns about one file's conversion.
#[derive(Debug)]
pub struct ConversionResult {
    pub source: PathBuf,
    pub detected: Option<TextEncoding>,
    pub confidence: Option<f32>,
    pub outcome: Outcome,
    pub backup_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    /// True when the decode needed lossy substitution (only possible with
    /// `lossy_fallback_allowed`).
    pub lossy: bool,
}

impl ConversionResult {
    pub fn new(source: &Path, outcome: Outcome) -> Self {
        ConversionResult {
            source: source.to_path_buf(),
            detected: None,
            confidence: None,
            outcome,
            backup_path: None,
            output_path: None,
            lossy: false,
        }
    }
}

/// Ordered per-file outcomes of a batch run; order is discovery order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub results: Vec<ConversionResult>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConversionResult> {
        self.results.iter()
    }

    pub fn converted(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Success))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::SkippedAlreadyTarget))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.converted() - self.skipped()
    }
}
