//! Custom error types for the sub_recode crate.

use std::path::PathBuf;

use thiserror::Error;

/// The primary error type for all conversion operations.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// No source encoding could be inferred from the input bytes.
    #[error("無法偵測來源編碼：{0}")]
    Detection(String),

    /// Every candidate encoding (primary and fallbacks) failed strict decoding
    /// and lossy fallback was not allowed.
    #[error("所有候選編碼（共 {attempted} 種）皆無法嚴格解碼，且未允許寬鬆解碼")]
    DecodeExhausted { attempted: usize },

    /// The target encoding cannot represent a codepoint present in the text.
    #[error("字元 {character:?} (U+{codepoint:04X}) 無法以目標編碼 {encoding} 表示")]
    UnencodableCharacter {
        character: char,
        codepoint: u32,
        encoding: &'static str,
    },

    /// A filesystem-level failure: read, backup, temporary write or rename.
    #[error("檔案系統操作失敗：{0}")]
    Write(#[from] std::io::Error),

    /// An encoding label that neither encoding_rs nor the UTF-32 variants know.
    #[error("未知的編碼名稱：{0}")]
    UnknownEncoding(String),

    /// The batch root is missing or not a directory.
    #[error("來源目錄無效：{}", .0.display())]
    InvalidSourceDirectory(PathBuf),
}

impl ConvertError {
    /// Whether this error belongs to the per-file taxonomy that a batch run
    /// captures into its report instead of propagating.
    pub fn is_per_file(&self) -> bool {
        !matches!(
            self,
            ConvertError::UnknownEncoding(_) | ConvertError::InvalidSourceDirectory(_)
        )
    }
}

/// A convenience `Result` type alias using the crate's `ConvertError` type.
pub type Result<T> = std::result::Result<T, ConvertError>;
