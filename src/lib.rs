//! # sub_recode
//!
//! 偵測字幕檔的來源編碼並安全轉換為目標編碼的工具函式庫。
//!
//! The core is an encoding-detection-and-safe-transcoding engine: given a
//! byte stream with no declared encoding, infer the most likely source
//! encoding, decode it without silent corruption, and re-encode it to the
//! requested target, leaving the original file recoverable on failure.

pub mod batch;
pub mod cli;
pub mod config;
pub mod convert;
pub mod encoding;
pub mod error;
pub mod interactive;
pub mod models;
pub mod utils;

// Re-export the main types for convenience.
pub use batch::{batch_convert, BatchOptions};
pub use convert::convert;
pub use error::{ConvertError, Result};
pub use models::{
    BatchReport, ConversionOptions, ConversionRequest, ConversionResult, Outcome,
};
