use std::io;
use std::path::Path;

use clap::Parser;

use crate::encoding::resolve_label;
use crate::error::{ConvertError, Result};

#[derive(Parser)]
#[command(
    name = "sub_recode",
    about = "偵測字幕檔的來源編碼並安全轉換為目標編碼",
    long_about = "一個將字幕檔從未知或混雜的來源編碼轉換為目標編碼（預設 UTF-8）的工具，\n支援單一檔案轉換或整個目錄樹的批次轉換，寫入前自動備份原始檔案。\n使用 `--help` 查看詳細用法。",
    arg_required_else_help = true
)]
pub struct Cli {
    /// 來源檔案或目錄路徑
    pub input: String,
    #[arg(long, default_value = "utf-8")]
    pub target_encoding: String,
    /// 指定來源編碼，略過自動偵測
    #[arg(long)]
    pub source_encoding: Option<String>,
    /// 輸出檔案路徑（僅適用於單一檔案，預設為原地覆寫）
    #[arg(short, long)]
    pub output: Option<String>,
    /// 輸出目錄（批次轉換時自動啟用序號命名）
    #[arg(long)]
    pub output_dir: Option<String>,
    /// 附加在副檔名前的名稱後綴
    #[arg(long)]
    pub suffix: Option<String>,
    #[arg(long, default_value_t = false)]
    pub no_backup: bool,
    /// 允許在所有候選編碼嚴格解碼失敗時改用寬鬆解碼
    #[arg(long, default_value_t = false)]
    pub lossy: bool,
    /// 目標編碼無法表示的字元以 ? 取代而非中止
    #[arg(long, default_value_t = false)]
    pub replace_unencodable: bool,
    #[arg(long, default_value = "none", value_parser = ["none", "unix", "windows"])]
    pub newline: String,
    #[arg(long, default_value = "srt,ass,ssa,sub,vtt", value_delimiter = ',')]
    pub extensions: Vec<String>,
    #[arg(long, default_value = "*", value_delimiter = ',')]
    pub include: Vec<String>,
    #[arg(long, value_delimiter = ',')]
    pub exclude: Option<Vec<String>>,
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
    #[arg(long, default_value = "info", value_parser = ["debug", "info", "warn", "error"])]
    pub log_level: String,
}

pub fn validate_cli_args(cli: &Cli) -> Result<()> {
    validate_input_path(&cli.input)?;
    validate_file_patterns(&cli.include, &cli.exclude)?;
    resolve_label(&cli.target_encoding)?;
    if let Some(source) = &cli.source_encoding {
        resolve_label(source)?;
    }
    if cli.output.is_some() && Path::new(&cli.input).is_dir() {
        return Err(ConvertError::Write(io::Error::new(
            io::ErrorKind::InvalidInput,
            "批次轉換不支援 --output，請改用 --output-dir",
        )));
    }
    Ok(())
}

pub fn validate_input_path(input: &str) -> Result<&Path> {
    let path = Path::new(input);
    if !path.exists() {
        log::error!("輸入路徑不存在：{}", input);
        return Err(ConvertError::Write(io::Error::new(
            io::ErrorKind::NotFound,
            format!("輸入路徑 '{}' 不存在", input),
        )));
    }
    Ok(path)
}

pub fn is_valid_pattern(pattern: &str) -> bool {
    let invalid_chars = ['/', '\\', ':', '?', '"', '<', '>', '|'];
    !pattern.is_empty() && !pattern.contains(&invalid_chars[..])
}

pub fn validate_file_patterns(include: &[String], exclude: &Option<Vec<String>>) -> Result<()> {
    for pattern in include {
        if !is_valid_pattern(pattern) {
            return Err(ConvertError::Write(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("無效的包含模式: {}", pattern),
            )));
        }
    }
    if let Some(exclude_patterns) = exclude {
        for pattern in exclude_patterns {
            if !is_valid_pattern(pattern) {
                return Err(ConvertError::Write(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("無效的排除模式: {}", pattern),
                )));
            }
        }
    }
    Ok(())
}
