use std::io;
use std::path::Path;

use dialoguer::{Confirm, Input, Select};

use crate::cli::run_conversion;
use crate::config::Cli;
use crate::error::Result;
use crate::utils::setup_logging;

const ENCODING_CHOICES: [(&str, &str); 8] = [
    ("UTF-8（預設）", "utf-8"),
    ("UTF-16LE", "utf-16le"),
    ("Big5", "big5"),
    ("GBK", "gbk"),
    ("Shift_JIS", "shift_jis"),
    ("Windows-1252（西歐）", "windows-1252"),
    ("Windows-1256（阿拉伯文）", "windows-1256"),
    ("自行輸入", ""),
];

pub fn process_interactive_mode() -> Result<String> {
    println!("=== 歡迎使用互動模式 ===");
    let input = get_input_path()?;
    let target_encoding = get_target_encoding()?;
    let backup = get_backup_option()?;
    let lossy = get_lossy_option()?;
    let newline = get_newline_option()?;
    let log_level = get_log_level_option()?;

    setup_logging(&log_level)?;

    let cli = Cli {
        input,
        target_encoding,
        source_encoding: None,
        output: None,
        output_dir: None,
        suffix: None,
        no_backup: !backup,
        lossy,
        replace_unencodable: false,
        newline,
        extensions: vec![
            "srt".to_string(),
            "ass".to_string(),
            "ssa".to_string(),
            "sub".to_string(),
            "vtt".to_string(),
        ],
        include: vec!["*".to_string()],
        exclude: None,
        no_progress: false,
        log_level,
    };
    run_conversion(&cli)
}

pub fn get_input_path() -> Result<String> {
    let path = Input::new()
        .with_prompt("請輸入字幕檔案或目錄路徑（例如：./movie.srt 或 ./subs）")
        .validate_with(|input: &String| -> std::result::Result<(), String> {
            if Path::new(input).exists() {
                Ok(())
            } else {
                Err(format!("路徑 '{}' 不存在", input))
            }
        })
        .interact_text()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    Ok(path)
}

pub fn get_target_encoding() -> Result<String> {
    let items: Vec<&str> = ENCODING_CHOICES.iter().map(|(label, _)| *label).collect();
    let selection = Select::new()
        .with_prompt("選擇目標編碼（使用方向鍵選擇，按 Enter 確認）")
        .items(&items)
        .default(0)
        .interact()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("目標編碼選擇失敗: {}", e)))?;

    let label = ENCODING_CHOICES[selection].1;
    if !label.is_empty() {
        return Ok(label.to_string());
    }

    let custom = Input::new()
        .with_prompt("請輸入編碼名稱（例如：euc-kr、windows-1251）")
        .validate_with(|input: &String| -> std::result::Result<(), String> {
            match crate::encoding::TextEncoding::for_label(input) {
                Some(_) => Ok(()),
                None => Err(format!("未知的編碼名稱 '{}'", input)),
            }
        })
        .interact_text()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    Ok(custom)
}

pub fn get_backup_option() -> Result<bool> {
    let backup = Confirm::new()
        .with_prompt("覆寫前是否備份原始檔案？（預設為是）")
        .default(true)
        .interact()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("備份選項輸入失敗: {}", e)))?;
    Ok(backup)
}

pub fn get_lossy_option() -> Result<bool> {
    let lossy = Confirm::new()
        .with_prompt("所有候選編碼皆失敗時，是否允許寬鬆解碼？（可能以替代符號取代損毀字元，預設為否）")
        .default(false)
        .interact()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("寬鬆解碼選項輸入失敗: {}", e)))?;
    Ok(lossy)
}

pub fn get_newline_option() -> Result<String> {
    let selection = Select::new()
        .with_prompt("選擇換行字元處理方式（使用方向鍵選擇，按 Enter 確認）")
        .items(&["保持原樣（預設）", "統一為 LF（Unix）", "統一為 CRLF（Windows）"])
        .default(0)
        .interact()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("換行選項選擇失敗: {}", e)))?;
    Ok(match selection {
        1 => "unix".to_string(),
        2 => "windows".to_string(),
        _ => "none".to_string(),
    })
}

pub fn get_log_level_option() -> Result<String> {
    let selection = Select::new()
        .with_prompt("選擇日誌等級（使用方向鍵選擇，按 Enter 確認）")
        .items(&["info（預設）", "warn", "error"])
        .default(0)
        .interact()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("日誌等級選擇失敗: {}", e)))?;
    Ok(match selection {
        1 => "warn".to_string(),
        2 => "error".to_string(),
        _ => "info".to_string(),
    })
}
