use std::path::{Path, PathBuf};

use clap::Parser;
use log::error;

use crate::batch::{self, BatchOptions};
use crate::config::{validate_cli_args, Cli};
use crate::convert;
use crate::encoding::encode::ReplacementPolicy;
use crate::encoding::eol::NewlineNormalization;
use crate::encoding::resolve_label;
use crate::error::Result;
use crate::interactive::process_interactive_mode;
use crate::models::{ConversionOptions, ConversionRequest, Outcome};
use crate::utils::{create_regex_sets, setup_logging};

pub fn process_args(args: Vec<String>) -> Result<String> {
    if args.len() == 1 {
        process_interactive_mode()
    } else {
        process_cli_mode()
    }
}

pub fn process_cli_mode() -> Result<String> {
    let cli = Cli::parse();
    validate_cli_args(&cli)?;
    setup_logging(&cli.log_level)?;
    run_conversion(&cli)
}

/// Dispatch on the input path: a directory runs a batch (always completes,
/// per-file failures stay in the report), a file runs a single conversion
/// whose failure is surfaced to the caller directly.
pub fn run_conversion(cli: &Cli) -> Result<String> {
    let options = build_conversion_options(cli)?;
    let input = Path::new(&cli.input);

    if input.is_dir() {
        log::info!(
            "開始批次轉換，來源目錄：{}，目標編碼：{}",
            cli.input,
            cli.target_encoding
        );
        run_batch(cli, input, options)
    } else {
        log::info!(
            "開始單檔轉換，來源：{}，目標編碼：{}",
            cli.input,
            cli.target_encoding
        );
        run_single(cli, input, options)
    }
}

fn run_batch(cli: &Cli, input: &Path, options: ConversionOptions) -> Result<String> {
    let (include, exclude) = create_regex_sets(
        &cli.include,
        &cli.exclude.as_deref().unwrap_or(&[]).to_vec(),
    );
    let batch_options = BatchOptions {
        conversion: options,
        extensions: cli.extensions.clone(),
        output_dir: cli.output_dir.as_ref().map(PathBuf::from),
        suffix: cli.suffix.clone(),
        include,
        exclude,
        no_progress: cli.no_progress,
    };

    let report = batch::batch_convert(input, &batch_options)?;
    for result in report.iter() {
        if !result.outcome.is_success() {
            error!("{}：{}", result.source.display(), result.outcome.describe());
        }
    }
    Ok(format!(
        "批次轉換完成：共 {} 個檔案，轉換 {}，跳過 {}，失敗 {}",
        report.len(),
        report.converted(),
        report.skipped(),
        report.failed()
    ))
}

fn run_single(cli: &Cli, input: &Path, options: ConversionOptions) -> Result<String> {
    let mut request = ConversionRequest::new(input, options);
    request.output_path = cli.output.as_ref().map(PathBuf::from);
    request.output_dir = cli.output_dir.as_ref().map(PathBuf::from);
    request.suffix = cli.suffix.clone();

    let result = convert::convert(&request);
    match result.outcome {
        Outcome::Success => {
            let output = result
                .output_path
                .as_deref()
                .unwrap_or(input)
                .display()
                .to_string();
            Ok(format!(
                "轉換完成：{} → {}（{} → {}）",
                input.display(),
                output,
                result
                    .detected
                    .map(|e| e.name())
                    .unwrap_or("未知"),
                cli.target_encoding
            ))
        }
        Outcome::SkippedAlreadyTarget => Ok(format!(
            "檔案 {} 已是目標編碼 {}，未作變更",
            input.display(),
            cli.target_encoding
        )),
        Outcome::FailedDetection(err)
        | Outcome::FailedDecode(err)
        | Outcome::FailedEncode(err)
        | Outcome::FailedWrite(err) => Err(err),
    }
}

pub fn build_conversion_options(cli: &Cli) -> Result<ConversionOptions> {
    let target_encoding = resolve_label(&cli.target_encoding)?;
    let source_override = cli
        .source_encoding
        .as_deref()
        .map(resolve_label)
        .transpose()?;
    let newline = NewlineNormalization::from_flag(&cli.newline)
        .unwrap_or(NewlineNormalization::None);
    let replacement = if cli.replace_unencodable {
        ReplacementPolicy::Substitute
    } else {
        ReplacementPolicy::Reject
    };

    Ok(ConversionOptions {
        target_encoding,
        source_override,
        backup_original: !cli.no_backup,
        lossy_fallback_allowed: cli.lossy,
        newline,
        replacement,
        ..ConversionOptions::default()
    })
}
