use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use log::{info, warn};
use rayon::prelude::*;
use regex::RegexSet;
use walkdir::WalkDir;

use crate::convert;
use crate::error::{ConvertError, Result};
use crate::models::{BatchReport, ConversionOptions, ConversionRequest, ConversionResult};
use crate::utils::{create_regex_sets, ProgressManager};

/// Extensions treated as subtitles when the caller does not say otherwise.
pub const DEFAULT_EXTENSIONS: [&str; 5] = ["srt", "ass", "ssa", "sub", "vtt"];

/// Batch-level options: the per-file conversion template plus discovery
/// filters and naming.
#[derive(Clone)]
pub struct BatchOptions {
    pub conversion: ConversionOptions,
    /// Recognized subtitle extensions, compared case-insensitively.
    pub extensions: Vec<String>,
    /// Shared output directory; enables sequence naming so converted names
    /// from different subdirectories can never collide.
    pub output_dir: Option<PathBuf>,
    pub suffix: Option<String>,
    pub include: RegexSet,
    pub exclude: RegexSet,
    pub no_progress: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        let (include, exclude) = create_regex_sets(&["*".to_string()], &[]);
        BatchOptions {
            conversion: ConversionOptions::default(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            output_dir: None,
            suffix: None,
            include,
            exclude,
            no_progress: true,
        }
    }
}

/// Convert every subtitle file under `root`.
///
/// One file's failure is recorded in its entry and never halts the batch;
/// the report always covers every discovered file, in discovery order.
/// Conversions run in parallel across files; output paths never alias
/// (in-place outputs are distinct by construction, a shared output directory
/// gets sequence naming), so no two writes target the same path.
pub fn batch_convert(root: &Path, options: &BatchOptions) -> Result<BatchReport> {
    if !root.is_dir() {
        return Err(ConvertError::InvalidSourceDirectory(root.to_path_buf()));
    }

    let files = discover_subtitles(root, options);
    if files.is_empty() {
        warn!("在 {} 下找不到符合條件的字幕檔", root.display());
        return Ok(BatchReport::default());
    }
    info!("在 {} 下發現 {} 個字幕檔", root.display(), files.len());

    let sequence_naming = options.output_dir.is_some();
    let requests: Vec<ConversionRequest> = files
        .into_iter()
        .enumerate()
        .map(|(index, path)| {
            let mut request = ConversionRequest::new(path, options.conversion.clone());
            request.output_dir = options.output_dir.clone();
            request.suffix = options.suffix.clone();
            if sequence_naming {
                request.sequence = Some(index + 1);
            }
            request
        })
        .collect();

    let progress = ProgressManager::new(requests.len() as u64, options.no_progress);
    let completed = AtomicU64::new(0);
    let results: Vec<ConversionResult> = requests
        .par_iter()
        .map(|request| {
            let result = convert::convert(request);
            if let Some(err) = result.outcome.error() {
                warn!("檔案 {} 轉換失敗：{err}", request.source.display());
            }
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            progress.update(done, "轉換中");
            result
        })
        .collect();

    let report = BatchReport { results };
    progress.finish(
        report.converted() as u64,
        report.skipped() as u64,
        report.failed() as u64,
    );
    info!(
        "批次完成：轉換 {}，跳過 {}，失敗 {}",
        report.converted(),
        report.skipped(),
        report.failed()
    );
    Ok(report)
}

/// Recursive discovery under `root`, deterministic: the final list is sorted
/// lexicographically by full path, so report ordering is reproducible.
fn discover_subtitles(root: &Path, options: &BatchOptions) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("略過無法讀取的路徑：{err}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        if is_subtitle(&path, &options.extensions) && passes_filters(&path, options) {
            files.push(path);
        }
    }
    files.sort();
    files
}

fn is_subtitle(path: &Path, extensions: &[String]) -> bool {
    let Some(extension) = path.extension() else {
        return false;
    };
    let extension = extension.to_string_lossy().to_lowercase();
    extensions.iter().any(|e| e.to_lowercase() == extension)
}

fn passes_filters(path: &Path, options: &BatchOptions) -> bool {
    let path_str = path.to_string_lossy();
    options.include.is_match(&path_str) && !options.exclude.is_match(&path_str)
}
