use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};
use tempfile::NamedTempFile;

use crate::encoding::bom::{bom_bytes, detect_bom};
use crate::encoding::eol::NewlineNormalization;
use crate::encoding::{decode, detect, encode, EncodingGuess, TextEncoding};
use crate::error::{ConvertError, Result};
use crate::models::{ConversionRequest, ConversionResult, Outcome};
use crate::utils::{generate_slug, timestamp_slug};

/// Below this detection confidence a warning is logged before proceeding;
/// the strict-decode fallback chain still guards against a wrong guess.
pub const CONFIDENCE_THRESHOLD: f32 = 0.7;

/// Extension appended to the file being overwritten, byte-exact copy.
pub const BACKUP_EXTENSION: &str = "bak";

const SLUG_LENGTH: usize = 3;
const MAX_SLUG_LENGTH: usize = 8;

/// Convert one file: read, detect (or take the override), decode, re-encode,
/// then atomically write. Never panics and never propagates: every failure is
/// captured in the returned `ConversionResult`.
///
/// The source file's bytes are overwritten only when decode and re-encode
/// both succeeded; until the final rename the original is untouched, and when
/// an existing file is about to be replaced a backup copy is taken first.
pub fn convert(request: &ConversionRequest) -> ConversionResult {
    let opts = &request.options;
    let source = request.source.as_path();

    let bytes = match fs::read(source) {
        Ok(bytes) => bytes,
        Err(err) => return ConversionResult::new(source, Outcome::FailedWrite(err.into())),
    };
    info!("讀取檔案：{}，大小：{} 位元組", source.display(), bytes.len());

    let guess = if let Some(override_encoding) = opts.source_override {
        EncodingGuess::certain(override_encoding)
    } else {
        match detect::detect(&bytes, opts.target_encoding, &opts.candidates) {
            Ok(guess) => guess,
            Err(err) => return ConversionResult::new(source, Outcome::FailedDetection(err)),
        }
    };

    let mut result = ConversionResult::new(source, Outcome::Success);
    result.detected = Some(guess.encoding);
    result.confidence = Some(guess.confidence);

    info!(
        "偵測結果：{} → {}（信心值 {:.2}）",
        source.display(),
        guess.encoding,
        guess.confidence
    );
    if guess.confidence < CONFIDENCE_THRESHOLD {
        warn!(
            "檔案 {} 的偵測信心值偏低（{:.2}），將依後備編碼鏈繼續",
            source.display(),
            guess.confidence
        );
    }

    if request.is_in_place() && can_skip(&bytes, &guess, request) {
        info!(
            "檔案 {} 已是目標編碼 {}，不需改寫",
            source.display(),
            opts.target_encoding
        );
        result.outcome = Outcome::SkippedAlreadyTarget;
        return result;
    }

    let decoded = match decode::decode(&bytes, &guess, opts.lossy_fallback_allowed) {
        Ok(decoded) => decoded,
        Err(err) => {
            result.outcome = Outcome::FailedDecode(err);
            return result;
        }
    };
    if decoded.encoding != guess.encoding {
        info!(
            "檔案 {} 改用後備編碼 {} 解碼",
            source.display(),
            decoded.encoding
        );
        result.detected = Some(decoded.encoding);
    }
    if decoded.lossy {
        warn!(
            "檔案 {} 以寬鬆模式解碼，部分位元組已被取代",
            source.display()
        );
        result.lossy = true;
    }

    let output = match encode::encode(
        &decoded.text,
        opts.target_encoding,
        opts.newline,
        opts.replacement,
    ) {
        Ok(output) => output,
        Err(err) => {
            result.outcome = Outcome::FailedEncode(err);
            return result;
        }
    };

    let output_path = match resolve_output_path(request) {
        Ok(path) => path,
        Err(err) => {
            result.outcome = Outcome::FailedWrite(err);
            return result;
        }
    };

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            if let Err(err) = fs::create_dir_all(parent) {
                result.outcome = Outcome::FailedWrite(err.into());
                return result;
            }
        }
    }

    if output_path.exists() && opts.backup_original {
        match create_backup(&output_path) {
            Ok(backup) => {
                info!("已備份原始檔案至 {}", backup.display());
                result.backup_path = Some(backup);
            }
            Err(err) => {
                result.outcome = Outcome::FailedWrite(err);
                return result;
            }
        }
    }

    if let Err(err) = atomic_write(&output_path, &output) {
        result.outcome = Outcome::FailedWrite(err);
        return result;
    }
    info!(
        "已寫入 {}（{} 位元組，目標編碼 {}）",
        output_path.display(),
        output.len(),
        opts.target_encoding
    );
    result.output_path = Some(output_path);
    result
}

/// Rewriting is pointless when the detected encoding is already the target,
/// no newline normalization was requested, and the file's BOM already matches
/// what the target would be written with. The whole stream must also strictly
/// decode as the target: detection samples the file, a skip must not.
fn can_skip(bytes: &[u8], guess: &EncodingGuess, request: &ConversionRequest) -> bool {
    let opts = &request.options;
    guess.encoding == opts.target_encoding
        && opts.newline == NewlineNormalization::None
        && bom_matches_target(bytes, opts.target_encoding)
        && decode::decode_strict(bytes, opts.target_encoding).is_some()
}

fn bom_matches_target(bytes: &[u8], target: TextEncoding) -> bool {
    let expected = bom_bytes(target);
    match detect_bom(bytes) {
        None => expected.is_empty(),
        Some(bom) => bom.encoding == target && !expected.is_empty(),
    }
}

/// Resolve where the converted bytes go. An explicit output path wins; with
/// no naming options at all the conversion is in-place. Otherwise the name is
/// rebuilt next to the source (or in the output directory) with the optional
/// sequence/suffix parts, and a random slug resolves collisions, growing on
/// repeated collision.
fn resolve_output_path(request: &ConversionRequest) -> Result<PathBuf> {
    if let Some(path) = &request.output_path {
        return Ok(path.clone());
    }
    if request.is_in_place() {
        return Ok(request.source.clone());
    }

    let directory = match &request.output_dir {
        Some(dir) => dir.clone(),
        None => request
            .source
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf(),
    };
    let (stem, extension) = split_name(&request.source);
    let decoration = concat_parts(
        request.sequence.map(|n| n.to_string()),
        request.suffix.clone(),
    );

    let plain = make_name(&directory, &stem, None, decoration.as_deref(), extension.as_deref());
    if !plain.exists() {
        return Ok(plain);
    }

    let mut slug_length = SLUG_LENGTH;
    loop {
        let slug = generate_slug(slug_length);
        let candidate = make_name(
            &directory,
            &stem,
            Some(slug.as_str()),
            decoration.as_deref(),
            extension.as_deref(),
        );
        if !candidate.exists() {
            return Ok(candidate);
        }
        slug_length += 1;
        if slug_length > MAX_SLUG_LENGTH {
            return Err(ConvertError::Write(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("無法為 {} 產生不重複的輸出檔名", request.source.display()),
            )));
        }
    }
}

fn split_name(path: &Path) -> (String, Option<String>) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "subtitle".to_string());
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());
    (stem, extension)
}

/// `{stem}.{slug}.{decoration}.{extension}`, omitting the absent parts.
fn make_name(
    directory: &Path,
    stem: &str,
    slug: Option<&str>,
    decoration: Option<&str>,
    extension: Option<&str>,
) -> PathBuf {
    let mut name = String::from(stem);
    if let Some(slug) = slug {
        name.push('.');
        name.push_str(slug);
    }
    if let Some(decoration) = decoration {
        name.push('.');
        name.push_str(decoration);
    }
    if let Some(extension) = extension {
        name.push('.');
        name.push_str(extension);
    }
    directory.join(name)
}

fn concat_parts(start: Option<String>, end: Option<String>) -> Option<String> {
    match (start, end) {
        (Some(start), Some(end)) => Some(format!("{start}.{end}")),
        (Some(start), None) => Some(start),
        (None, Some(end)) => Some(end),
        (None, None) => None,
    }
}

/// Byte-exact copy of the file about to be overwritten, as a sibling `.bak`;
/// a timestamp keeps the name unique when a backup already exists.
fn create_backup(path: &Path) -> Result<PathBuf> {
    let mut backup = append_extension(path, BACKUP_EXTENSION);
    if backup.exists() {
        backup = append_extension(&append_extension(path, &timestamp_slug()), BACKUP_EXTENSION);
    }
    fs::copy(path, &backup)?;
    Ok(backup)
}

fn append_extension(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Write to a temporary file in the destination directory, then rename over
/// the destination, so a crash mid-write can never leave a half-written file.
fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(directory)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path)
        .map_err(|err| ConvertError::Write(err.error))?;
    Ok(())
}
