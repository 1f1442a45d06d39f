use std::fs;
use std::path::Path;

use sub_recode::encoding::encode::ReplacementPolicy;
use sub_recode::encoding::eol::NewlineNormalization;
use sub_recode::encoding::{TextEncoding, UTF_16LE, UTF_8};
use sub_recode::{batch_convert, convert, BatchOptions, ConversionOptions, ConversionRequest, Outcome};

fn utf16le_with_bom(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    bytes
}

fn utf8_with_bom(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xEF, 0xBB, 0xBF];
    bytes.extend_from_slice(text.as_bytes());
    bytes
}

fn in_place_request(path: &Path) -> ConversionRequest {
    ConversionRequest::new(path, ConversionOptions::default())
}

#[test]
fn utf16le_bom_to_utf8_bomless() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("movie.srt");
    fs::write(&file, utf16le_with_bom("Hello")).unwrap();

    let result = convert(&in_place_request(&file));

    assert!(matches!(result.outcome, Outcome::Success), "{:?}", result.outcome);
    assert_eq!(result.detected, Some(UTF_16LE));
    assert_eq!(result.confidence, Some(1.0));
    assert_eq!(fs::read(&file).unwrap(), b"Hello");
}

#[test]
fn backup_preserves_original_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("movie.srt");
    let original = utf16le_with_bom("Original line");
    fs::write(&file, &original).unwrap();

    let result = convert(&in_place_request(&file));

    assert!(matches!(result.outcome, Outcome::Success));
    let backup = result.backup_path.expect("backup expected for in-place overwrite");
    assert_eq!(backup, dir.path().join("movie.srt.bak"));
    assert_eq!(fs::read(&backup).unwrap(), original);
    assert_eq!(fs::read(&file).unwrap(), b"Original line");
}

#[test]
fn skip_when_already_target_performs_zero_writes() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("movie.srt");
    fs::write(&file, "1\n00:00:01,000 --> 00:00:02,000\nHello\n").unwrap();

    let result = convert(&in_place_request(&file));

    assert!(matches!(result.outcome, Outcome::SkippedAlreadyTarget));
    assert!(result.backup_path.is_none());
    assert!(result.output_path.is_none());
    // The file is untouched and nothing else appeared next to it.
    assert_eq!(
        fs::read(&file).unwrap(),
        b"1\n00:00:01,000 --> 00:00:02,000\nHello\n"
    );
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn utf8_bom_mismatch_is_rewritten_without_bom() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("movie.srt");
    fs::write(&file, utf8_with_bom("Hello")).unwrap();

    let result = convert(&in_place_request(&file));

    assert!(matches!(result.outcome, Outcome::Success));
    assert_eq!(fs::read(&file).unwrap(), b"Hello");
}

#[test]
fn conversion_is_idempotent_once_at_target() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("movie.srt");
    let (bytes, _, _) = encoding_rs::WINDOWS_1256.encode("السلام عليكم ورحمة الله وبركاته");
    fs::write(&file, &bytes).unwrap();

    let first = convert(&in_place_request(&file));
    assert!(matches!(first.outcome, Outcome::Success), "{:?}", first.outcome);
    let converted = fs::read(&file).unwrap();
    assert_eq!(converted, "السلام عليكم ورحمة الله وبركاته".as_bytes());

    let second = convert(&in_place_request(&file));
    assert!(matches!(second.outcome, Outcome::SkippedAlreadyTarget));
    assert_eq!(fs::read(&file).unwrap(), converted);
}

#[test]
fn strict_failure_without_lossy_never_corrupts() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("movie.srt");
    let original = b"ok \xFF\xFF broken".to_vec();
    fs::write(&file, &original).unwrap();

    // Pin the source encoding so no fallback can rescue the bytes.
    let mut request = in_place_request(&file);
    request.options.source_override = Some(UTF_8);

    let result = convert(&request);

    assert!(matches!(result.outcome, Outcome::FailedDecode(_)));
    assert_eq!(fs::read(&file).unwrap(), original);
    assert!(result.backup_path.is_none());
}

#[test]
fn lossy_fallback_flags_the_result() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("movie.srt");
    fs::write(&file, b"ok \xFF\xFF broken").unwrap();

    let mut request = in_place_request(&file);
    request.options.source_override = Some(UTF_8);
    request.options.lossy_fallback_allowed = true;

    let result = convert(&request);

    assert!(matches!(result.outcome, Outcome::Success));
    assert!(result.lossy);
    let converted = String::from_utf8(fs::read(&file).unwrap()).unwrap();
    assert!(converted.contains('\u{FFFD}'));
    assert!(converted.starts_with("ok "));
}

#[test]
fn unencodable_character_rejected_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("movie.srt");
    let original = "中文字幕".as_bytes().to_vec();
    fs::write(&file, &original).unwrap();

    let mut request = in_place_request(&file);
    request.options.source_override = Some(UTF_8);
    request.options.target_encoding = TextEncoding::Rs(encoding_rs::WINDOWS_1252);

    let result = convert(&request);

    assert!(matches!(result.outcome, Outcome::FailedEncode(_)));
    assert_eq!(fs::read(&file).unwrap(), original);
}

#[test]
fn substitute_policy_converts_with_question_marks() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("movie.srt");
    fs::write(&file, "ok 中 ok".as_bytes()).unwrap();

    let mut request = in_place_request(&file);
    request.options.source_override = Some(UTF_8);
    request.options.target_encoding = TextEncoding::Rs(encoding_rs::WINDOWS_1252);
    request.options.replacement = ReplacementPolicy::Substitute;

    let result = convert(&request);

    assert!(matches!(result.outcome, Outcome::Success));
    assert_eq!(fs::read(&file).unwrap(), b"ok ? ok");
}

#[test]
fn newline_normalization_rewrites_even_when_encoding_matches() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("movie.srt");
    fs::write(&file, "first\r\nsecond\r\n").unwrap();

    let mut request = in_place_request(&file);
    request.options.newline = NewlineNormalization::Unix;

    let result = convert(&request);

    assert!(matches!(result.outcome, Outcome::Success));
    assert_eq!(fs::read(&file).unwrap(), b"first\nsecond\n");
}

#[test]
fn failed_final_write_leaves_original_intact() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("movie.srt");
    let original = utf8_with_bom("Hello");
    fs::write(&file, &original).unwrap();

    // The output path is an existing directory, so the final rename cannot
    // succeed; the source must remain byte-identical.
    let obstacle = dir.path().join("occupied");
    fs::create_dir(&obstacle).unwrap();
    let mut request = in_place_request(&file);
    request.output_path = Some(obstacle.clone());
    request.options.backup_original = false;

    let result = convert(&request);

    assert!(matches!(result.outcome, Outcome::FailedWrite(_)));
    assert_eq!(fs::read(&file).unwrap(), original);
    assert!(obstacle.is_dir());
    // The temporary file was cleaned up.
    let names: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names.len(), 2, "unexpected leftovers: {names:?}");
}

#[test]
fn suffix_writes_a_sibling_and_keeps_the_source() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("movie.srt");
    let original = utf16le_with_bom("Hello");
    fs::write(&file, &original).unwrap();

    let mut request = in_place_request(&file);
    request.suffix = Some("fixed".to_string());

    let result = convert(&request);

    assert!(matches!(result.outcome, Outcome::Success));
    assert_eq!(result.output_path, Some(dir.path().join("movie.fixed.srt")));
    assert_eq!(fs::read(dir.path().join("movie.fixed.srt")).unwrap(), b"Hello");
    assert_eq!(fs::read(&file).unwrap(), original);
    assert!(result.backup_path.is_none());
}

#[test]
fn batch_isolates_the_failing_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.srt"), utf8_with_bom("first")).unwrap();
    fs::write(dir.path().join("b.srt"), utf8_with_bom("second")).unwrap();
    fs::write(dir.path().join("c.srt"), utf8_with_bom("third")).unwrap();
    fs::write(dir.path().join("empty.srt"), b"").unwrap();

    let report = batch_convert(dir.path(), &BatchOptions::default()).unwrap();

    assert_eq!(report.len(), 4);
    assert_eq!(report.converted(), 3);
    assert_eq!(report.failed(), 1);

    // Discovery order is lexicographic, so the report order is reproducible.
    let names: Vec<_> = report
        .iter()
        .map(|r| r.source.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["a.srt", "b.srt", "c.srt", "empty.srt"]);

    let empty = &report.results[3];
    assert!(matches!(empty.outcome, Outcome::FailedDetection(_)));
    assert_eq!(fs::read(dir.path().join("a.srt")).unwrap(), b"first");
}

#[test]
fn batch_recurses_and_ignores_other_extensions() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("season1")).unwrap();
    fs::write(dir.path().join("season1/ep1.srt"), utf8_with_bom("ep1")).unwrap();
    fs::write(dir.path().join("notes.txt"), utf8_with_bom("not a subtitle")).unwrap();

    let report = batch_convert(dir.path(), &BatchOptions::default()).unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(
        report.results[0].source,
        dir.path().join("season1/ep1.srt")
    );
    // The .txt file was never touched.
    assert_eq!(
        fs::read(dir.path().join("notes.txt")).unwrap(),
        utf8_with_bom("not a subtitle")
    );
}

#[test]
fn batch_root_must_be_a_directory() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("movie.srt");
    fs::write(&file, b"x").unwrap();

    let result = batch_convert(&file, &BatchOptions::default());
    assert!(matches!(
        result,
        Err(sub_recode::ConvertError::InvalidSourceDirectory(_))
    ));
}

#[test]
fn batch_output_dir_applies_sequence_naming() {
    let dir = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("a")).unwrap();
    fs::create_dir_all(dir.path().join("b")).unwrap();
    // Same file name in two subdirectories would collide in a shared
    // output directory without sequence naming.
    fs::write(dir.path().join("a/movie.srt"), utf8_with_bom("from a")).unwrap();
    fs::write(dir.path().join("b/movie.srt"), utf8_with_bom("from b")).unwrap();

    let options = BatchOptions {
        output_dir: Some(out.path().to_path_buf()),
        ..BatchOptions::default()
    };
    let report = batch_convert(dir.path(), &options).unwrap();

    assert_eq!(report.len(), 2);
    assert_eq!(report.converted(), 2);
    assert_eq!(fs::read(out.path().join("movie.1.srt")).unwrap(), b"from a");
    assert_eq!(fs::read(out.path().join("movie.2.srt")).unwrap(), b"from b");
}

#[test]
fn explicit_source_override_skips_detection() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("movie.srt");
    // Valid in both windows-1256 and windows-1251; the override decides.
    let (bytes, _, _) = encoding_rs::WINDOWS_1251.encode("привет");
    fs::write(&file, &bytes).unwrap();

    let mut request = in_place_request(&file);
    request.options.source_override =
        Some(TextEncoding::Rs(encoding_rs::WINDOWS_1251));

    let result = convert(&request);

    assert!(matches!(result.outcome, Outcome::Success));
    assert_eq!(result.detected, Some(TextEncoding::Rs(encoding_rs::WINDOWS_1251)));
    assert_eq!(result.confidence, Some(1.0));
    assert_eq!(fs::read(&file).unwrap(), "привет".as_bytes());
}

#[test]
fn missing_source_file_is_a_write_failure() {
    let dir = tempfile::tempdir().unwrap();
    let request = in_place_request(&dir.path().join("missing.srt"));
    let result = convert(&request);
    assert!(matches!(result.outcome, Outcome::FailedWrite(_)));
}
