use std::io;
use std::time::Instant;

use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use rand::distr::Alphanumeric;
use rand::Rng;
use regex::RegexSet;

pub fn setup_logging(log_level: &str) -> io::Result<()> {
    let log_level_filter = match log_level {
        "debug" => log::LevelFilter::Debug,
        "info" => log::LevelFilter::Info,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        _ => log::LevelFilter::Info,
    };
    env_logger::Builder::new()
        .filter_level(log_level_filter)
        .init();
    Ok(())
}

pub struct ProgressManager {
    pb: ProgressBar,
    no_progress: bool,
    start: Instant,
}

impl ProgressManager {
    pub fn new(total: u64, no_progress: bool) -> Self {
        let pb = if no_progress {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new(total);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{msg} [{bar:40}] {pos}/{len} ETA: {eta_precise}")
                    .unwrap()
                    .progress_chars("##-"),
            );
            pb
        };
        ProgressManager {
            pb,
            no_progress,
            start: Instant::now(),
        }
    }

    pub fn update(&self, count: u64, action: &str) {
        if self.no_progress {
            return;
        }
        let elapsed = self.start.elapsed().as_secs_f64();
        let speed = if elapsed > 0.0 {
            count as f64 / elapsed
        } else {
            0.0
        };
        self.pb
            .set_message(format!("{action}：{count} 檔案，速度：{speed:.0} 檔案/秒"));
        self.pb.set_position(count);
    }

    pub fn finish(&self, converted: u64, skipped: u64, failed: u64) {
        if self.no_progress {
            return;
        }
        self.pb.finish_with_message(format!(
            "完成，轉換 {converted} 個檔案，跳過 {skipped} 個，失敗 {failed} 個"
        ));
    }
}

pub fn generate_slug(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}

pub fn timestamp_slug() -> String {
    Local::now().format("%Y%m%d%H%M%S").to_string()
}

pub fn create_regex_sets(include: &[String], exclude: &[String]) -> (RegexSet, RegexSet) {
    let include_patterns: Vec<_> = include
        .iter()
        .map(|p| p.replace(".", "\\.").replace("*", ".*"))
        .collect();
    let exclude_patterns: Vec<_> = exclude
        .iter()
        .map(|p| p.replace(".", "\\.").replace("*", ".*"))
        .collect();

    let include_set = RegexSet::new(&include_patterns).unwrap_or_else(|e| {
        log::warn!("無效的包含模式: {}，使用空集作為回退", e);
        RegexSet::empty()
    });

    let exclude_set = RegexSet::new(&exclude_patterns).unwrap_or_else(|e| {
        log::warn!("無效的排除模式: {}，使用空集作為回退", e);
        RegexSet::empty()
    });

    (include_set, exclude_set)
}
