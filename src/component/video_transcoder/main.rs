use super::batch_transcoder::{BatchTranscoder, TranscodeOutcome, TranscodeSummary};
use crate::config::Config;
use crate::tools::{CancelToken, FfmpegTranscoder, scan_all_files};
use anyhow::{Result, bail};
use console::style;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use rust_i18n::t;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub struct VideoTranscoder {
    config: Config,
    shutdown_signal: Arc<AtomicBool>,
}

impl VideoTranscoder {
    pub const fn new(config: Config, shutdown_signal: Arc<AtomicBool>) -> Self {
        Self {
            config,
            shutdown_signal,
        }
    }

    pub fn run(&self) -> Result<()> {
        println!("{}", style(t!("transcode.title")).cyan().bold());

        let path: String = Input::new()
            .with_prompt(t!("transcode.input_path"))
            .interact_text()?;
        let path = PathBuf::from(path.trim());
        if !path.exists() {
            bail!("{}", t!("transcode.path_not_found", path = path.display()));
        }

        let files = scan_all_files(&path);
        if files.is_empty() {
            println!("{}", style(t!("transcode.no_files")).yellow());
            return Ok(());
        }
        let total_mb = files.iter().map(|f| f.size).sum::<u64>() as f64 / 1024.0 / 1024.0;
        println!(
            "{}",
            style(t!(
                "transcode.found_files",
                count = files.len(),
                size = format!("{total_mb:.2}")
            ))
            .green()
        );

        let synthesis = &self.config.settings.synthesis;
        let settings = &self.config.settings.batch_transcode;
        let transcoder = FfmpegTranscoder::new(&synthesis.ffmpeg_path, &synthesis.ffprobe_path)
            .with_timeout(settings.transcode_timeout_secs.map(std::time::Duration::from_secs));
        let cancel = CancelToken::from_signal(Arc::clone(&self.shutdown_signal));
        let batch = BatchTranscoder::new(&transcoder, settings, &cancel);

        let progress_bar = ProgressBar::new(files.len() as u64);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
                .progress_chars("#>-"),
        );

        let paths: Vec<PathBuf> = files.into_iter().map(|f| f.path).collect();
        let summary = batch.run_files(&paths, |file, outcome| {
            let name = file.file_name().unwrap_or_default().to_string_lossy();
            let mark = match outcome {
                TranscodeOutcome::Converted => t!("transcode.mark_converted"),
                TranscodeOutcome::Skipped(_) => t!("transcode.mark_skipped"),
                TranscodeOutcome::Failed(_) => t!("transcode.mark_failed"),
            };
            progress_bar.set_message(format!("{mark}: {name}"));
            progress_bar.inc(1);
        });
        progress_bar.finish_with_message(t!("transcode.finished").to_string());

        print_summary(&summary);
        Ok(())
    }
}

fn print_summary(summary: &TranscodeSummary) {
    println!();
    println!("{}", style(t!("transcode.summary.title")).cyan().bold());
    println!("  {}", t!("transcode.summary.total", count = summary.total()));
    println!(
        "  {}",
        style(t!("transcode.summary.converted", count = summary.converted.len())).green()
    );
    println!("  {}", t!("transcode.summary.skipped", count = summary.skipped.len()));
    if !summary.failed.is_empty() {
        println!(
            "  {}",
            style(t!("transcode.summary.failed", count = summary.failed.len())).red()
        );
        for (path, reason) in &summary.failed {
            println!("    - {}: {reason}", path.display());
        }
    }
}
