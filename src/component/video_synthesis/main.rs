use super::orchestrator::{PipelineOrchestrator, PipelineResult};
use super::segment::SegmentSource;
use crate::config::Config;
use crate::config::save::{add_recent_path, save_settings};
use crate::tools::{CancelToken, FfmpegTranscoder};
use anyhow::Result;
use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use log::{info, warn};
use rust_i18n::t;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub struct VideoSynthesizer {
    config: Config,
    shutdown_signal: Arc<AtomicBool>,
}

impl VideoSynthesizer {
    pub const fn new(config: Config, shutdown_signal: Arc<AtomicBool>) -> Self {
        Self {
            config,
            shutdown_signal,
        }
    }

    /// 取回執行後更新的設定（最近使用的路徑等）
    #[must_use]
    pub fn into_config(self) -> Config {
        self.config
    }

    pub fn run(&mut self) -> Result<()> {
        println!("{}", style(t!("synthesis.title")).cyan().bold());

        let source = self.prompt_source_directory()?;
        let output = self.prompt_output_path(&source)?;

        let settings = &mut self.config.settings.synthesis;
        settings.source_directory = source.clone();
        settings.output_path = output;
        settings.use_crossfade = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(t!("synthesis.use_crossfade"))
            .default(settings.use_crossfade)
            .interact()?;

        add_recent_path(&mut self.config.settings, &source.to_string_lossy());
        if let Err(e) = save_settings(&self.config.settings) {
            warn!("無法儲存設定: {e}");
        }

        let settings = &self.config.settings.synthesis;
        println!(
            "{}",
            style(t!(
                "synthesis.settings_line",
                width = settings.target_width,
                height = settings.target_height,
                fps = settings.frame_rate,
                display = settings.display_duration_secs,
                transition = settings.transition_duration_secs,
                batch = settings.batch_size
            ))
            .dim()
        );
        println!("{}", style(t!("synthesis.starting")).cyan());

        let transcoder = FfmpegTranscoder::new(&settings.ffmpeg_path, &settings.ffprobe_path)
            .with_timeout(settings.transcode_timeout());
        let cancel = CancelToken::from_signal(Arc::clone(&self.shutdown_signal));
        let result = PipelineOrchestrator::new(settings, &transcoder, &cancel).run();

        print_summary(&result);
        Ok(())
    }

    fn prompt_source_directory(&self) -> Result<PathBuf> {
        let recent = &self.config.settings.recent_paths;

        if !recent.is_empty() {
            let mut items: Vec<String> = recent.clone();
            items.push(t!("synthesis.new_path").to_string());

            let selection = Select::with_theme(&ColorfulTheme::default())
                .with_prompt(t!("synthesis.select_source"))
                .items(&items)
                .default(0)
                .interact()?;

            if selection < recent.len() {
                return Ok(PathBuf::from(&recent[selection]));
            }
        }

        let path: String = Input::new()
            .with_prompt(t!("synthesis.input_source"))
            .interact_text()?;
        Ok(PathBuf::from(path.trim()))
    }

    fn prompt_output_path(&self, source: &Path) -> Result<PathBuf> {
        let configured = &self.config.settings.synthesis.output_path;
        let default = if configured.is_absolute() {
            configured.clone()
        } else {
            source.join(configured)
        };

        let path: String = Input::new()
            .with_prompt(t!("synthesis.output_path"))
            .default(default.to_string_lossy().to_string())
            .interact_text()?;
        Ok(PathBuf::from(path.trim()))
    }
}

fn print_summary(result: &PipelineResult) {
    println!();
    println!("{}", style(t!("synthesis.summary.title")).cyan().bold());

    if let Some(output) = &result.output_path {
        println!("  {} {}", t!("synthesis.summary.output"), style(output.display()).green());
        let images = result
            .segments
            .iter()
            .filter(|s| matches!(s.source, SegmentSource::Images { .. }))
            .count();
        println!(
            "  {}",
            t!(
                "synthesis.summary.segments",
                total = result.segments.len(),
                images = images,
                gifs = result.segments.len() - images
            )
        );
        let total: f64 = result
            .segments
            .iter()
            .filter_map(|s| s.duration_seconds)
            .sum();
        println!(
            "  {}",
            t!("synthesis.summary.duration", secs = format!("{total:.1}"))
        );
    }

    if let Some(reason) = result.failure_reason() {
        let stage = result
            .failed_stage
            .map(|s| s.to_string())
            .unwrap_or_default();
        println!(
            "  {} [{stage}] {reason}",
            style(t!("synthesis.summary.failed")).red().bold()
        );
    }

    println!(
        "  {}",
        t!("synthesis.summary.cleaned", count = result.cleaned_artifacts.len())
    );
    if !result.uncleaned_artifacts.is_empty() {
        println!("{}", style(t!("synthesis.summary.uncleaned")).yellow());
        for path in &result.uncleaned_artifacts {
            println!("  - {}", path.display());
        }
    }

    info!(
        "合成結束 - 成功: {}, 清理: {}, 殘留: {}",
        result.success,
        result.cleaned_artifacts.len(),
        result.uncleaned_artifacts.len()
    );
}
