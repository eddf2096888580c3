use crate::component::{VideoSynthesizer, VideoTranscoder};
use crate::config::Config;
use crate::pause;
use anyhow::Result;
use console::{Term, style};
use rust_i18n::t;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub fn run_video_synthesizer(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    config: &mut Config,
) -> Result<()> {
    // 上一次的中斷不影響新的工作
    shutdown_signal.store(false, Ordering::SeqCst);
    let mut synthesizer = VideoSynthesizer::new(config.clone(), Arc::clone(shutdown_signal));

    if let Err(e) = synthesizer.run() {
        eprintln!("{} {}", style(t!("common.error_prefix")).red().bold(), e);
    }
    *config = synthesizer.into_config();

    pause(term)?;
    Ok(())
}

pub fn run_video_transcoder(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    config: &Config,
) -> Result<()> {
    shutdown_signal.store(false, Ordering::SeqCst);
    let transcoder = VideoTranscoder::new(config.clone(), Arc::clone(shutdown_signal));

    if let Err(e) = transcoder.run() {
        eprintln!("{} {}", style(t!("common.error_prefix")).red().bold(), e);
    }

    pause(term)?;
    Ok(())
}
