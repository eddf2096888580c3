use super::frame_normalizer::letterbox_filter;
use super::segment::{Segment, SegmentSource};
use crate::config::EncoderSettings;
use crate::error::TranscodeError;
use crate::tools::{CancelToken, FfmpegCommand, InputSpec, JobKind, Transcoder};
use log::{info, warn};
use std::path::{Path, PathBuf};

#[must_use]
pub fn gif_output_path(work_dir: &Path, index: usize) -> PathBuf {
    work_dir.join(format!("gif_{index:03}.mp4"))
}

/// 將 GIF 轉成與圖片片段相同解析度與幀率的影片
pub struct GifConverter<'a> {
    transcoder: &'a dyn Transcoder,
    encoder: &'a EncoderSettings,
    width: u32,
    height: u32,
    frame_rate: u32,
}

impl<'a> GifConverter<'a> {
    pub fn new(
        transcoder: &'a dyn Transcoder,
        encoder: &'a EncoderSettings,
        width: u32,
        height: u32,
        frame_rate: u32,
    ) -> Self {
        Self {
            transcoder,
            encoder,
            width,
            height,
            frame_rate,
        }
    }

    #[must_use]
    pub fn build_command(&self, gif_path: &Path, output_path: &Path) -> FfmpegCommand {
        FfmpegCommand::new(JobKind::ConvertGif, output_path)
            .input(InputSpec::file(gif_path))
            .video_filter(format!(
                "{},fps={}",
                letterbox_filter(self.width, self.height),
                self.frame_rate
            ))
            .encoder(self.encoder)
            .output_arg("-an")
    }

    pub fn convert(
        &self,
        gif_path: &Path,
        output_path: &Path,
        order_hint: usize,
        cancel: &CancelToken,
    ) -> Result<Segment, TranscodeError> {
        self.transcoder
            .run(&self.build_command(gif_path, output_path), cancel)?;

        // 長度只用於顯示，取得失敗不影響合併
        let duration_seconds = match self.transcoder.probe(output_path, cancel) {
            Ok(info) => info.duration_seconds,
            Err(e) => {
                warn!("無法取得 GIF 片段長度 {}: {e}", output_path.display());
                None
            }
        };

        info!(
            "GIF 轉換完成: {} -> {}",
            gif_path.display(),
            output_path.display()
        );

        Ok(Segment {
            path: output_path.to_path_buf(),
            duration_seconds,
            order_hint,
            source: SegmentSource::Gif {
                source: gif_path.to_path_buf(),
            },
        })
    }
}
