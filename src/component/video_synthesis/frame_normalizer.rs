use crate::error::TranscodeError;
use crate::tools::{CancelToken, FfmpegCommand, InputSpec, JobKind, Transcoder};
use log::debug;
use std::path::{Path, PathBuf};

/// 縮放並置中到固定畫布後的單張圖片
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedFrame {
    pub source: PathBuf,
    pub output_path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// 等比例縮小（不放大超過目標）、黑邊置中、強制 SAR = 1
#[must_use]
pub fn letterbox_filter(width: u32, height: u32) -> String {
    format!(
        "scale={width}:{height}:force_original_aspect_ratio=decrease,pad={width}:{height}:(ow-iw)/2:(oh-ih)/2:color=black,setsar=1"
    )
}

pub struct FrameNormalizer<'a> {
    transcoder: &'a dyn Transcoder,
    width: u32,
    height: u32,
}

impl<'a> FrameNormalizer<'a> {
    pub fn new(transcoder: &'a dyn Transcoder, width: u32, height: u32) -> Self {
        Self {
            transcoder,
            width,
            height,
        }
    }

    #[must_use]
    pub fn build_command(&self, image_path: &Path, output_path: &Path) -> FfmpegCommand {
        FfmpegCommand::new(JobKind::Normalize, output_path)
            .input(InputSpec::file(image_path))
            .video_filter(letterbox_filter(self.width, self.height))
            .single_frame()
    }

    /// 只寫出一個檔案；失敗時帶回 ffmpeg 的診斷訊息，由呼叫端決定是否中止
    pub fn normalize(
        &self,
        image_path: &Path,
        output_path: &Path,
        cancel: &CancelToken,
    ) -> Result<NormalizedFrame, TranscodeError> {
        debug!(
            "正規化圖片 {} -> {} ({}x{})",
            image_path.display(),
            output_path.display(),
            self.width,
            self.height
        );

        self.transcoder
            .run(&self.build_command(image_path, output_path), cancel)?;

        Ok(NormalizedFrame {
            source: image_path.to_path_buf(),
            output_path: output_path.to_path_buf(),
            width: self.width,
            height: self.height,
        })
    }
}
