//! 錯誤類型
//!
//! 驗證錯誤在任何轉檔前回報；轉檔錯誤只中止當前階段；
//! 檔案系統錯誤在清理時僅記錄，在必要寫入時升級為階段失敗。

use crate::component::video_synthesis::PipelineState;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// 外部轉檔程式（ffmpeg / ffprobe）呼叫失敗
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("無法啟動 {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("ffmpeg 執行失敗 (exit code {exit_code:?}): {diagnostics}")]
    Failed {
        exit_code: Option<i32>,
        diagnostics: String,
    },

    #[error("ffmpeg 執行逾時 ({}s)，已終止程序", .0.as_secs())]
    Timeout(Duration),

    #[error("操作已取消")]
    Cancelled,

    #[error("輸入無效: {0}")]
    InvalidInput(String),

    #[error("輸出檔案未建立: {}", .0.display())]
    MissingOutput(PathBuf),

    #[error("ffprobe 解析失敗: {0}")]
    Probe(String),
}

impl TranscodeError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// 在任何轉檔工作開始前即可判定的錯誤
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("路徑不存在: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("路徑不是資料夾: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("圖片數量不足: 至少需要 {required} 張，只找到 {found} 張")]
    TooFewImages { found: usize, required: usize },

    #[error("第 {batch_index} 批圖片過多: {size} > {max}")]
    SegmentTooLarge {
        batch_index: usize,
        size: usize,
        max: usize,
    },

    #[error("設定無效: {0}")]
    InvalidSettings(String),
}

/// 管線層級錯誤
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{stage} 階段轉檔失敗: {source}")]
    Transcode {
        stage: PipelineState,
        #[source]
        source: TranscodeError,
    },

    #[error("檔案操作失敗 {}: {source}", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("無法建立工作執行緒池: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl SynthesisError {
    pub fn file_system(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileSystem {
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub const fn transcode(stage: PipelineState, source: TranscodeError) -> Self {
        Self::Transcode { stage, source }
    }

    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
