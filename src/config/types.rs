use crate::component::video_synthesis::DEFAULT_TRANSITIONS;
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const MAX_RECENT_PATHS: usize = 10;

/// 單一輸出檔案的編碼參數
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    pub video_codec: String,
    pub preset: Option<String>,
    pub pixel_format: Option<String>,
    /// libx264 / libx265 的 CRF
    pub crf: Option<u8>,
    /// NVENC 類編碼器的 rate control 模式（例如 vbr）
    pub rate_control: Option<String>,
    /// NVENC 類編碼器的固定品質值
    pub constant_quality: Option<u8>,
    pub multipass: Option<u8>,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            video_codec: "libx265".to_string(),
            preset: Some("slow".to_string()),
            pixel_format: Some("yuv420p".to_string()),
            crf: Some(23),
            rate_control: None,
            constant_quality: None,
            multipass: None,
        }
    }
}

impl EncoderSettings {
    #[must_use]
    pub fn with_crf(crf: u8) -> Self {
        Self {
            crf: Some(crf),
            ..Self::default()
        }
    }

    /// 轉換為 ffmpeg 輸出參數
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["-c:v".to_string(), self.video_codec.clone()];
        if let Some(preset) = &self.preset {
            args.extend(["-preset".to_string(), preset.clone()]);
        }
        if let Some(rc) = &self.rate_control {
            args.extend(["-rc".to_string(), rc.clone()]);
        }
        if let Some(cq) = self.constant_quality {
            args.extend(["-cq".to_string(), cq.to_string()]);
        }
        if let Some(crf) = self.crf {
            args.extend(["-crf".to_string(), crf.to_string()]);
        }
        if let Some(passes) = self.multipass {
            args.extend(["-multipass".to_string(), passes.to_string()]);
        }
        if let Some(pix_fmt) = &self.pixel_format {
            args.extend(["-pix_fmt".to_string(), pix_fmt.clone()]);
        }
        args
    }
}

/// 圖片合成影片設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisSettings {
    pub source_directory: PathBuf,
    pub output_path: PathBuf,
    /// 中間檔存放位置，未設定時於來源資料夾下建立 `.synthesis-<uuid>`
    pub work_directory: Option<PathBuf>,
    pub target_width: u32,
    pub target_height: u32,
    pub frame_rate: u32,
    pub display_duration_secs: f64,
    pub transition_duration_secs: f64,
    pub use_crossfade: bool,
    pub fixed_transition: Option<String>,
    /// 覆寫預設的轉場清單
    pub transition_catalog: Option<Vec<String>>,
    pub batch_size: usize,
    pub max_images_per_segment: usize,
    pub random_seed: Option<u64>,
    pub worker_threads: usize,
    pub transcode_timeout_secs: Option<u64>,
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    pub segment_encoder: EncoderSettings,
    pub gif_encoder: EncoderSettings,
    pub merge_encoder: EncoderSettings,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            source_directory: PathBuf::new(),
            output_path: PathBuf::from("output.mp4"),
            work_directory: None,
            target_width: 1920,
            target_height: 1080,
            frame_rate: 60,
            display_duration_secs: 4.0,
            transition_duration_secs: 1.0,
            use_crossfade: true,
            fixed_transition: None,
            transition_catalog: None,
            batch_size: 30,
            max_images_per_segment: 50,
            random_seed: None,
            worker_threads: 4,
            transcode_timeout_secs: Some(3600),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            segment_encoder: EncoderSettings::default(),
            gif_encoder: EncoderSettings::with_crf(28),
            merge_encoder: EncoderSettings::default(),
        }
    }
}

impl SynthesisSettings {
    #[must_use]
    pub fn transcode_timeout(&self) -> Option<Duration> {
        self.transcode_timeout_secs.map(Duration::from_secs)
    }

    /// 目前生效的轉場清單
    #[must_use]
    pub fn catalog(&self) -> Vec<String> {
        self.transition_catalog.clone().unwrap_or_else(|| {
            DEFAULT_TRANSITIONS
                .iter()
                .map(|name| (*name).to_string())
                .collect()
        })
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let invalid = |message: String| Err(ValidationError::InvalidSettings(message));

        if self.target_width == 0 || self.target_height == 0 {
            return invalid(format!(
                "輸出解析度不可為 0: {}x{}",
                self.target_width, self.target_height
            ));
        }
        if self.target_width % 2 != 0 || self.target_height % 2 != 0 {
            return invalid(format!(
                "輸出解析度必須為偶數: {}x{}",
                self.target_width, self.target_height
            ));
        }
        if self.frame_rate == 0 {
            return invalid("幀率不可為 0".to_string());
        }
        if !self.display_duration_secs.is_finite() || !self.transition_duration_secs.is_finite() {
            return invalid(format!(
                "時間設定必須為有限數值: 顯示 {}s, 轉場 {}s",
                self.display_duration_secs, self.transition_duration_secs
            ));
        }
        if !(self.transition_duration_secs > 0.0) {
            return invalid(format!(
                "轉場時間必須大於 0: {}",
                self.transition_duration_secs
            ));
        }
        if self.transition_duration_secs > self.display_duration_secs {
            return invalid(format!(
                "轉場時間 {}s 不可大於圖片顯示時間 {}s",
                self.transition_duration_secs, self.display_duration_secs
            ));
        }
        if self.batch_size < 2 {
            return invalid(format!("每批圖片數至少為 2: {}", self.batch_size));
        }
        if self.max_images_per_segment < 2 {
            return invalid(format!(
                "每段影片圖片上限至少為 2: {}",
                self.max_images_per_segment
            ));
        }
        if self.worker_threads == 0 {
            return invalid("工作執行緒數不可為 0".to_string());
        }

        let catalog = self.catalog();
        if catalog.is_empty() {
            return invalid("轉場清單不可為空".to_string());
        }
        if let Some(fixed) = &self.fixed_transition
            && !catalog.iter().any(|name| name == fixed)
        {
            return invalid(format!("不支援的轉場: {fixed}"));
        }

        Ok(())
    }
}

/// 批次轉檔設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchTranscodeSettings {
    /// 只轉換此編碼的影片
    pub source_codec: String,
    pub encoder: EncoderSettings,
    pub transcode_timeout_secs: Option<u64>,
}

impl Default for BatchTranscodeSettings {
    fn default() -> Self {
        Self {
            source_codec: "h264".to_string(),
            encoder: EncoderSettings {
                crf: Some(23),
                ..EncoderSettings::default()
            },
            transcode_timeout_secs: None,
        }
    }
}

/// 介面語言，對應 `locales/` 下的檔案
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en-US")]
    EnUs,
    #[default]
    #[serde(rename = "zh-TW")]
    ZhTw,
}

impl Language {
    pub const ALL: [Self; 2] = [Self::EnUs, Self::ZhTw];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EnUs => "en-US",
            Self::ZhTw => "zh-TW",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::EnUs => "English",
            Self::ZhTw => "繁體中文",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub language: Language,
    pub synthesis: SynthesisSettings,
    pub batch_transcode: BatchTranscodeSettings,
    pub recent_paths: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub settings: UserSettings,
}
