use crate::error::TranscodeError;
use serde::Deserialize;
use std::path::Path;
use std::process::Command;

/// 主要視訊串流的基本資訊
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    pub codec_name: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub sample_aspect_ratio: Option<String>,
    pub duration_seconds: Option<f64>,
}

#[derive(Deserialize)]
struct FfprobeOutput {
    format: Option<FormatInfo>,
    streams: Option<Vec<StreamInfo>>,
}

#[derive(Deserialize)]
struct FormatInfo {
    duration: Option<String>,
}

#[derive(Deserialize)]
struct StreamInfo {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    sample_aspect_ratio: Option<String>,
    duration: Option<String>,
}

/// 取得媒體資訊的 ffprobe 命令，輸出 JSON 到 stdout
#[must_use]
pub fn probe_command(ffprobe_path: &Path, path: &Path) -> Command {
    let mut command = Command::new(ffprobe_path);
    command
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path);
    command
}

pub fn parse_probe_output(stdout: &str) -> Result<MediaInfo, TranscodeError> {
    let probe: FfprobeOutput = serde_json::from_str(stdout)
        .map_err(|e| TranscodeError::Probe(format!("無法解析 ffprobe 輸出: {e}")))?;

    let video_stream = probe
        .streams
        .as_ref()
        .and_then(|streams| {
            streams
                .iter()
                .find(|s| s.codec_type.as_deref() == Some("video"))
        })
        .ok_or_else(|| TranscodeError::Probe("找不到視訊串流".to_string()))?;

    // 影片長度優先從 format 取得，其次從 stream
    let duration_seconds = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .or(video_stream.duration.as_ref())
        .and_then(|d| d.parse::<f64>().ok());

    Ok(MediaInfo {
        codec_name: video_stream.codec_name.clone(),
        width: video_stream.width,
        height: video_stream.height,
        sample_aspect_ratio: video_stream.sample_aspect_ratio.clone(),
        duration_seconds,
    })
}
