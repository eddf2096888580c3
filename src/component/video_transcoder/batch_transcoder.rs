use crate::config::BatchTranscodeSettings;
use crate::error::SynthesisError;
use crate::tools::{CancelToken, FfmpegCommand, InputSpec, JobKind, Transcoder, scan_all_files};
use log::{debug, error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// 單一檔案的處理結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscodeOutcome {
    Converted,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TranscodeSummary {
    pub converted: Vec<PathBuf>,
    pub skipped: Vec<(PathBuf, String)>,
    pub failed: Vec<(PathBuf, String)>,
}

impl TranscodeSummary {
    fn record(&mut self, path: &Path, outcome: TranscodeOutcome) {
        match outcome {
            TranscodeOutcome::Converted => self.converted.push(path.to_path_buf()),
            TranscodeOutcome::Skipped(reason) => self.skipped.push((path.to_path_buf(), reason)),
            TranscodeOutcome::Failed(reason) => self.failed.push((path.to_path_buf(), reason)),
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.converted.len() + self.skipped.len() + self.failed.len()
    }
}

/// 與原檔同資料夾的暫存輸出 `<stem>_2.mp4`
#[must_use]
pub fn temporary_output_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!("{stem}_2.mp4"))
}

/// 逐一將指定編碼的影片轉為設定的編碼，完成後取代原檔
pub struct BatchTranscoder<'a> {
    transcoder: &'a dyn Transcoder,
    settings: &'a BatchTranscodeSettings,
    cancel: CancelToken,
}

impl<'a> BatchTranscoder<'a> {
    pub fn new(
        transcoder: &'a dyn Transcoder,
        settings: &'a BatchTranscodeSettings,
        cancel: &CancelToken,
    ) -> Self {
        Self {
            transcoder,
            settings,
            cancel: cancel.child(),
        }
    }

    /// 單一檔案或資料夾（遞迴）
    #[must_use]
    pub fn collect_files(path: &Path) -> Vec<PathBuf> {
        scan_all_files(path).into_iter().map(|info| info.path).collect()
    }

    pub fn run(&self, path: &Path) -> TranscodeSummary {
        let files = Self::collect_files(path);
        info!("找到 {} 個檔案: {}", files.len(), path.display());
        self.run_files(&files, |_, _| {})
    }

    /// 每處理完一個檔案呼叫一次 `on_progress`
    pub fn run_files(
        &self,
        files: &[PathBuf],
        mut on_progress: impl FnMut(&Path, &TranscodeOutcome),
    ) -> TranscodeSummary {
        let mut summary = TranscodeSummary::default();

        for file in files {
            if self.cancel.is_cancelled() {
                warn!("收到取消信號，停止批次轉檔");
                break;
            }
            let outcome = self.transcode_file(file);
            on_progress(file, &outcome);
            summary.record(file, outcome);
        }

        info!(
            "批次轉檔完成 - 轉換: {}, 略過: {}, 失敗: {}",
            summary.converted.len(),
            summary.skipped.len(),
            summary.failed.len()
        );
        summary
    }

    #[must_use]
    pub fn build_command(&self, source: &Path, output: &Path) -> FfmpegCommand {
        FfmpegCommand::new(JobKind::Transcode, output)
            .input(InputSpec::file(source))
            .encoder(&self.settings.encoder)
    }

    pub fn transcode_file(&self, path: &Path) -> TranscodeOutcome {
        let codec = match self.transcoder.probe(path, &self.cancel) {
            Ok(info) => info.codec_name,
            Err(e) => {
                debug!("無法讀取編碼，略過 {}: {e}", path.display());
                return TranscodeOutcome::Skipped(format!("無法讀取編碼: {e}"));
            }
        };

        if codec.as_deref() != Some(self.settings.source_codec.as_str()) {
            return TranscodeOutcome::Skipped(format!(
                "編碼為 {}",
                codec.as_deref().unwrap_or("未知")
            ));
        }

        let temporary = temporary_output_path(path);
        if temporary.exists() {
            warn!("暫存檔已存在，略過 {}", path.display());
            return TranscodeOutcome::Skipped(format!("暫存檔 {} 已存在", temporary.display()));
        }
        info!("開始轉檔: {}", path.display());

        if let Err(e) = self
            .transcoder
            .run(&self.build_command(path, &temporary), &self.cancel)
        {
            discard(&temporary);
            error!("轉檔失敗 {}: {e}", path.display());
            return TranscodeOutcome::Failed(e.to_string());
        }

        match replace_original(path, &temporary) {
            Ok(()) => {
                info!("轉檔完成: {}", path.display());
                TranscodeOutcome::Converted
            }
            Err(e) => {
                error!("無法取代原檔 {}: {e}", path.display());
                TranscodeOutcome::Failed(e.to_string())
            }
        }
    }
}

fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path)
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!("刪除暫存檔失敗 {}: {e}", path.display());
    }
}

/// 先刪原檔再改名；改名失敗時保留暫存檔供手動復原
fn replace_original(original: &Path, temporary: &Path) -> Result<(), SynthesisError> {
    fs::remove_file(original).map_err(|e| {
        discard(temporary);
        SynthesisError::file_system(original, e)
    })?;
    fs::rename(temporary, original).map_err(|e| SynthesisError::file_system(temporary, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TranscodeError;
    use crate::tools::MediaInfo;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// 依副檔名回報編碼，`.fail` 結尾的來源轉檔失敗
    #[derive(Default)]
    struct CodecByExtension {
        runs: Mutex<Vec<PathBuf>>,
    }

    impl Transcoder for CodecByExtension {
        fn run(&self, command: &FfmpegCommand, cancel: &CancelToken) -> Result<(), TranscodeError> {
            if cancel.is_cancelled() {
                return Err(TranscodeError::Cancelled);
            }
            let source = command.inputs_spec()[0].path.clone();
            self.runs.lock().unwrap().push(source.clone());
            fs::write(command.output_path(), b"hevc").unwrap();
            if source.to_string_lossy().contains("broken") {
                return Err(TranscodeError::Failed {
                    exit_code: Some(1),
                    diagnostics: "broken input".to_string(),
                });
            }
            Ok(())
        }

        fn probe(&self, path: &Path, _cancel: &CancelToken) -> Result<MediaInfo, TranscodeError> {
            let codec = match path.extension().and_then(|e| e.to_str()) {
                Some("mp4") => "h264",
                Some("mkv") => "hevc",
                _ => return Err(TranscodeError::Probe("not a video".to_string())),
            };
            Ok(MediaInfo {
                codec_name: Some(codec.to_string()),
                width: Some(1920),
                height: Some(1080),
                sample_aspect_ratio: None,
                duration_seconds: Some(10.0),
            })
        }
    }

    #[test]
    fn test_temporary_output_path() {
        assert_eq!(
            temporary_output_path(Path::new("/videos/clip.mov")),
            PathBuf::from("/videos/clip_2.mp4")
        );
    }

    #[test]
    fn test_only_source_codec_is_converted() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        let h264 = nested.join("a.mp4");
        let hevc = temp_dir.path().join("b.mkv");
        let text = temp_dir.path().join("notes.txt");
        fs::write(&h264, b"h264").unwrap();
        fs::write(&hevc, b"hevc").unwrap();
        fs::write(&text, b"text").unwrap();

        let transcoder = CodecByExtension::default();
        let settings = BatchTranscodeSettings::default();
        let batch = BatchTranscoder::new(&transcoder, &settings, &CancelToken::new());
        let summary = batch.run(temp_dir.path());

        assert_eq!(summary.converted, vec![h264.clone()]);
        assert_eq!(summary.skipped.len(), 2);
        assert!(summary.failed.is_empty());
        assert_eq!(fs::read(&h264).unwrap(), b"hevc");
        assert!(!temporary_output_path(&h264).exists());
    }

    #[test]
    fn test_failure_keeps_original() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("broken.mp4");
        fs::write(&source, b"h264").unwrap();

        let transcoder = CodecByExtension::default();
        let settings = BatchTranscodeSettings::default();
        let batch = BatchTranscoder::new(&transcoder, &settings, &CancelToken::new());
        let outcome = batch.transcode_file(&source);

        assert!(matches!(outcome, TranscodeOutcome::Failed(_)));
        assert_eq!(fs::read(&source).unwrap(), b"h264");
        assert!(!temporary_output_path(&source).exists());
    }

    #[test]
    fn test_existing_temporary_name_is_left_alone() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("a.mp4");
        let user_file = temp_dir.path().join("a_2.mp4");
        fs::write(&source, b"h264").unwrap();
        fs::write(&user_file, b"USER DATA").unwrap();

        let transcoder = CodecByExtension::default();
        let settings = BatchTranscodeSettings::default();
        let batch = BatchTranscoder::new(&transcoder, &settings, &CancelToken::new());
        let outcome = batch.transcode_file(&source);

        assert!(matches!(outcome, TranscodeOutcome::Skipped(_)));
        assert_eq!(fs::read(&user_file).unwrap(), b"USER DATA");
        assert_eq!(fs::read(&source).unwrap(), b"h264");
        assert!(transcoder.runs.lock().unwrap().is_empty());
    }

    #[test]
    fn test_cancellation_stops_before_next_file() {
        let temp_dir = TempDir::new().unwrap();
        let files: Vec<PathBuf> = (0..3)
            .map(|i| {
                let path = temp_dir.path().join(format!("{i}.mp4"));
                fs::write(&path, b"h264").unwrap();
                path
            })
            .collect();

        let transcoder = CodecByExtension::default();
        let settings = BatchTranscodeSettings::default();
        let cancel = CancelToken::new();
        let batch = BatchTranscoder::new(&transcoder, &settings, &cancel);
        let summary = batch.run_files(&files, |_, _| cancel.cancel());

        assert_eq!(summary.total(), 1);
        assert_eq!(transcoder.runs.lock().unwrap().len(), 1);
    }
}
