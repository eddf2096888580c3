//! 外部轉檔程式介面
//!
//! 核心流程只透過 [`Transcoder`] 呼叫 ffmpeg / ffprobe，
//! 測試可替換為不啟動任何程序的實作。

use super::cancellation::CancelToken;
use super::ffmpeg_command::FfmpegCommand;
use super::ffprobe_info::{MediaInfo, parse_probe_output, probe_command};
use crate::error::TranscodeError;
use log::{debug, error, warn};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub trait Transcoder: Send + Sync {
    /// 執行一次轉檔，阻塞直到程序結束、逾時或被取消
    fn run(&self, command: &FfmpegCommand, cancel: &CancelToken) -> Result<(), TranscodeError>;

    /// 與 [`Transcoder::run`] 相同受逾時與取消限制
    fn probe(&self, path: &Path, cancel: &CancelToken) -> Result<MediaInfo, TranscodeError>;
}

/// 以子程序執行 ffmpeg / ffprobe
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    ffmpeg_path: PathBuf,
    ffprobe_path: PathBuf,
    timeout: Option<Duration>,
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg_path: impl Into<PathBuf>, ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
            timeout: None,
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// 在背景讀完輸出管線，避免緩衝區塞滿而卡住子程序
    fn spawn_pipe_reader<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
        let mut pipe = pipe?;
        Some(thread::spawn(move || {
            let mut buffer = String::new();
            let _ = pipe.read_to_string(&mut buffer);
            buffer
        }))
    }

    fn collect(reader: Option<JoinHandle<String>>) -> String {
        reader
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default()
    }

    fn kill(child: &mut Child) {
        if let Err(e) = child.kill() {
            warn!("無法終止程序 [{}]: {e}", child.id());
        }
        let _ = child.wait();
    }

    fn wait_for_completion(
        &self,
        program: &Path,
        child: &mut Child,
        cancel: &CancelToken,
    ) -> Result<ExitStatus, TranscodeError> {
        let started = Instant::now();

        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {}
                Err(e) => {
                    Self::kill(child);
                    return Err(TranscodeError::Failed {
                        exit_code: None,
                        diagnostics: format!("無法檢查程序狀態: {e}"),
                    });
                }
            }

            if cancel.is_cancelled() {
                warn!("收到取消信號，終止程序 [{}]", child.id());
                Self::kill(child);
                return Err(TranscodeError::Cancelled);
            }

            if let Some(timeout) = self.timeout
                && started.elapsed() >= timeout
            {
                warn!(
                    "{} 超過 {} 秒未完成，終止程序 [{}]",
                    program.display(),
                    timeout.as_secs(),
                    child.id()
                );
                Self::kill(child);
                return Err(TranscodeError::Timeout(timeout));
            }

            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Transcoder for FfmpegTranscoder {
    fn run(&self, command: &FfmpegCommand, cancel: &CancelToken) -> Result<(), TranscodeError> {
        if cancel.is_cancelled() {
            return Err(TranscodeError::Cancelled);
        }

        let mut process = command.build_command(&self.ffmpeg_path);
        process
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        debug!(
            "執行 {} 工作: {} {}",
            command.kind(),
            self.ffmpeg_path.display(),
            command.build_args().join(" ")
        );

        let mut child = process.spawn().map_err(|source| TranscodeError::Launch {
            program: self.ffmpeg_path.display().to_string(),
            source,
        })?;

        let stderr_reader = Self::spawn_pipe_reader(child.stderr.take());
        let status = self.wait_for_completion(&self.ffmpeg_path, &mut child, cancel);
        let diagnostics = Self::collect(stderr_reader);

        let status = status?;
        if !status.success() {
            error!(
                "{} 工作失敗 [{}]: {}",
                command.kind(),
                command.output_path().display(),
                diagnostics.trim()
            );
            return Err(TranscodeError::Failed {
                exit_code: status.code(),
                diagnostics: diagnostics.trim().to_string(),
            });
        }

        if !command.output_path().exists() {
            return Err(TranscodeError::MissingOutput(
                command.output_path().to_path_buf(),
            ));
        }

        debug!(
            "{} 工作完成: {}",
            command.kind(),
            command.output_path().display()
        );
        Ok(())
    }

    fn probe(&self, path: &Path, cancel: &CancelToken) -> Result<MediaInfo, TranscodeError> {
        if cancel.is_cancelled() {
            return Err(TranscodeError::Cancelled);
        }

        let mut process = probe_command(&self.ffprobe_path, path);
        process
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = process.spawn().map_err(|source| TranscodeError::Launch {
            program: self.ffprobe_path.display().to_string(),
            source,
        })?;

        let stdout_reader = Self::spawn_pipe_reader(child.stdout.take());
        let stderr_reader = Self::spawn_pipe_reader(child.stderr.take());
        let status = self.wait_for_completion(&self.ffprobe_path, &mut child, cancel);
        let stdout = Self::collect(stdout_reader);
        let stderr = Self::collect(stderr_reader);

        let status = status?;
        if !status.success() {
            return Err(TranscodeError::Failed {
                exit_code: status.code(),
                diagnostics: format!("ffprobe 執行失敗 {}: {}", path.display(), stderr.trim()),
            });
        }

        parse_probe_output(&stdout)
    }
}
