//! 整合測試 - 以腳本化的轉檔替身驗證整條合成流程
//!
//! 不需要 ffmpeg：替身只記錄每次呼叫並寫出輸出檔

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::TempDir;
use video_synthesis::component::video_synthesis::{
    PipelineOrchestrator, PipelineResult, PipelineState, SegmentSource,
};
use video_synthesis::config::SynthesisSettings;
use video_synthesis::error::{SynthesisError, TranscodeError, ValidationError};
use video_synthesis::tools::{CancelToken, FfmpegCommand, JobKind, MediaInfo, Transcoder};
use walkdir::WalkDir;

/// 對流程中的某個步驟注入的行為
#[derive(Clone, Copy, PartialEq, Eq)]
enum Injection {
    None,
    FailOn(JobKind),
    /// 合併時刪除一張正規化圖片，模擬清理前已消失的中間檔
    VanishBeforeCleaning,
    /// 第一張正規化圖片寫成含檔案的資料夾，使其無法刪除
    UndeletableFrame,
}

struct ScriptedTranscoder {
    injection: Injection,
    calls: Mutex<Vec<(JobKind, Vec<String>)>>,
}

impl ScriptedTranscoder {
    fn new(injection: Injection) -> Self {
        Self {
            injection,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn count(&self, kind: JobKind) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .count()
    }

    fn total(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// 所有合成工作的 filter graph（排序後）
    fn compose_graphs(&self) -> Vec<String> {
        let mut graphs: Vec<String> = self
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(kind, _)| *kind == JobKind::Compose)
            .filter_map(|(_, args)| {
                let index = args.iter().position(|arg| arg == "-filter_complex")?;
                args.get(index + 1).cloned()
            })
            .collect();
        graphs.sort();
        graphs
    }
}

impl Transcoder for ScriptedTranscoder {
    fn run(&self, command: &FfmpegCommand, cancel: &CancelToken) -> Result<(), TranscodeError> {
        if cancel.is_cancelled() {
            return Err(TranscodeError::Cancelled);
        }
        self.calls
            .lock()
            .unwrap()
            .push((command.kind(), command.build_args()));

        let output = command.output_path();
        let first_frame = output
            .file_name()
            .is_some_and(|name| name == "frame_0000.png");

        if self.injection == Injection::UndeletableFrame && first_frame {
            fs::create_dir(output).unwrap();
            fs::write(output.join("locked"), b"x").unwrap();
        } else {
            // 失敗時也留下部分輸出
            fs::write(output, b"partial").unwrap();
        }

        if self.injection == Injection::VanishBeforeCleaning && command.kind() == JobKind::Merge {
            let work_dir = output.parent().unwrap();
            fs::remove_file(work_dir.join("frame_0000.png")).unwrap();
        }

        if self.injection == Injection::FailOn(command.kind()) {
            return Err(TranscodeError::Failed {
                exit_code: Some(1),
                diagnostics: format!("injected {} failure", command.kind()),
            });
        }
        Ok(())
    }

    fn probe(&self, _path: &Path, _cancel: &CancelToken) -> Result<MediaInfo, TranscodeError> {
        Ok(MediaInfo {
            codec_name: Some("h264".to_string()),
            width: Some(1920),
            height: Some(1080),
            sample_aspect_ratio: Some("1:1".to_string()),
            duration_seconds: Some(3.0),
        })
    }
}

struct Workspace {
    _temp_dir: TempDir,
    source: PathBuf,
    output: PathBuf,
}

impl Workspace {
    fn new(images: usize, gifs: usize) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("photos");
        fs::create_dir(&source).unwrap();
        for i in 0..images {
            fs::write(source.join(format!("img_{i:03}.jpg")), b"jpeg").unwrap();
        }
        for i in 0..gifs {
            fs::write(source.join(format!("anim_{i:02}.gif")), b"gif").unwrap();
        }
        fs::write(source.join("README.txt"), b"not media").unwrap();
        let output = temp_dir.path().join("result").join("output.mp4");

        Self {
            _temp_dir: temp_dir,
            source,
            output,
        }
    }

    fn root(&self) -> &Path {
        self.source.parent().unwrap()
    }

    fn settings(&self) -> SynthesisSettings {
        SynthesisSettings {
            source_directory: self.source.clone(),
            output_path: self.output.clone(),
            fixed_transition: Some("fade".to_string()),
            random_seed: Some(2024),
            worker_threads: 2,
            ..SynthesisSettings::default()
        }
    }

    fn snapshot(&self) -> BTreeSet<PathBuf> {
        WalkDir::new(self.root())
            .into_iter()
            .filter_map(Result::ok)
            .map(|entry| entry.path().to_path_buf())
            .collect()
    }
}

fn run(settings: &SynthesisSettings, transcoder: &ScriptedTranscoder) -> PipelineResult {
    PipelineOrchestrator::new(settings, transcoder, &CancelToken::new()).run()
}

/// 測試 1: 5 張圖片、每批 30 張、固定 fade 轉場 -> 單一 16 秒片段
#[test]
fn test_five_images_single_segment() {
    let workspace = Workspace::new(5, 0);
    let transcoder = ScriptedTranscoder::new(Injection::None);

    let result = run(&workspace.settings(), &transcoder);

    assert!(result.success, "{:?}", result.failure_reason());
    assert_eq!(result.segments.len(), 1);
    assert_eq!(result.segments[0].duration_seconds, Some(16.0));
    assert_eq!(
        result.segments[0].source,
        SegmentSource::Images { frame_count: 5 }
    );
    assert_eq!(result.output_path.as_deref(), Some(workspace.output.as_path()));
    assert!(workspace.output.exists());

    assert_eq!(transcoder.count(JobKind::Normalize), 5);
    assert_eq!(transcoder.count(JobKind::Compose), 1);
    assert_eq!(transcoder.count(JobKind::ConvertGif), 0);
    assert_eq!(transcoder.count(JobKind::Merge), 1);

    let graphs = transcoder.compose_graphs();
    assert_eq!(graphs[0].matches("xfade=transition=fade").count(), 4);
    assert!(graphs[0].contains("offset=12.000[x4]"));

    println!("✓ 單一片段測試通過");
}

/// 測試 2: 61 張圖片、每批 30 張 -> 最後一張併入第二批
#[test]
fn test_remainder_of_one_is_merged() {
    let workspace = Workspace::new(61, 0);
    let transcoder = ScriptedTranscoder::new(Injection::None);

    let result = run(&workspace.settings(), &transcoder);

    assert!(result.success, "{:?}", result.failure_reason());
    let mut segments = result.segments.clone();
    segments.sort_by_key(|s| s.order_hint);
    let sizes: Vec<usize> = segments
        .iter()
        .map(|s| match s.source {
            SegmentSource::Images { frame_count } => frame_count,
            SegmentSource::Gif { .. } => 0,
        })
        .collect();
    assert_eq!(sizes, vec![30, 31]);
    assert_eq!(transcoder.count(JobKind::Compose), 2);

    println!("✓ 餘數合併測試通過");
}

/// 測試 3: 少於 2 張圖片 -> 驗證錯誤，不呼叫任何轉檔
#[test]
fn test_too_few_images() {
    let workspace = Workspace::new(1, 3);
    let before = workspace.snapshot();
    let transcoder = ScriptedTranscoder::new(Injection::None);

    let result = run(&workspace.settings(), &transcoder);

    assert!(!result.success);
    assert!(matches!(
        result.failure,
        Some(SynthesisError::Validation(ValidationError::TooFewImages {
            found: 1,
            required: 2
        }))
    ));
    assert_eq!(transcoder.total(), 0);
    assert_eq!(workspace.snapshot(), before);
}

/// 測試 4: 單批超過上限 -> 在正規化前拒絕
#[test]
fn test_ceiling_rejected_before_normalization() {
    let workspace = Workspace::new(61, 0);
    let transcoder = ScriptedTranscoder::new(Injection::None);
    let settings = SynthesisSettings {
        batch_size: 60,
        ..workspace.settings()
    };

    let result = run(&settings, &transcoder);

    assert_eq!(result.failed_stage, Some(PipelineState::Scanning));
    assert!(matches!(
        result.failure,
        Some(SynthesisError::Validation(ValidationError::SegmentTooLarge {
            size: 61,
            max: 50,
            ..
        }))
    ));
    assert_eq!(transcoder.total(), 0);
}

/// 測試 5: 每個階段失敗後，磁碟上的檔案與執行前完全相同
#[test]
fn test_cleanup_totality_for_every_failing_state() {
    let cases = [
        (Injection::FailOn(JobKind::Normalize), PipelineState::Normalizing),
        (Injection::FailOn(JobKind::Compose), PipelineState::Batching),
        (Injection::FailOn(JobKind::ConvertGif), PipelineState::ConvertingGifs),
        (Injection::FailOn(JobKind::Merge), PipelineState::Merging),
    ];

    for (injection, expected_stage) in cases {
        let workspace = Workspace::new(7, 2);
        let before = workspace.snapshot();
        let transcoder = ScriptedTranscoder::new(injection);
        let settings = SynthesisSettings {
            batch_size: 3,
            ..workspace.settings()
        };

        let result = run(&settings, &transcoder);

        assert!(!result.success);
        assert_eq!(result.failed_stage, Some(expected_stage));
        assert!(matches!(
            result.failure,
            Some(SynthesisError::Transcode { stage, .. }) if stage == expected_stage
        ));
        assert!(result.uncleaned_artifacts.is_empty());
        assert!(!result.cleaned_artifacts.is_empty());
        assert_eq!(
            result
                .states
                .iter()
                .filter(|s| **s == PipelineState::Cleaning)
                .count(),
            1
        );
        assert_eq!(workspace.snapshot(), before, "{expected_stage}");
    }

    println!("✓ 各階段清理測試通過");
}

/// 測試 6: Scanning 階段失敗（來源不存在）
#[test]
fn test_missing_source_directory() {
    let workspace = Workspace::new(0, 0);
    let before = workspace.snapshot();
    let transcoder = ScriptedTranscoder::new(Injection::None);
    let settings = SynthesisSettings {
        source_directory: workspace.root().join("does-not-exist"),
        ..workspace.settings()
    };

    let result = run(&settings, &transcoder);

    assert_eq!(result.failed_stage, Some(PipelineState::Scanning));
    assert!(result.failure.as_ref().unwrap().is_validation());
    assert_eq!(
        result.states,
        vec![
            PipelineState::Scanning,
            PipelineState::Cleaning,
            PipelineState::Done
        ]
    );
    assert_eq!(workspace.snapshot(), before);
}

/// 測試 7: Cleaning 時中間檔已被外部刪除，仍視為成功清理
#[test]
fn test_artifact_vanished_before_cleaning() {
    let workspace = Workspace::new(4, 1);
    let mut before = workspace.snapshot();
    let transcoder = ScriptedTranscoder::new(Injection::VanishBeforeCleaning);

    let result = run(&workspace.settings(), &transcoder);

    assert!(result.success, "{:?}", result.failure_reason());
    assert!(result.uncleaned_artifacts.is_empty());
    before.insert(workspace.output.parent().unwrap().to_path_buf());
    before.insert(workspace.output.clone());
    assert_eq!(workspace.snapshot(), before);
}

/// 測試 8: 無法刪除的中間檔會回報給使用者，不影響結果
#[test]
fn test_undeletable_artifact_is_reported() {
    let workspace = Workspace::new(3, 0);
    let transcoder = ScriptedTranscoder::new(Injection::UndeletableFrame);

    let result = run(&workspace.settings(), &transcoder);

    assert!(result.success, "{:?}", result.failure_reason());
    assert_eq!(result.uncleaned_artifacts.len(), 2);
    assert!(
        result
            .uncleaned_artifacts
            .iter()
            .any(|path| path.ends_with("frame_0000.png"))
    );
    assert!(result.uncleaned_artifacts.iter().all(|path| path.exists()));
}

/// 測試 9: GIF 片段排在圖片片段之後並參與合併
#[test]
fn test_gif_segments_follow_image_segments() {
    let workspace = Workspace::new(4, 2);
    let transcoder = ScriptedTranscoder::new(Injection::None);

    let result = run(&workspace.settings(), &transcoder);

    assert!(result.success, "{:?}", result.failure_reason());
    assert_eq!(result.segments.len(), 3);
    let mut gif_hints: Vec<usize> = result
        .segments
        .iter()
        .filter(|s| matches!(s.source, SegmentSource::Gif { .. }))
        .map(|s| s.order_hint)
        .collect();
    gif_hints.sort_unstable();
    assert_eq!(gif_hints, vec![1, 2]);
    assert!(
        result
            .segments
            .iter()
            .filter(|s| matches!(s.source, SegmentSource::Gif { .. }))
            .all(|s| s.duration_seconds == Some(3.0))
    );
    assert_eq!(transcoder.count(JobKind::ConvertGif), 2);
}

/// 測試 10: 相同種子 -> 相同的轉場與合併順序
#[test]
fn test_seed_makes_run_reproducible() {
    let run_once = || {
        let workspace = Workspace::new(12, 2);
        let transcoder = ScriptedTranscoder::new(Injection::None);
        let settings = SynthesisSettings {
            batch_size: 4,
            fixed_transition: None,
            random_seed: Some(99),
            ..workspace.settings()
        };
        let result = run(&settings, &transcoder);
        assert!(result.success, "{:?}", result.failure_reason());
        let order: Vec<usize> = result.segments.iter().map(|s| s.order_hint).collect();
        (order, transcoder.compose_graphs())
    };

    assert_eq!(run_once(), run_once());
}

/// 測試 11: 不合理的設定在任何轉檔前即被拒絕
#[test]
fn test_invalid_settings_rejected() {
    let workspace = Workspace::new(5, 0);
    let transcoder = ScriptedTranscoder::new(Injection::None);
    let settings = SynthesisSettings {
        display_duration_secs: 1.0,
        transition_duration_secs: 2.0,
        ..workspace.settings()
    };

    let result = run(&settings, &transcoder);

    assert!(matches!(
        result.failure,
        Some(SynthesisError::Validation(ValidationError::InvalidSettings(_)))
    ));
    assert_eq!(transcoder.total(), 0);
}

/// 測試 12: 串接模式不使用 xfade
#[test]
fn test_concat_mode() {
    let workspace = Workspace::new(6, 0);
    let transcoder = ScriptedTranscoder::new(Injection::None);
    let settings = SynthesisSettings {
        use_crossfade: false,
        ..workspace.settings()
    };

    let result = run(&settings, &transcoder);

    assert!(result.success, "{:?}", result.failure_reason());
    assert_eq!(result.segments[0].duration_seconds, Some(24.0));
    let graphs = transcoder.compose_graphs();
    assert!(graphs[0].contains("concat=n=6:v=1:a=0[v]"));
    assert!(!graphs[0].contains("xfade"));
}

/// 測試 13: 工作資料夾的上層不存在時，結束後連同新建的上層一起移除
#[test]
fn test_nested_missing_work_directory_is_removed() {
    for injection in [Injection::FailOn(JobKind::Normalize), Injection::None] {
        let workspace = Workspace::new(4, 1);
        let before = workspace.snapshot();
        let transcoder = ScriptedTranscoder::new(injection);
        let settings = SynthesisSettings {
            work_directory: Some(workspace.root().join("scratch").join("nested")),
            ..workspace.settings()
        };

        let result = run(&settings, &transcoder);

        assert_eq!(result.success, injection == Injection::None);
        assert!(result.uncleaned_artifacts.is_empty());
        assert!(!workspace.root().join("scratch").exists());

        let mut after = workspace.snapshot();
        after.remove(&workspace.output);
        after.remove(workspace.output.parent().unwrap());
        assert_eq!(after, before);
    }

    println!("✓ 巢狀工作資料夾清理測試通過");
}
