//! 合成流程狀態機
//!
//! `Scanning → Normalizing → Batching → ConvertingGifs → Merging → Cleaning → Done`
//!
//! 任一階段失敗都直接進入 Cleaning；Cleaning 每次執行恰好一次，
//! 刪除所有已登記的中間檔後才回報結果。

use super::frame_normalizer::{FrameNormalizer, NormalizedFrame};
use super::gif_converter::{GifConverter, gif_output_path};
use super::segment::Segment;
use super::segment_batcher::{SegmentBatcher, plan_batches, segment_output_path, validate_plan};
use super::transition_composer::{CompositionSettings, TransitionComposer};
use super::video_merger::VideoMerger;
use crate::config::SynthesisSettings;
use crate::error::{SynthesisError, TranscodeError, ValidationError};
use crate::tools::{
    ArtifactLedger, CancelToken, MediaInventory, Transcoder, WorkerPool,
    create_missing_directories, first_failure, scan_media,
};
use log::{debug, error, info, warn};
use std::fmt;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const MIN_IMAGES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    Scanning,
    Normalizing,
    Batching,
    ConvertingGifs,
    Merging,
    Cleaning,
    Done,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Scanning => "Scanning",
            Self::Normalizing => "Normalizing",
            Self::Batching => "Batching",
            Self::ConvertingGifs => "ConvertingGifs",
            Self::Merging => "Merging",
            Self::Cleaning => "Cleaning",
            Self::Done => "Done",
        };
        f.write_str(name)
    }
}

/// 一次執行的最終結果
#[derive(Debug)]
pub struct PipelineResult {
    pub success: bool,
    pub output_path: Option<PathBuf>,
    pub failure: Option<SynthesisError>,
    pub failed_stage: Option<PipelineState>,
    /// 實際合併順序
    pub segments: Vec<Segment>,
    pub cleaned_artifacts: Vec<PathBuf>,
    /// 無法刪除、需要手動處理的中間檔
    pub uncleaned_artifacts: Vec<PathBuf>,
    pub states: Vec<PipelineState>,
}

impl PipelineResult {
    #[must_use]
    pub fn failure_reason(&self) -> Option<String> {
        self.failure.as_ref().map(ToString::to_string)
    }
}

struct StageFailure {
    stage: PipelineState,
    error: SynthesisError,
}

impl StageFailure {
    fn new(stage: PipelineState, error: impl Into<SynthesisError>) -> Self {
        Self {
            stage,
            error: error.into(),
        }
    }

    fn transcode(stage: PipelineState, error: TranscodeError) -> Self {
        Self::new(stage, SynthesisError::transcode(stage, error))
    }
}

struct Completed {
    output_path: PathBuf,
    segments: Vec<Segment>,
}

/// Scanning 階段的產出
struct ScanOutcome {
    inventory: MediaInventory,
    plan: Vec<Range<usize>>,
    work_dir: PathBuf,
}

pub struct PipelineOrchestrator<'a> {
    settings: &'a SynthesisSettings,
    transcoder: &'a dyn Transcoder,
    cancel: CancelToken,
}

impl<'a> PipelineOrchestrator<'a> {
    pub fn new(
        settings: &'a SynthesisSettings,
        transcoder: &'a dyn Transcoder,
        cancel: &CancelToken,
    ) -> Self {
        Self {
            settings,
            transcoder,
            cancel: cancel.child(),
        }
    }

    pub fn run(&self) -> PipelineResult {
        let mut ledger = ArtifactLedger::default();
        let mut states = Vec::new();

        let outcome = self.execute(&mut ledger, &mut states);

        states.push(PipelineState::Cleaning);
        let report = ledger.cleanup();
        states.push(PipelineState::Done);

        match outcome {
            Ok(completed) => {
                info!("影片合成完成: {}", completed.output_path.display());
                PipelineResult {
                    success: true,
                    output_path: Some(completed.output_path),
                    failure: None,
                    failed_stage: None,
                    segments: completed.segments,
                    cleaned_artifacts: report.removed,
                    uncleaned_artifacts: report.not_deleted,
                    states,
                }
            }
            Err(failure) => {
                error!("影片合成失敗於 {} 階段: {}", failure.stage, failure.error);
                PipelineResult {
                    success: false,
                    output_path: None,
                    failure: Some(failure.error),
                    failed_stage: Some(failure.stage),
                    segments: Vec::new(),
                    cleaned_artifacts: report.removed,
                    uncleaned_artifacts: report.not_deleted,
                    states,
                }
            }
        }
    }

    fn enter(
        &self,
        state: PipelineState,
        states: &mut Vec<PipelineState>,
    ) -> Result<(), StageFailure> {
        states.push(state);
        info!("進入 {state} 階段");
        if self.cancel.is_cancelled() {
            return Err(StageFailure::transcode(state, TranscodeError::Cancelled));
        }
        Ok(())
    }

    fn execute(
        &self,
        ledger: &mut ArtifactLedger,
        states: &mut Vec<PipelineState>,
    ) -> Result<Completed, StageFailure> {
        self.enter(PipelineState::Scanning, states)?;
        let scan = self
            .scan(ledger)
            .map_err(|e| StageFailure::new(PipelineState::Scanning, e))?;

        let pool = WorkerPool::new(self.settings.worker_threads)
            .map_err(|e| StageFailure::new(PipelineState::Scanning, e))?;
        debug!("工作執行緒: {}", pool.threads());

        self.enter(PipelineState::Normalizing, states)?;
        let frames = self.normalize(&pool, &scan, ledger)?;

        self.enter(PipelineState::Batching, states)?;
        let mut segments = self.compose_batches(&pool, &scan, &frames, ledger)?;

        self.enter(PipelineState::ConvertingGifs, states)?;
        segments.extend(self.convert_gifs(&pool, &scan, segments.len(), ledger)?);

        self.enter(PipelineState::Merging, states)?;
        self.merge(&scan, segments, ledger)
    }

    fn scan(&self, ledger: &mut ArtifactLedger) -> Result<ScanOutcome, SynthesisError> {
        let settings = self.settings;
        settings.validate()?;

        let inventory = scan_media(&settings.source_directory)?;
        info!(
            "找到 {} 張圖片、{} 個 GIF（略過 {} 個其他檔案）",
            inventory.images.len(),
            inventory.gifs.len(),
            inventory.others.len()
        );

        if inventory.images.len() < MIN_IMAGES {
            return Err(ValidationError::TooFewImages {
                found: inventory.images.len(),
                required: MIN_IMAGES,
            }
            .into());
        }

        let plan = plan_batches(inventory.images.len(), settings.batch_size);
        validate_plan(&plan, settings.max_images_per_segment)?;

        let base = settings
            .work_directory
            .as_deref()
            .unwrap_or(&settings.source_directory);
        let work_dir = base.join(format!(".synthesis-{}", Uuid::new_v4()));
        for directory in create_missing_directories(&work_dir)? {
            ledger.track_directory(directory);
        }
        info!("工作資料夾: {}", work_dir.display());

        Ok(ScanOutcome {
            inventory,
            plan,
            work_dir,
        })
    }

    fn normalize(
        &self,
        pool: &WorkerPool,
        scan: &ScanOutcome,
        ledger: &mut ArtifactLedger,
    ) -> Result<Vec<NormalizedFrame>, StageFailure> {
        let outputs: Vec<PathBuf> = (0..scan.inventory.images.len())
            .map(|index| scan.work_dir.join(format!("frame_{index:04}.png")))
            .collect();
        ledger.track_files(outputs.iter().cloned());

        let normalizer = FrameNormalizer::new(
            self.transcoder,
            self.settings.target_width,
            self.settings.target_height,
        );
        let results = pool.run_all(&scan.inventory.images, &self.cancel, |index, image, token| {
            normalizer.normalize(image, &outputs[index], token)
        });

        first_failure(results).map_err(|(index, e)| {
            warn!(
                "圖片正規化失敗: {}",
                scan.inventory.images[index].display()
            );
            StageFailure::transcode(PipelineState::Normalizing, e)
        })
    }

    fn compose_batches(
        &self,
        pool: &WorkerPool,
        scan: &ScanOutcome,
        frames: &[NormalizedFrame],
        ledger: &mut ArtifactLedger,
    ) -> Result<Vec<Segment>, StageFailure> {
        ledger.track_files((0..scan.plan.len()).map(|index| segment_output_path(&scan.work_dir, index)));

        let composition = CompositionSettings::from(self.settings);
        let batcher = SegmentBatcher::new(
            TransitionComposer::new(self.transcoder, &composition),
            pool,
            &scan.work_dir,
            self.settings.use_crossfade,
        )
        .with_transitions(
            self.settings.fixed_transition.clone(),
            self.settings.catalog(),
            self.settings.random_seed,
        );

        batcher
            .batch(frames, self.settings.batch_size, &self.cancel)
            .map_err(|failure| {
                warn!(
                    "片段合成中斷，{} 個已完成的片段將被清除",
                    failure.produced.len()
                );
                StageFailure::transcode(PipelineState::Batching, failure.source)
            })
    }

    fn convert_gifs(
        &self,
        pool: &WorkerPool,
        scan: &ScanOutcome,
        first_order_hint: usize,
        ledger: &mut ArtifactLedger,
    ) -> Result<Vec<Segment>, StageFailure> {
        let gifs = &scan.inventory.gifs;
        if gifs.is_empty() {
            return Ok(Vec::new());
        }

        let outputs: Vec<PathBuf> = (0..gifs.len())
            .map(|index| gif_output_path(&scan.work_dir, index))
            .collect();
        ledger.track_files(outputs.iter().cloned());

        let converter = GifConverter::new(
            self.transcoder,
            &self.settings.gif_encoder,
            self.settings.target_width,
            self.settings.target_height,
            self.settings.frame_rate,
        );
        let results = pool.run_all(gifs, &self.cancel, |index, gif, token| {
            converter.convert(gif, &outputs[index], first_order_hint + index, token)
        });

        first_failure(results).map_err(|(index, e)| {
            warn!("GIF 轉換失敗: {}", gifs[index].display());
            StageFailure::transcode(PipelineState::ConvertingGifs, e)
        })
    }

    fn merge(
        &self,
        scan: &ScanOutcome,
        segments: Vec<Segment>,
        ledger: &mut ArtifactLedger,
    ) -> Result<Completed, StageFailure> {
        let output_path = self.settings.output_path.clone();
        let extension = output_path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("mp4");
        let staged = scan.work_dir.join(format!("merged.{extension}"));
        ledger.track_file(&staged);

        let merger = VideoMerger::new(
            self.transcoder,
            &self.settings.merge_encoder,
            self.settings.random_seed,
        );
        let segments = merger
            .merge(segments, &staged, &self.cancel)
            .map_err(|e| StageFailure::transcode(PipelineState::Merging, e))?;

        promote(&staged, &output_path)
            .map_err(|e| StageFailure::new(PipelineState::Merging, e))?;

        Ok(Completed {
            output_path,
            segments,
        })
    }
}

/// 將暫存輸出移到最終位置；失敗時移除為此建立的上層資料夾
fn promote(staged: &Path, output_path: &Path) -> Result<(), SynthesisError> {
    let created = match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => create_missing_directories(parent)?,
        _ => Vec::new(),
    };

    let result = move_or_copy(staged, output_path);
    if result.is_err() {
        for directory in created.iter().rev() {
            if let Err(e) = fs::remove_dir(directory) {
                warn!("刪除資料夾失敗 {}: {e}", directory.display());
            }
        }
    }
    result
}

/// 跨檔案系統時先複製到目的地旁的暫存檔再改名，既有輸出只會被完整檔案取代
fn move_or_copy(staged: &Path, output_path: &Path) -> Result<(), SynthesisError> {
    let Err(e) = fs::rename(staged, output_path) else {
        return Ok(());
    };
    warn!("無法直接移動輸出檔 ({e})，改用複製");

    let file_name = output_path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let partial = output_path.with_file_name(format!(".{file_name}.{}.partial", Uuid::new_v4()));

    let copied = fs::copy(staged, &partial)
        .map_err(|e| SynthesisError::file_system(output_path, e))
        .and_then(|_| {
            fs::rename(&partial, output_path).map_err(|e| SynthesisError::file_system(output_path, e))
        });
    if copied.is_err()
        && let Err(e) = fs::remove_file(&partial)
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!("刪除未完成的輸出檔失敗 {}: {e}", partial.display());
    }
    copied
}
