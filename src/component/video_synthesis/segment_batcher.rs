use super::frame_normalizer::NormalizedFrame;
use super::segment::Segment;
use super::transition::{TransitionPicker, seeded_rng};
use super::transition_composer::TransitionComposer;
use crate::error::{TranscodeError, ValidationError};
use crate::tools::{CancelToken, WorkerPool, partition_results};
use log::{info, warn};
use std::ops::Range;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 將 `frame_count` 張圖片切成每批 `batch_size` 張
///
/// 最後一批只剩 1 張時併入前一批，避免產生無法合成的片段。
#[must_use]
pub fn plan_batches(frame_count: usize, batch_size: usize) -> Vec<Range<usize>> {
    let batch_size = batch_size.max(2);
    let mut batches: Vec<Range<usize>> = (0..frame_count)
        .step_by(batch_size)
        .map(|start| start..(start + batch_size).min(frame_count))
        .collect();

    if batches.len() > 1
        && batches.last().is_some_and(|last| last.len() == 1)
        && let Some(remainder) = batches.pop()
        && let Some(previous) = batches.last_mut()
    {
        previous.end = remainder.end;
    }

    batches
}

/// 任一批超過上限即拒絕
pub fn validate_plan(plan: &[Range<usize>], max_frames: usize) -> Result<(), ValidationError> {
    match plan
        .iter()
        .enumerate()
        .find(|(_, batch)| batch.len() > max_frames)
    {
        Some((batch_index, batch)) => Err(ValidationError::SegmentTooLarge {
            batch_index,
            size: batch.len(),
            max: max_frames,
        }),
        None => Ok(()),
    }
}

#[must_use]
pub fn segment_output_path(work_dir: &Path, batch_index: usize) -> PathBuf {
    work_dir.join(format!("segment_{batch_index:03}.mp4"))
}

/// 合成中斷時，已完成的片段與失敗的批次
#[derive(Debug, Error)]
#[error("第 {batch_index} 批合成失敗: {source}")]
pub struct BatchFailure {
    pub produced: Vec<Segment>,
    pub batch_index: usize,
    #[source]
    pub source: TranscodeError,
}

pub struct SegmentBatcher<'a> {
    composer: TransitionComposer<'a>,
    pool: &'a WorkerPool,
    work_dir: &'a Path,
    use_crossfade: bool,
    fixed_transition: Option<String>,
    catalog: Vec<String>,
    seed: Option<u64>,
}

impl<'a> SegmentBatcher<'a> {
    pub fn new(
        composer: TransitionComposer<'a>,
        pool: &'a WorkerPool,
        work_dir: &'a Path,
        use_crossfade: bool,
    ) -> Self {
        Self {
            composer,
            pool,
            work_dir,
            use_crossfade,
            fixed_transition: None,
            catalog: Vec::new(),
            seed: None,
        }
    }

    #[must_use]
    pub fn with_transitions(
        mut self,
        fixed_transition: Option<String>,
        catalog: Vec<String>,
        seed: Option<u64>,
    ) -> Self {
        self.fixed_transition = fixed_transition;
        self.catalog = catalog;
        self.seed = seed;
        self
    }

    /// 每批使用獨立的亂數來源，與執行緒排程無關
    fn picker_for(&self, batch_index: usize) -> TransitionPicker {
        match &self.fixed_transition {
            Some(name) => TransitionPicker::fixed(name.clone()),
            None => TransitionPicker::random(
                self.catalog.clone(),
                seeded_rng(self.seed, batch_index as u64),
            ),
        }
    }

    /// 各批互不相依，於工作池平行合成；結果依批次順序排列
    pub fn batch(
        &self,
        frames: &[NormalizedFrame],
        batch_size: usize,
        cancel: &CancelToken,
    ) -> Result<Vec<Segment>, BatchFailure> {
        let plan = plan_batches(frames.len(), batch_size);
        info!(
            "共 {} 張圖片，分為 {} 批合成 (每批 {batch_size} 張)",
            frames.len(),
            plan.len()
        );

        let results = self.pool.run_all(&plan, cancel, |batch_index, range, token| {
            let mut picker = self.picker_for(batch_index);
            self.composer.compose(
                &frames[range.clone()],
                self.use_crossfade,
                &mut picker,
                &segment_output_path(self.work_dir, batch_index),
                batch_index,
                token,
            )
        });

        let (succeeded, failure) = partition_results(results);
        let produced: Vec<Segment> = succeeded.into_iter().map(|(_, segment)| segment).collect();

        match failure {
            Some((batch_index, source)) => {
                warn!(
                    "第 {batch_index} 批合成失敗，已完成 {} 個片段",
                    produced.len()
                );
                Err(BatchFailure {
                    produced,
                    batch_index,
                    source,
                })
            }
            None => Ok(produced),
        }
    }
}
