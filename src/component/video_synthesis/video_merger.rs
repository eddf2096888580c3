use super::segment::Segment;
use super::transition::seeded_rng;
use crate::config::EncoderSettings;
use crate::error::TranscodeError;
use crate::tools::{CancelToken, FfmpegCommand, InputSpec, JobKind, Transcoder};
use log::info;
use rand::seq::SliceRandom;
use std::fmt::Write as _;
use std::path::Path;

/// 與轉場抽樣使用不同的亂數串流
const SHUFFLE_STREAM: u64 = u64::MAX;

/// 均勻打亂片段順序；有種子時結果固定
#[must_use]
pub fn shuffle_segments(mut segments: Vec<Segment>, seed: Option<u64>) -> Vec<Segment> {
    let mut rng = seeded_rng(seed, SHUFFLE_STREAM);
    segments.shuffle(&mut rng);
    segments
}

#[must_use]
pub fn concat_graph(count: usize) -> String {
    let mut graph = String::new();
    for index in 0..count {
        let _ = write!(graph, "[{index}:v]");
    }
    let _ = write!(graph, "concat=n={count}:v=1:a=0[v]");
    graph
}

pub struct VideoMerger<'a> {
    transcoder: &'a dyn Transcoder,
    encoder: &'a EncoderSettings,
    seed: Option<u64>,
}

impl<'a> VideoMerger<'a> {
    pub fn new(transcoder: &'a dyn Transcoder, encoder: &'a EncoderSettings, seed: Option<u64>) -> Self {
        Self {
            transcoder,
            encoder,
            seed,
        }
    }

    #[must_use]
    pub fn build_command(&self, ordered: &[Segment], output_path: &Path) -> FfmpegCommand {
        FfmpegCommand::new(JobKind::Merge, output_path)
            .inputs(ordered.iter().map(|segment| InputSpec::file(&segment.path)))
            .filter_complex(concat_graph(ordered.len()), "v")
            .encoder(self.encoder)
    }

    /// 回傳實際合併的片段順序
    pub fn merge(
        &self,
        segments: Vec<Segment>,
        output_path: &Path,
        cancel: &CancelToken,
    ) -> Result<Vec<Segment>, TranscodeError> {
        if segments.is_empty() {
            return Err(TranscodeError::invalid_input("沒有可合併的片段"));
        }

        let ordered = shuffle_segments(segments, self.seed);
        info!(
            "合併 {} 個片段，順序: {:?}",
            ordered.len(),
            ordered.iter().map(|s| s.order_hint).collect::<Vec<_>>()
        );

        self.transcoder
            .run(&self.build_command(&ordered, output_path), cancel)?;
        Ok(ordered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::video_synthesis::segment::SegmentSource;
    use crate::tools::fake::FakeTranscoder;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn segments(count: usize) -> Vec<Segment> {
        (0..count)
            .map(|i| Segment {
                path: PathBuf::from(format!("/work/segment_{i:03}.mp4")),
                duration_seconds: Some(16.0),
                order_hint: i,
                source: SegmentSource::Images { frame_count: 5 },
            })
            .collect()
    }

    fn hints(segments: &[Segment]) -> Vec<usize> {
        segments.iter().map(|s| s.order_hint).collect()
    }

    #[test]
    fn test_concat_graph() {
        assert_eq!(concat_graph(1), "[0:v]concat=n=1:v=1:a=0[v]");
        assert_eq!(concat_graph(3), "[0:v][1:v][2:v]concat=n=3:v=1:a=0[v]");
    }

    #[test]
    fn test_seeded_shuffle_is_reproducible() {
        let a = shuffle_segments(segments(20), Some(7));
        let b = shuffle_segments(segments(20), Some(7));
        assert_eq!(hints(&a), hints(&b));

        let mut sorted = hints(&a);
        sorted.sort_unstable();
        assert_eq!(sorted, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_merge_requires_segments() {
        let transcoder = FakeTranscoder::default();
        let encoder = EncoderSettings::default();
        let merger = VideoMerger::new(&transcoder, &encoder, None);
        let err = merger
            .merge(Vec::new(), Path::new("/tmp/out.mp4"), &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, TranscodeError::InvalidInput(_)));
        assert_eq!(transcoder.call_count(), 0);
    }

    #[test]
    fn test_merge_single_invocation_in_shuffled_order() {
        let temp_dir = TempDir::new().unwrap();
        let transcoder = FakeTranscoder::default();
        let encoder = EncoderSettings::default();
        let merger = VideoMerger::new(&transcoder, &encoder, Some(3));
        let output = temp_dir.path().join("merged.mp4");

        let ordered = merger
            .merge(segments(4), &output, &CancelToken::new())
            .unwrap();

        assert_eq!(transcoder.kinds(), vec![JobKind::Merge]);
        let calls = transcoder.calls.lock().unwrap();
        let input_paths: Vec<PathBuf> = calls[0]
            .inputs_spec()
            .iter()
            .map(|input| input.path.clone())
            .collect();
        let ordered_paths: Vec<PathBuf> = ordered.iter().map(|s| s.path.clone()).collect();
        assert_eq!(input_paths, ordered_paths);
    }
}
