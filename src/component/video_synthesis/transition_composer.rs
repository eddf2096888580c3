//! 轉場合成
//!
//! 將一批已正規化的圖片組成單一 filter graph，再呼叫一次 ffmpeg
//! 輸出片段影片。轉場模式下以 xfade 逐張折疊：
//!
//! ```text
//! [f0][f1]xfade=offset=D-X [x1]
//! [x1][f2]xfade=offset=cumulative-X [x2]
//! ...
//! ```

use super::frame_normalizer::NormalizedFrame;
use super::segment::{Segment, SegmentSource};
use super::timeline::{TimelineState, concat_duration};
use super::transition::TransitionPicker;
use crate::config::{EncoderSettings, SynthesisSettings};
use crate::error::TranscodeError;
use crate::tools::{CancelToken, FfmpegCommand, InputSpec, JobKind, Transcoder, format_seconds};
use log::{debug, info};
use std::fmt::Write as _;
use std::path::Path;

const MIN_FRAMES: usize = 2;

#[derive(Debug, Clone)]
pub struct CompositionSettings {
    pub display_secs: f64,
    pub transition_secs: f64,
    pub frame_rate: u32,
    pub max_frames: usize,
    pub encoder: EncoderSettings,
}

impl From<&SynthesisSettings> for CompositionSettings {
    fn from(settings: &SynthesisSettings) -> Self {
        Self {
            display_secs: settings.display_duration_secs,
            transition_secs: settings.transition_duration_secs,
            frame_rate: settings.frame_rate,
            max_frames: settings.max_images_per_segment,
            encoder: settings.segment_encoder.clone(),
        }
    }
}

/// 建好的 filter graph 與其時間軸
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub filter_graph: String,
    pub output_label: String,
    pub duration_secs: f64,
    /// 依序使用的轉場，串接模式為空
    pub transitions: Vec<String>,
    pub offsets: Vec<f64>,
}

/// 只建 filter graph，不呼叫任何外部程式
#[must_use]
pub fn build_composition(
    frame_count: usize,
    use_crossfade: bool,
    picker: &mut TransitionPicker,
    display_secs: f64,
    transition_secs: f64,
) -> Composition {
    let mut graph = String::new();

    // 統一像素格式，避免不同來源的 PNG 造成 xfade 協商失敗
    for index in 0..frame_count {
        let _ = write!(graph, "[{index}:v]format=yuv420p,setsar=1[f{index}];");
    }

    // 少於兩張時沒有可轉場的相鄰圖片
    if !use_crossfade || frame_count < 2 {
        for index in 0..frame_count {
            let _ = write!(graph, "[f{index}]");
        }
        let _ = write!(graph, "concat=n={frame_count}:v=1:a=0[v]");
        return Composition {
            filter_graph: graph,
            output_label: "v".to_string(),
            duration_secs: concat_duration(frame_count, display_secs),
            transitions: Vec::new(),
            offsets: Vec::new(),
        };
    }

    let duration = format_seconds(transition_secs);
    let mut timeline = TimelineState::seed(display_secs, transition_secs);
    let mut transitions = Vec::with_capacity(frame_count.saturating_sub(1));
    let mut offsets = Vec::with_capacity(frame_count.saturating_sub(1));

    let transition = picker.next_transition();
    let _ = write!(
        graph,
        "[f0][f1]xfade=transition={transition}:duration={duration}:offset={}[x1]",
        format_seconds(timeline.last_offset_secs)
    );
    transitions.push(transition);
    offsets.push(timeline.last_offset_secs);

    for index in 2..frame_count {
        let offset = timeline.fold();
        let transition = picker.next_transition();
        let _ = write!(
            graph,
            ";[x{}][f{index}]xfade=transition={transition}:duration={duration}:offset={}[x{index}]",
            index - 1,
            format_seconds(offset)
        );
        transitions.push(transition);
        offsets.push(offset);
    }

    Composition {
        filter_graph: graph,
        output_label: format!("x{}", frame_count - 1),
        duration_secs: timeline.cumulative_duration_secs,
        transitions,
        offsets,
    }
}

pub struct TransitionComposer<'a> {
    transcoder: &'a dyn Transcoder,
    settings: &'a CompositionSettings,
}

impl<'a> TransitionComposer<'a> {
    pub fn new(transcoder: &'a dyn Transcoder, settings: &'a CompositionSettings) -> Self {
        Self {
            transcoder,
            settings,
        }
    }

    fn validate(&self, frames: &[NormalizedFrame]) -> Result<(), TranscodeError> {
        if frames.len() < MIN_FRAMES {
            return Err(TranscodeError::invalid_input(format!(
                "合成片段至少需要 {MIN_FRAMES} 張圖片，只有 {} 張",
                frames.len()
            )));
        }
        if frames.len() > self.settings.max_frames {
            return Err(TranscodeError::invalid_input(format!(
                "圖片過多，請減少圖片數量: {} > {}",
                frames.len(),
                self.settings.max_frames
            )));
        }
        let (width, height) = (frames[0].width, frames[0].height);
        if let Some(frame) = frames
            .iter()
            .find(|frame| frame.width != width || frame.height != height)
        {
            return Err(TranscodeError::invalid_input(format!(
                "圖片尺寸不一致: {} 為 {}x{}，預期 {width}x{height}",
                frame.output_path.display(),
                frame.width,
                frame.height
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn build_command(
        &self,
        frames: &[NormalizedFrame],
        composition: &Composition,
        output_path: &Path,
    ) -> FfmpegCommand {
        let inputs = frames.iter().map(|frame| {
            InputSpec::looped_still(
                &frame.output_path,
                self.settings.frame_rate,
                self.settings.display_secs,
            )
        });

        FfmpegCommand::new(JobKind::Compose, output_path)
            .inputs(inputs)
            .filter_complex(&composition.filter_graph, &composition.output_label)
            .encoder(&self.settings.encoder)
    }

    pub fn compose(
        &self,
        frames: &[NormalizedFrame],
        use_crossfade: bool,
        picker: &mut TransitionPicker,
        output_path: &Path,
        order_hint: usize,
        cancel: &CancelToken,
    ) -> Result<Segment, TranscodeError> {
        self.validate(frames)?;

        let composition = build_composition(
            frames.len(),
            use_crossfade,
            picker,
            self.settings.display_secs,
            self.settings.transition_secs,
        );
        debug!(
            "片段 {order_hint} 轉場: {}",
            if composition.transitions.is_empty() {
                "concat".to_string()
            } else {
                composition.transitions.join(",")
            }
        );

        let command = self.build_command(frames, &composition, output_path);
        self.transcoder.run(&command, cancel)?;

        info!(
            "片段 {order_hint} 完成: {} 張圖片，總長 {}s -> {}",
            frames.len(),
            composition.duration_secs,
            output_path.display()
        );

        Ok(Segment {
            path: output_path.to_path_buf(),
            duration_seconds: Some(composition.duration_secs),
            order_hint,
            source: SegmentSource::Images {
                frame_count: frames.len(),
            },
        })
    }
}
