//! 圖片合成影片元件
//!
//! 將資料夾內的圖片正規化、分批以轉場合成片段，再與 GIF 片段一起合併為單一影片

mod frame_normalizer;
mod gif_converter;
mod main;
mod orchestrator;
mod segment;
mod segment_batcher;
mod timeline;
mod transition;
mod transition_composer;
mod video_merger;

pub use frame_normalizer::{FrameNormalizer, NormalizedFrame, letterbox_filter};
pub use gif_converter::{GifConverter, gif_output_path};
pub use main::VideoSynthesizer;
pub use orchestrator::{PipelineOrchestrator, PipelineResult, PipelineState};
pub use segment::{Segment, SegmentSource};
pub use segment_batcher::{
    BatchFailure, SegmentBatcher, plan_batches, segment_output_path, validate_plan,
};
pub use timeline::{TimelineState, concat_duration, crossfade_duration};
pub use transition::{DEFAULT_TRANSITIONS, TransitionPicker, seeded_rng};
pub use transition_composer::{
    Composition, CompositionSettings, TransitionComposer, build_composition,
};
pub use video_merger::{VideoMerger, concat_graph, shuffle_segments};
