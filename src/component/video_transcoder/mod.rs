//! 批次轉檔元件
//!
//! 將指定編碼（預設 H.264）的影片轉為 HEVC 並取代原檔

mod batch_transcoder;
mod main;

pub use batch_transcoder::{
    BatchTranscoder, TranscodeOutcome, TranscodeSummary, temporary_output_path,
};
pub use main::VideoTranscoder;
