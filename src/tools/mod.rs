mod artifact_janitor;
mod cancellation;
mod ffmpeg_command;
mod ffprobe_info;
mod file_scanner;
mod media_inventory;
mod path_validator;
mod transcoder;
mod worker_pool;

pub use artifact_janitor::{ArtifactLedger, CleanupReport, cleanup, cleanup_directory};
pub use cancellation::CancelToken;
pub use ffmpeg_command::{FfmpegCommand, InputSpec, JobKind, format_seconds};
pub use ffprobe_info::MediaInfo;
pub use file_scanner::{FileInfo, scan_all_files};
pub use media_inventory::{MediaAsset, MediaInventory, MediaKind, scan_media};
pub use path_validator::{create_missing_directories, validate_directory_exists};
#[cfg(test)]
pub use transcoder::fake;
pub use transcoder::{FfmpegTranscoder, Transcoder};
pub use worker_pool::{WorkerPool, first_failure, partition_results};
