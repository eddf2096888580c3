pub mod load;
pub mod save;
pub mod types;

pub use types::{
    BatchTranscodeSettings, Config, EncoderSettings, Language, MAX_RECENT_PATHS, SynthesisSettings,
    UserSettings,
};
