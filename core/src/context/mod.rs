mod config;
mod error;

pub use config::{
    AppConfig, AppConfigExt, AudioSettings, DEFAULT_MAX_CHANNELS, HotkeySettings, Key, MatchType,
    NumberField, SoundCommand, SoundFile,
};
pub use error::ConfigError;
