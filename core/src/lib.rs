pub mod context;
pub mod engine;
pub mod hotkeys;
pub mod library;
pub mod matching;
pub mod playback;
pub mod rules;
pub mod selector;

// Re-exports for convenience
pub use context::{AppConfig, AppConfigExt, ConfigError};
pub use engine::{EngineEvent, EngineHandle, EngineReceiver, SoundEngine, create_engine_channel};
pub use hotkeys::{Combo, HotkeyOutcome, HotkeyToggle, KeyEvent};
pub use library::{AudioLibrary, ClipResolver, LibraryError};
pub use matching::{MatchOutcome, MessageMatcher};
pub use playback::{
    AudioDevice, ChannelPool, ChannelState, PlayRequest, PlaybackError, PoolStatus, RodioDevice,
    SubmitOutcome,
};
pub use rules::{RuleId, RuleSet, RuleStatsEntry, SoundClip, SoundRule};
pub use selector::select_clip;
