//! Shared configuration types for chatsound
//!
//! This crate contains the serializable rule and settings types that are shared
//! between the engine (chatsound-core) and any front end that edits them.
//! Persistence lives in chatsound-core behind the `AppConfigExt` trait.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

fn default_true() -> bool {
    true
}

// ─────────────────────────────────────────────────────────────────────────────
// Sound Commands
// ─────────────────────────────────────────────────────────────────────────────

/// How a rule's aliases are compared against an incoming chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Trimmed message equals the alias exactly
    Equals,
    /// Trimmed message starts with the alias
    #[default]
    StartsWith,
    /// First space-delimited token of the trimmed message equals the alias
    StartsWithWord,
    /// Alias appears in the message as a whole word
    ContainsWord,
}

impl MatchType {
    pub const ALL: [MatchType; 4] = [
        MatchType::Equals,
        MatchType::StartsWith,
        MatchType::StartsWithWord,
        MatchType::ContainsWord,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MatchType::Equals => "Equals",
            MatchType::StartsWith => "Starts With",
            MatchType::StartsWithWord => "Starts With Word",
            MatchType::ContainsWord => "Contains Word",
        }
    }
}

/// A numeric setting as written by the user.
///
/// Older settings files store numbers as strings ("0.5"), newer ones as plain
/// numbers. Both forms are accepted; interpretation (and the fallback for
/// garbage) is left to the engine so it can log which rule was affected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberField {
    Number(f64),
    Text(String),
}

impl NumberField {
    /// Parsed value, or `None` if the field is not a finite number
    pub fn value(&self) -> Option<f64> {
        let v = match self {
            NumberField::Number(n) => *n,
            NumberField::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        v.is_finite().then_some(v)
    }
}

impl From<f64> for NumberField {
    fn from(value: f64) -> Self {
        NumberField::Number(value)
    }
}

impl fmt::Display for NumberField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberField::Number(n) => write!(f, "{n}"),
            NumberField::Text(s) => f.write_str(s),
        }
    }
}

fn default_one() -> NumberField {
    NumberField::Number(1.0)
}

fn default_zero() -> NumberField {
    NumberField::Number(0.0)
}

/// One playable clip of a sound command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundFile {
    /// File name inside the managed audio directory, or an absolute path
    pub file_name: String,

    /// Relative selection weight (not required to sum to anything)
    #[serde(default = "default_one")]
    pub weight: NumberField,
}

impl SoundFile {
    pub fn new(file_name: impl Into<String>, weight: f64) -> Self {
        Self {
            file_name: file_name.into(),
            weight: NumberField::Number(weight),
        }
    }
}

/// A chat trigger rule ("sound command") as stored in the settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundCommand {
    /// Comma-separated aliases, e.g. `"KEKW, kekw"`
    pub name: String,

    #[serde(default)]
    pub category: String,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub match_type: MatchType,

    /// Probability in [0, 1] that a matched rule actually plays
    #[serde(default = "default_one")]
    pub play_chance: NumberField,

    /// Playback gain in [0, 1]
    #[serde(default = "default_one")]
    pub volume: NumberField,

    /// Minimum seconds between two plays (0 disables the cooldown)
    #[serde(default = "default_zero")]
    pub cooldown_seconds: NumberField,

    #[serde(default)]
    pub times_played: u64,

    #[serde(default)]
    pub sound_files: Vec<SoundFile>,
}

impl SoundCommand {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: String::new(),
            enabled: true,
            match_type: MatchType::default(),
            play_chance: default_one(),
            volume: default_one(),
            cooldown_seconds: default_zero(),
            times_played: 0,
            sound_files: Vec::new(),
        }
    }

    /// Aliases split from `name`, trimmed, with empty entries dropped
    pub fn aliases(&self) -> Vec<String> {
        self.name
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from)
            .collect()
    }

    /// `(Category) Name`, or just `Name` when no category is set
    pub fn display_name(&self) -> String {
        if self.category.is_empty() {
            self.name.clone()
        } else {
            format!("({}) {}", self.category, self.name)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Keys
// ─────────────────────────────────────────────────────────────────────────────

/// A keyboard key as reported by the global key-capture source.
///
/// Stored in settings as its display string (`"LeftControl"`, `"C"`, `"F20"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Key {
    LeftControl,
    RightControl,
    LeftShift,
    RightShift,
    LeftAlt,
    RightAlt,
    LeftMeta,
    RightMeta,
    /// Letter or digit, letters normalized to uppercase
    Char(char),
    /// Function key F1..F24
    F(u8),
    /// Any other key, by lowercase name (`"space"`, `"escape"`)
    Named(String),
}

impl Key {
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            Key::LeftControl
                | Key::RightControl
                | Key::LeftShift
                | Key::RightShift
                | Key::LeftAlt
                | Key::RightAlt
                | Key::LeftMeta
                | Key::RightMeta
        )
    }
}

/// Error returned when a key name cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseKeyError(pub String);

impl fmt::Display for ParseKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid key name '{}'", self.0)
    }
}

impl std::error::Error for ParseKeyError {}

impl FromStr for Key {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
            return Err(ParseKeyError(s.to_string()));
        }

        let lower = trimmed.to_ascii_lowercase();
        // Hook libraries prefix virtual key codes with "Vc"
        let name = match lower.strip_prefix("vc") {
            Some(rest) if !rest.is_empty() => rest,
            _ => lower.as_str(),
        };

        let key = match name {
            "ctrl" | "control" | "lctrl" | "leftctrl" | "leftcontrol" => Key::LeftControl,
            "rctrl" | "rightctrl" | "rightcontrol" => Key::RightControl,
            "shift" | "lshift" | "leftshift" => Key::LeftShift,
            "rshift" | "rightshift" => Key::RightShift,
            "alt" | "lalt" | "leftalt" => Key::LeftAlt,
            "ralt" | "rightalt" | "altgr" => Key::RightAlt,
            "meta" | "super" | "win" | "cmd" | "lmeta" | "leftmeta" => Key::LeftMeta,
            "rmeta" | "rightmeta" => Key::RightMeta,
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_alphanumeric() => Key::Char(c.to_ascii_uppercase()),
                    _ => match name.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
                        Some(n @ 1..=24) => Key::F(n),
                        _ => Key::Named(name.to_string()),
                    },
                }
            }
        };
        Ok(key)
    }
}

impl TryFrom<String> for Key {
    type Error = ParseKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.to_string()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::LeftControl => f.write_str("LeftControl"),
            Key::RightControl => f.write_str("RightControl"),
            Key::LeftShift => f.write_str("LeftShift"),
            Key::RightShift => f.write_str("RightShift"),
            Key::LeftAlt => f.write_str("LeftAlt"),
            Key::RightAlt => f.write_str("RightAlt"),
            Key::LeftMeta => f.write_str("LeftMeta"),
            Key::RightMeta => f.write_str("RightMeta"),
            Key::Char(c) => write!(f, "{c}"),
            Key::F(n) => write!(f, "F{n}"),
            Key::Named(name) => f.write_str(name),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Settings
// ─────────────────────────────────────────────────────────────────────────────

fn default_enable_combo() -> Vec<Key> {
    vec![Key::F(20)]
}

/// Global hotkey configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotkeySettings {
    /// Keys that must be held together to toggle sound triggers on/off
    #[serde(default = "default_enable_combo")]
    pub enable_combo: Vec<Key>,
}

impl Default for HotkeySettings {
    fn default() -> Self {
        Self {
            enable_combo: default_enable_combo(),
        }
    }
}

/// Number of playback channels when not configured
pub const DEFAULT_MAX_CHANNELS: usize = 12;

fn default_max_channels() -> usize {
    DEFAULT_MAX_CHANNELS
}

/// Playback settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Number of sounds that may play at the same time
    #[serde(default = "default_max_channels")]
    pub max_channels: usize,

    /// Force-stop a clip that is still playing after this many seconds
    #[serde(default)]
    pub playback_timeout_secs: Option<u64>,

    /// Override for the managed audio directory
    #[serde(default)]
    pub audio_dir: Option<String>,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            max_channels: DEFAULT_MAX_CHANNELS,
            playback_timeout_secs: None,
            audio_dir: None,
        }
    }
}

/// Application configuration
///
/// Note: Persistence methods (load/save) are provided by chatsound-core via the
/// `AppConfigExt` trait.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub sound_commands: Vec<SoundCommand>,
    #[serde(default)]
    pub hotkeys: HotkeySettings,
    #[serde(default)]
    pub audio: AudioSettings,
}
