//! Runtime form of a sound command
//!
//! `SoundRule` is built once from the stored `SoundCommand`: aliases are split
//! and compiled, numeric fields are parsed with safe fallbacks. Play statistics
//! live behind an `Arc` so an edited rule keeps counting where it left off.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use chatsound_types::{MatchType, NumberField, SoundCommand};
use tracing::warn;

use crate::matching::Alias;

/// Stable identifier of a rule within a `RuleSet`
pub type RuleId = u64;

/// A selectable clip with its parsed weight
#[derive(Debug, Clone, PartialEq)]
pub struct SoundClip {
    pub file_name: String,
    pub weight: f64,
}

/// Counters mutated by the engine as a side effect of playback
#[derive(Debug, Default)]
pub(crate) struct RuleStats {
    times_played: AtomicU64,
    last_played: Mutex<Option<Instant>>,
}

impl RuleStats {
    fn with_count(times_played: u64) -> Self {
        Self {
            times_played: AtomicU64::new(times_played),
            last_played: Mutex::new(None),
        }
    }
}

#[derive(Debug)]
pub struct SoundRule {
    id: RuleId,
    command: SoundCommand,
    aliases: Vec<Alias>,
    play_chance: f64,
    volume: f32,
    cooldown: Duration,
    clips: Vec<SoundClip>,
    stats: Arc<RuleStats>,
}

impl SoundRule {
    /// Build a rule from its stored form. Malformed numeric fields fall back
    /// to their defaults and are logged.
    pub fn from_command(id: RuleId, command: SoundCommand) -> Self {
        let stats = Arc::new(RuleStats::with_count(command.times_played));
        Self::with_stats(id, command, stats)
    }

    pub(crate) fn with_stats(id: RuleId, command: SoundCommand, stats: Arc<RuleStats>) -> Self {
        let name = command.name.as_str();
        let aliases = command
            .aliases()
            .into_iter()
            .map(|text| Alias::new(text, command.match_type))
            .collect::<Vec<_>>();
        if aliases.is_empty() {
            warn!(rule = %name, "Sound command has no aliases and will never match");
        }

        let play_chance = unit_interval(name, "play_chance", &command.play_chance);
        let volume = unit_interval(name, "volume", &command.volume) as f32;
        let cooldown = cooldown(name, &command.cooldown_seconds);

        let mut clips: Vec<SoundClip> = command
            .sound_files
            .iter()
            .map(|file| SoundClip {
                file_name: file.file_name.clone(),
                weight: weight(name, &file.file_name, &file.weight),
            })
            .collect();
        rescale_weights(name, &mut clips);

        Self {
            id,
            command,
            aliases,
            play_chance,
            volume,
            cooldown,
            clips,
            stats,
        }
    }

    pub fn id(&self) -> RuleId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.command.name
    }

    pub fn display_name(&self) -> String {
        self.command.display_name()
    }

    pub fn enabled(&self) -> bool {
        self.command.enabled
    }

    pub fn match_type(&self) -> MatchType {
        self.command.match_type
    }

    pub fn aliases(&self) -> &[Alias] {
        &self.aliases
    }

    pub fn play_chance(&self) -> f64 {
        self.play_chance
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn clips(&self) -> &[SoundClip] {
        &self.clips
    }

    /// The stored form this rule was built from (stats not included)
    pub fn command(&self) -> &SoundCommand {
        &self.command
    }

    /// True if any alias matches `message` under this rule's match type
    pub fn matches(&self, message: &str) -> bool {
        let trimmed = message.trim();
        self.aliases
            .iter()
            .any(|alias| alias.matches(self.command.match_type, message, trimmed))
    }

    pub fn is_on_cooldown(&self, now: Instant) -> bool {
        if self.cooldown.is_zero() {
            return false;
        }
        match self.last_played() {
            Some(last) => now.saturating_duration_since(last) < self.cooldown,
            None => false,
        }
    }

    pub fn times_played(&self) -> u64 {
        self.stats.times_played.load(Ordering::Relaxed)
    }

    pub fn last_played(&self) -> Option<Instant> {
        *self
            .stats
            .last_played
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Bump the play counter and restart the cooldown window
    pub fn record_play(&self, now: Instant) {
        self.stats.times_played.fetch_add(1, Ordering::Relaxed);
        *self
            .stats
            .last_played
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(now);
    }

    pub fn reset_stats(&self) {
        self.stats.times_played.store(0, Ordering::Relaxed);
    }

    /// Stored form with the live play counter, ready for persistence
    pub fn to_command(&self) -> SoundCommand {
        SoundCommand {
            times_played: self.times_played(),
            ..self.command.clone()
        }
    }

    pub(crate) fn stats(&self) -> Arc<RuleStats> {
        Arc::clone(&self.stats)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Lenient field parsing
// ─────────────────────────────────────────────────────────────────────────────

fn unit_interval(rule: &str, field: &'static str, raw: &NumberField) -> f64 {
    match raw.value() {
        Some(v) if (0.0..=1.0).contains(&v) => v,
        Some(v) => {
            let clamped = v.clamp(0.0, 1.0);
            warn!(rule, field, value = v, clamped, "Value outside 0..=1, clamping");
            clamped
        }
        None => {
            warn!(rule, field, value = %raw, "Unparseable value, using 1");
            1.0
        }
    }
}

fn cooldown(rule: &str, raw: &NumberField) -> Duration {
    match raw.value() {
        Some(secs) if secs > 0.0 => Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX),
        Some(_) => Duration::ZERO,
        None => {
            warn!(rule, field = "cooldown_seconds", value = %raw, "Unparseable value, cooldown disabled");
            Duration::ZERO
        }
    }
}

fn weight(rule: &str, file: &str, raw: &NumberField) -> f64 {
    match raw.value() {
        Some(w) if w >= 0.0 => w,
        Some(w) => {
            warn!(rule, file, weight = w, "Negative weight, clip will never be selected");
            0.0
        }
        None => {
            warn!(rule, file, value = %raw, "Unparseable weight, using 1");
            1.0
        }
    }
}

/// Scale weights down when their sum overflows, keeping their ratios
fn rescale_weights(rule: &str, clips: &mut [SoundClip]) {
    if crate::selector::total_weight(clips).is_finite() {
        return;
    }
    let max = clips.iter().map(|c| c.weight).fold(0.0, f64::max);
    warn!(rule, max_weight = max, "Clip weights sum past f64 range, rescaling");
    for clip in clips.iter_mut() {
        clip.weight /= max;
    }
}
