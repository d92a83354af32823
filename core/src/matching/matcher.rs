//! Chat message → play decision
//!
//! Scans a snapshot of the rules in order and produces at most one play
//! request per message. Gates, in order: global enable flag, rule enabled,
//! cooldown, alias match, chance roll.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::library::ClipResolver;
use crate::playback::{ChannelPool, PlayRequest, SubmitOutcome};
use crate::rules::{RuleId, RuleSet, SoundRule};
use crate::selector::select_clip;

/// What evaluating one message decided
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// Sound triggers are globally switched off
    Disabled,
    /// No rule matched (or every matching rule failed its chance roll)
    NoMatch,
    /// A rule was chosen and produced a playable clip
    Play(PlayRequest),
    /// A rule was chosen but had no playable clip; scanning stopped anyway
    Silent { rule: RuleId },
}

pub struct MessageMatcher {
    rules: Arc<RuleSet>,
    enabled: Arc<AtomicBool>,
    resolver: Arc<dyn ClipResolver>,
    rng: StdRng,
}

impl MessageMatcher {
    pub fn new(rules: Arc<RuleSet>, enabled: Arc<AtomicBool>, resolver: Arc<dyn ClipResolver>) -> Self {
        Self::with_rng(rules, enabled, resolver, StdRng::from_os_rng())
    }

    /// Use a specific random source (seeded in tests)
    pub fn with_rng(
        rules: Arc<RuleSet>,
        enabled: Arc<AtomicBool>,
        resolver: Arc<dyn ClipResolver>,
        rng: StdRng,
    ) -> Self {
        Self {
            rules,
            enabled,
            resolver,
            rng,
        }
    }

    /// Evaluate `text` and hand any resulting request to `pool`
    pub fn on_message(&mut self, text: &str, pool: &ChannelPool) -> Option<SubmitOutcome> {
        match self.evaluate(text, Instant::now()) {
            MatchOutcome::Play(request) => Some(pool.submit(request)),
            _ => None,
        }
    }

    /// Decide what `text` should play at time `now`. Updates the chosen rule's
    /// counters when a playable clip is found.
    pub fn evaluate(&mut self, text: &str, now: Instant) -> MatchOutcome {
        if !self.enabled.load(Ordering::Relaxed) {
            return MatchOutcome::Disabled;
        }

        let rules = self.rules.snapshot();
        for rule in rules.iter() {
            if !rule.enabled() {
                debug!(rule = %rule.name(), "Sound command is disabled. Skipping.");
                continue;
            }

            if rule.is_on_cooldown(now) {
                debug!(rule = %rule.name(), "Sound command is on cooldown. Skipping.");
                continue;
            }

            if !rule.matches(text) {
                continue;
            }

            let roll: f64 = self.rng.random();
            let should_play = roll <= rule.play_chance();
            debug!(
                rule = %rule.name(),
                roll,
                play_chance = rule.play_chance(),
                should_play,
                "Command matched"
            );
            if !should_play {
                continue;
            }

            return match self.prepare(rule) {
                Some(request) => {
                    rule.record_play(now);
                    MatchOutcome::Play(request)
                }
                // Chosen rule without a playable clip still consumes the message
                None => MatchOutcome::Silent { rule: rule.id() },
            };
        }

        MatchOutcome::NoMatch
    }

    /// Pick a clip for `rule` ignoring every gate. Counts as a play.
    pub fn preview(&mut self, rule: &SoundRule, now: Instant) -> Option<PlayRequest> {
        let request = self.prepare(rule)?;
        rule.record_play(now);
        Some(request)
    }

    fn prepare(&mut self, rule: &SoundRule) -> Option<PlayRequest> {
        if rule.clips().is_empty() {
            debug!(rule = %rule.name(), "Sound command has no sound files");
            return None;
        }

        let clip = select_clip(rule.clips(), &mut self.rng)?;
        if clip.file_name.trim().is_empty() {
            warn!(rule = %rule.name(), "Selected sound file has no file reference");
            return None;
        }

        let Some(path) = self.resolver.resolve(&clip.file_name) else {
            warn!(rule = %rule.name(), file = %clip.file_name, "Sound file not found");
            return None;
        };

        debug!(rule = %rule.name(), path = %path.display(), "Playing sound for command");
        Some(PlayRequest {
            path,
            gain: rule.volume(),
            rule_id: rule.id(),
            rule_name: rule.name().to_string(),
        })
    }
}
