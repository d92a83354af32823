//! Tests for MessageMatcher
//!
//! Verifies that:
//! - Cooldown, enable flags and chance rolls gate in order
//! - The first chosen rule stops the scan even when it cannot play
//! - Counters change only when a clip is actually produced

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chatsound_types::{MatchType, NumberField, SoundCommand, SoundFile};
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::{MatchOutcome, MessageMatcher};
use crate::library::ClipResolver;
use crate::playback::testing::ScriptedDevice;
use crate::playback::{ChannelPool, SubmitOutcome};
use crate::rules::RuleSet;

fn command(name: &str, files: &[&str]) -> SoundCommand {
    let mut cmd = SoundCommand::new(name);
    cmd.sound_files = files.iter().map(|f| SoundFile::new(*f, 1.0)).collect();
    cmd
}

fn resolve_all() -> Arc<dyn ClipResolver> {
    Arc::new(|name: &str| Some(PathBuf::from("/sounds").join(name)))
}

fn resolve_none() -> Arc<dyn ClipResolver> {
    Arc::new(|_: &str| None)
}

struct Fixture {
    rules: Arc<RuleSet>,
    enabled: Arc<AtomicBool>,
    matcher: MessageMatcher,
}

fn fixture(resolver: Arc<dyn ClipResolver>) -> Fixture {
    let rules = Arc::new(RuleSet::new());
    let enabled = Arc::new(AtomicBool::new(true));
    let matcher = MessageMatcher::with_rng(
        Arc::clone(&rules),
        Arc::clone(&enabled),
        resolver,
        StdRng::seed_from_u64(7),
    );
    Fixture {
        rules,
        enabled,
        matcher,
    }
}

fn played_file(outcome: &MatchOutcome) -> Option<String> {
    match outcome {
        MatchOutcome::Play(request) => request
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned()),
        _ => None,
    }
}

#[test]
fn cooldown_blocks_until_window_passes() {
    let mut f = fixture(resolve_all());
    let mut cmd = command("hi", &["hi.mp3"]);
    cmd.cooldown_seconds = NumberField::Number(5.0);
    let id = f.rules.push(cmd);

    let t0 = Instant::now();
    assert_eq!(played_file(&f.matcher.evaluate("hi", t0)).as_deref(), Some("hi.mp3"));
    assert_eq!(f.matcher.evaluate("hi", t0 + Duration::from_secs(3)), MatchOutcome::NoMatch);
    assert!(matches!(
        f.matcher.evaluate("hi", t0 + Duration::from_secs(6)),
        MatchOutcome::Play(_)
    ));
    assert_eq!(f.rules.get(id).unwrap().times_played(), 2);
}

#[test]
fn failed_chance_roll_falls_through_to_next_rule() {
    let mut f = fixture(resolve_all());
    let mut never = command("hi", &["a.mp3"]);
    never.play_chance = NumberField::Number(0.0);
    let a = f.rules.push(never);
    let b = f.rules.push(command("hi,hey", &["b.mp3"]));

    let outcome = f.matcher.evaluate("hi", Instant::now());
    assert_eq!(played_file(&outcome).as_deref(), Some("b.mp3"));
    assert_eq!(f.rules.get(a).unwrap().times_played(), 0);
    assert_eq!(f.rules.get(b).unwrap().times_played(), 1);
}

#[test]
fn chosen_rule_without_clips_stops_the_scan() {
    let mut f = fixture(resolve_all());
    let empty = f.rules.push(command("hi", &[]));
    let backup = f.rules.push(command("hi,hey", &["b.mp3"]));

    assert_eq!(
        f.matcher.evaluate("hi there", Instant::now()),
        MatchOutcome::Silent { rule: empty }
    );
    assert_eq!(f.rules.get(empty).unwrap().times_played(), 0);
    assert_eq!(f.rules.get(backup).unwrap().times_played(), 0);
}

#[test]
fn missing_file_is_silent_and_leaves_counters() {
    let mut f = fixture(resolve_none());
    let mut cmd = command("hi", &["gone.mp3"]);
    cmd.cooldown_seconds = NumberField::Number(30.0);
    let id = f.rules.push(cmd);

    let t0 = Instant::now();
    assert_eq!(f.matcher.evaluate("hi", t0), MatchOutcome::Silent { rule: id });

    let rule = f.rules.get(id).unwrap();
    assert_eq!(rule.times_played(), 0);
    assert!(rule.last_played().is_none());
    // No cooldown was started, so the rule is chosen again
    assert_eq!(
        f.matcher.evaluate("hi", t0 + Duration::from_secs(1)),
        MatchOutcome::Silent { rule: id }
    );
}

#[test]
fn global_flag_disables_everything() {
    let mut f = fixture(resolve_all());
    let id = f.rules.push(command("hi", &["hi.mp3"]));

    f.enabled.store(false, Ordering::Relaxed);
    assert_eq!(f.matcher.evaluate("hi", Instant::now()), MatchOutcome::Disabled);
    assert_eq!(f.rules.get(id).unwrap().times_played(), 0);

    f.enabled.store(true, Ordering::Relaxed);
    assert!(matches!(f.matcher.evaluate("hi", Instant::now()), MatchOutcome::Play(_)));
}

#[test]
fn disabled_rule_is_skipped() {
    let mut f = fixture(resolve_all());
    let mut off = command("hi", &["a.mp3"]);
    off.enabled = false;
    f.rules.push(off);
    f.rules.push(command("hi,hey", &["b.mp3"]));

    let outcome = f.matcher.evaluate("hi", Instant::now());
    assert_eq!(played_file(&outcome).as_deref(), Some("b.mp3"));
}

#[test]
fn first_matching_rule_wins() {
    let mut f = fixture(resolve_all());
    let mut exact = command("lol", &["exact.mp3"]);
    exact.match_type = MatchType::Equals;
    f.rules.push(exact);
    f.rules.push(command("lo", &["prefix.mp3"]));

    let now = Instant::now();
    assert_eq!(played_file(&f.matcher.evaluate("lol", now)).as_deref(), Some("exact.mp3"));
    assert_eq!(played_file(&f.matcher.evaluate("lol!", now)).as_deref(), Some("prefix.mp3"));
    assert_eq!(f.matcher.evaluate("hello", now), MatchOutcome::NoMatch);
}

#[test]
fn request_carries_rule_volume() {
    let mut f = fixture(resolve_all());
    let mut cmd = command("hi", &["hi.mp3"]);
    cmd.volume = NumberField::Number(0.25);
    let id = f.rules.push(cmd);

    let MatchOutcome::Play(request) = f.matcher.evaluate("hi", Instant::now()) else {
        panic!("expected a play");
    };
    assert_eq!(request.gain, 0.25);
    assert_eq!(request.rule_id, id);
    assert_eq!(request.rule_name, "hi");
}

#[test]
fn preview_ignores_gates_and_counts() {
    let mut f = fixture(resolve_all());
    let mut cmd = command("hi", &["hi.mp3"]);
    cmd.enabled = false;
    cmd.play_chance = NumberField::Number(0.0);
    cmd.cooldown_seconds = NumberField::Number(60.0);
    let id = f.rules.push(cmd);
    f.enabled.store(false, Ordering::Relaxed);

    let rule = f.rules.get(id).unwrap();
    let now = Instant::now();
    assert!(f.matcher.preview(&rule, now).is_some());
    assert!(f.matcher.preview(&rule, now).is_some());
    assert_eq!(rule.times_played(), 2);
}

#[test]
fn on_message_submits_to_pool() {
    let device = ScriptedDevice::auto_finish();
    let pool = ChannelPool::new(Arc::new(device.clone()), 2, None);
    let mut f = fixture(resolve_all());
    f.rules.push(command("hi", &["hi.mp3"]));

    assert_eq!(
        f.matcher.on_message("hi", &pool),
        Some(SubmitOutcome::Started { channel: 0 })
    );
    assert_eq!(f.matcher.on_message("nothing", &pool), None);
}
