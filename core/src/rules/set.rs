//! Ordered, copy-on-write rule collection
//!
//! Readers take an `Arc` snapshot and iterate it without holding a lock, so an
//! edit made mid-scan (including removal) never disturbs an evaluation that is
//! already running. Every edit publishes a fresh snapshot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use chatsound_types::SoundCommand;

use super::rule::{RuleId, SoundRule};

/// Immutable view of the rules in evaluation order
pub type RuleSnapshot = Arc<Vec<Arc<SoundRule>>>;

/// Play statistics for one rule
#[derive(Debug, Clone, PartialEq)]
pub struct RuleStatsEntry {
    pub id: RuleId,
    pub display_name: String,
    pub times_played: u64,
    pub last_played: Option<Instant>,
}

#[derive(Debug, Default)]
pub struct RuleSet {
    rules: RwLock<RuleSnapshot>,
    next_id: AtomicU64,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_commands(commands: Vec<SoundCommand>) -> Self {
        let set = Self::new();
        set.replace_all(commands);
        set
    }

    /// Current rules in evaluation order
    pub fn snapshot(&self) -> RuleSnapshot {
        Arc::clone(&self.rules.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    pub fn get(&self, id: RuleId) -> Option<Arc<SoundRule>> {
        self.snapshot().iter().find(|r| r.id() == id).cloned()
    }

    /// Find a rule by its full name, display name, or any alias (case-insensitive)
    pub fn find(&self, name: &str) -> Option<Arc<SoundRule>> {
        let name = name.trim();
        self.snapshot()
            .iter()
            .find(|r| {
                r.name().eq_ignore_ascii_case(name)
                    || r.display_name().eq_ignore_ascii_case(name)
                    || r.aliases().iter().any(|a| a.text().eq_ignore_ascii_case(name))
            })
            .cloned()
    }

    /// Replace every rule. Play counters are taken from the commands.
    pub fn replace_all(&self, commands: Vec<SoundCommand>) {
        let rules = commands
            .into_iter()
            .map(|cmd| Arc::new(SoundRule::from_command(self.allocate_id(), cmd)))
            .collect();
        self.publish(|current| *current = rules);
    }

    /// Append a rule at the end of the evaluation order
    pub fn push(&self, command: SoundCommand) -> RuleId {
        let id = self.allocate_id();
        let rule = Arc::new(SoundRule::from_command(id, command));
        self.publish(|rules| rules.push(rule));
        id
    }

    /// Replace a rule's settings in place. The live play counter and cooldown
    /// carry over; `command.times_played` is ignored.
    pub fn update(&self, id: RuleId, command: SoundCommand) -> bool {
        self.publish(|rules| {
            let Some(slot) = rules.iter_mut().find(|r| r.id() == id) else {
                return false;
            };
            *slot = Arc::new(SoundRule::with_stats(id, command, slot.stats()));
            true
        })
    }

    pub fn set_enabled(&self, id: RuleId, enabled: bool) -> bool {
        let Some(rule) = self.get(id) else {
            return false;
        };
        let command = SoundCommand {
            enabled,
            ..rule.command().clone()
        };
        self.update(id, command)
    }

    pub fn remove(&self, id: RuleId) -> bool {
        self.publish(|rules| {
            let before = rules.len();
            rules.retain(|r| r.id() != id);
            rules.len() != before
        })
    }

    /// Move a rule to `index` in the evaluation order (clamped to the end)
    pub fn move_to(&self, id: RuleId, index: usize) -> bool {
        self.publish(|rules| {
            let Some(from) = rules.iter().position(|r| r.id() == id) else {
                return false;
            };
            let rule = rules.remove(from);
            let to = index.min(rules.len());
            rules.insert(to, rule);
            true
        })
    }

    /// Stored form of every rule, including live play counters
    pub fn to_commands(&self) -> Vec<SoundCommand> {
        self.snapshot().iter().map(|r| r.to_command()).collect()
    }

    /// Play statistics, most played first
    pub fn stats(&self) -> Vec<RuleStatsEntry> {
        let mut entries: Vec<_> = self
            .snapshot()
            .iter()
            .map(|r| RuleStatsEntry {
                id: r.id(),
                display_name: r.display_name(),
                times_played: r.times_played(),
                last_played: r.last_played(),
            })
            .collect();
        entries.sort_by(|a, b| b.times_played.cmp(&a.times_played));
        entries
    }

    pub fn reset_stats(&self, id: RuleId) -> bool {
        match self.get(id) {
            Some(rule) => {
                rule.reset_stats();
                true
            }
            None => false,
        }
    }

    pub fn reset_all_stats(&self) {
        for rule in self.snapshot().iter() {
            rule.reset_stats();
        }
    }

    fn allocate_id(&self) -> RuleId {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Clone the current list, apply `edit`, and publish the result
    fn publish<T>(&self, edit: impl FnOnce(&mut Vec<Arc<SoundRule>>) -> T) -> T {
        let mut guard = self.rules.write().unwrap_or_else(PoisonError::into_inner);
        let mut rules = guard.as_ref().clone();
        let result = edit(&mut rules);
        *guard = Arc::new(rules);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(set: &RuleSet) -> Vec<String> {
        set.snapshot().iter().map(|r| r.name().to_string()).collect()
    }

    #[test]
    fn snapshot_survives_concurrent_removal() {
        let set = RuleSet::from_commands(vec![SoundCommand::new("a"), SoundCommand::new("b")]);
        let snapshot = set.snapshot();
        let first = snapshot[0].id();

        assert!(set.remove(first));
        assert_eq!(snapshot.len(), 2);
        assert_eq!(names(&set), vec!["b"]);
    }

    #[test]
    fn update_keeps_counters() {
        let set = RuleSet::new();
        let id = set.push(SoundCommand::new("a"));
        set.get(id).unwrap().record_play(Instant::now());

        let mut edited = SoundCommand::new("a, alpha");
        edited.times_played = 99;
        assert!(set.update(id, edited));

        let rule = set.get(id).unwrap();
        assert_eq!(rule.aliases().len(), 2);
        assert_eq!(rule.times_played(), 1);
        assert!(rule.last_played().is_some());
    }

    #[test]
    fn move_to_reorders() {
        let set = RuleSet::from_commands(vec![
            SoundCommand::new("a"),
            SoundCommand::new("b"),
            SoundCommand::new("c"),
        ]);
        let c = set.find("c").unwrap().id();
        assert!(set.move_to(c, 0));
        assert_eq!(names(&set), vec!["c", "a", "b"]);

        assert!(set.move_to(c, 100));
        assert_eq!(names(&set), vec!["a", "b", "c"]);
        assert!(!set.move_to(12345, 0));
    }

    #[test]
    fn set_enabled_rebuilds_rule() {
        let set = RuleSet::new();
        let id = set.push(SoundCommand::new("a"));
        assert!(set.set_enabled(id, false));
        assert!(!set.get(id).unwrap().enabled());
    }

    #[test]
    fn find_matches_alias_and_display_name() {
        let mut cmd = SoundCommand::new("KEKW, kekw2");
        cmd.category = "Laugh".into();
        let set = RuleSet::from_commands(vec![cmd]);

        assert!(set.find("kekw2").is_some());
        assert!(set.find("(laugh) kekw, kekw2").is_some());
        assert!(set.find("nope").is_none());
    }

    #[test]
    fn stats_sorted_by_play_count() {
        let set = RuleSet::from_commands(vec![SoundCommand::new("a"), SoundCommand::new("b")]);
        let b = set.find("b").unwrap();
        b.record_play(Instant::now());
        b.record_play(Instant::now());

        let stats = set.stats();
        assert_eq!(stats[0].display_name, "b");
        assert_eq!(stats[0].times_played, 2);

        set.reset_all_stats();
        assert!(set.stats().iter().all(|s| s.times_played == 0));
        assert_eq!(set.to_commands()[1].times_played, 0);
    }
}
