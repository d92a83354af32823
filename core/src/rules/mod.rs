//! Sound command rules
//!
//! This module provides:
//! - **SoundRule**: runtime form of a stored `SoundCommand` (compiled aliases,
//!   parsed numbers, live play statistics)
//! - **RuleSet**: the ordered, copy-on-write collection the matcher scans

mod rule;
mod set;

pub use rule::{RuleId, SoundClip, SoundRule};
pub use set::{RuleSet, RuleSnapshot, RuleStatsEntry};
