//! Message matching
//!
//! - **Alias**: per-alias comparison for each `MatchType`
//! - **MessageMatcher**: the per-message rule scan

mod alias;
mod matcher;

#[cfg(test)]
mod matcher_tests;

pub use alias::Alias;
pub use matcher::{MatchOutcome, MessageMatcher};
