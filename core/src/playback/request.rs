use std::path::PathBuf;

use crate::rules::RuleId;

/// One resolved clip waiting for (or assigned to) a channel
#[derive(Debug, Clone, PartialEq)]
pub struct PlayRequest {
    pub path: PathBuf,
    pub gain: f32,
    /// Rule that produced the request, for diagnostics
    pub rule_id: RuleId,
    pub rule_name: String,
}
