//! Event types posted to the sound engine

use tokio::sync::oneshot;

use crate::hotkeys::{Combo, KeyEvent};
use crate::rules::RuleId;

/// Everything the engine reacts to. Sources post these instead of touching
/// engine state directly.
#[derive(Debug)]
pub enum EngineEvent {
    /// A chat message arrived
    Chat(String),

    /// Raw key transition from the key-capture source
    Key(KeyEvent),

    /// Record the next combo as the new enable toggle and report it
    BeginCapture(oneshot::Sender<Combo>),

    CancelCapture,

    /// Posted by the engine itself when a capture completes
    ComboCaptured(Combo),

    /// Play a rule right away, ignoring its gates
    Preview(RuleId),

    /// Flip the global enable flag (same as pressing the enable combo)
    ToggleEnabled,

    Shutdown,
}

impl EngineEvent {
    /// Short name for log lines
    pub fn kind(&self) -> &'static str {
        match self {
            EngineEvent::Chat(_) => "chat",
            EngineEvent::Key(_) => "key",
            EngineEvent::BeginCapture(_) => "begin_capture",
            EngineEvent::CancelCapture => "cancel_capture",
            EngineEvent::ComboCaptured(_) => "combo_captured",
            EngineEvent::Preview(_) => "preview",
            EngineEvent::ToggleEnabled => "toggle_enabled",
            EngineEvent::Shutdown => "shutdown",
        }
    }
}
