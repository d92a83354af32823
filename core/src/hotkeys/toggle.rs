use std::collections::{BTreeSet, HashMap};

use chatsound_types::Key;
use tracing::{debug, info};

use super::Combo;

/// Action run when a registered combo is pressed
pub type HotkeyAction = Box<dyn FnMut() + Send>;

/// Receives the combo recorded by a capture
pub type CaptureCallback = Box<dyn FnOnce(Combo) + Send>;

/// Raw key transition from the global key-capture source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub pressed: bool,
}

impl KeyEvent {
    pub fn press(key: Key) -> Self {
        Self { key, pressed: true }
    }

    pub fn release(key: Key) -> Self {
        Self {
            key,
            pressed: false,
        }
    }
}

/// What a key event caused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotkeyOutcome {
    Ignored,
    /// A registered combo's action ran
    Fired(Combo),
    /// A capture finished with this combo
    Captured(Combo),
}

/// Tracks held keys and dispatches registered combos.
///
/// Owned by the engine task, which feeds it key events in arrival order.
#[derive(Default)]
pub struct HotkeyToggle {
    held: BTreeSet<Key>,
    actions: HashMap<Combo, HotkeyAction>,
    capture: Option<CaptureCallback>,
}

impl HotkeyToggle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `action` to `combo`, replacing any previous action for it.
    /// Empty combos are refused.
    pub fn register(&mut self, combo: Combo, action: HotkeyAction) -> bool {
        if combo.is_empty() {
            debug!("Refusing to register empty hotkey combo");
            return false;
        }
        info!(hotkey = %combo, "Registered hotkey");
        self.actions.insert(combo, action);
        true
    }

    pub fn unregister(&mut self, combo: &Combo) -> bool {
        let removed = self.actions.remove(combo).is_some();
        if removed {
            info!(hotkey = %combo, "Unregistered hotkey");
        }
        removed
    }

    pub fn is_registered(&self, combo: &Combo) -> bool {
        self.actions.contains_key(combo)
    }

    /// Record the next combo instead of dispatching. Keys already held are
    /// forgotten so a stale modifier cannot leak into the capture.
    pub fn begin_capture(&mut self, on_captured: CaptureCallback) {
        if self.capture.replace(on_captured).is_some() {
            debug!("Hotkey capture restarted");
        }
        self.held.clear();
    }

    pub fn cancel_capture(&mut self) -> bool {
        self.capture.take().is_some()
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.is_some()
    }

    /// Currently held keys
    pub fn held(&self) -> Combo {
        self.held.iter().cloned().collect()
    }

    pub fn handle(&mut self, event: KeyEvent) -> HotkeyOutcome {
        if !event.pressed {
            self.held.remove(&event.key);
            return HotkeyOutcome::Ignored;
        }

        let is_modifier = event.key.is_modifier();
        let newly_held = self.held.insert(event.key);

        if self.capture.is_some() {
            if is_modifier {
                return HotkeyOutcome::Ignored;
            }
            let combo = self.held();
            if let Some(on_captured) = self.capture.take() {
                debug!(hotkey = %combo, "Captured hotkey");
                on_captured(combo.clone());
            }
            return HotkeyOutcome::Captured(combo);
        }

        // Auto-repeat of a key that is already down
        if !newly_held {
            return HotkeyOutcome::Ignored;
        }

        let held = self.held();
        match self.actions.get_mut(&held) {
            Some(action) => {
                debug!(hotkey = %held, "Hotkey pressed");
                action();
                HotkeyOutcome::Fired(held)
            }
            None => HotkeyOutcome::Ignored,
        }
    }
}
