//! Sound engine service
//!
//! Runs as a background task, draining `EngineEvent`s from two queues. Key and
//! control events are taken before chat. All rule evaluation and hotkey state
//! live on this one consumer; chat and key sources only post events.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use chatsound_types::AppConfig;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use super::events::EngineEvent;
use super::handle::{EngineHandle, EngineReceiver};
use crate::hotkeys::{Combo, HotkeyAction, HotkeyToggle};
use crate::library::ClipResolver;
use crate::matching::MessageMatcher;
use crate::playback::{AudioDevice, ChannelPool};
use crate::rules::{RuleId, RuleSet};

pub struct SoundEngine {
    /// Chat and control queues
    queues: EngineReceiver,

    /// Own control queue, for events raised from inside callbacks. Weak so the
    /// engine still stops once every external handle is gone.
    events: mpsc::WeakUnboundedSender<EngineEvent>,

    rules: Arc<RuleSet>,

    /// Global on/off switch, flipped by the enable combo
    enabled: Arc<AtomicBool>,

    matcher: MessageMatcher,
    pool: Arc<ChannelPool>,
    hotkeys: HotkeyToggle,
    enable_combo: Combo,

    /// Requester waiting on an in-progress combo capture
    pending_capture: Option<oneshot::Sender<Combo>>,
}

impl SoundEngine {
    pub fn new(
        handle: &EngineHandle,
        queues: EngineReceiver,
        rules: Arc<RuleSet>,
        resolver: Arc<dyn ClipResolver>,
        pool: ChannelPool,
        enable_combo: Combo,
    ) -> Self {
        let enabled = Arc::new(AtomicBool::new(true));
        let matcher = MessageMatcher::new(Arc::clone(&rules), Arc::clone(&enabled), resolver);

        let mut hotkeys = HotkeyToggle::new();
        if !hotkeys.register(enable_combo.clone(), toggle_action(Arc::clone(&enabled))) {
            warn!("No enable hotkey configured");
        }

        Self {
            queues,
            events: handle.downgrade(),
            rules,
            enabled,
            matcher,
            pool: Arc::new(pool),
            hotkeys,
            enable_combo,
            pending_capture: None,
        }
    }

    /// Build an engine from persisted settings
    pub fn from_config(
        handle: &EngineHandle,
        queues: EngineReceiver,
        config: &AppConfig,
        device: Arc<dyn AudioDevice>,
        resolver: Arc<dyn ClipResolver>,
    ) -> Self {
        let rules = Arc::new(RuleSet::from_commands(config.sound_commands.clone()));
        let pool = ChannelPool::from_settings(device, &config.audio);
        let combo = Combo::from(config.hotkeys.enable_combo.as_slice());
        Self::new(handle, queues, rules, resolver, pool, combo)
    }

    /// Live rule set, shared with whoever edits rules
    pub fn rules(&self) -> Arc<RuleSet> {
        Arc::clone(&self.rules)
    }

    pub fn enabled_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.enabled)
    }

    pub fn pool(&self) -> Arc<ChannelPool> {
        Arc::clone(&self.pool)
    }

    pub fn enable_combo(&self) -> &Combo {
        &self.enable_combo
    }

    /// Run the engine until `Shutdown` arrives or every handle is dropped,
    /// then dispose the channel pool.
    pub async fn run(mut self) {
        info!(
            rules = self.rules.len(),
            channels = self.pool.capacity(),
            hotkey = %self.enable_combo,
            "Sound engine started"
        );

        while let Some(event) = self.next_event().await {
            if !self.handle(event) {
                break;
            }
        }

        self.hotkeys.cancel_capture();
        let pool = Arc::clone(&self.pool);
        if let Err(e) = tokio::task::spawn_blocking(move || pool.dispose()).await {
            error!(error = %e, "Failed to dispose audio channels");
        }
        info!("Sound engine stopped");
    }

    /// Next event, control first. None once the handles are gone.
    async fn next_event(&mut self) -> Option<EngineEvent> {
        tokio::select! {
            biased;
            event = self.queues.control.recv() => event,
            text = self.queues.chat.recv() => text.map(EngineEvent::Chat),
        }
    }

    /// Returns false when the engine should stop
    fn handle(&mut self, event: EngineEvent) -> bool {
        match event {
            EngineEvent::Chat(text) => self.on_chat(&text),
            EngineEvent::Key(key) => {
                self.hotkeys.handle(key);
            }
            EngineEvent::BeginCapture(reply) => self.begin_capture(reply),
            EngineEvent::CancelCapture => self.cancel_capture(),
            EngineEvent::ComboCaptured(combo) => self.set_enable_combo(combo),
            EngineEvent::Preview(id) => self.preview(id),
            EngineEvent::ToggleEnabled => {
                flip(&self.enabled);
            }
            EngineEvent::Shutdown => return false,
        }
        true
    }

    fn on_chat(&mut self, text: &str) {
        if let Some(outcome) = self.matcher.on_message(text, &self.pool) {
            debug!(?outcome, "Sound request submitted");
        }
    }

    fn begin_capture(&mut self, reply: oneshot::Sender<Combo>) {
        let events = self.events.clone();
        self.hotkeys.begin_capture(Box::new(move |combo| {
            let Some(tx) = events.upgrade() else {
                return;
            };
            if let Err(e) = tx.send(EngineEvent::ComboCaptured(combo)) {
                warn!(error = %e, "Failed to deliver captured hotkey");
            }
        }));
        // A replaced requester sees its receiver close
        self.pending_capture = Some(reply);
        info!("Capturing enable hotkey");
    }

    fn cancel_capture(&mut self) {
        if self.hotkeys.cancel_capture() {
            info!("Hotkey capture cancelled");
        }
        self.pending_capture = None;
    }

    fn set_enable_combo(&mut self, combo: Combo) {
        self.hotkeys.unregister(&self.enable_combo);
        self.hotkeys
            .register(combo.clone(), toggle_action(Arc::clone(&self.enabled)));
        info!(old = %self.enable_combo, new = %combo, "Enable hotkey changed");
        self.enable_combo = combo.clone();

        let Some(reply) = self.pending_capture.take() else {
            return;
        };
        if reply.send(combo).is_err() {
            debug!("Capture requester went away");
        }
    }

    fn preview(&mut self, id: RuleId) {
        let Some(rule) = self.rules.get(id) else {
            warn!(rule_id = id, "Preview requested for unknown sound command");
            return;
        };
        match self.matcher.preview(&rule, Instant::now()) {
            Some(request) => {
                let outcome = self.pool.submit(request);
                debug!(rule = %rule.name(), ?outcome, "Preview submitted");
            }
            None => warn!(rule = %rule.name(), "Nothing to preview"),
        }
    }
}

/// Flip the enable flag and return the new state
fn flip(enabled: &AtomicBool) -> bool {
    let now_enabled = !enabled.fetch_xor(true, Ordering::Relaxed);
    info!(enabled = now_enabled, "Sound triggers toggled");
    now_enabled
}

fn toggle_action(enabled: Arc<AtomicBool>) -> HotkeyAction {
    Box::new(move || {
        flip(&enabled);
    })
}
