use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::events::EngineEvent;
use crate::hotkeys::{Combo, KeyEvent};
use crate::rules::RuleId;

/// Buffer size for chat messages. Bursts beyond this are dropped.
pub const ENGINE_QUEUE_CAPACITY: usize = 256;

/// Cloneable sender for posting events to a running `SoundEngine`.
///
/// Chat goes on a bounded queue and is dropped when it is full. Key and
/// control events go on an unbounded queue the engine drains first, so held
/// key state never falls behind a chat burst. Posting never blocks; the engine
/// stops once every handle is dropped.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    chat: mpsc::Sender<String>,
    control: mpsc::UnboundedSender<EngineEvent>,
}

/// Receiving ends of the engine queues, consumed by `SoundEngine`
#[derive(Debug)]
pub struct EngineReceiver {
    pub(crate) chat: mpsc::Receiver<String>,
    pub(crate) control: mpsc::UnboundedReceiver<EngineEvent>,
}

impl EngineHandle {
    /// Post an event. Returns false if it was dropped.
    pub fn post(&self, event: EngineEvent) -> bool {
        match event {
            EngineEvent::Chat(text) => self.chat(text),
            event => match self.control.send(event) {
                Ok(()) => true,
                Err(mpsc::error::SendError(event)) => {
                    debug!(event = event.kind(), "Engine stopped, dropping event");
                    false
                }
            },
        }
    }

    pub fn chat(&self, text: impl Into<String>) -> bool {
        match self.chat.try_send(text.into()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Chat queue full, dropping message");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Engine stopped, dropping chat message");
                false
            }
        }
    }

    /// Chat messages waiting to be evaluated
    pub fn pending_chat(&self) -> usize {
        self.chat.max_capacity() - self.chat.capacity()
    }

    pub fn key(&self, event: KeyEvent) -> bool {
        self.post(EngineEvent::Key(event))
    }

    pub fn preview(&self, rule: RuleId) -> bool {
        self.post(EngineEvent::Preview(rule))
    }

    pub fn toggle_enabled(&self) -> bool {
        self.post(EngineEvent::ToggleEnabled)
    }

    pub fn cancel_capture(&self) -> bool {
        self.post(EngineEvent::CancelCapture)
    }

    /// Start capturing the enable combo. The receiver resolves with the new
    /// combo, or errors if the capture was cancelled or replaced.
    pub fn begin_capture(&self) -> Option<oneshot::Receiver<Combo>> {
        let (reply, rx) = oneshot::channel();
        self.post(EngineEvent::BeginCapture(reply)).then_some(rx)
    }

    pub async fn capture(&self) -> Option<Combo> {
        self.begin_capture()?.await.ok()
    }

    /// Ask the engine to stop. Queued chat messages are discarded.
    pub fn shutdown(&self) {
        self.post(EngineEvent::Shutdown);
    }

    pub(crate) fn downgrade(&self) -> mpsc::WeakUnboundedSender<EngineEvent> {
        self.control.downgrade()
    }
}

/// Create a new engine channel
pub fn create_engine_channel() -> (EngineHandle, EngineReceiver) {
    let (chat_tx, chat_rx) = mpsc::channel(ENGINE_QUEUE_CAPACITY);
    let (control_tx, control_rx) = mpsc::unbounded_channel();
    (
        EngineHandle {
            chat: chat_tx,
            control: control_tx,
        },
        EngineReceiver {
            chat: chat_rx,
            control: control_rx,
        },
    )
}
