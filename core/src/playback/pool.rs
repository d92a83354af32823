//! Fixed-size playback channel pool with FIFO overflow
//!
//! Each busy channel runs on its own thread and holds a `ChannelLease`. Dropping
//! the lease (normal end, device error, timeout, or a panic unwinding out of the
//! device) hands the channel back and dispatches at most one queued request.
//!
//! Channel states and the overflow queue share one mutex, so finding an idle
//! channel and marking it busy is a single critical section.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chatsound_types::AudioSettings;
use tracing::{debug, error, info, warn};

use super::{AudioDevice, PlayRequest, Stopper};

/// How long `dispose` waits for stopped channels to hand back their leases
const DISPOSE_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Idle,
    Busy,
    /// Pool shut down; never reused
    Disposed,
}

/// Result of handing a request to the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Playback started on this channel
    Started { channel: usize },
    /// All channels busy; request waits at this queue depth
    Queued { depth: usize },
    /// Pool already disposed
    Rejected,
    /// A channel was claimed but its playback thread could not be started.
    /// The channel is free again.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub busy: usize,
    pub idle: usize,
    pub queued: usize,
}

struct Channel {
    state: ChannelState,
    stopper: Option<Arc<dyn Stopper>>,
}

struct PoolState {
    channels: Vec<Channel>,
    queue: VecDeque<PlayRequest>,
    /// Leases not yet handed back
    active: usize,
    disposed: bool,
}

impl PoolState {
    /// Claim the first idle channel
    fn try_acquire(&mut self) -> Option<usize> {
        let index = self
            .channels
            .iter()
            .position(|c| c.state == ChannelState::Idle)?;
        self.channels[index].state = ChannelState::Busy;
        self.active += 1;
        Some(index)
    }
}

/// Starts a named channel thread running `work`
pub(crate) type SpawnFn = fn(String, Box<dyn FnOnce() + Send>) -> std::io::Result<()>;

fn spawn_thread(name: String, work: Box<dyn FnOnce() + Send>) -> std::io::Result<()> {
    std::thread::Builder::new().name(name).spawn(work).map(drop)
}

struct PoolShared {
    state: Mutex<PoolState>,
    drained: Condvar,
    device: Arc<dyn AudioDevice>,
    playback_timeout: Option<Duration>,
    spawn: SpawnFn,
}

pub struct ChannelPool {
    shared: Arc<PoolShared>,
}

impl ChannelPool {
    /// Create a pool with `channels` slots (at least one)
    pub fn new(
        device: Arc<dyn AudioDevice>,
        channels: usize,
        playback_timeout: Option<Duration>,
    ) -> Self {
        Self::with_spawner(device, channels, playback_timeout, spawn_thread)
    }

    pub(crate) fn with_spawner(
        device: Arc<dyn AudioDevice>,
        channels: usize,
        playback_timeout: Option<Duration>,
        spawn: SpawnFn,
    ) -> Self {
        let channels = channels.max(1);
        let state = PoolState {
            channels: (0..channels)
                .map(|_| Channel {
                    state: ChannelState::Idle,
                    stopper: None,
                })
                .collect(),
            queue: VecDeque::new(),
            active: 0,
            disposed: false,
        };

        Self {
            shared: Arc::new(PoolShared {
                state: Mutex::new(state),
                drained: Condvar::new(),
                device,
                playback_timeout,
                spawn,
            }),
        }
    }

    pub fn from_settings(device: Arc<dyn AudioDevice>, settings: &AudioSettings) -> Self {
        Self::new(
            device,
            settings.max_channels,
            settings.playback_timeout_secs.map(Duration::from_secs),
        )
    }

    /// Start `request` on an idle channel or queue it. Never blocks on playback.
    pub fn submit(&self, request: PlayRequest) -> SubmitOutcome {
        self.shared.submit(request)
    }

    pub fn status(&self) -> PoolStatus {
        let state = self.shared.lock();
        let busy = state
            .channels
            .iter()
            .filter(|c| c.state == ChannelState::Busy)
            .count();
        let idle = state
            .channels
            .iter()
            .filter(|c| c.state == ChannelState::Idle)
            .count();
        PoolStatus {
            busy,
            idle,
            queued: state.queue.len(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.shared.lock().channels.len()
    }

    pub fn channel_state(&self, channel: usize) -> Option<ChannelState> {
        self.shared.lock().channels.get(channel).map(|c| c.state)
    }

    /// Stop every channel, drop queued requests, and wait briefly for channel
    /// threads to finish. Idempotent.
    pub fn dispose(&self) {
        self.shared.dispose();
    }
}

impl Drop for ChannelPool {
    fn drop(&mut self) {
        self.shared.dispose();
    }
}

impl PoolShared {
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn submit(self: &Arc<Self>, request: PlayRequest) -> SubmitOutcome {
        let mut state = self.lock();
        if state.disposed {
            warn!(rule = %request.rule_name, "Sound pool is shut down, dropping request");
            return SubmitOutcome::Rejected;
        }

        match state.try_acquire() {
            Some(channel) => {
                drop(state);
                if self.launch(channel, request) {
                    SubmitOutcome::Started { channel }
                } else {
                    SubmitOutcome::Failed
                }
            }
            None => {
                state.queue.push_back(request);
                let depth = state.queue.len();
                debug!(queue_size = depth, "All audio channels busy, sound request queued");
                SubmitOutcome::Queued { depth }
            }
        }
    }

    /// Run `request` on its own thread. `channel` must already be marked busy.
    /// Returns false if the thread could not be started.
    fn launch(self: &Arc<Self>, channel: usize, request: PlayRequest) -> bool {
        let lease = ChannelLease {
            shared: Arc::clone(self),
            channel,
        };
        let rule = request.rule_name.clone();

        // On failure the closure, and the lease in it, is dropped, freeing the channel
        match (self.spawn)(
            format!("sound-channel-{channel}"),
            Box::new(move || lease.play(request)),
        ) {
            Ok(()) => true,
            Err(e) => {
                error!(channel, rule = %rule, error = %e, "Failed to spawn playback thread");
                false
            }
        }
    }

    /// Record the stop handle of a started clip. Returns false if the pool was
    /// disposed while the clip was starting.
    fn attach(&self, channel: usize, stopper: Arc<dyn Stopper>) -> bool {
        let mut state = self.lock();
        if state.disposed {
            return false;
        }
        state.channels[channel].stopper = Some(stopper);
        true
    }

    /// A channel's playback ended (for any reason)
    fn finish(self: &Arc<Self>, channel: usize) {
        let mut state = self.lock();
        state.active = state.active.saturating_sub(1);
        state.channels[channel].stopper = None;

        if state.disposed {
            self.drained.notify_all();
            return;
        }

        state.channels[channel].state = ChannelState::Idle;

        // Drain exactly one queued request per completion
        let Some(next) = state.queue.pop_front() else {
            return;
        };
        match state.try_acquire() {
            Some(free) => {
                let remaining = state.queue.len();
                drop(state);
                debug!(channel = free, remaining, "Dispatching queued sound");
                self.launch(free, next);
            }
            None => state.queue.push_back(next),
        }
    }

    fn dispose(&self) {
        let stoppers: Vec<_> = {
            let mut state = self.lock();
            if state.disposed {
                return;
            }
            state.disposed = true;

            let dropped = state.queue.len();
            state.queue.clear();

            let stoppers: Vec<_> = state
                .channels
                .iter_mut()
                .filter_map(|c| {
                    c.state = ChannelState::Disposed;
                    c.stopper.take()
                })
                .collect();
            info!(
                stopping = stoppers.len(),
                dropped_queued = dropped,
                "Disposing sound channels"
            );
            stoppers
        };

        for stopper in stoppers {
            stopper.stop();
        }

        let state = self.lock();
        let (state, wait) = self
            .drained
            .wait_timeout_while(state, DISPOSE_GRACE, |s| s.active > 0)
            .unwrap_or_else(PoisonError::into_inner);
        if wait.timed_out() {
            warn!(active = state.active, "Sound channels still running after shutdown grace period");
        }
    }
}

/// Ownership of one busy channel. Dropping it frees the channel.
struct ChannelLease {
    shared: Arc<PoolShared>,
    channel: usize,
}

impl ChannelLease {
    fn play(self, request: PlayRequest) {
        let playback = match self.shared.device.start(&request.path, request.gain) {
            Ok(playback) => playback,
            Err(e) => {
                error!(
                    rule = %request.rule_name,
                    path = %request.path.display(),
                    error = %e,
                    "Error playing audio file"
                );
                return;
            }
        };

        let stopper = playback.stopper();
        if !self.shared.attach(self.channel, Arc::clone(&stopper)) {
            stopper.stop();
        }

        if let Err(e) = playback.wait(self.shared.playback_timeout) {
            error!(
                rule = %request.rule_name,
                path = %request.path.display(),
                error = %e,
                "Error playing audio file"
            );
        }
    }
}

impl Drop for ChannelLease {
    fn drop(&mut self) {
        self.shared.finish(self.channel);
    }
}
