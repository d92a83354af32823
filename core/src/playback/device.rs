//! Audio output seam
//!
//! The pool only needs "start this file at this gain, tell me when it ends, let
//! me stop it early". `AudioDevice` is that seam; `RodioDevice` is the real
//! implementation.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use rodio::{Decoder, OutputStream, Sink};

use super::PlaybackError;

/// How often a rodio channel checks whether its sink has drained
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Forces an active playback to end early. Callable from any thread.
pub trait Stopper: Send + Sync {
    fn stop(&self);
}

/// A clip that has started playing on the calling thread
pub trait Playback {
    fn stopper(&self) -> Arc<dyn Stopper>;

    /// Block until end of stream, a forced stop, or `timeout` elapses
    fn wait(self: Box<Self>, timeout: Option<Duration>) -> Result<(), PlaybackError>;
}

/// Opens and starts clips. Called from a channel's own thread, which then
/// waits on the returned playback.
pub trait AudioDevice: Send + Sync + 'static {
    fn start(&self, path: &Path, gain: f32) -> Result<Box<dyn Playback>, PlaybackError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Rodio
// ─────────────────────────────────────────────────────────────────────────────

/// Default output device via rodio. Each playback opens its own stream, the
/// same way one-shot sounds are played elsewhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct RodioDevice;

impl AudioDevice for RodioDevice {
    fn start(&self, path: &Path, gain: f32) -> Result<Box<dyn Playback>, PlaybackError> {
        let (stream, stream_handle) = OutputStream::try_default().map_err(PlaybackError::OpenDevice)?;

        let file = File::open(path).map_err(|source| PlaybackError::OpenFile {
            path: path.to_path_buf(),
            source,
        })?;
        let source = Decoder::new(BufReader::new(file)).map_err(|source| PlaybackError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let sink = Sink::try_new(&stream_handle).map_err(PlaybackError::CreateSink)?;

        sink.set_volume(gain);
        sink.append(source);

        Ok(Box::new(RodioPlayback {
            control: Arc::new(RodioControl {
                sink,
                stopped: AtomicBool::new(false),
            }),
            path: path.to_path_buf(),
            _stream: stream,
        }))
    }
}

struct RodioControl {
    sink: Sink,
    stopped: AtomicBool,
}

impl Stopper for RodioControl {
    fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        self.sink.stop();
    }
}

struct RodioPlayback {
    control: Arc<RodioControl>,
    path: PathBuf,
    // Output stream must outlive the sink; it is not Send so it stays on this thread
    _stream: OutputStream,
}

impl Playback for RodioPlayback {
    fn stopper(&self) -> Arc<dyn Stopper> {
        self.control.clone()
    }

    fn wait(self: Box<Self>, timeout: Option<Duration>) -> Result<(), PlaybackError> {
        let deadline = timeout.map(|t| Instant::now() + t);

        while !self.control.sink.empty() && !self.control.stopped.load(Ordering::Acquire) {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                self.control.stop();
                return Err(PlaybackError::TimedOut {
                    path: self.path.clone(),
                    timeout: timeout.unwrap_or_default(),
                });
            }
            std::thread::sleep(POLL_INTERVAL);
        }
        Ok(())
    }
}
