//! Error types for audio playback

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by an audio device while starting or running a clip.
///
/// These never leave the channel pool: they are logged and the channel is freed.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("failed to open audio output device")]
    OpenDevice(#[source] rodio::StreamError),

    #[error("failed to create audio sink")]
    CreateSink(#[source] rodio::PlayError),

    #[error("failed to open audio file {path}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode audio file {path}")]
    Decode {
        path: PathBuf,
        #[source]
        source: rodio::decoder::DecoderError,
    },

    #[error("playback of {path} still running after {timeout:?}, stopped")]
    TimedOut { path: PathBuf, timeout: Duration },

    /// Failure injected by the scripted test device
    #[cfg(test)]
    #[error("audio device failure: {0}")]
    Device(String),
}
