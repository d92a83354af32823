//! Sound playback
//!
//! This module provides:
//! - **AudioDevice**: the output seam (`RodioDevice` in production)
//! - **ChannelPool**: a fixed number of concurrent channels with a FIFO
//!   overflow queue
//! - **PlayRequest**: a resolved clip on its way to a channel
//!
//! # Channel lifecycle
//!
//! ```text
//!   Idle ──submit / queue drain──▶ Busy ──EOF, error, timeout, stop──▶ Idle
//!     │                              │
//!     └──────────── dispose ─────────┴──────────────▶ Disposed
//! ```

mod device;
mod error;
mod pool;
mod request;

#[cfg(test)]
pub(crate) mod testing;


pub use device::{AudioDevice, Playback, RodioDevice, Stopper};
pub use error::PlaybackError;
pub use pool::{ChannelPool, ChannelState, PoolStatus, SubmitOutcome};
pub use request::PlayRequest;
