//! Sound engine event loop
//!
//! Chat messages, key events, and control requests arrive through an
//! `EngineHandle` and are processed one at a time by `SoundEngine::run`.

mod events;
mod handle;
mod service;


pub use events::EngineEvent;
pub use handle::{ENGINE_QUEUE_CAPACITY, EngineHandle, EngineReceiver, create_engine_channel};
pub use service::SoundEngine;
