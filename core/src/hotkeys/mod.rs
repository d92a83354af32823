//! Global hotkeys
//!
//! - **Combo**: an unordered key set, parsed from `"Ctrl+Shift+C"`
//! - **HotkeyToggle**: held-key tracking, combo dispatch, and combo capture
//!
//! Releases only update the held set. A combo fires on the press that makes
//! the held set equal to it; auto-repeat presses never fire.

mod combo;
mod toggle;


pub use combo::Combo;
pub use toggle::{CaptureCallback, HotkeyAction, HotkeyOutcome, HotkeyToggle, KeyEvent};
