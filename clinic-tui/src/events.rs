//! Event types for the TUI event loop.

use crate::controller::ViewEvent;
use crossterm::event::KeyEvent;

#[derive(Debug)]
pub enum TuiEvent {
    Input(KeyEvent),
    Resize { width: u16, height: u16 },
    /// Completion of background work started by the view mounted as `mount`.
    View { mount: u64, event: ViewEvent },
}
