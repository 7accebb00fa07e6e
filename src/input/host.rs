//! Collaborators the input layer reports to
//!
//! The front-end UI and the game session live outside this crate. The input
//! subsystem reaches them only through these traits.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use super::events::PlatformEvent;

/// Cursor state derived after each event drain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorState {
    pub visible: bool,
    /// Relative mouse mode (pointer captured for mouse aiming)
    pub locked: bool,
}

/// Front-end UI surface
///
/// Called from the event thread. Implementations must not call back into the
/// input subsystem's capture APIs from these methods.
pub trait UiHost: Send + Sync {
    /// Hand an event to the UI's own queue
    fn queue_event(&self, event: PlatformEvent);

    /// Whether a menu that captures input is focused
    fn is_context_capturing_input(&self) -> bool;

    fn open_notification(&self, title: &str, message: &str);

    /// Show `completed` lit icons out of `total`
    fn set_prompt_progress(&self, completed: usize, total: usize);

    fn clear_prompt_progress(&self);

    fn close_prompt(&self);

    fn toggle_fullscreen(&self) {}

    /// A batch of files dropped on the window
    fn drop_files(&self, _files: Vec<PathBuf>) {}

    fn apply_cursor(&self, _cursor: CursorState) {}

    /// Give the pointer back to the UI (after quit was requested in-game)
    fn activate_mouse(&self) {}

    /// Called once, on the first drain after the game session started
    fn process_game_started(&self) {}
}

/// Game session lifecycle
pub trait GameSession: Send + Sync {
    fn is_game_started(&self) -> bool;

    /// Request the session to shut down
    fn quit(&self);
}

/// Minimal [`GameSession`] backed by two flags
#[derive(Debug, Default)]
pub struct SessionFlags {
    started: AtomicBool,
    quit_requested: AtomicBool,
}

impl SessionFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self) {
        self.started.store(true, Ordering::SeqCst);
    }

    pub fn is_quit_requested(&self) -> bool {
        self.quit_requested.load(Ordering::SeqCst)
    }
}

impl GameSession for SessionFlags {
    fn is_game_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    fn quit(&self) {
        self.quit_requested.store(true, Ordering::SeqCst);
    }
}
