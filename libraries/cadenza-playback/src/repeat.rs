//! Repeat mode state
//!
//! Tracks the current mode together with the "already replayed once" flag
//! used by [`RepeatMode::One`].

use crate::types::RepeatMode;

/// Repeat state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepeatState {
    mode: RepeatMode,
    has_repeated_once: bool,
}

impl RepeatState {
    /// Create repeat state in the given mode
    pub fn new(mode: RepeatMode) -> Self {
        Self {
            mode,
            has_repeated_once: false,
        }
    }

    /// Current mode
    pub fn mode(&self) -> RepeatMode {
        self.mode
    }

    /// Advance `Off -> All -> One -> Off`, returning the new mode
    ///
    /// Leaving or entering a mode resets the replay flag.
    pub fn toggle(&mut self) -> RepeatMode {
        self.set_mode(self.mode.cycled());
        self.mode
    }

    /// Set the mode directly
    pub fn set_mode(&mut self, mode: RepeatMode) {
        self.mode = mode;
        self.has_repeated_once = false;
    }

    /// Whether the current track has already been replayed once
    pub fn has_repeated_once(&self) -> bool {
        self.has_repeated_once
    }

    /// Record that the current track was replayed
    pub fn mark_repeated(&mut self) {
        self.has_repeated_once = true;
    }

    /// Clear the replay flag (called whenever a new track starts)
    pub fn clear_repeated(&mut self) {
        self.has_repeated_once = false;
    }

    /// Whether the output itself should loop the current track
    pub fn loops_natively(&self) -> bool {
        self.mode == RepeatMode::All
    }
}
