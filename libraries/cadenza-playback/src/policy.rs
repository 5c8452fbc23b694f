//! Track-end policy
//!
//! Decides what happens when the output reports the natural end of a
//! source. Repeat-all never reaches this point: the output loops by itself
//! and does not report an end.

use tracing::debug;

use crate::repeat::RepeatState;
use crate::types::RepeatMode;

/// What to do after a track ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndAction {
    /// Rewind and play the same track again
    ReplayCurrent,
    /// Move on to the next track
    Advance,
    /// The output is looping; nothing to do
    Ignore,
}

/// Decide the end-of-track action, updating the replay flag
pub fn on_track_ended(repeat: &mut RepeatState) -> EndAction {
    let action = match repeat.mode() {
        RepeatMode::Off => EndAction::Advance,
        RepeatMode::All => EndAction::Ignore,
        RepeatMode::One if !repeat.has_repeated_once() => {
            repeat.mark_repeated();
            EndAction::ReplayCurrent
        }
        RepeatMode::One => {
            repeat.clear_repeated();
            EndAction::Advance
        }
    };
    debug!(mode = ?repeat.mode(), ?action, "Track ended");
    action
}
