//! Playback events
//!
//! Hosts observe session changes by draining these after each operation
//! or media event. Every variant carries enough to redraw without querying
//! the session again.

use serde::{Deserialize, Serialize};

use crate::types::{LoadErrorKind, PlaybackState, RepeatMode};

/// Events emitted by the audio session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Current track changed
    TrackChanged {
        /// ID of the new track (`None` when the session emptied)
        track_id: Option<String>,
        /// ID of the previous track (if any)
        previous_track_id: Option<String>,
    },

    /// Derived playback state changed
    StateChanged {
        /// The new playback state
        state: PlaybackState,
    },

    /// Queue contents, order or selection changed
    QueueChanged {
        /// New queue length
        length: usize,
        /// New current index
        current_index: Option<usize>,
    },

    /// Repeat mode changed
    RepeatModeChanged {
        /// The new mode
        mode: RepeatMode,
    },

    /// Shuffle toggled
    ShuffleChanged {
        /// Whether shuffle is now on
        enabled: bool,
    },

    /// Volume or mute changed
    VolumeChanged {
        /// Linear level (0.0 - 1.0)
        level: f32,
        /// Whether audio is muted
        is_muted: bool,
    },

    /// Loading indicator changed
    LoadingChanged {
        /// Whether the output is buffering
        is_loading: bool,
    },

    /// Current source failed to load
    LoadFailed {
        /// Failing track
        track_id: String,
        /// Classified failure
        kind: LoadErrorKind,
    },

    /// Track reached its natural end
    TrackEnded {
        /// ID of the finished track
        track_id: String,
    },
}
