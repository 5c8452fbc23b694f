//! Core types for playback management

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Playback state, derived from the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// No track bound to the output
    Stopped,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,

    /// Play requested, waiting for the source to become playable
    Loading,
}

/// Repeat mode
///
/// Cycles `Off -> All -> One -> Off`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Advance through the queue
    #[default]
    Off,

    /// Loop the current track on the output itself
    All,

    /// Replay the current track once, then advance
    One,
}

impl RepeatMode {
    /// Next mode in the toggle cycle
    #[must_use]
    pub fn cycled(self) -> Self {
        match self {
            Self::Off => Self::All,
            Self::All => Self::One,
            Self::One => Self::Off,
        }
    }
}

/// Classified load failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadErrorKind {
    /// Fetch failed mid-way
    Network,

    /// Source could not be decoded
    Decode,

    /// Source format or URL not supported
    UnsupportedFormat,

    /// Load aborted
    Aborted,

    /// Anything else
    Unknown,
}

/// Runtime configuration for an [`crate::AudioSession`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Initial volume in `[0, 1]` (default: 1.0)
    pub volume: f32,

    /// Initial mute state (default: false)
    pub muted: bool,

    /// Initial repeat mode (default: Off)
    pub repeat: RepeatMode,

    /// Position past which "previous" restarts the current track (default: 3s)
    pub restart_threshold: Duration,

    /// Retries allowed per track after a load error (default: 3)
    pub max_load_retries: u32,

    /// Cadence of now-playing position updates while playing (default: 1s)
    pub position_interval: Duration,

    /// Square artwork sizes advertised to the now-playing surface
    pub artwork_sizes: Vec<u32>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: 1.0,
            muted: false,
            repeat: RepeatMode::Off,
            restart_threshold: Duration::from_secs(3),
            max_load_retries: 3,
            position_interval: Duration::from_secs(1),
            artwork_sizes: vec![96, 128, 192, 256, 384, 512],
        }
    }
}
