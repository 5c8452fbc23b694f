//! Media output abstraction
//!
//! [`MediaOutput`] is the single handle the engine drives: one source at a
//! time, a paused flag, a position and a loop attribute. Platform
//! notifications come back as [`MediaEvent`]s which the host forwards to
//! [`crate::AudioSession::handle_media_event`].

use std::time::Duration;

use crate::types::LoadErrorKind;

/// Identifies one deferred play request
///
/// Issued by the output when [`MediaOutput::play`] cannot answer
/// immediately, and echoed back in [`MediaEvent::PlayResolved`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayTicket(pub u64);

/// Why a play request was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayRejection {
    /// Platform-provided reason (autoplay policy, aborted load, ...)
    pub reason: String,
}

impl PlayRejection {
    /// Create a rejection with the given reason
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for PlayRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Outcome of [`MediaOutput::play`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayAttempt {
    /// Output is now playing
    Started,

    /// Output refused to play
    Rejected(PlayRejection),

    /// Answer arrives later as [`MediaEvent::PlayResolved`]
    Pending(PlayTicket),
}

/// Platform media error code
///
/// Follows the conventional numbering: 1 aborted, 2 network, 3 decode,
/// 4 source not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaErrorCode(pub u16);

impl MediaErrorCode {
    /// Load aborted by the user agent
    pub const ABORTED: Self = Self(1);
    /// Network failure while fetching
    pub const NETWORK: Self = Self(2);
    /// Decoding failure
    pub const DECODE: Self = Self(3);
    /// Source or format not supported
    pub const SRC_NOT_SUPPORTED: Self = Self(4);

    /// Classify the code
    pub fn kind(self) -> LoadErrorKind {
        match self {
            Self::ABORTED => LoadErrorKind::Aborted,
            Self::NETWORK => LoadErrorKind::Network,
            Self::DECODE => LoadErrorKind::Decode,
            Self::SRC_NOT_SUPPORTED => LoadErrorKind::UnsupportedFormat,
            _ => LoadErrorKind::Unknown,
        }
    }
}

/// Notification from the media output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaEvent {
    /// Source fetch started
    LoadStart,
    /// Playback stalled waiting for data
    Waiting,
    /// Fetch stalled
    Stalled,
    /// Enough data to start playing
    CanPlay,
    /// First frame decoded
    LoadedData,
    /// Playback actually started
    Playing,
    /// Position advanced
    TimeUpdate,
    /// Duration became known or changed
    DurationChange,
    /// Source played to its end (never raised while looping)
    Ended,
    /// Source failed to load or decode
    Error(MediaErrorCode),
    /// Deferred play request settled
    PlayResolved {
        /// Ticket returned from [`MediaOutput::play`]
        ticket: PlayTicket,
        /// `Ok` if playback started
        result: Result<(), PlayRejection>,
    },
}

/// Single media handle driven by the playback engine
///
/// Implementations wrap a platform player. Only the engine calls these
/// methods.
pub trait MediaOutput {
    /// Bind a new source (or clear it with `None`), resetting position
    fn set_source(&mut self, url: Option<&str>);

    /// Request playback of the bound source
    fn play(&mut self) -> PlayAttempt;

    /// Pause playback
    fn pause(&mut self);

    /// Whether the output is currently paused
    fn is_paused(&self) -> bool;

    /// Move the playback position
    fn seek(&mut self, position: Duration);

    /// Current playback position
    fn position(&self) -> Duration;

    /// Source duration, once known
    fn duration(&self) -> Option<Duration>;

    /// Set linear volume (0.0 - 1.0)
    fn set_volume(&mut self, volume: f32);

    /// Set mute flag
    fn set_muted(&mut self, muted: bool);

    /// Set the loop attribute; a looping output restarts instead of ending
    fn set_loop(&mut self, looping: bool);
}
