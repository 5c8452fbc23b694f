//! Cadenza - Audio Session
//!
//! Platform-agnostic playback core for a streaming music player.
//!
//! This crate provides:
//! - Queue with identity-based dedupe, reordering and reversible shuffle
//! - Repeat modes (Off, All, One) with a single replay for One
//! - Next/previous navigation with a 3-second restart rule
//! - A playback engine that keeps one media output in sync with the
//!   session's intent (source binding, play/pause, loop, volume)
//! - Now-playing publishing to OS media surfaces with remote commands
//!
//! # Architecture
//!
//! `cadenza-playback` never touches a real player. The platform supplies a
//! [`MediaOutput`] (one media handle) and optionally a
//! [`NowPlayingSurface`], then forwards platform notifications as
//! [`MediaEvent`]s. Everything runs on the caller's thread.
//!
//! # Example: Basic Playback
//!
//! ```rust,no_run
//! use cadenza_core::Track;
//! use cadenza_playback::{AudioSession, MediaEvent, MediaOutput, PlaybackConfig};
//! # use cadenza_playback::PlayAttempt;
//! # use std::time::Duration;
//! # struct Player;
//! # impl MediaOutput for Player {
//! #     fn set_source(&mut self, _url: Option<&str>) {}
//! #     fn play(&mut self) -> PlayAttempt { PlayAttempt::Started }
//! #     fn pause(&mut self) {}
//! #     fn is_paused(&self) -> bool { true }
//! #     fn seek(&mut self, _position: Duration) {}
//! #     fn position(&self) -> Duration { Duration::ZERO }
//! #     fn duration(&self) -> Option<Duration> { None }
//! #     fn set_volume(&mut self, _volume: f32) {}
//! #     fn set_muted(&mut self, _muted: bool) {}
//! #     fn set_loop(&mut self, _looping: bool) {}
//! # }
//!
//! let mut session = AudioSession::new(Player, PlaybackConfig::default());
//!
//! let album: Vec<Track> = (1..=3)
//!     .map(|n| Track::new(format!("t{n}")).with_audio(format!("https://cdn/{n}.mp3")))
//!     .collect();
//!
//! session.play_track(&album[0], Some(&album));
//! session.toggle_repeat();
//!
//! // Forward platform notifications
//! session.handle_media_event(MediaEvent::CanPlay);
//!
//! for event in session.drain_events() {
//!     println!("{event:?}");
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
mod engine;
mod error;
mod events;
#[cfg(feature = "media-controls")]
pub mod media_controls;
pub mod navigation;
pub mod now_playing;
mod output;
pub mod policy;
mod queue;
mod repeat;
mod session;
mod shuffle;
pub mod types;
mod volume;

// Public exports
pub use config::Settings;
pub use engine::{EngineSignal, PlaybackEngine};
pub use error::{PlaybackError, Result};
pub use events::PlaybackEvent;
pub use now_playing::{
    NowPlaying, NowPlayingError, NowPlayingMetadata, NowPlayingSurface, PlaybackStatus,
    PositionState, RemoteCommand, TransportAction,
};
pub use output::{MediaErrorCode, MediaEvent, MediaOutput, PlayAttempt, PlayRejection, PlayTicket};
pub use queue::QueueStore;
pub use repeat::RepeatState;
pub use session::{AudioSession, SessionSnapshot, SharedSession};
pub use types::{LoadErrorKind, PlaybackConfig, PlaybackState, RepeatMode};
pub use volume::Volume;
