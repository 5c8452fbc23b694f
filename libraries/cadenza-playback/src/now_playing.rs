//! Now-playing integration
//!
//! Publishes track metadata, playback status and position to an OS-level
//! media surface (lock screen, media keys, desktop widgets) and turns the
//! surface's transport actions into [`RemoteCommand`]s.
//!
//! The surface is optional. Every surface call is best effort: failures
//! are logged and never reach the session.

use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use cadenza_core::Track;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors reported by a [`NowPlayingSurface`]
#[derive(Debug, Error)]
pub enum NowPlayingError {
    /// The platform has no now-playing surface
    #[error("Now-playing surface not supported on this platform")]
    Unsupported,

    /// The platform rejected the call
    #[error("Now-playing platform error: {0}")]
    Platform(String),
}

/// Transport command received from the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteCommand {
    /// Resume playback
    Play,
    /// Pause playback
    Pause,
    /// Toggle play/pause
    Toggle,
    /// Stop playback
    Stop,
    /// Skip to next track
    Next,
    /// Go to previous track
    Previous,
    /// Seek to an absolute position
    SeekTo(Duration),
}

/// Transport actions a surface can offer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportAction {
    /// Play button
    Play,
    /// Pause button
    Pause,
    /// Stop button
    Stop,
    /// Previous track button
    Previous,
    /// Next track button
    Next,
    /// Seek bar
    SeekTo,
}

/// Every action registered with the surface
pub const TRANSPORT_ACTIONS: [TransportAction; 6] = [
    TransportAction::Play,
    TransportAction::Pause,
    TransportAction::Stop,
    TransportAction::Previous,
    TransportAction::Next,
    TransportAction::SeekTo,
];

/// One artwork rendition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artwork {
    /// Image URL
    pub src: String,
    /// Advertised size, `WxH`
    pub sizes: String,
    /// MIME type guessed from the extension
    pub mime_type: Option<String>,
}

/// Metadata published for the current track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NowPlayingMetadata {
    /// Track title
    pub title: String,
    /// Artist name
    pub artist: String,
    /// Artwork renditions, smallest first
    pub artwork: Vec<Artwork>,
    /// Track duration, if known
    pub duration: Option<Duration>,
}

impl NowPlayingMetadata {
    /// Build metadata for `track`, advertising the cover at each size
    pub fn for_track(track: &Track, artwork_sizes: &[u32]) -> Self {
        let mime_type = guess_image_mime(&track.cover);
        let artwork = artwork_sizes
            .iter()
            .map(|size| Artwork {
                src: track.cover.clone(),
                sizes: format!("{size}x{size}"),
                mime_type: mime_type.clone(),
            })
            .collect();

        Self {
            title: track.title.clone(),
            artist: track.artist.clone(),
            artwork,
            duration: Duration::try_from_secs_f64(track.duration)
                .ok()
                .filter(|d| !d.is_zero()),
        }
    }
}

fn guess_image_mime(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let extension = path.rsplit_once('.')?.1.to_ascii_lowercase();
    let mime = match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        _ => return None,
    };
    Some(mime.to_string())
}

/// Playback status shown by the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackStatus {
    /// Playing
    Playing,
    /// Paused
    Paused,
    /// Nothing loaded
    Stopped,
}

/// Position state published to the surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionState {
    /// Current position
    pub position: Duration,
    /// Track duration (zero while unknown)
    pub duration: Duration,
    /// Playback rate
    pub playback_rate: f64,
}

/// OS-level now-playing surface
pub trait NowPlayingSurface {
    /// Whether the platform actually provides this surface
    fn is_supported(&self) -> bool {
        true
    }

    /// Publish track metadata
    fn set_metadata(&mut self, metadata: &NowPlayingMetadata) -> Result<(), NowPlayingError>;

    /// Publish playback status
    fn set_playback_status(&mut self, status: PlaybackStatus) -> Result<(), NowPlayingError>;

    /// Publish position state
    fn set_position(&mut self, state: &PositionState) -> Result<(), NowPlayingError>;

    /// Register transport actions; commands are sent on `commands`
    fn register_actions(
        &mut self,
        actions: &[TransportAction],
        commands: Sender<RemoteCommand>,
    ) -> Result<(), NowPlayingError>;

    /// Clear metadata and unregister every action
    fn clear(&mut self) -> Result<(), NowPlayingError>;
}

/// Mirrors the session onto an optional [`NowPlayingSurface`]
pub struct NowPlaying {
    surface: Option<Box<dyn NowPlayingSurface>>,
    commands_tx: Sender<RemoteCommand>,
    commands_rx: Receiver<RemoteCommand>,
    registered: bool,
    published_track: Option<String>,
    last_status: Option<PlaybackStatus>,
    last_position_at: Option<Instant>,
    position_interval: Duration,
    artwork_sizes: Vec<u32>,
}

impl NowPlaying {
    /// Create a publisher for `surface`
    ///
    /// An unsupported surface is dropped and the publisher becomes inert.
    pub fn new(
        surface: Option<Box<dyn NowPlayingSurface>>,
        position_interval: Duration,
        artwork_sizes: Vec<u32>,
    ) -> Self {
        let surface = surface.filter(|s| {
            let supported = s.is_supported();
            if !supported {
                debug!("Now-playing surface unsupported, disabling");
            }
            supported
        });
        let (commands_tx, commands_rx) = mpsc::channel();

        Self {
            surface,
            commands_tx,
            commands_rx,
            registered: false,
            published_track: None,
            last_status: None,
            last_position_at: None,
            position_interval,
            artwork_sizes,
        }
    }

    /// Publisher without a surface
    pub fn disabled() -> Self {
        Self::new(None, Duration::from_secs(1), Vec::new())
    }

    /// Whether a surface is attached
    pub fn is_active(&self) -> bool {
        self.surface.is_some()
    }

    /// Publish the current track, or tear down when it is `None`
    ///
    /// Handlers are registered on the first track and kept while tracks
    /// keep changing.
    pub fn track_changed(&mut self, track: Option<&Track>) {
        let Some(track) = track else {
            self.teardown();
            return;
        };
        if self.surface.is_none() {
            return;
        }
        if self.published_track.as_deref() == Some(track.track_id.as_str()) {
            return;
        }

        let metadata = NowPlayingMetadata::for_track(track, &self.artwork_sizes);
        self.call("set_metadata", |s| s.set_metadata(&metadata));
        self.published_track = Some(track.track_id.clone());

        if !self.registered {
            let tx = self.commands_tx.clone();
            self.registered = self.call("register_actions", |s| {
                s.register_actions(&TRANSPORT_ACTIONS, tx)
            });
        }
    }

    /// Publish a status change
    ///
    /// Entering `Playing` arms the position cadence so the next tick
    /// publishes immediately; leaving it publishes the final position once
    /// and stops the cadence.
    pub fn status_changed(&mut self, status: PlaybackStatus, position: PositionState) {
        if self.surface.is_none()
            || self.published_track.is_none()
            || self.last_status == Some(status)
        {
            return;
        }
        let was_playing = self.last_status == Some(PlaybackStatus::Playing);
        self.last_status = Some(status);
        self.call("set_playback_status", |s| s.set_playback_status(status));

        self.last_position_at = None;
        if was_playing && status != PlaybackStatus::Stopped {
            self.call("set_position", |s| s.set_position(&position));
        }
    }

    /// Publish position immediately (after a seek)
    pub fn position_changed(&mut self, position: PositionState) {
        if self.surface.is_none() || self.published_track.is_none() {
            return;
        }
        self.call("set_position", |s| s.set_position(&position));
    }

    /// Republish position if playing and the cadence interval has elapsed
    pub fn tick(&mut self, now: Instant, position: PositionState) {
        if self.surface.is_none() || self.last_status != Some(PlaybackStatus::Playing) {
            return;
        }
        let due = match self.last_position_at {
            Some(last) => now.saturating_duration_since(last) >= self.position_interval,
            None => true,
        };
        if due {
            self.call("set_position", |s| s.set_position(&position));
            self.last_position_at = Some(now);
        }
    }

    /// Next queued remote command, if any
    pub fn poll_command(&self) -> Option<RemoteCommand> {
        self.commands_rx.try_recv().ok()
    }

    /// Sender that feeds remote commands into this publisher
    pub fn command_sender(&self) -> Sender<RemoteCommand> {
        self.commands_tx.clone()
    }

    /// Clear the surface and drop every registered handler
    pub fn teardown(&mut self) {
        if self.surface.is_some() && (self.registered || self.published_track.is_some()) {
            self.call("clear", |s| s.clear());
            debug!("Now-playing surface cleared");
        }
        self.registered = false;
        self.published_track = None;
        self.last_status = None;
        self.last_position_at = None;
        while self.commands_rx.try_recv().is_ok() {}
    }

    fn call<F>(&mut self, operation: &str, f: F) -> bool
    where
        F: FnOnce(&mut dyn NowPlayingSurface) -> Result<(), NowPlayingError>,
    {
        let Some(surface) = self.surface.as_deref_mut() else {
            return false;
        };
        match f(surface) {
            Ok(()) => true,
            Err(e) => {
                warn!(operation, error = %e, "Now-playing update failed");
                false
            }
        }
    }
}

impl Drop for NowPlaying {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for NowPlaying {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NowPlaying")
            .field("active", &self.surface.is_some())
            .field("registered", &self.registered)
            .field("published_track", &self.published_track)
            .field("last_status", &self.last_status)
            .finish_non_exhaustive()
    }
}
