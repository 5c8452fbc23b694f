//! OS media controls backend (MPRIS / SMTC / Now Playing) via `souvlaki`

use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use souvlaki::{
    MediaControlEvent, MediaControls, MediaMetadata, MediaPlayback, MediaPosition, PlatformConfig,
    SeekDirection,
};
use tracing::info;

use crate::now_playing::{
    NowPlayingError, NowPlayingMetadata, NowPlayingSurface, PlaybackStatus, PositionState,
    RemoteCommand, TransportAction,
};

const SEEK_STEP: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, Default)]
struct ControlState {
    position: Duration,
    duration: Duration,
}

/// [`NowPlayingSurface`] backed by the platform media controls
pub struct SystemMediaControls {
    controls: MediaControls,
    state: Arc<Mutex<ControlState>>,
    status: PlaybackStatus,
    attached: bool,
}

impl SystemMediaControls {
    /// Connect to the platform media controls
    ///
    /// `dbus_name` is only used on Linux. Windows needs a window handle
    /// and is reported as unsupported.
    pub fn new(display_name: &str, dbus_name: &str) -> Result<Self, NowPlayingError> {
        if cfg!(target_os = "windows") {
            return Err(NowPlayingError::Unsupported);
        }

        let controls = MediaControls::new(PlatformConfig {
            display_name,
            dbus_name,
            hwnd: None,
        })
        .map_err(|e| NowPlayingError::Platform(format!("{e:?}")))?;

        info!(display_name, "System media controls connected");
        Ok(Self {
            controls,
            state: Arc::new(Mutex::new(ControlState::default())),
            status: PlaybackStatus::Stopped,
            attached: false,
        })
    }

    fn publish_playback(&mut self, position: Option<Duration>) -> Result<(), NowPlayingError> {
        let progress = position.map(MediaPosition);
        let playback = match self.status {
            PlaybackStatus::Stopped => MediaPlayback::Stopped,
            PlaybackStatus::Paused => MediaPlayback::Paused { progress },
            PlaybackStatus::Playing => MediaPlayback::Playing { progress },
        };
        self.controls.set_playback(playback).map_err(platform_error)
    }
}

fn platform_error(e: souvlaki::Error) -> NowPlayingError {
    NowPlayingError::Platform(format!("{e:?}"))
}

fn map_control_event(event: MediaControlEvent, state: ControlState) -> Option<RemoteCommand> {
    let seek = |target: Duration| {
        (!state.duration.is_zero()).then(|| RemoteCommand::SeekTo(target.min(state.duration)))
    };

    match event {
        MediaControlEvent::Play => Some(RemoteCommand::Play),
        MediaControlEvent::Pause => Some(RemoteCommand::Pause),
        MediaControlEvent::Toggle => Some(RemoteCommand::Toggle),
        MediaControlEvent::Next => Some(RemoteCommand::Next),
        MediaControlEvent::Previous => Some(RemoteCommand::Previous),
        MediaControlEvent::Stop => Some(RemoteCommand::Stop),
        MediaControlEvent::SetPosition(MediaPosition(position)) => seek(position),
        MediaControlEvent::SeekBy(direction, delta) => seek(step(state.position, direction, delta)),
        MediaControlEvent::Seek(direction) => seek(step(state.position, direction, SEEK_STEP)),
        MediaControlEvent::SetVolume(_)
        | MediaControlEvent::OpenUri(_)
        | MediaControlEvent::Raise
        | MediaControlEvent::Quit => None,
    }
}

fn step(position: Duration, direction: SeekDirection, delta: Duration) -> Duration {
    match direction {
        SeekDirection::Forward => position.saturating_add(delta),
        SeekDirection::Backward => position.saturating_sub(delta),
    }
}

impl NowPlayingSurface for SystemMediaControls {
    fn set_metadata(&mut self, metadata: &NowPlayingMetadata) -> Result<(), NowPlayingError> {
        let cover_url = metadata.artwork.last().map(|a| a.src.as_str());
        self.controls
            .set_metadata(MediaMetadata {
                title: Some(metadata.title.as_str()),
                artist: Some(metadata.artist.as_str()),
                album: None,
                cover_url,
                duration: metadata.duration,
            })
            .map_err(platform_error)
    }

    fn set_playback_status(&mut self, status: PlaybackStatus) -> Result<(), NowPlayingError> {
        self.status = status;
        self.publish_playback(None)
    }

    fn set_position(&mut self, position: &PositionState) -> Result<(), NowPlayingError> {
        if let Ok(mut state) = self.state.lock() {
            state.position = position.position;
            state.duration = position.duration;
        }
        self.publish_playback(Some(position.position))
    }

    fn register_actions(
        &mut self,
        _actions: &[TransportAction],
        commands: Sender<RemoteCommand>,
    ) -> Result<(), NowPlayingError> {
        let state = Arc::clone(&self.state);
        self.controls
            .attach(move |event| {
                let snapshot = match state.lock() {
                    Ok(state) => *state,
                    Err(poisoned) => *poisoned.into_inner(),
                };
                if let Some(command) = map_control_event(event, snapshot) {
                    let _ = commands.send(command);
                }
            })
            .map_err(platform_error)?;
        self.attached = true;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), NowPlayingError> {
        self.status = PlaybackStatus::Stopped;
        self.controls
            .set_metadata(MediaMetadata::default())
            .map_err(platform_error)?;
        self.publish_playback(None)?;
        if self.attached {
            self.controls.detach().map_err(platform_error)?;
            self.attached = false;
        }
        Ok(())
    }
}
