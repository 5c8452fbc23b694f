//! Now-playing surface selection
//!
//! Uses the OS media controls when built with `media-controls` and enabled
//! in settings; otherwise now-playing updates are written to the log.

use std::sync::mpsc::Sender;

use cadenza_playback::config::NowPlayingSettings;
use cadenza_playback::{
    NowPlayingError, NowPlayingMetadata, NowPlayingSurface, PlaybackStatus, PositionState,
    RemoteCommand, TransportAction,
};
use tracing::info;

/// Surface that logs every update
#[derive(Debug, Default)]
pub struct LogSurface {
    commands: Option<Sender<RemoteCommand>>,
}

impl NowPlayingSurface for LogSurface {
    fn set_metadata(&mut self, metadata: &NowPlayingMetadata) -> Result<(), NowPlayingError> {
        info!(
            title = %metadata.title,
            artist = %metadata.artist,
            artwork = metadata.artwork.len(),
            "Now playing"
        );
        Ok(())
    }

    fn set_playback_status(&mut self, status: PlaybackStatus) -> Result<(), NowPlayingError> {
        info!(?status, "Now-playing status");
        Ok(())
    }

    fn set_position(&mut self, state: &PositionState) -> Result<(), NowPlayingError> {
        tracing::debug!(
            position = state.position.as_secs_f64(),
            duration = state.duration.as_secs_f64(),
            "Now-playing position"
        );
        Ok(())
    }

    fn register_actions(
        &mut self,
        actions: &[TransportAction],
        commands: Sender<RemoteCommand>,
    ) -> Result<(), NowPlayingError> {
        info!(actions = actions.len(), "Transport actions registered");
        self.commands = Some(commands);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), NowPlayingError> {
        info!("Now-playing cleared");
        self.commands = None;
        Ok(())
    }
}

/// Pick the surface for these settings
pub fn select(settings: &NowPlayingSettings) -> Option<Box<dyn NowPlayingSurface>> {
    if !settings.enabled {
        return None;
    }

    #[cfg(feature = "media-controls")]
    {
        use cadenza_playback::media_controls::SystemMediaControls;

        match SystemMediaControls::new(&settings.display_name, "cadenza") {
            Ok(controls) => return Some(Box::new(controls)),
            Err(e) => tracing::warn!("System media controls unavailable, logging instead: {}", e),
        }
    }

    Some(Box::new(LogSurface::default()))
}
