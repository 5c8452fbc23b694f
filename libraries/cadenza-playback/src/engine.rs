//! Playback engine
//!
//! Owns the [`MediaOutput`] and reconciles it with the session's intent:
//! which track is bound, whether it should be playing, the loop attribute
//! and the volume. Platform notifications are folded into explicit state
//! (`is_loading`, `load_error`) and surfaced as [`EngineSignal`]s.
//!
//! A source is only rebound when the track identity changes. Each rebind
//! bumps a generation counter; deferred play answers carrying an older
//! generation are discarded so they can never resume the wrong track.

use std::time::Duration;

use cadenza_core::Track;
use tracing::{debug, info, warn};

use crate::output::{MediaEvent, MediaOutput, PlayAttempt, PlayRejection, PlayTicket};
use crate::types::{LoadErrorKind, PlaybackConfig, PlaybackState};
use crate::volume::Volume;

/// What the session needs to act on after a media event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineSignal {
    /// Nothing for the session to do
    None,
    /// Loading indicator flipped
    LoadingChanged(bool),
    /// Position or duration moved
    Progress,
    /// Source reached its end (never raised while looping)
    Ended,
    /// Source failed to load
    LoadFailed(LoadErrorKind),
    /// Play intent was dropped because the output refused to play
    PlayRejected,
}

#[derive(Debug, Clone)]
struct PendingPlay {
    ticket: PlayTicket,
    generation: u64,
    track_id: String,
}

#[derive(Debug, Clone)]
struct BoundSource {
    track_id: String,
    url: String,
}

/// Drives a single media output
pub struct PlaybackEngine<O: MediaOutput> {
    output: O,
    bound: Option<BoundSource>,
    generation: u64,
    is_playing: bool,
    is_loading: bool,
    load_error: Option<LoadErrorKind>,
    pending_play: Option<PendingPlay>,
    looping: bool,
    volume: Volume,
    retry_attempts: u32,
    max_load_retries: u32,
}

impl<O: MediaOutput> PlaybackEngine<O> {
    /// Create an engine, pushing initial volume and mute to the output
    pub fn new(mut output: O, config: &PlaybackConfig) -> Self {
        let mut volume = Volume::new(config.volume);
        if config.muted {
            volume.mute();
        }
        output.set_volume(volume.level());
        output.set_muted(volume.is_muted());
        output.set_loop(false);

        Self {
            output,
            bound: None,
            generation: 0,
            is_playing: false,
            is_loading: false,
            load_error: None,
            pending_play: None,
            looping: false,
            volume,
            retry_attempts: 0,
            max_load_retries: config.max_load_retries,
        }
    }

    /// Bind `track` to the output
    ///
    /// Rebinds only when the track identity differs from the bound one.
    /// `None` and unplayable tracks perform a clean stop: pause, clear the
    /// source and reset position. Returns `true` if the binding changed.
    pub fn bind(&mut self, track: Option<&Track>) -> bool {
        let target = track.and_then(|t| t.audio.as_deref().map(|url| (t, url)));

        match target {
            Some((track, url)) => {
                if self.bound_track_id() == Some(track.track_id.as_str()) {
                    return false;
                }

                self.generation += 1;
                self.pending_play = None;
                self.load_error = None;
                self.retry_attempts = 0;
                self.is_loading = true;
                self.bound = Some(BoundSource {
                    track_id: track.track_id.clone(),
                    url: url.to_string(),
                });
                self.output.set_source(Some(url));
                self.output.set_loop(self.looping);
                info!(track_id = %track.track_id, generation = self.generation, "Source bound");
                true
            }
            None => {
                if let Some(track) = track {
                    warn!(track_id = %track.track_id, "Refusing to bind unplayable track");
                }
                if self.bound.is_none() {
                    return false;
                }
                self.unbind();
                true
            }
        }
    }

    fn unbind(&mut self) {
        self.generation += 1;
        self.output.pause();
        self.output.set_source(None);
        self.output.seek(Duration::ZERO);
        self.bound = None;
        self.is_playing = false;
        self.is_loading = false;
        self.load_error = None;
        self.pending_play = None;
        self.retry_attempts = 0;
        debug!("Output cleared");
    }

    /// Set the play intent and reconcile the output with it
    pub fn set_playing(&mut self, playing: bool) {
        self.is_playing = playing;
        self.reconcile();
    }

    fn reconcile(&mut self) {
        if self.bound.is_none() {
            self.is_playing = false;
            return;
        }

        if !self.is_playing {
            // A pause supersedes any outstanding play request; its late
            // answer is then stale and the next resume asks again.
            if let Some(pending) = self.pending_play.take() {
                debug!(ticket = ?pending.ticket, "Pending play superseded by pause");
            }
            if !self.output.is_paused() {
                self.output.pause();
            }
            return;
        }

        if self.pending_play.is_some() || !self.output.is_paused() {
            return;
        }

        match self.output.play() {
            PlayAttempt::Started => {}
            PlayAttempt::Rejected(rejection) => self.reject(&rejection),
            PlayAttempt::Pending(ticket) => {
                let track_id = self.bound_track_id().unwrap_or_default().to_string();
                self.pending_play = Some(PendingPlay {
                    ticket,
                    generation: self.generation,
                    track_id,
                });
            }
        }
    }

    fn reject(&mut self, rejection: &PlayRejection) {
        warn!(reason = %rejection, "Play request rejected");
        self.is_playing = false;
    }

    fn resolve_play(
        &mut self,
        ticket: PlayTicket,
        result: Result<(), PlayRejection>,
    ) -> EngineSignal {
        let current = match self.pending_play.take() {
            Some(pending)
                if pending.ticket == ticket
                    && pending.generation == self.generation
                    && self.bound_track_id() == Some(pending.track_id.as_str()) =>
            {
                pending
            }
            other => {
                self.pending_play = other;
                debug!(?ticket, "Discarding stale play resolution");
                return EngineSignal::None;
            }
        };

        match result {
            Ok(()) => {
                debug!(track_id = %current.track_id, "Deferred play started");
                if !self.is_playing {
                    self.output.pause();
                }
                EngineSignal::None
            }
            Err(rejection) => {
                self.reject(&rejection);
                EngineSignal::PlayRejected
            }
        }
    }

    /// Fold a media event into engine state
    pub fn handle_event(&mut self, event: MediaEvent) -> EngineSignal {
        if self.bound.is_none() {
            if !matches!(event, MediaEvent::PlayResolved { .. }) {
                debug!(?event, "Ignoring media event with no bound source");
            }
            return EngineSignal::None;
        }

        match event {
            MediaEvent::LoadStart | MediaEvent::Waiting | MediaEvent::Stalled => {
                self.set_loading(true)
            }
            MediaEvent::CanPlay | MediaEvent::LoadedData | MediaEvent::Playing => {
                self.set_loading(false)
            }
            MediaEvent::TimeUpdate | MediaEvent::DurationChange => EngineSignal::Progress,
            MediaEvent::Ended => {
                if self.looping {
                    debug!("Ignoring end of looping source");
                    EngineSignal::None
                } else {
                    EngineSignal::Ended
                }
            }
            MediaEvent::Error(code) => {
                let kind = code.kind();
                warn!(code = code.0, ?kind, track_id = ?self.bound_track_id(), "Source failed to load");
                self.is_loading = false;
                self.is_playing = false;
                self.pending_play = None;
                self.load_error = Some(kind);
                EngineSignal::LoadFailed(kind)
            }
            MediaEvent::PlayResolved { ticket, result } => self.resolve_play(ticket, result),
        }
    }

    fn set_loading(&mut self, loading: bool) -> EngineSignal {
        if self.is_loading == loading {
            return EngineSignal::None;
        }
        self.is_loading = loading;
        EngineSignal::LoadingChanged(loading)
    }

    /// Mirror the repeat-all mode onto the output's loop attribute
    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
        self.output.set_loop(looping);
    }

    /// Whether the output loops the current source
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Seek within the bound source, clamped to `[0, duration]`
    ///
    /// Returns `false` when nothing is bound.
    pub fn seek(&mut self, position: Duration) -> bool {
        if self.bound.is_none() {
            return false;
        }
        let position = match self.duration() {
            Some(duration) => position.min(duration),
            None => position,
        };
        self.output.seek(position);
        true
    }

    /// Seek to a fraction of the duration (clamped to `[0, 1]`)
    ///
    /// No-op while the duration is unknown or zero.
    pub fn seek_to_fraction(&mut self, fraction: f64) -> bool {
        let Some(duration) = self.duration().filter(|d| !d.is_zero()) else {
            return false;
        };
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        self.seek(duration.mul_f64(fraction))
    }

    /// Pause and rewind without unbinding the source
    pub fn stop(&mut self) {
        self.set_playing(false);
        if self.bound.is_some() {
            self.output.seek(Duration::ZERO);
        }
    }

    /// Rebind the current source after a load error and request playback
    ///
    /// Returns `false` if there is no error to recover from or the retry
    /// budget for this track is spent.
    pub fn retry(&mut self) -> bool {
        if !self.can_retry() {
            return false;
        }
        let Some(bound) = self.bound.clone() else {
            return false;
        };

        self.retry_attempts += 1;
        self.generation += 1;
        self.pending_play = None;
        self.load_error = None;
        self.is_loading = true;
        self.output.set_source(Some(&bound.url));
        self.output.set_loop(self.looping);
        info!(track_id = %bound.track_id, attempt = self.retry_attempts, "Retrying load");
        self.set_playing(true);
        true
    }

    /// Whether [`Self::retry`] would do anything
    pub fn can_retry(&self) -> bool {
        self.bound.is_some()
            && self.load_error.is_some()
            && self.retry_attempts < self.max_load_retries
    }

    /// Set the volume level, returning `(level, muted)`
    pub fn set_volume(&mut self, level: f32) -> (f32, bool) {
        self.volume.set_level(level);
        self.output.set_volume(self.volume.level());
        self.output.set_muted(self.volume.is_muted());
        (self.volume.level(), self.volume.is_muted())
    }

    /// Toggle mute, returning the new state
    pub fn toggle_mute(&mut self) -> bool {
        let muted = self.volume.toggle_mute();
        self.output.set_muted(muted);
        muted
    }

    /// Volume controller
    pub fn volume(&self) -> &Volume {
        &self.volume
    }

    /// ID of the bound track
    pub fn bound_track_id(&self) -> Option<&str> {
        self.bound.as_ref().map(|b| b.track_id.as_str())
    }

    /// Play intent
    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Whether the output is buffering
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Classified error of the last failed load, cleared on rebind
    pub fn load_error(&self) -> Option<LoadErrorKind> {
        self.load_error
    }

    /// Playback position, zero when nothing is bound
    pub fn position(&self) -> Duration {
        if self.bound.is_some() {
            self.output.position()
        } else {
            Duration::ZERO
        }
    }

    /// Duration of the bound source, once known
    pub fn duration(&self) -> Option<Duration> {
        self.bound.as_ref().and_then(|_| self.output.duration())
    }

    /// Derived playback state
    pub fn state(&self) -> PlaybackState {
        match (&self.bound, self.is_playing, self.is_loading) {
            (None, _, _) => PlaybackState::Stopped,
            (Some(_), true, true) => PlaybackState::Loading,
            (Some(_), true, false) => PlaybackState::Playing,
            (Some(_), false, _) => PlaybackState::Paused,
        }
    }

    /// Source generation, bumped on every rebind
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The driven output
    pub fn output(&self) -> &O {
        &self.output
    }
}
