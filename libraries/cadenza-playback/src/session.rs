//! Audio session
//!
//! The single entry point consumers use. Ties together the queue, repeat
//! state, playback engine and now-playing publisher, and keeps them in
//! sync after every operation.
//!
//! Operations never fail: impossible requests are no-ops, and load or
//! autoplay failures show up as session state (`is_playing`, `load_error`)
//! and [`PlaybackEvent`]s.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use cadenza_core::Track;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::engine::{EngineSignal, PlaybackEngine};
use crate::events::PlaybackEvent;
use crate::navigation::{self, Step};
use crate::now_playing::{NowPlaying, NowPlayingSurface, PlaybackStatus, PositionState, RemoteCommand};
use crate::output::{MediaEvent, MediaOutput};
use crate::policy::{self, EndAction};
use crate::queue::QueueStore;
use crate::repeat::RepeatState;
use crate::types::{LoadErrorKind, PlaybackConfig, PlaybackState, RepeatMode};

/// Shared handle for hosts that hand the session to several UI callbacks
pub type SharedSession<O> = Rc<RefCell<AudioSession<O>>>;

/// Serializable view of the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// Current track
    pub current_track: Option<Track>,
    /// Live queue order
    pub queue: Vec<Track>,
    /// Selected queue index
    pub current_index: Option<usize>,
    /// Derived playback state
    pub state: PlaybackState,
    /// Play intent
    pub is_playing: bool,
    /// Buffering indicator
    pub is_loading: bool,
    /// Last load failure
    pub load_error: Option<LoadErrorKind>,
    /// Repeat mode
    pub repeat_mode: RepeatMode,
    /// Shuffle flag
    pub is_shuffled: bool,
    /// Volume level (0.0 - 1.0)
    pub volume: f32,
    /// Mute flag
    pub is_muted: bool,
    /// Position in seconds
    pub current_time: f64,
    /// Duration in seconds (zero while unknown)
    pub duration: f64,
}

/// Audio session facade
pub struct AudioSession<O: MediaOutput> {
    queue: QueueStore,
    repeat: RepeatState,
    engine: PlaybackEngine<O>,
    now_playing: NowPlaying,
    restart_threshold: Duration,
    current_track_id: Option<String>,
    last_state: PlaybackState,
    pending_events: Vec<PlaybackEvent>,
}

impl<O: MediaOutput> AudioSession<O> {
    /// Create a session without a now-playing surface
    pub fn new(output: O, config: PlaybackConfig) -> Self {
        Self::build(output, None, config)
    }

    /// Create a session publishing to `surface`
    pub fn with_surface(
        output: O,
        surface: Box<dyn NowPlayingSurface>,
        config: PlaybackConfig,
    ) -> Self {
        Self::build(output, Some(surface), config)
    }

    fn build(
        output: O,
        surface: Option<Box<dyn NowPlayingSurface>>,
        config: PlaybackConfig,
    ) -> Self {
        let mut engine = PlaybackEngine::new(output, &config);
        let repeat = RepeatState::new(config.repeat);
        engine.set_looping(repeat.loops_natively());

        let now_playing = NowPlaying::new(
            surface,
            config.position_interval,
            config.artwork_sizes.clone(),
        );

        info!(repeat = ?config.repeat, volume = config.volume, "Audio session created");
        Self {
            queue: QueueStore::new(),
            repeat,
            engine,
            now_playing,
            restart_threshold: config.restart_threshold,
            current_track_id: None,
            last_state: PlaybackState::Stopped,
            pending_events: Vec::new(),
        }
    }

    /// Wrap into a [`SharedSession`]
    pub fn into_shared(self) -> SharedSession<O> {
        Rc::new(RefCell::new(self))
    }

    // ===== Playback =====

    /// Play `track`
    ///
    /// With `track_list`, the queue is replaced by that list (the track is
    /// appended if missing). Without it, the track is selected in the queue,
    /// or appended first. Playing the current track again resumes it.
    /// Unplayable tracks are refused and return `false`.
    pub fn play_track(&mut self, track: &Track, track_list: Option<&[Track]>) -> bool {
        if !track.is_playable() {
            debug!(track_id = %track.track_id, "Refusing to play track without audio");
            return false;
        }

        match track_list {
            Some(list) => {
                let was_shuffled = self.queue.is_shuffled();
                self.queue.initialize(list.to_vec(), Some(&track.track_id));
                if was_shuffled {
                    self.pending_events.push(PlaybackEvent::ShuffleChanged { enabled: false });
                }
                if self.queue.current_index().is_none() {
                    self.queue.add(track.clone());
                    if let Some(index) = self.queue.position_of(&track.track_id) {
                        self.queue.select(index);
                    }
                }
            }
            None => {
                if self.current_track_id.as_deref() == Some(track.track_id.as_str()) {
                    self.resume_track();
                    return true;
                }
                if !self.queue.contains(&track.track_id) {
                    self.queue.add(track.clone());
                }
                if let Some(index) = self.queue.position_of(&track.track_id) {
                    self.queue.select(index);
                }
            }
        }

        self.emit_queue_changed();
        self.load_current(true, false);
        self.sync();
        true
    }

    /// Play the queue entry at `index`
    pub fn play_at_index(&mut self, index: usize) -> bool {
        match self.queue.get(index) {
            Some(track) if track.is_playable() => {}
            _ => return false,
        }
        self.queue.select(index);
        self.emit_queue_changed();
        self.load_current(true, true);
        self.sync();
        true
    }

    /// Pause playback
    pub fn pause_track(&mut self) {
        self.engine.set_playing(false);
        self.sync();
    }

    /// Resume playback, loading the selected track if nothing is bound
    pub fn resume_track(&mut self) {
        if self.engine.bound_track_id().is_some() {
            self.engine.set_playing(true);
        } else {
            self.load_current(true, false);
        }
        self.sync();
    }

    /// Toggle between playing and paused
    pub fn toggle_play(&mut self) {
        if self.engine.is_playing() {
            self.pause_track();
        } else {
            self.resume_track();
        }
    }

    /// Pause and rewind the current track, keeping it selected
    pub fn stop_track(&mut self) {
        self.engine.stop();
        self.sync();
    }

    /// Skip to the next track
    ///
    /// Stops if the queue has nothing playable.
    pub fn next_track(&mut self) {
        self.repeat.clear_repeated();
        match navigation::next_step(&self.queue) {
            Step::Select(index) => {
                self.queue.select(index);
                self.emit_queue_changed();
                self.load_current(true, true);
            }
            Step::Restart => self.restart_current(),
            Step::Stop => {
                debug!("Nothing to advance to");
                self.engine.set_playing(false);
            }
        }
        self.sync();
    }

    /// Go to the previous track, or restart the current one if playback
    /// is past the restart threshold
    pub fn previous_track(&mut self) {
        let step = navigation::previous_step(
            &self.queue,
            self.engine.position(),
            self.restart_threshold,
        );
        match step {
            Step::Select(index) => {
                self.repeat.clear_repeated();
                self.queue.select(index);
                self.emit_queue_changed();
                self.load_current(true, true);
            }
            Step::Restart => self.restart_current(),
            Step::Stop => self.engine.set_playing(false),
        }
        self.sync();
    }

    /// Seek to an absolute position (clamped to the duration)
    pub fn seek(&mut self, position: Duration) {
        self.engine.seek(position);
        self.publish_position_now();
    }

    /// Seek to a percentage of the duration (clamped to `[0, 100]`)
    ///
    /// No-op while the duration is unknown.
    pub fn seek_to_percent(&mut self, percent: f64) {
        self.engine.seek_to_fraction(percent / 100.0);
        self.publish_position_now();
    }

    /// Retry loading the current track after a load error
    pub fn retry_load(&mut self) -> bool {
        let retried = self.engine.retry();
        self.sync();
        retried
    }

    /// Whether [`Self::retry_load`] would do anything
    pub fn can_retry(&self) -> bool {
        self.engine.can_retry()
    }

    // ===== Modes =====

    /// Cycle repeat mode `Off -> All -> One -> Off`
    pub fn toggle_repeat(&mut self) -> RepeatMode {
        let mode = self.repeat.toggle();
        self.engine.set_looping(self.repeat.loops_natively());
        info!(?mode, "Repeat mode changed");
        self.pending_events.push(PlaybackEvent::RepeatModeChanged { mode });
        mode
    }

    /// Toggle shuffle, returning the new state
    pub fn toggle_shuffle(&mut self) -> bool {
        let enabled = self.queue.toggle_shuffle();
        self.pending_events.push(PlaybackEvent::ShuffleChanged { enabled });
        self.emit_queue_changed();
        enabled
    }

    /// Set volume (clamped to `[0, 1]`); any positive level unmutes
    pub fn update_volume(&mut self, level: f32) {
        let (level, is_muted) = self.engine.set_volume(level);
        self.pending_events.push(PlaybackEvent::VolumeChanged { level, is_muted });
    }

    /// Toggle mute, keeping the volume level
    pub fn toggle_mute(&mut self) -> bool {
        let is_muted = self.engine.toggle_mute();
        self.pending_events.push(PlaybackEvent::VolumeChanged {
            level: self.engine.volume().level(),
            is_muted,
        });
        is_muted
    }

    // ===== Queue =====

    /// Append a track to the queue (no-op for duplicates)
    ///
    /// Adding to an empty queue selects the track without playing it.
    pub fn add_to_queue(&mut self, track: Track) -> bool {
        let was_empty = self.queue.is_empty();
        if !self.queue.add(track) {
            return false;
        }
        self.emit_queue_changed();
        if was_empty {
            self.load_current(false, false);
            self.sync();
        }
        true
    }

    /// Remove the queue entry at `index`
    pub fn remove_from_queue(&mut self, index: usize) -> Option<Track> {
        let removed = self.queue.remove(index)?;
        self.emit_queue_changed();

        let still_current = self.current_track_id.as_deref()
            == self.queue.current().map(|t| t.track_id.as_str());
        if !still_current {
            if let Some(index) = navigation::playable_from_current(&self.queue) {
                if Some(index) != self.queue.current_index() {
                    self.queue.select(index);
                    self.emit_queue_changed();
                }
            }
            let playing = self.engine.is_playing();
            self.load_current(playing, false);
        }
        self.sync();
        Some(removed)
    }

    /// Move a queue entry; the current track stays selected
    pub fn move_track(&mut self, from: usize, to: usize) -> bool {
        let moved = self.queue.move_track(from, to);
        if moved {
            self.emit_queue_changed();
        }
        moved
    }

    /// Empty the queue and stop playback
    pub fn clear_queue(&mut self) {
        self.queue.clear();
        self.emit_queue_changed();
        self.load_current(false, false);
        self.sync();
    }

    // ===== Platform =====

    /// Feed a notification from the media output
    pub fn handle_media_event(&mut self, event: MediaEvent) {
        trace!(?event, "Media event");
        match self.engine.handle_event(event) {
            EngineSignal::None | EngineSignal::Progress | EngineSignal::PlayRejected => {}
            EngineSignal::LoadingChanged(is_loading) => {
                self.pending_events.push(PlaybackEvent::LoadingChanged { is_loading });
            }
            EngineSignal::LoadFailed(kind) => {
                if let Some(track_id) = self.current_track_id.clone() {
                    self.pending_events.push(PlaybackEvent::LoadFailed { track_id, kind });
                }
                self.pending_events.push(PlaybackEvent::LoadingChanged { is_loading: false });
            }
            EngineSignal::Ended => self.on_track_ended(),
        }
        self.sync();
    }

    fn on_track_ended(&mut self) {
        if let Some(track_id) = self.current_track_id.clone() {
            self.pending_events.push(PlaybackEvent::TrackEnded { track_id });
        }

        match policy::on_track_ended(&mut self.repeat) {
            EndAction::ReplayCurrent => self.restart_current(),
            EndAction::Advance => self.next_track(),
            EndAction::Ignore => {}
        }
    }

    /// Drive periodic work: apply queued remote commands and publish the
    /// playback position on its cadence
    pub fn tick(&mut self, now: Instant) {
        while let Some(command) = self.now_playing.poll_command() {
            self.apply_remote(command);
        }
        let position = self.position_state();
        self.now_playing.tick(now, position);
    }

    /// Apply a transport command from the now-playing surface
    pub fn apply_remote(&mut self, command: RemoteCommand) {
        debug!(?command, "Remote command");
        match command {
            RemoteCommand::Play => self.resume_track(),
            RemoteCommand::Pause => self.pause_track(),
            RemoteCommand::Toggle => self.toggle_play(),
            RemoteCommand::Stop => self.stop_track(),
            RemoteCommand::Next => self.next_track(),
            RemoteCommand::Previous => self.previous_track(),
            RemoteCommand::SeekTo(position) => self.seek(position),
        }
    }

    /// Sender for injecting remote commands (applied on the next tick)
    pub fn remote_commands(&self) -> std::sync::mpsc::Sender<RemoteCommand> {
        self.now_playing.command_sender()
    }

    /// Drain events accumulated since the last call
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // ===== Queries =====

    /// Track at the current queue index
    ///
    /// May be unplayable, in which case nothing is bound to the output.
    pub fn current_track(&self) -> Option<&Track> {
        self.queue.current()
    }

    /// Whether `track_id` is the current track and playing
    pub fn is_track_playing(&self, track_id: &str) -> bool {
        self.engine.is_playing() && self.current_track_id.as_deref() == Some(track_id)
    }

    /// Play intent
    pub fn is_playing(&self) -> bool {
        self.engine.is_playing()
    }

    /// Derived playback state
    pub fn state(&self) -> PlaybackState {
        self.engine.state()
    }

    /// Buffering indicator
    pub fn is_loading(&self) -> bool {
        self.engine.is_loading()
    }

    /// Last load failure for the current track
    pub fn load_error(&self) -> Option<LoadErrorKind> {
        self.engine.load_error()
    }

    /// Repeat mode
    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat.mode()
    }

    /// Whether repeat-one already replayed the current track
    pub fn has_repeated_once(&self) -> bool {
        self.repeat.has_repeated_once()
    }

    /// Shuffle flag
    pub fn is_shuffled(&self) -> bool {
        self.queue.is_shuffled()
    }

    /// Volume level (0.0 - 1.0)
    pub fn volume(&self) -> f32 {
        self.engine.volume().level()
    }

    /// Mute flag
    pub fn is_muted(&self) -> bool {
        self.engine.volume().is_muted()
    }

    /// Playback position
    pub fn current_time(&self) -> Duration {
        self.engine.position()
    }

    /// Duration of the current source (zero while unknown)
    pub fn duration(&self) -> Duration {
        self.engine.duration().unwrap_or_default()
    }

    /// Live queue order
    pub fn queue(&self) -> &[Track] {
        self.queue.tracks()
    }

    /// Selected queue index
    pub fn current_index(&self) -> Option<usize> {
        self.queue.current_index()
    }

    /// The driven media output
    pub fn output(&self) -> &O {
        self.engine.output()
    }

    /// Serializable view of the session
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            current_track: self.current_track().cloned(),
            queue: self.queue.tracks().to_vec(),
            current_index: self.queue.current_index(),
            state: self.state(),
            is_playing: self.is_playing(),
            is_loading: self.is_loading(),
            load_error: self.load_error(),
            repeat_mode: self.repeat_mode(),
            is_shuffled: self.is_shuffled(),
            volume: self.volume(),
            is_muted: self.is_muted(),
            current_time: self.current_time().as_secs_f64(),
            duration: self.duration().as_secs_f64(),
        }
    }

    /// Release the now-playing surface
    pub fn shutdown(&mut self) {
        self.now_playing.teardown();
    }

    // ===== Internals =====

    /// Bind the selected track and apply the play intent
    ///
    /// `restart_same` rewinds when the selection did not change the bound
    /// track, so explicit navigation onto the current track replays it.
    fn load_current(&mut self, play: bool, restart_same: bool) {
        let selected = self.queue.current().cloned();
        let track = selected.clone().filter(Track::is_playable);
        let changed = self.engine.bind(track.as_ref());

        let track_id = selected.map(|t| t.track_id);
        if track_id != self.current_track_id {
            let previous_track_id = std::mem::replace(&mut self.current_track_id, track_id.clone());
            self.repeat.clear_repeated();
            self.now_playing.track_changed(track.as_ref());
            info!(track_id = ?track_id, "Track changed");
            self.pending_events.push(PlaybackEvent::TrackChanged {
                track_id,
                previous_track_id,
            });
        } else if !changed && restart_same && track.is_some() {
            self.engine.seek(Duration::ZERO);
        }

        if track.is_some() {
            self.engine.set_playing(play);
        }
    }

    fn restart_current(&mut self) {
        if self.engine.bound_track_id().is_none() {
            return;
        }
        self.engine.seek(Duration::ZERO);
        self.engine.set_playing(true);
    }

    fn position_state(&self) -> PositionState {
        PositionState {
            position: self.engine.position(),
            duration: self.duration(),
            playback_rate: 1.0,
        }
    }

    fn publish_position_now(&mut self) {
        let position = self.position_state();
        self.now_playing.position_changed(position);
    }

    fn emit_queue_changed(&mut self) {
        self.pending_events.push(PlaybackEvent::QueueChanged {
            length: self.queue.len(),
            current_index: self.queue.current_index(),
        });
    }

    /// Emit a state change if the derived state moved, and mirror it to
    /// the now-playing surface
    fn sync(&mut self) {
        let state = self.engine.state();
        if state != self.last_state {
            debug!(from = ?self.last_state, to = ?state, "Playback state changed");
            self.last_state = state;
            self.pending_events.push(PlaybackEvent::StateChanged { state });
        }
        let position = self.position_state();
        self.now_playing.status_changed(status_for(state), position);
    }
}

fn status_for(state: PlaybackState) -> PlaybackStatus {
    match state {
        PlaybackState::Stopped => PlaybackStatus::Stopped,
        PlaybackState::Playing | PlaybackState::Loading => PlaybackStatus::Playing,
        PlaybackState::Paused => PlaybackStatus::Paused,
    }
}

impl<O: MediaOutput> std::fmt::Debug for AudioSession<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioSession")
            .field("current_track_id", &self.current_track_id)
            .field("state", &self.engine.state())
            .field("queue_len", &self.queue.len())
            .field("repeat", &self.repeat.mode())
            .field("shuffled", &self.queue.is_shuffled())
            .field("now_playing", &self.now_playing)
            .finish_non_exhaustive()
    }
}
