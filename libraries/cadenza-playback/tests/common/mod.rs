//! Shared fixtures: a scriptable media output and a recording now-playing
//! surface. Both expose their state through shared handles so tests can
//! inspect and drive them after handing them to a session.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc::Sender;
use std::time::Duration;

use cadenza_core::Track;
use cadenza_playback::{
    AudioSession, MediaEvent, MediaOutput, NowPlayingError, NowPlayingMetadata,
    NowPlayingSurface, PlayAttempt, PlayRejection, PlayTicket, PlaybackConfig, PlaybackStatus,
    PositionState, RemoteCommand, TransportAction,
};

// ===== Media output =====

/// How the fake answers `play()`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayMode {
    #[default]
    Immediate,
    Deferred,
    Refuse,
}

#[derive(Debug, Default)]
pub struct OutputState {
    pub source: Option<String>,
    pub sources_set: Vec<Option<String>>,
    pub paused: bool,
    pub position: Duration,
    pub duration: Option<Duration>,
    pub looping: bool,
    pub volume: f32,
    pub muted: bool,
    pub play_calls: usize,
    pub play_mode: PlayMode,
    pub next_ticket: u64,
    pub last_ticket: Option<PlayTicket>,
}

pub type OutputHandle = Rc<RefCell<OutputState>>;

pub struct FakeOutput {
    state: OutputHandle,
}

impl FakeOutput {
    pub fn new() -> (Self, OutputHandle) {
        let state = Rc::new(RefCell::new(OutputState {
            paused: true,
            duration: Some(Duration::from_secs(180)),
            ..OutputState::default()
        }));
        (
            Self {
                state: Rc::clone(&state),
            },
            state,
        )
    }
}

impl MediaOutput for FakeOutput {
    fn set_source(&mut self, url: Option<&str>) {
        let mut state = self.state.borrow_mut();
        state.source = url.map(String::from);
        let source = state.source.clone();
        state.sources_set.push(source);
        state.paused = true;
        state.position = Duration::ZERO;
    }

    fn play(&mut self) -> PlayAttempt {
        let mut state = self.state.borrow_mut();
        state.play_calls += 1;
        match state.play_mode {
            PlayMode::Immediate => {
                state.paused = false;
                PlayAttempt::Started
            }
            PlayMode::Deferred => {
                state.paused = false;
                state.next_ticket += 1;
                let ticket = PlayTicket(state.next_ticket);
                state.last_ticket = Some(ticket);
                PlayAttempt::Pending(ticket)
            }
            PlayMode::Refuse => {
                PlayAttempt::Rejected(PlayRejection::new("NotAllowedError"))
            }
        }
    }

    fn pause(&mut self) {
        self.state.borrow_mut().paused = true;
    }

    fn is_paused(&self) -> bool {
        self.state.borrow().paused
    }

    fn seek(&mut self, position: Duration) {
        self.state.borrow_mut().position = position;
    }

    fn position(&self) -> Duration {
        self.state.borrow().position
    }

    fn duration(&self) -> Option<Duration> {
        self.state.borrow().duration
    }

    fn set_volume(&mut self, volume: f32) {
        self.state.borrow_mut().volume = volume;
    }

    fn set_muted(&mut self, muted: bool) {
        self.state.borrow_mut().muted = muted;
    }

    fn set_loop(&mut self, looping: bool) {
        self.state.borrow_mut().looping = looping;
    }
}

/// Play the bound source to its end the way a platform player would
///
/// A looping output rewinds silently; otherwise it pauses at the end and
/// reports [`MediaEvent::Ended`], which is returned for the test to feed.
pub fn play_to_end(output: &OutputHandle) -> Option<MediaEvent> {
    let mut state = output.borrow_mut();
    if state.looping {
        state.position = Duration::ZERO;
        return None;
    }
    state.position = state.duration.unwrap_or_default();
    state.paused = true;
    Some(MediaEvent::Ended)
}

/// Drive the session through a natural track end
pub fn finish_track(session: &mut AudioSession<FakeOutput>, output: &OutputHandle) {
    if let Some(event) = play_to_end(output) {
        session.handle_media_event(event);
    }
}

// ===== Now-playing surface =====

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    Metadata(String),
    Status(PlaybackStatus),
    Position(Duration),
    Register(usize),
    Clear,
}

#[derive(Default)]
pub struct SurfaceState {
    pub calls: Vec<SurfaceCall>,
    pub commands: Option<Sender<RemoteCommand>>,
    pub fail: bool,
}

pub type SurfaceHandle = Rc<RefCell<SurfaceState>>;

pub struct RecordingSurface {
    state: SurfaceHandle,
}

impl RecordingSurface {
    pub fn new() -> (Box<dyn NowPlayingSurface>, SurfaceHandle) {
        let state: SurfaceHandle = Rc::default();
        (
            Box::new(Self {
                state: Rc::clone(&state),
            }),
            state,
        )
    }

    fn record(&self, call: SurfaceCall) -> Result<(), NowPlayingError> {
        let mut state = self.state.borrow_mut();
        state.calls.push(call);
        if state.fail {
            return Err(NowPlayingError::Platform("surface offline".into()));
        }
        Ok(())
    }
}

impl NowPlayingSurface for RecordingSurface {
    fn set_metadata(&mut self, metadata: &NowPlayingMetadata) -> Result<(), NowPlayingError> {
        self.record(SurfaceCall::Metadata(metadata.title.clone()))
    }

    fn set_playback_status(&mut self, status: PlaybackStatus) -> Result<(), NowPlayingError> {
        self.record(SurfaceCall::Status(status))
    }

    fn set_position(&mut self, state: &PositionState) -> Result<(), NowPlayingError> {
        self.record(SurfaceCall::Position(state.position))
    }

    fn register_actions(
        &mut self,
        actions: &[TransportAction],
        commands: Sender<RemoteCommand>,
    ) -> Result<(), NowPlayingError> {
        self.state.borrow_mut().commands = Some(commands);
        self.record(SurfaceCall::Register(actions.len()))
    }

    fn clear(&mut self) -> Result<(), NowPlayingError> {
        self.state.borrow_mut().commands = None;
        self.record(SurfaceCall::Clear)
    }
}

pub fn count_calls(surface: &SurfaceHandle, predicate: impl Fn(&SurfaceCall) -> bool) -> usize {
    surface.borrow().calls.iter().filter(|c| predicate(c)).count()
}

// ===== Tracks and sessions =====

pub fn track(id: &str) -> Track {
    Track::new(id)
        .with_title(format!("Title {id}"))
        .with_artist("Artist")
        .with_audio(format!("https://cdn.example/{id}.mp3"))
        .with_duration(180.0)
}

pub fn tracks(ids: &[&str]) -> Vec<Track> {
    ids.iter().map(|id| track(id)).collect()
}

pub fn session() -> (AudioSession<FakeOutput>, OutputHandle) {
    let (output, handle) = FakeOutput::new();
    (AudioSession::new(output, PlaybackConfig::default()), handle)
}

pub fn session_with_surface() -> (AudioSession<FakeOutput>, OutputHandle, SurfaceHandle) {
    let (output, handle) = FakeOutput::new();
    let (surface, surface_handle) = RecordingSurface::new();
    (
        AudioSession::with_surface(output, surface, PlaybackConfig::default()),
        handle,
        surface_handle,
    )
}

pub fn current_id(session: &AudioSession<FakeOutput>) -> Option<String> {
    session.current_track().map(|t| t.track_id.clone())
}
