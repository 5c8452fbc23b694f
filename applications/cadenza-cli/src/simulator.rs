//! Simulated media player
//!
//! Stands in for a platform audio element. [`SimulatedOutput`] is the
//! handle the session drives; [`SimulatedPlatform`] is the platform side
//! that advances the clock and raises media events.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use cadenza_core::Track;
use cadenza_playback::{MediaErrorCode, MediaEvent, MediaOutput, PlayAttempt, PlayRejection};
use tracing::trace;

/// Sources whose URL contains this marker fail to load
pub const FAILING_SOURCE_MARKER: &str = "broken";

const FALLBACK_DURATION: Duration = Duration::from_secs(180);

#[derive(Debug, Default)]
struct PlayerState {
    source: Option<String>,
    paused: bool,
    loading: bool,
    position: Duration,
    duration: Option<Duration>,
    looping: bool,
    volume: f32,
    muted: bool,
    durations: HashMap<String, Duration>,
    pending: Vec<MediaEvent>,
}

/// Create a connected output/platform pair for `tracks`
pub fn pair(tracks: &[Track]) -> (SimulatedOutput, SimulatedPlatform) {
    let durations = tracks
        .iter()
        .filter_map(|t| {
            let duration = Duration::try_from_secs_f64(t.duration)
                .ok()
                .filter(|d| !d.is_zero())?;
            t.audio.clone().map(|url| (url, duration))
        })
        .collect();

    let state = Rc::new(RefCell::new(PlayerState {
        paused: true,
        volume: 1.0,
        durations,
        ..PlayerState::default()
    }));

    (
        SimulatedOutput {
            state: Rc::clone(&state),
        },
        SimulatedPlatform { state },
    )
}

/// Media handle driven by the session
pub struct SimulatedOutput {
    state: Rc<RefCell<PlayerState>>,
}

impl MediaOutput for SimulatedOutput {
    fn set_source(&mut self, url: Option<&str>) {
        let mut state = self.state.borrow_mut();
        state.source = url.map(String::from);
        state.paused = true;
        state.position = Duration::ZERO;
        state.duration = None;
        state.loading = url.is_some();
        if url.is_some() {
            state.pending.push(MediaEvent::LoadStart);
        }
    }

    fn play(&mut self) -> PlayAttempt {
        let mut state = self.state.borrow_mut();
        if state.source.is_none() {
            return PlayAttempt::Rejected(PlayRejection::new("no source"));
        }
        state.paused = false;
        PlayAttempt::Started
    }

    fn pause(&mut self) {
        self.state.borrow_mut().paused = true;
    }

    fn is_paused(&self) -> bool {
        self.state.borrow().paused
    }

    fn seek(&mut self, position: Duration) {
        let mut state = self.state.borrow_mut();
        state.position = match state.duration {
            Some(duration) => position.min(duration),
            None => position,
        };
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

/// Platform side of the simulated player
pub struct SimulatedPlatform {
    state: Rc<RefCell<PlayerState>>,
}

impl SimulatedPlatform {
    /// Advance the clock by `elapsed`, returning the media events raised
    pub fn advance(&self, elapsed: Duration) -> Vec<MediaEvent> {
        let mut state = self.state.borrow_mut();
        let mut events = std::mem::take(&mut state.pending);

        let Some(source) = state.source.clone() else {
            return events;
        };

        if state.loading {
            state.loading = false;
            if source.contains(FAILING_SOURCE_MARKER) {
                events.push(MediaEvent::Error(MediaErrorCode::NETWORK));
                state.paused = true;
                return events;
            }
            state.duration = Some(
                state
                    .durations
                    .get(&source)
                    .copied()
                    .unwrap_or(FALLBACK_DURATION),
            );
            events.extend([
                MediaEvent::DurationChange,
                MediaEvent::LoadedData,
                MediaEvent::CanPlay,
            ]);
            return events;
        }

        if state.paused {
            return events;
        }

        let duration = state.duration.unwrap_or(FALLBACK_DURATION);
        state.position += elapsed;
        events.push(MediaEvent::TimeUpdate);

        if state.position >= duration {
            if state.looping {
                trace!("Looping source");
                state.position = Duration::ZERO;
            } else {
                state.position = duration;
                state.paused = true;
                events.push(MediaEvent::Ended);
            }
        }
        events
    }

    /// Effective output gain (0.0 when muted)
    pub fn gain(&self) -> f32 {
        let state = self.state.borrow();
        if state.muted {
            0.0
        } else {
            state.volume
        }
    }
}
