//! Property-based tests for the queue and audio session
//!
//! Uses proptest to verify invariants across random operation sequences.

mod common;

use std::collections::HashSet;
use std::time::Duration;

use cadenza_core::Track;
use cadenza_playback::{MediaErrorCode, MediaEvent, QueueStore, RepeatMode};
use common::*;
use proptest::prelude::*;

// ===== Helpers =====

fn arbitrary_track() -> impl Strategy<Value = Track> {
    ("[a-z0-9]{1,6}", "[A-Za-z ]{1,20}", any::<bool>()).prop_map(|(id, title, playable)| {
        let track = Track::new(id.clone()).with_title(title).with_duration(120.0);
        if playable {
            track.with_audio(format!("https://cdn.example/{id}.mp3"))
        } else {
            track
        }
    })
}

fn arbitrary_tracks() -> impl Strategy<Value = Vec<Track>> {
    prop::collection::vec(arbitrary_track(), 0..30)
}

#[derive(Debug, Clone)]
enum Op {
    PlayAt(usize),
    Add(Track),
    Remove(usize),
    Move(usize, usize),
    Next,
    Previous,
    Pause,
    Resume,
    Stop,
    Shuffle,
    Repeat,
    Volume(f32),
    Mute,
    Seek(u64),
    End,
    Fail,
    Retry,
    Clear,
}

fn arbitrary_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..20).prop_map(Op::PlayAt),
        arbitrary_track().prop_map(Op::Add),
        (0usize..20).prop_map(Op::Remove),
        (0usize..20, 0usize..20).prop_map(|(a, b)| Op::Move(a, b)),
        Just(Op::Next),
        Just(Op::Previous),
        Just(Op::Pause),
        Just(Op::Resume),
        Just(Op::Stop),
        Just(Op::Shuffle),
        Just(Op::Repeat),
        (-2.0f32..3.0).prop_map(Op::Volume),
        Just(Op::Mute),
        (0u64..400).prop_map(Op::Seek),
        Just(Op::End),
        Just(Op::Fail),
        Just(Op::Retry),
        Just(Op::Clear),
    ]
}

fn ids(queue: &[Track]) -> Vec<String> {
    queue.iter().map(|t| t.track_id.clone()).collect()
}

// ===== Queue properties =====

proptest! {
    /// Property: The queue never holds two tracks with the same ID
    #[test]
    fn queue_ids_stay_unique(initial in arbitrary_tracks(), extra in arbitrary_tracks()) {
        let mut queue = QueueStore::new();
        queue.initialize(initial, None);
        for track in extra {
            queue.add(track);
        }

        let unique: HashSet<&str> = queue.tracks().iter().map(|t| t.track_id.as_str()).collect();
        prop_assert_eq!(unique.len(), queue.len());
    }

    /// Property: Shuffle on then off restores order and current track
    #[test]
    fn shuffle_round_trip(tracks in arbitrary_tracks(), pick in 0usize..30) {
        let mut queue = QueueStore::new();
        queue.initialize(tracks, None);
        if !queue.is_empty() {
            queue.select(pick % queue.len());
        }
        let order = ids(queue.tracks());
        let current = queue.current().map(|t| t.track_id.clone());

        queue.toggle_shuffle();
        prop_assert_eq!(queue.current().map(|t| t.track_id.clone()), current.clone());
        queue.toggle_shuffle();

        prop_assert_eq!(ids(queue.tracks()), order);
        prop_assert_eq!(queue.current().map(|t| t.track_id.clone()), current);
    }

    /// Property: Unshuffled next from the last entry wraps to 0
    #[test]
    fn next_wraps_from_last(tracks in arbitrary_tracks()) {
        let mut queue = QueueStore::new();
        queue.initialize(tracks, None);
        prop_assume!(!queue.is_empty());

        queue.select(queue.len() - 1);
        prop_assert_eq!(queue.next_index(), Some(0));
    }

    /// Property: Removal keeps the selection in range and on the same
    /// track whenever that track survives
    #[test]
    fn removal_keeps_selection_valid(tracks in arbitrary_tracks(), pick in 0usize..30, remove in 0usize..30) {
        let mut queue = QueueStore::new();
        queue.initialize(tracks, None);
        prop_assume!(!queue.is_empty());
        queue.select(pick % queue.len());
        let current = queue.current().map(|t| t.track_id.clone());

        let removed = queue.remove(remove);

        if let Some(index) = queue.current_index() {
            prop_assert!(index < queue.len());
        } else {
            prop_assert!(queue.is_empty());
        }
        match removed {
            Some(track) if Some(&track.track_id) != current.as_ref() => {
                prop_assert_eq!(queue.current().map(|t| t.track_id.clone()), current);
            }
            None => prop_assert_eq!(queue.current().map(|t| t.track_id.clone()), current),
            Some(_) => {}
        }
    }
}

// ===== Session properties =====

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Property: Session invariants hold after any operation sequence
    #[test]
    fn session_invariants_hold(initial in arbitrary_tracks(), ops in prop::collection::vec(arbitrary_op(), 1..60)) {
        let (mut session, output) = session();
        if let Some(first) = initial.iter().find(|t| t.is_playable()).cloned() {
            session.play_track(&first, Some(&initial));
        }

        for op in ops {
            match op {
                Op::PlayAt(i) => { session.play_at_index(i); }
                Op::Add(track) => { session.add_to_queue(track); }
                Op::Remove(i) => { session.remove_from_queue(i); }
                Op::Move(a, b) => { session.move_track(a, b); }
                Op::Next => session.next_track(),
                Op::Previous => session.previous_track(),
                Op::Pause => session.pause_track(),
                Op::Resume => session.resume_track(),
                Op::Stop => session.stop_track(),
                Op::Shuffle => { session.toggle_shuffle(); }
                Op::Repeat => { session.toggle_repeat(); }
                Op::Volume(v) => session.update_volume(v),
                Op::Mute => { session.toggle_mute(); }
                Op::Seek(s) => session.seek(Duration::from_secs(s)),
                Op::End => finish_track(&mut session, &output),
                Op::Fail => session.handle_media_event(MediaEvent::Error(MediaErrorCode::NETWORK)),
                Op::Retry => { session.retry_load(); }
                Op::Clear => session.clear_queue(),
            }

            let unique: HashSet<String> = session.queue().iter().map(|t| t.track_id.clone()).collect();
            prop_assert_eq!(unique.len(), session.queue().len());

            if let Some(index) = session.current_index() {
                prop_assert!(index < session.queue().len());
            }

            prop_assert!((0.0..=1.0).contains(&session.volume()));

            let state = output.borrow();
            prop_assert_eq!(state.looping, session.repeat_mode() == RepeatMode::All);

            prop_assert_eq!(
                session.current_track(),
                session.current_index().and_then(|i| session.queue().get(i))
            );
            match session.current_track().filter(|t| t.is_playable()) {
                Some(track) => {
                    prop_assert_eq!(state.source.as_deref(), track.audio.as_deref());
                }
                None => {
                    prop_assert!(!session.is_playing());
                    prop_assert_eq!(state.source.as_deref(), None);
                }
            }

            if session.is_playing() {
                prop_assert!(!state.paused);
            }
        }
    }

    /// Property: Positive volume always clears mute
    #[test]
    fn positive_volume_unmutes(start_muted in any::<bool>(), level in 0.0001f32..5.0) {
        let (mut session, _output) = session();
        if start_muted {
            session.toggle_mute();
        }
        session.update_volume(level);
        prop_assert!(!session.is_muted());
        prop_assert!(session.volume() > 0.0 && session.volume() <= 1.0);
    }
}
