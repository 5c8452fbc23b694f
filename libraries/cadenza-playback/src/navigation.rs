//! Next / previous navigation
//!
//! Pure decisions over the queue; the session applies them.

use std::time::Duration;

use tracing::trace;

use crate::queue::QueueStore;

/// Outcome of a navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Select the entry at this index
    Select(usize),
    /// Rewind the current track to the start
    Restart,
    /// Nothing to move to; stop playing
    Stop,
}

/// Decide the "next" step
///
/// Skips entries without a playable source, giving up after one pass over
/// the queue.
pub fn next_step(queue: &QueueStore) -> Step {
    let Some(mut index) = queue.next_index() else {
        return Step::Stop;
    };

    if queue.is_shuffled() {
        return first_playable_random(queue, index);
    }

    for _ in 0..queue.len() {
        if is_playable(queue, index) {
            return Step::Select(index);
        }
        trace!(index, "Skipping unplayable entry");
        index = (index + 1) % queue.len();
    }
    Step::Stop
}

/// Decide the "previous" step
///
/// Past `threshold` into the track, restart it instead of moving back.
/// An empty queue also restarts.
pub fn previous_step(queue: &QueueStore, position: Duration, threshold: Duration) -> Step {
    if position > threshold {
        return Step::Restart;
    }

    let Some(mut index) = queue.previous_index() else {
        return Step::Restart;
    };

    if queue.is_shuffled() {
        return match first_playable_random(queue, index) {
            Step::Stop => Step::Restart,
            step => step,
        };
    }

    for _ in 0..queue.len() {
        if is_playable(queue, index) {
            return Step::Select(index);
        }
        trace!(index, "Skipping unplayable entry");
        index = index.checked_sub(1).unwrap_or(queue.len() - 1);
    }
    Step::Restart
}

/// First playable entry at or after the current index, wrapping once
pub fn playable_from_current(queue: &QueueStore) -> Option<usize> {
    let start = queue.current_index()?;
    let len = queue.len();
    (0..len)
        .map(|offset| (start + offset) % len)
        .find(|&index| is_playable(queue, index))
}

fn is_playable(queue: &QueueStore, index: usize) -> bool {
    queue.get(index).is_some_and(cadenza_core::Track::is_playable)
}

fn first_playable_random(queue: &QueueStore, candidate: usize) -> Step {
    if is_playable(queue, candidate) {
        return Step::Select(candidate);
    }

    let current = queue.current_index();
    let other = queue
        .tracks()
        .iter()
        .enumerate()
        .find(|(i, t)| Some(*i) != current && t.is_playable())
        .map(|(i, _)| i);

    match (other, current) {
        (Some(index), _) => Step::Select(index),
        (None, Some(index)) if is_playable(queue, index) => Step::Select(index),
        _ => Step::Stop,
    }
}
