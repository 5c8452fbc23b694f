//! Queue store
//!
//! Holds the ordered play list, the pre-shuffle snapshot and the current
//! selection. Selection is tracked by index but always re-derived from the
//! track identity whenever the order changes, so reordering, shuffling and
//! removal never move the listener to a different track.
//!
//! Invariants:
//! - no two entries share a `track_id`
//! - `current_index` is `None` or in `0..len`
//! - when shuffle is off the snapshot equals the live order

use cadenza_core::Track;
use tracing::debug;

use crate::shuffle::{random_index_excluding, shuffle_tracks};

/// Ordered play list with shuffle support
#[derive(Debug, Clone, Default)]
pub struct QueueStore {
    /// Live play order
    queue: Vec<Track>,

    /// Order before shuffle was enabled
    original: Vec<Track>,

    /// Selected entry
    current_index: Option<usize>,

    shuffled: bool,
}

impl QueueStore {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the queue with `tracks`
    ///
    /// Duplicate IDs keep their first occurrence. The selection is placed on
    /// `current_track_id` if present, otherwise cleared. Shuffle is turned
    /// off.
    pub fn initialize(&mut self, tracks: Vec<Track>, current_track_id: Option<&str>) {
        let mut list: Vec<Track> = Vec::with_capacity(tracks.len());
        for track in tracks {
            if !list.iter().any(|t| t.track_id == track.track_id) {
                list.push(track);
            }
        }

        self.original = list.clone();
        self.queue = list;
        self.shuffled = false;

        self.current_index = current_track_id.and_then(|id| self.position_of(id));
        debug!(
            len = self.queue.len(),
            current = ?self.current_index,
            "Queue initialized"
        );
    }

    /// Append a track unless its ID is already queued
    ///
    /// Returns `true` if appended. Adding to an empty queue selects the new
    /// track without implying playback.
    pub fn add(&mut self, track: Track) -> bool {
        if self.contains(&track.track_id) {
            debug!(track_id = %track.track_id, "Track already queued");
            return false;
        }

        self.original.push(track.clone());
        self.queue.push(track);

        if self.current_index.is_none() && self.queue.len() == 1 {
            self.current_index = Some(0);
        }
        true
    }

    /// Remove the entry at `index`
    ///
    /// Out-of-range indices are a no-op. Removing an entry before the
    /// selection shifts the selection down by one; removing the selected
    /// entry keeps the same slot, clamped to the new end. The track is
    /// dropped from the pre-shuffle snapshot as well.
    pub fn remove(&mut self, index: usize) -> Option<Track> {
        if index >= self.queue.len() {
            return None;
        }

        let removed = self.queue.remove(index);
        self.original.retain(|t| t.track_id != removed.track_id);

        self.current_index = match self.current_index {
            _ if self.queue.is_empty() => None,
            Some(current) if index < current => Some(current - 1),
            Some(current) if index == current => Some(current.min(self.queue.len() - 1)),
            other => other,
        };

        Some(removed)
    }

    /// Index to select for "next"
    ///
    /// `None` only when the queue is empty. With shuffle on, a uniformly
    /// random entry other than the current one; a single-entry queue yields
    /// `Some(0)`. Otherwise the following entry, wrapping to the start.
    pub fn next_index(&self) -> Option<usize> {
        let len = self.queue.len();
        if len == 0 {
            return None;
        }
        if self.shuffled {
            return random_index_excluding(len, self.current_index);
        }
        Some(match self.current_index {
            Some(current) => (current + 1) % len,
            None => 0,
        })
    }

    /// Index to select for "previous"
    ///
    /// Mirrors [`Self::next_index`], wrapping from the start to the last
    /// entry.
    pub fn previous_index(&self) -> Option<usize> {
        let len = self.queue.len();
        if len == 0 {
            return None;
        }
        if self.shuffled {
            return random_index_excluding(len, self.current_index);
        }
        Some(match self.current_index {
            Some(0) | None => len - 1,
            Some(current) => current - 1,
        })
    }

    /// Flip shuffle, returning the new state
    ///
    /// Enabling snapshots the live order and shuffles it; disabling restores
    /// the snapshot. The selection follows the current track either way.
    pub fn toggle_shuffle(&mut self) -> bool {
        let current_id = self.current().map(|t| t.track_id.clone());

        if self.shuffled {
            self.queue = self.original.clone();
            self.shuffled = false;
        } else {
            self.original = self.queue.clone();
            shuffle_tracks(&mut self.queue);
            self.shuffled = true;
        }

        self.current_index = current_id.and_then(|id| self.position_of(&id));
        debug!(shuffled = self.shuffled, "Shuffle toggled");
        self.shuffled
    }

    /// Move the entry at `from` to position `to`
    ///
    /// Returns `false` if either index is out of range. The selection
    /// follows the current track.
    pub fn move_track(&mut self, from: usize, to: usize) -> bool {
        let len = self.queue.len();
        if from >= len || to >= len {
            return false;
        }
        if from == to {
            return true;
        }

        let current_id = self.current().map(|t| t.track_id.clone());
        let track = self.queue.remove(from);
        self.queue.insert(to, track);

        if !self.shuffled {
            self.original = self.queue.clone();
        }
        self.current_index = current_id.and_then(|id| self.position_of(&id));
        true
    }

    /// Select the entry at `index`
    ///
    /// Returns `false` if out of range.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.queue.len() {
            return false;
        }
        self.current_index = Some(index);
        true
    }

    /// Clear the queue, the snapshot and the selection
    ///
    /// Shuffle is switched off as well.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.original.clear();
        self.current_index = None;
        self.shuffled = false;
    }

    /// Currently selected track
    pub fn current(&self) -> Option<&Track> {
        self.current_index.and_then(|i| self.queue.get(i))
    }

    /// Currently selected index
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// Track at `index`
    pub fn get(&self, index: usize) -> Option<&Track> {
        self.queue.get(index)
    }

    /// Position of the track with the given ID
    pub fn position_of(&self, track_id: &str) -> Option<usize> {
        self.queue.iter().position(|t| t.track_id == track_id)
    }

    /// Whether a track with the given ID is queued
    pub fn contains(&self, track_id: &str) -> bool {
        self.position_of(track_id).is_some()
    }

    /// Live play order
    pub fn tracks(&self) -> &[Track] {
        &self.queue
    }

    /// Order before shuffle was enabled
    pub fn original(&self) -> &[Track] {
        &self.original
    }

    /// Whether shuffle is on
    pub fn is_shuffled(&self) -> bool {
        self.shuffled
    }

    /// Number of queued tracks
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
