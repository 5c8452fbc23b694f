//! Randomization helpers for shuffle mode

use cadenza_core::Track;
use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};

/// Shuffle tracks in place (Fisher-Yates)
///
/// Each track has equal probability of appearing at any position.
pub fn shuffle_tracks(tracks: &mut [Track]) {
    let mut rng = thread_rng();
    tracks.shuffle(&mut rng);
}

/// Pick a uniformly random index in `0..len`, avoiding `exclude` when
/// another choice exists
///
/// Returns `None` for an empty range. A single-element range always yields
/// `Some(0)`.
pub fn random_index_excluding(len: usize, exclude: Option<usize>) -> Option<usize> {
    match (len, exclude) {
        (0, _) => None,
        (1, _) => Some(0),
        (len, Some(exclude)) if exclude < len => {
            let pick = thread_rng().gen_range(0..len - 1);
            Some(if pick >= exclude { pick + 1 } else { pick })
        }
        (len, _) => Some(thread_rng().gen_range(0..len)),
    }
}
