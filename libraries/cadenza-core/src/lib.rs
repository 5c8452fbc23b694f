//! Cadenza Core
//!
//! Platform-agnostic track model and record normalization.
//!
//! This crate provides:
//! - **Domain Types**: the canonical [`Track`] and its [`Lyrics`]
//! - **Normalization**: [`normalize`] turns heterogeneous catalogue records
//!   into canonical tracks, rejecting records without an identity
//! - **Error Handling**: unified [`CoreError`] and [`Result`] types
//!
//! # Example
//!
//! ```rust
//! use cadenza_core::normalize;
//! use serde_json::json;
//!
//! let track = normalize(&json!({
//!     "slug": "night-drive",
//!     "title": "Night Drive",
//!     "cover_url": "https://img.example/night-drive.jpg",
//!     "audio": "https://cdn.example/night-drive.mp3",
//!     "duration": 245,
//! }))
//! .expect("record has an identity");
//!
//! assert_eq!(track.track_id, "night-drive");
//! assert_eq!(track.duration_formatted, "4:05");
//! assert!(track.is_playable());
//!
//! // Records without trackId/slug/id are rejected
//! assert!(normalize(&json!({ "title": "orphan" })).is_none());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod normalize;
pub mod track;

pub use error::{CoreError, Result};
pub use normalize::{normalize, normalize_all, normalize_json, parse_lrc};
pub use track::{
    format_duration, parse_duration_text, LyricLine, Lyrics, Track, PLACEHOLDER_COVER,
    UNKNOWN_ARTIST, UNKNOWN_TITLE,
};
