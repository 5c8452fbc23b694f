//! Canonical track model
//!
//! Every record that reaches the playback core is expressed as a [`Track`].
//! Raw catalogue records are converted by [`crate::normalize`].

use serde::{Deserialize, Serialize};

/// Title used when a record carries none
pub const UNKNOWN_TITLE: &str = "Unknown title";

/// Artist used when a record carries none
pub const UNKNOWN_ARTIST: &str = "Unknown artist";

/// Cover used when a record carries no artwork
pub const PLACEHOLDER_COVER: &str = "/images/placeholder-cover.png";

/// Canonical track
///
/// Serialized in camelCase so a serialized track can be fed back through
/// the normalizer unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Stable identity key (never empty)
    pub track_id: String,

    /// Track title
    pub title: String,

    /// Artist display name
    pub artist: String,

    /// Artist identity, if known
    pub artist_id: Option<String>,

    /// Cover URL or local asset path
    pub cover: String,

    /// Playable source URL (`None` = not playable)
    pub audio: Option<String>,

    /// Duration in seconds
    pub duration: f64,

    /// Duration formatted as `m:ss`
    pub duration_formatted: String,

    /// Whether the listener liked this track
    pub is_liked: bool,

    /// Total play count
    pub plays_count: u64,

    /// Lyrics attached to the track
    pub lyrics: Lyrics,
}

impl Track {
    /// Create a track with every optional field at its default
    pub fn new(track_id: impl Into<String>) -> Self {
        Self {
            track_id: track_id.into(),
            title: UNKNOWN_TITLE.to_string(),
            artist: UNKNOWN_ARTIST.to_string(),
            artist_id: None,
            cover: PLACEHOLDER_COVER.to_string(),
            audio: None,
            duration: 0.0,
            duration_formatted: format_duration(0.0),
            is_liked: false,
            plays_count: 0,
            lyrics: Lyrics::None,
        }
    }

    /// Set the title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the artist name
    #[must_use]
    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = artist.into();
        self
    }

    /// Set the playable source
    #[must_use]
    pub fn with_audio(mut self, audio: impl Into<String>) -> Self {
        self.audio = Some(audio.into());
        self
    }

    /// Set the duration (seconds) and its formatted form
    #[must_use]
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = sanitize_seconds(seconds);
        self.duration_formatted = format_duration(self.duration);
        self
    }

    /// A track is playable iff it has an audio source
    pub fn is_playable(&self) -> bool {
        self.audio.is_some()
    }
}

/// Lyrics attached to a track
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum Lyrics {
    /// No lyrics
    #[default]
    None,

    /// Plain text lyrics
    Static(String),

    /// Time-coded lyrics, sorted by time
    Synced(Vec<LyricLine>),
}

impl Lyrics {
    /// Synced line active at `seconds` into the track
    ///
    /// The active line is the last one whose time is not after `seconds`.
    /// Static lyrics and positions before the first line yield `None`.
    pub fn line_at(&self, seconds: f64) -> Option<&LyricLine> {
        let Self::Synced(lines) = self else {
            return None;
        };
        let next = lines.partition_point(|line| line.time <= seconds);
        next.checked_sub(1).map(|i| &lines[i])
    }
}

/// One time-coded lyric line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricLine {
    /// Offset from track start in seconds
    pub time: f64,

    /// Line text
    pub text: String,
}

/// Format seconds as `m:ss`
///
/// Minutes are not wrapped into hours. Negative and non-finite input
/// formats as `0:00`.
pub fn format_duration(seconds: f64) -> String {
    let total = sanitize_seconds(seconds).floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Parse `m:ss`, `h:mm:ss` or a plain number of seconds
pub fn parse_duration_text(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if !text.contains(':') {
        return text.parse::<f64>().ok().map(sanitize_seconds);
    }

    let mut total = 0.0;
    for part in text.split(':') {
        let value: f64 = part.trim().parse().ok()?;
        if value < 0.0 {
            return None;
        }
        total = total * 60.0 + value;
    }
    Some(sanitize_seconds(total))
}

pub(crate) fn sanitize_seconds(seconds: f64) -> f64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    }
}
