//! Track normalization
//!
//! Catalogue and mock records carry track fields under varying key names
//! (`cover_url` or `cover`, `duration_formatted` or nothing at all, an artist
//! as a string or as an object). [`normalize`] maps any of them onto the
//! canonical [`Track`].
//!
//! Rules:
//! - identity comes from `trackId`, `slug` or `id`, in that order; a record
//!   without one is rejected (`None`) and logged
//! - every optional field falls back to a documented default
//! - a record that is already canonical is returned unchanged

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{CoreError, Result};
use crate::track::{
    format_duration, parse_duration_text, sanitize_seconds, LyricLine, Lyrics, Track,
    PLACEHOLDER_COVER, UNKNOWN_ARTIST, UNKNOWN_TITLE,
};

const ID_KEYS: &[&str] = &["trackId", "slug", "id"];
const TITLE_KEYS: &[&str] = &["title", "name"];
const ARTIST_NAME_KEYS: &[&str] = &["artist_name", "artistName"];
const ARTIST_ID_KEYS: &[&str] = &["artistId", "artist_id", "artist_slug", "artistSlug"];
const COVER_KEYS: &[&str] = &["cover_url", "coverUrl", "cover", "image", "artwork"];
const AUDIO_KEYS: &[&str] = &["audio", "audio_url", "audioUrl", "src", "file"];
const DURATION_FORMATTED_KEYS: &[&str] = &["duration_formatted", "durationFormatted"];
const LIKED_KEYS: &[&str] = &["isLiked", "is_liked", "liked"];
const PLAYS_KEYS: &[&str] = &["playsCount", "plays_count", "plays"];

/// Fields only a canonical track carries
const CANONICAL_MARKERS: &[&str] = &["trackId", "durationFormatted", "playsCount"];

/// Keys that wrap a listing of records in API responses
const LISTING_KEYS: &[&str] = &["tracks", "results", "data", "items"];

/// Convert a raw record into a canonical track
///
/// Returns `None` (and logs a warning) when the record has no identity.
pub fn normalize(raw: &Value) -> Option<Track> {
    let Some(obj) = raw.as_object() else {
        warn!("Track record is not an object, skipping");
        return None;
    };

    if is_canonical(obj) {
        if let Ok(track) = serde_json::from_value::<Track>(raw.clone()) {
            if !track.track_id.is_empty() {
                return Some(track);
            }
        }
    }

    let Some(track_id) = identity(obj) else {
        warn!(
            keys = ?obj.keys().collect::<Vec<_>>(),
            "Track record has no trackId/slug/id, skipping"
        );
        return None;
    };

    let duration = duration_seconds(obj);
    let duration_formatted =
        string_field(obj, DURATION_FORMATTED_KEYS).unwrap_or_else(|| format_duration(duration));

    Some(Track {
        track_id,
        title: string_field(obj, TITLE_KEYS).unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
        artist: artist_name(obj).unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
        artist_id: artist_id(obj),
        cover: string_field(obj, COVER_KEYS).unwrap_or_else(|| PLACEHOLDER_COVER.to_string()),
        audio: string_field(obj, AUDIO_KEYS),
        duration,
        duration_formatted,
        is_liked: LIKED_KEYS
            .iter()
            .find_map(|k| obj.get(*k).and_then(Value::as_bool))
            .unwrap_or(false),
        plays_count: PLAYS_KEYS
            .iter()
            .find_map(|k| obj.get(*k).and_then(as_count))
            .unwrap_or(0),
        lyrics: obj.get("lyrics").map(parse_lyrics).unwrap_or_default(),
    })
}

/// Normalize a batch of records, skipping rejected ones
pub fn normalize_all<'a, I>(records: I) -> Vec<Track>
where
    I: IntoIterator<Item = &'a Value>,
{
    records.into_iter().filter_map(normalize).collect()
}

/// Parse a JSON listing and normalize every record in it
///
/// Accepts a bare array, a single record, or an object wrapping the array
/// under `tracks`, `results`, `data` or `items`.
pub fn normalize_json(text: &str) -> Result<Vec<Track>> {
    let value: Value = serde_json::from_str(text)?;

    match &value {
        Value::Array(records) => Ok(normalize_all(records)),
        Value::Object(obj) => {
            if let Some(records) = LISTING_KEYS
                .iter()
                .find_map(|k| obj.get(*k).and_then(Value::as_array))
            {
                Ok(normalize_all(records))
            } else {
                Ok(normalize(&value).into_iter().collect())
            }
        }
        _ => Err(CoreError::invalid_input(
            "expected a track record or a listing of track records",
        )),
    }
}

fn is_canonical(obj: &Map<String, Value>) -> bool {
    CANONICAL_MARKERS.iter().all(|k| obj.contains_key(*k))
}

fn identity(obj: &Map<String, Value>) -> Option<String> {
    ID_KEYS.iter().find_map(|k| obj.get(*k).and_then(as_key))
}

/// Identity values may be strings or numbers
fn as_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| {
        obj.get(*k)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
    })
}

fn artist_name(obj: &Map<String, Value>) -> Option<String> {
    match obj.get("artist") {
        Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.trim().to_string()),
        Some(Value::Object(artist)) => {
            if let Some(name) = string_field(artist, &["name", "title"]) {
                return Some(name);
            }
        }
        _ => {}
    }
    string_field(obj, ARTIST_NAME_KEYS)
}

fn artist_id(obj: &Map<String, Value>) -> Option<String> {
    if let Some(id) = ARTIST_ID_KEYS.iter().find_map(|k| obj.get(*k).and_then(as_key)) {
        return Some(id);
    }
    obj.get("artist")
        .and_then(Value::as_object)
        .and_then(|artist| ["slug", "id"].iter().find_map(|k| artist.get(*k).and_then(as_key)))
}

fn duration_seconds(obj: &Map<String, Value>) -> f64 {
    let from_raw = match obj.get("duration") {
        Some(Value::Number(n)) => n.as_f64().map(sanitize_seconds),
        Some(Value::String(s)) => parse_duration_text(s),
        _ => None,
    };

    from_raw
        .or_else(|| string_field(obj, DURATION_FORMATTED_KEYS).and_then(|s| parse_duration_text(&s)))
        .unwrap_or(0.0)
}

fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.floor() as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_lyrics(value: &Value) -> Lyrics {
    match value {
        Value::String(text) => lyrics_from_text(text),
        Value::Object(obj) => {
            let kind = obj.get("type").and_then(Value::as_str).unwrap_or("none");
            let content = obj.get("content");
            match (kind, content) {
                ("static", Some(Value::String(text))) if !text.trim().is_empty() => {
                    Lyrics::Static(text.clone())
                }
                ("synced", Some(Value::String(text))) => synced_or_none(parse_lrc(text)),
                ("synced", Some(Value::Array(lines))) => {
                    synced_or_none(lines.iter().filter_map(lyric_line).collect())
                }
                _ => Lyrics::None,
            }
        }
        _ => Lyrics::None,
    }
}

fn lyrics_from_text(text: &str) -> Lyrics {
    if text.trim().is_empty() {
        return Lyrics::None;
    }
    let lines = parse_lrc(text);
    if lines.is_empty() {
        Lyrics::Static(text.to_string())
    } else {
        Lyrics::Synced(lines)
    }
}

fn synced_or_none(mut lines: Vec<LyricLine>) -> Lyrics {
    if lines.is_empty() {
        return Lyrics::None;
    }
    lines.sort_by(|a, b| a.time.total_cmp(&b.time));
    Lyrics::Synced(lines)
}

fn lyric_line(value: &Value) -> Option<LyricLine> {
    let obj = value.as_object()?;
    let time = match obj.get("time") {
        Some(Value::Number(n)) => n.as_f64().map(sanitize_seconds)?,
        Some(Value::String(s)) => parse_duration_text(s)?,
        _ => return None,
    };
    let text = obj
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Some(LyricLine { time, text })
}

/// Parse LRC text (`[mm:ss.xx] line`), sorted by time
///
/// A line may carry several time tags; metadata tags such as `[ar:...]`
/// are skipped.
pub fn parse_lrc(text: &str) -> Vec<LyricLine> {
    let mut lines = Vec::new();

    for raw_line in text.lines() {
        let mut rest = raw_line.trim();
        let mut times = Vec::new();

        while let Some(stripped) = rest.strip_prefix('[') {
            let Some(end) = stripped.find(']') else {
                break;
            };
            match parse_duration_text(&stripped[..end]) {
                Some(time) => times.push(time),
                None => break,
            }
            rest = stripped[end + 1..].trim_start();
        }

        for time in times {
            lines.push(LyricLine {
                time,
                text: rest.trim().to_string(),
            });
        }
    }

    lines.sort_by(|a, b| a.time.total_cmp(&b.time));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identity_priority_is_track_id_then_slug_then_id() {
        let t = normalize(&json!({"trackId": "a", "slug": "b", "id": 3})).unwrap();
        assert_eq!(t.track_id, "a");

        let t = normalize(&json!({"slug": "b", "id": 3})).unwrap();
        assert_eq!(t.track_id, "b");

        let t = normalize(&json!({"id": 3})).unwrap();
        assert_eq!(t.track_id, "3");
    }

    #[test]
    fn blank_identity_falls_through_to_next_key() {
        let t = normalize(&json!({"trackId": "  ", "slug": "real"})).unwrap();
        assert_eq!(t.track_id, "real");
    }

    #[test]
    fn record_without_identity_is_rejected() {
        assert!(normalize(&json!({"title": "Orphan", "audio": "x.mp3"})).is_none());
        assert!(normalize(&json!("not an object")).is_none());
        assert!(normalize(&json!({"id": null})).is_none());
    }

    #[test]
    fn maps_alternate_key_names() {
        let t = normalize(&json!({
            "slug": "night-drive",
            "name": "Night Drive",
            "artist": {"name": "Neon Coast", "slug": "neon-coast"},
            "cover_url": "https://img/cover.jpg",
            "audio_url": "https://cdn/night-drive.mp3",
            "duration": 245,
            "is_liked": true,
            "plays_count": 1200,
        }))
        .unwrap();

        assert_eq!(t.title, "Night Drive");
        assert_eq!(t.artist, "Neon Coast");
        assert_eq!(t.artist_id.as_deref(), Some("neon-coast"));
        assert_eq!(t.cover, "https://img/cover.jpg");
        assert_eq!(t.audio.as_deref(), Some("https://cdn/night-drive.mp3"));
        assert_eq!(t.duration, 245.0);
        assert_eq!(t.duration_formatted, "4:05");
        assert!(t.is_liked);
        assert_eq!(t.plays_count, 1200);
    }

    #[test]
    fn explicit_formatted_duration_is_kept() {
        let t = normalize(&json!({"id": 1, "duration": 61, "duration_formatted": "01:01"})).unwrap();
        assert_eq!(t.duration_formatted, "01:01");
    }

    #[test]
    fn duration_derived_from_formatted_when_missing() {
        let t = normalize(&json!({"id": 1, "duration_formatted": "3:20"})).unwrap();
        assert_eq!(t.duration, 200.0);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let t = normalize(&json!({"id": "bare"})).unwrap();
        assert_eq!(t, Track::new("bare"));
    }

    #[test]
    fn empty_audio_is_not_playable() {
        let t = normalize(&json!({"id": "x", "audio": ""})).unwrap();
        assert!(!t.is_playable());
    }

    #[test]
    fn normalizing_canonical_track_is_identity() {
        let original = normalize(&json!({
            "id": "t9",
            "title": "Echoes",
            "artist": "Someone",
            "audio": "/a/t9.mp3",
            "duration": 93.5,
            "lyrics": {"type": "static", "content": "words"},
        }))
        .unwrap();

        let again = normalize(&serde_json::to_value(&original).unwrap()).unwrap();
        assert_eq!(again, original);
    }

    #[test]
    fn lyrics_variants() {
        let t = normalize(&json!({"id": 1, "lyrics": {"type": "static", "content": "hello"}})).unwrap();
        assert_eq!(t.lyrics, Lyrics::Static("hello".into()));

        let t = normalize(&json!({"id": 1, "lyrics": {"type": "synced", "content": [
            {"time": 12.0, "text": "second"},
            {"time": 1.5, "text": "first"},
        ]}}))
        .unwrap();
        match t.lyrics {
            Lyrics::Synced(lines) => {
                assert_eq!(lines.len(), 2);
                assert_eq!(lines[0].text, "first");
            }
            other => panic!("expected synced lyrics, got {other:?}"),
        }

        let t = normalize(&json!({"id": 1, "lyrics": {"type": "none"}})).unwrap();
        assert_eq!(t.lyrics, Lyrics::None);

        let t = normalize(&json!({"id": 1, "lyrics": "just words"})).unwrap();
        assert_eq!(t.lyrics, Lyrics::Static("just words".into()));
    }

    #[test]
    fn parse_lrc_handles_multiple_tags_and_metadata() {
        let lines = parse_lrc("[ar:Someone]\n[00:10.50][01:00.00] chorus\n[00:02.00] intro\n");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].time, 2.0);
        assert_eq!(lines[0].text, "intro");
        assert_eq!(lines[1].time, 10.5);
        assert_eq!(lines[2].time, 60.0);
        assert_eq!(lines[2].text, "chorus");
    }

    #[test]
    fn normalize_json_accepts_wrapped_listings() {
        let tracks = normalize_json(r#"{"results": [{"id": 1}, {"title": "no id"}, {"slug": "b"}]}"#)
            .unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[1].track_id, "b");

        let tracks = normalize_json(r#"[{"id": "a"}]"#).unwrap();
        assert_eq!(tracks.len(), 1);

        assert!(normalize_json("42").is_err());
        assert!(normalize_json("{not json").is_err());
    }
}
