//! Interactive command parsing and dispatch

use std::time::Duration;

use anyhow::{bail, Context, Result};
use cadenza_core::Track;
use cadenza_playback::{AudioSession, MediaOutput, RemoteCommand};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

/// One line typed at the prompt
#[derive(Debug, Parser)]
#[command(no_binary_name = true, disable_help_flag = true)]
pub struct Line {
    #[command(subcommand)]
    pub command: Command,
}

/// Commands accepted at the prompt
#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Play a catalogue entry by index or ID, or resume
    Play { target: Option<String> },
    /// Pause playback
    Pause,
    /// Resume playback
    Resume,
    /// Toggle play/pause
    Toggle,
    /// Pause and rewind
    Stop,
    /// Skip to the next track
    Next,
    /// Previous track, or restart the current one
    Prev,
    /// Seek to an absolute position in seconds
    Seek { seconds: f64 },
    /// Seek to a percentage of the track
    SeekPct { percent: f64 },
    /// Cycle repeat mode
    Repeat,
    /// Toggle shuffle
    Shuffle,
    /// Set the volume (0.0 - 1.0)
    Volume { level: f32 },
    /// Toggle mute
    Mute,
    /// Retry a failed load
    Retry,
    /// Append a catalogue entry to the queue
    Add { target: String },
    /// Remove a queue entry
    Remove { index: usize },
    /// Move a queue entry
    Move { from: usize, to: usize },
    /// Empty the queue
    Clear,
    /// Print the queue
    Queue,
    /// Print the session as JSON
    Status,
    /// Print the synced lyric line at the current position
    Lyrics,
    /// Simulate a media key press
    Key {
        #[arg(value_enum)]
        action: MediaKey,
    },
    /// Leave the player
    Quit,
}

/// Media keys the prompt can simulate
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum MediaKey {
    Play,
    Pause,
    Toggle,
    Stop,
    Next,
    Previous,
}

impl From<MediaKey> for RemoteCommand {
    fn from(key: MediaKey) -> Self {
        match key {
            MediaKey::Play => Self::Play,
            MediaKey::Pause => Self::Pause,
            MediaKey::Toggle => Self::Toggle,
            MediaKey::Stop => Self::Stop,
            MediaKey::Next => Self::Next,
            MediaKey::Previous => Self::Previous,
        }
    }
}

/// Parse a prompt line; `Ok(None)` for blank input
pub fn parse(input: &str) -> Result<Option<Command>> {
    let words: Vec<&str> = input.split_whitespace().collect();
    if words.is_empty() {
        return Ok(None);
    }
    let line = Line::try_parse_from(words).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    Ok(Some(line.command))
}

/// Whether the loop should keep running after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Resolve `target` against the catalogue: a numeric index or a track ID
fn lookup<'a>(catalogue: &'a [Track], target: &str) -> Result<&'a Track> {
    if let Ok(index) = target.parse::<usize>() {
        if let Some(track) = catalogue.get(index) {
            return Ok(track);
        }
    }
    catalogue
        .iter()
        .find(|t| t.track_id == target)
        .with_context(|| format!("No catalogue entry '{target}'"))
}

/// Apply `command` to the session
pub fn execute<O: MediaOutput>(
    session: &mut AudioSession<O>,
    catalogue: &[Track],
    command: Command,
) -> Result<Flow> {
    match command {
        Command::Play { target: None } => session.resume_track(),
        Command::Play {
            target: Some(target),
        } => {
            let track = lookup(catalogue, &target)?;
            if !session.play_track(track, Some(catalogue)) {
                bail!("Track '{}' has no audio", track.track_id);
            }
        }
        Command::Pause => session.pause_track(),
        Command::Resume => session.resume_track(),
        Command::Toggle => session.toggle_play(),
        Command::Stop => session.stop_track(),
        Command::Next => session.next_track(),
        Command::Prev => session.previous_track(),
        Command::Seek { seconds } => {
            let Ok(position) = Duration::try_from_secs_f64(seconds) else {
                bail!("Seek position must be a non-negative number of seconds");
            };
            session.seek(position);
        }
        Command::SeekPct { percent } => session.seek_to_percent(percent),
        Command::Repeat => {
            let mode = session.toggle_repeat();
            info!(?mode, "Repeat mode");
        }
        Command::Shuffle => {
            let enabled = session.toggle_shuffle();
            info!(enabled, "Shuffle");
        }
        Command::Volume { level } => session.update_volume(level),
        Command::Mute => {
            session.toggle_mute();
        }
        Command::Retry => {
            if !session.retry_load() {
                warn!("Nothing to retry");
            }
        }
        Command::Add { target } => {
            let track = lookup(catalogue, &target)?.clone();
            if !session.add_to_queue(track) {
                warn!("Track '{}' is already queued", target);
            }
        }
        Command::Remove { index } => {
            if session.remove_from_queue(index).is_none() {
                bail!("No queue entry at {index}");
            }
        }
        Command::Move { from, to } => {
            if !session.move_track(from, to) {
                bail!("Cannot move {from} to {to}");
            }
        }
        Command::Clear => session.clear_queue(),
        Command::Queue => print_queue(session),
        Command::Status => {
            println!("{}", serde_json::to_string_pretty(&session.snapshot())?);
        }
        Command::Lyrics => {
            let seconds = session.current_time().as_secs_f64();
            match session
                .current_track()
                .and_then(|t| t.lyrics.line_at(seconds))
            {
                Some(line) => println!("{}", line.text),
                None => println!("(no synced lyrics)"),
            }
        }
        Command::Key { action } => {
            session
                .remote_commands()
                .send(action.into())
                .context("Remote command channel closed")?;
        }
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

fn print_queue<O: MediaOutput>(session: &AudioSession<O>) {
    let current = session.current_index();
    for (index, track) in session.queue().iter().enumerate() {
        let marker = if Some(index) == current { ">" } else { " " };
        println!(
            "{marker} {index:>3}  {}  {} - {} [{}]",
            track.track_id, track.artist, track.title, track.duration_formatted
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator;
    use cadenza_playback::PlaybackConfig;

    fn catalogue() -> Vec<Track> {
        ["a", "b", "c"]
            .iter()
            .map(|id| {
                Track::new(*id)
                    .with_title(format!("Song {id}"))
                    .with_audio(format!("https://cdn/{id}.mp3"))
                    .with_duration(60.0)
            })
            .collect()
    }

    #[test]
    fn blank_line_parses_to_nothing() {
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[test]
    fn parses_arguments() {
        assert_eq!(
            parse("seek 12.5").unwrap(),
            Some(Command::Seek { seconds: 12.5 })
        );
        assert_eq!(
            parse("move 2 0").unwrap(),
            Some(Command::Move { from: 2, to: 0 })
        );
        assert_eq!(
            parse("seek-pct 50").unwrap(),
            Some(Command::SeekPct { percent: 50.0 })
        );
        assert_eq!(
            parse("key previous").unwrap(),
            Some(Command::Key {
                action: MediaKey::Previous
            })
        );
        assert_eq!(parse("play").unwrap(), Some(Command::Play { target: None }));
    }

    #[test]
    fn rejects_unknown_commands() {
        assert!(parse("rewind").is_err());
        assert!(parse("volume loud").is_err());
    }

    #[test]
    fn lookup_by_index_then_id() {
        let tracks = catalogue();
        assert_eq!(lookup(&tracks, "1").unwrap().track_id, "b");
        assert_eq!(lookup(&tracks, "c").unwrap().track_id, "c");
        assert!(lookup(&tracks, "9").is_err());
    }

    #[test]
    fn play_then_next_follows_catalogue() {
        let tracks = catalogue();
        let (output, _platform) = simulator::pair(&tracks);
        let mut session = AudioSession::new(output, PlaybackConfig::default());

        execute(&mut session, &tracks, Command::Play { target: Some("a".into()) }).unwrap();
        assert_eq!(session.queue().len(), 3);
        assert!(session.is_playing());

        execute(&mut session, &tracks, Command::Next).unwrap();
        assert_eq!(session.current_track().unwrap().track_id, "b");
    }

    #[test]
    fn media_key_applies_on_tick() {
        let tracks = catalogue();
        let (output, _platform) = simulator::pair(&tracks);
        let mut session = AudioSession::new(output, PlaybackConfig::default());
        execute(&mut session, &tracks, Command::Play { target: Some("a".into()) }).unwrap();

        execute(
            &mut session,
            &tracks,
            Command::Key {
                action: MediaKey::Pause,
            },
        )
        .unwrap();
        assert!(session.is_playing());

        session.tick(std::time::Instant::now());
        assert!(!session.is_playing());
    }

    #[test]
    fn quit_stops_the_loop() {
        let tracks = catalogue();
        let (output, _platform) = simulator::pair(&tracks);
        let mut session = AudioSession::new(output, PlaybackConfig::default());
        assert_eq!(
            execute(&mut session, &tracks, Command::Quit).unwrap(),
            Flow::Quit
        );
    }

    #[test]
    fn unrepresentable_seek_is_an_error() {
        let tracks = catalogue();
        let (output, _platform) = simulator::pair(&tracks);
        let mut session = AudioSession::new(output, PlaybackConfig::default());
        execute(&mut session, &tracks, Command::Play { target: Some("a".into()) }).unwrap();

        assert!(execute(&mut session, &tracks, Command::Seek { seconds: 1e30 }).is_err());
        assert!(execute(&mut session, &tracks, Command::Seek { seconds: -1.0 }).is_err());
        assert!(execute(&mut session, &tracks, Command::Seek { seconds: 12.0 }).is_ok());
    }

    #[test]
    fn removing_missing_entry_is_an_error() {
        let tracks = catalogue();
        let (output, _platform) = simulator::pair(&tracks);
        let mut session = AudioSession::new(output, PlaybackConfig::default());
        assert!(execute(&mut session, &tracks, Command::Remove { index: 4 }).is_err());
    }
}
