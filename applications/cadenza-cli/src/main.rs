//! Cadenza - terminal host for the audio session
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use cadenza_core::Track;
use cadenza_playback::{AudioSession, PlaybackEvent, Settings};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod simulator;
mod surface;

use commands::Flow;

#[derive(Parser)]
#[command(name = "cadenza")]
#[command(about = "Cadenza audio session driven from the terminal", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "CADENZA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a JSON catalogue on a simulated player
    Play {
        /// Catalogue file (JSON array of track records)
        catalogue: PathBuf,
        /// Start at this catalogue index or track ID
        #[arg(short, long)]
        start: Option<String>,
        /// Simulated clock step in milliseconds
        #[arg(long, default_value_t = 250)]
        tick_ms: u64,
    },
    /// Normalize a JSON catalogue and print the tracks
    Normalize {
        /// Catalogue file (JSON array of track records)
        catalogue: PathBuf,
        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },
    /// Print the effective settings
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cadenza=info,cadenza_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref())?;
    settings.validate()?;

    match cli.command {
        Commands::Play {
            catalogue,
            start,
            tick_ms,
        } => {
            play(&settings, &catalogue, start.as_deref(), tick_ms).await?;
        }
        Commands::Normalize { catalogue, pretty } => {
            let tracks = load_catalogue(&catalogue).await?;
            let json = if pretty {
                serde_json::to_string_pretty(&tracks)?
            } else {
                serde_json::to_string(&tracks)?
            };
            println!("{json}");
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
    }

    Ok(())
}

async fn load_catalogue(path: &Path) -> anyhow::Result<Vec<Track>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read catalogue {}", path.display()))?;
    let tracks = cadenza_core::normalize_json(&text)?;
    tracing::info!("Loaded {} tracks from {}", tracks.len(), path.display());
    Ok(tracks)
}

async fn play(
    settings: &Settings,
    path: &Path,
    start: Option<&str>,
    tick_ms: u64,
) -> anyhow::Result<()> {
    let catalogue = load_catalogue(path).await?;
    let (output, platform) = simulator::pair(&catalogue);

    let config = settings.playback_config();
    let mut session = match surface::select(&settings.now_playing) {
        Some(surface) => AudioSession::with_surface(output, surface, config),
        None => AudioSession::new(output, config),
    };

    let first = match start {
        Some(target) => commands::parse(&format!("play {target}"))?,
        None => catalogue
            .iter()
            .position(Track::is_playable)
            .map(|index| commands::Command::Play {
                target: Some(index.to_string()),
            }),
    };
    match first {
        Some(command) => {
            commands::execute(&mut session, &catalogue, command)?;
        }
        None => tracing::warn!("Catalogue has no playable tracks"),
    }
    report(&mut session);

    let step = Duration::from_millis(tick_ms.max(1));
    let mut ticker = tokio::time::interval(step);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for event in platform.advance(step) {
                    session.handle_media_event(event);
                }
                session.tick(Instant::now());
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match commands::parse(&line) {
                    Ok(Some(command)) => match commands::execute(&mut session, &catalogue, command) {
                        Ok(Flow::Quit) => break,
                        Ok(Flow::Continue) => {}
                        Err(e) => eprintln!("{e}"),
                    },
                    Ok(None) => {}
                    Err(e) => eprintln!("{e}"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
        report(&mut session);
    }

    session.shutdown();
    tracing::info!("Cadenza stopped");
    Ok(())
}

fn report<O: cadenza_playback::MediaOutput>(session: &mut AudioSession<O>) {
    for event in session.drain_events() {
        match event {
            PlaybackEvent::TrackChanged { track_id, .. } => match session.current_track() {
                Some(track) => tracing::info!("▶ {} - {}", track.artist, track.title),
                None => tracing::info!(?track_id, "No track"),
            },
            PlaybackEvent::LoadFailed { track_id, kind } => {
                tracing::warn!(%track_id, ?kind, "Load failed (type 'retry' to try again)");
            }
            other => tracing::debug!(?other, "Playback event"),
        }
    }
}
