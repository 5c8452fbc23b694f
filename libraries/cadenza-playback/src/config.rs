//! Settings loading
//!
//! Layered: built-in defaults, then an optional TOML file, then environment
//! variables prefixed with `CADENZA` (nested keys separated by `__`, e.g.
//! `CADENZA__PLAYBACK__VOLUME=0.5`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PlaybackError, Result};
use crate::types::{PlaybackConfig, RepeatMode};

/// Default settings file, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "cadenza.toml";

const ENV_PREFIX: &str = "CADENZA";

/// Application settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    /// Playback defaults
    #[serde(default = "default_playback")]
    pub playback: PlaybackSettings,

    /// Now-playing surface
    #[serde(default = "default_now_playing")]
    pub now_playing: NowPlayingSettings,
}

/// `[playback]` section
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlaybackSettings {
    /// Initial volume (0.0 - 1.0)
    #[serde(default = "default_volume")]
    pub volume: f32,

    /// Start muted
    #[serde(default)]
    pub muted: bool,

    /// Initial repeat mode
    #[serde(default)]
    pub repeat: RepeatMode,

    /// Seconds into a track past which "previous" restarts it
    #[serde(default = "default_restart_threshold_secs")]
    pub restart_threshold_secs: f64,

    /// Retries allowed per track after a load error
    #[serde(default = "default_max_load_retries")]
    pub max_load_retries: u32,
}

/// `[now_playing]` section
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NowPlayingSettings {
    /// Publish to the OS media surface
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Position publish cadence while playing
    #[serde(default = "default_position_interval_ms")]
    pub position_interval_ms: u64,

    /// Name shown by the OS media surface
    #[serde(default = "default_display_name")]
    pub display_name: String,

    /// Square artwork sizes advertised
    #[serde(default = "default_artwork_sizes")]
    pub artwork_sizes: Vec<u32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            playback: default_playback(),
            now_playing: default_now_playing(),
        }
    }
}

impl Settings {
    /// Load settings
    ///
    /// An explicit `path` must exist; without one, [`DEFAULT_CONFIG_FILE`]
    /// is used if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    fn load_with_prefix(path: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let mut builder = config::Config::builder();

        match path {
            Some(path) => {
                builder = builder.add_source(config::File::from(path.to_path_buf()).required(true));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    builder = builder.add_source(config::File::from(default_path));
                }
            }
        }

        builder = builder.add_source(
            config::Environment::with_prefix(env_prefix)
                .separator("__")
                .try_parsing(true),
        );

        let settings: Self = builder.build()?.try_deserialize()?;
        debug!(?settings, "Settings loaded");
        Ok(settings)
    }

    /// Validate settings
    pub fn validate(&self) -> Result<()> {
        let volume = self.playback.volume;
        if !(0.0..=1.0).contains(&volume) {
            return Err(PlaybackError::InvalidConfig(format!(
                "playback.volume must be within [0, 1], got {volume}"
            )));
        }

        let threshold = self.playback.restart_threshold_secs;
        if Duration::try_from_secs_f64(threshold).is_err() {
            return Err(PlaybackError::InvalidConfig(format!(
                "playback.restart_threshold_secs must be a non-negative number, got {threshold}"
            )));
        }

        if self.now_playing.position_interval_ms == 0 {
            return Err(PlaybackError::InvalidConfig(
                "now_playing.position_interval_ms must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Runtime playback configuration derived from these settings
    pub fn playback_config(&self) -> PlaybackConfig {
        PlaybackConfig {
            volume: self.playback.volume,
            muted: self.playback.muted,
            repeat: self.playback.repeat,
            restart_threshold: Duration::try_from_secs_f64(self.playback.restart_threshold_secs)
                .unwrap_or(Duration::ZERO),
            max_load_retries: self.playback.max_load_retries,
            position_interval: Duration::from_millis(self.now_playing.position_interval_ms),
            artwork_sizes: self.now_playing.artwork_sizes.clone(),
        }
    }
}

// Default values
fn default_playback() -> PlaybackSettings {
    PlaybackSettings {
        volume: default_volume(),
        muted: false,
        repeat: RepeatMode::Off,
        restart_threshold_secs: default_restart_threshold_secs(),
        max_load_retries: default_max_load_retries(),
    }
}

fn default_volume() -> f32 {
    1.0
}

fn default_restart_threshold_secs() -> f64 {
    3.0
}

fn default_max_load_retries() -> u32 {
    3
}

fn default_now_playing() -> NowPlayingSettings {
    NowPlayingSettings {
        enabled: default_enabled(),
        position_interval_ms: default_position_interval_ms(),
        display_name: default_display_name(),
        artwork_sizes: default_artwork_sizes(),
    }
}

fn default_enabled() -> bool {
    true
}

fn default_position_interval_ms() -> u64 {
    1000
}

fn default_display_name() -> String {
    "Cadenza".to_string()
}

fn default_artwork_sizes() -> Vec<u32> {
    vec![96, 128, 192, 256, 384, 512]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_match_playback_config_defaults() {
        assert_eq!(Settings::default().playback_config(), PlaybackConfig::default());
    }

    #[test]
    fn loads_partial_file_over_defaults() {
        let file = write_config(
            r#"
            [playback]
            volume = 0.5
            repeat = "one"

            [now_playing]
            position_interval_ms = 250
            "#,
        );

        let settings = Settings::load_with_prefix(Some(file.path()), "CADENZA_TEST_PARTIAL").unwrap();
        assert_eq!(settings.playback.volume, 0.5);
        assert_eq!(settings.playback.repeat, RepeatMode::One);
        assert_eq!(settings.playback.max_load_retries, 3);
        assert_eq!(settings.now_playing.position_interval_ms, 250);
        assert_eq!(settings.now_playing.display_name, "Cadenza");

        let config = settings.playback_config();
        assert_eq!(config.position_interval, Duration::from_millis(250));
        assert_eq!(config.restart_threshold, Duration::from_secs(3));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = Settings::load_with_prefix(
            Some(Path::new("/definitely/not/here/cadenza.toml")),
            "CADENZA_TEST_MISSING",
        );
        assert!(matches!(result, Err(PlaybackError::Config(_))));
    }

    #[test]
    fn environment_overrides_file() {
        let file = write_config("[playback]\nvolume = 0.5\n");
        std::env::set_var("CADENZA_TEST_ENV__PLAYBACK__VOLUME", "0.25");

        let settings = Settings::load_with_prefix(Some(file.path()), "CADENZA_TEST_ENV").unwrap();
        std::env::remove_var("CADENZA_TEST_ENV__PLAYBACK__VOLUME");

        assert_eq!(settings.playback.volume, 0.25);
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let mut settings = Settings::default();
        assert!(settings.validate().is_ok());

        settings.playback.volume = 1.5;
        assert!(matches!(settings.validate(), Err(PlaybackError::InvalidConfig(_))));

        settings.playback.volume = 0.5;
        settings.playback.restart_threshold_secs = -1.0;
        assert!(settings.validate().is_err());

        settings.playback.restart_threshold_secs = 1e300;
        assert!(settings.validate().is_err());
        assert_eq!(settings.playback_config().restart_threshold, Duration::ZERO);

        settings.playback.restart_threshold_secs = 3.0;
        settings.now_playing.position_interval_ms = 0;
        assert!(settings.validate().is_err());
    }
}
