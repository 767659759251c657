//! Runtime configuration.
//!
//! Settings come from an optional JSON file (path taken from `WARDEN_CONFIG`,
//! defaulting to `warden.json`), with every field defaulted so the file can be
//! omitted entirely. `DISCORD_TOKEN` and `AUDIO_DIR` from the environment take
//! precedence over the file.

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "warden.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Missing DISCORD_TOKEN")]
    MissingToken,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Bot token. Normally supplied through `DISCORD_TOKEN`.
    pub discord_token: Option<String>,
    pub voice: VoiceConfig,
    pub reconnect: ReconnectConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct VoiceConfig {
    /// Directory `playlocal` resolves filenames against.
    pub audio_dir: PathBuf,
    /// How long a `leave` keeps suppressing the reconnect of its disconnect event.
    #[serde(with = "humantime_serde")]
    pub leave_intent_ttl: Duration,
    /// Leave the channel once a `muzika` stream finishes on its own.
    pub leave_after_stream: bool,
    /// Executable used to resolve remote sources.
    pub ytdlp_path: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReconnectConfig {
    pub max_attempts: u32,
    #[serde(with = "humantime_serde")]
    pub backoff: Duration,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            audio_dir: PathBuf::from("."),
            leave_intent_ttl: Duration::from_secs(10),
            leave_after_stream: true,
            ytdlp_path: "yt-dlp".to_string(),
        }
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::from_secs(2),
        }
    }
}

impl Config {
    /// Load the configuration from the file named by `WARDEN_CONFIG` and apply
    /// environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var("WARDEN_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::from_file(Path::new(&path))?;
        config.apply_env();
        Ok(config)
    }

    /// Read a config file. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_json(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded config from {}: {:?}", path.display(), config.voice);
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(raw)
    }

    fn apply_env(&mut self) {
        if let Ok(token) = env::var("DISCORD_TOKEN") {
            self.discord_token = Some(token);
        }
        if let Ok(dir) = env::var("AUDIO_DIR") {
            self.voice.audio_dir = PathBuf::from(dir);
        }
    }

    pub fn token(&self) -> Result<&str, ConfigError> {
        self.discord_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .ok_or(ConfigError::MissingToken)
    }
}
