//! Configuration loading and typed config structures for the game server.
//!
//! The configuration lives in `rhenaguesser.yaml` (path overridable with
//! `RHENAGUESSER_CONFIG`). Every field has a default, so a missing file
//! or an empty section yields a working server that plays five rounds of
//! Panoramax pictures around the Upper Rhine.
//!
//! Environment variables override a few deployment-specific values:
//!
//! | Variable            | Field                         |
//! |---------------------|-------------------------------|
//! | `HOST`              | `server.host`                 |
//! | `PORT`              | `server.port`                 |
//! | `PANORAMAX_API_URL` | `pictures.panoramax.api_url`  |
//! | `LOG_LEVEL`         | `logging.level`               |

use std::path::Path;
use std::time::Duration;

use rhenaguesser_pictures::PictureSourceConfig;
use serde::Deserialize;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "RHENAGUESSER_CONFIG";

/// Configuration file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "rhenaguesser.yaml";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The values parsed but cannot run a server.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level server configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AppConfig {
    /// Listen address.
    #[serde(default)]
    pub server: ServerSection,

    /// Game rules and session housekeeping.
    #[serde(default)]
    pub game: GameConfig,

    /// Picture source selection and tuning.
    #[serde(default)]
    pub pictures: PictureSourceConfig,

    /// Log filter and output format.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from the file named by [`CONFIG_PATH_ENV`], or
    /// [`DEFAULT_CONFIG_PATH`]. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::from_file`].
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_owned());
        let path = Path::new(&path);
        if path.exists() {
            Self::from_file(path)
        } else {
            let mut config = Self::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
    }

    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if the values are unusable.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string, without env overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] or [`ConfigError::Invalid`].
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Override deployment values from the environment.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("HOST") {
            self.server.host = val;
        }
        if let Some(port) = std::env::var("PORT").ok().and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }
        if let Ok(val) = std::env::var("PANORAMAX_API_URL") {
            self.pictures.panoramax.api_url = val;
        }
        if let Ok(val) = std::env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
    }

    /// Reject values no server can run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.game.rounds == 0 {
            return Err(ConfigError::Invalid("game.rounds must be at least 1".to_owned()));
        }
        if self.game.session_code_length == 0 || self.game.player_token_length == 0 {
            return Err(ConfigError::Invalid(
                "session_code_length and player_token_length must be positive".to_owned(),
            ));
        }
        if self.game.finished_session_ttl_secs > 0 && self.game.reap_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "reap_interval_secs must be positive when the reaper is enabled".to_owned(),
            ));
        }
        if self.game.finished_session_ttl_secs > 0
            && self.game.finished_session_ttl_secs.saturating_mul(1000) < self.game.reveal_delay_ms
        {
            return Err(ConfigError::Invalid(
                "finished_session_ttl_secs must cover reveal_delay_ms".to_owned(),
            ));
        }
        self.pictures
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

/// Listen address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Game rules and session housekeeping.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GameConfig {
    /// Rounds (pictures) per session.
    #[serde(default = "default_rounds")]
    pub rounds: usize,

    /// Pause between `roundComplete` and `nextLocation`, in milliseconds.
    #[serde(default = "default_reveal_delay_ms")]
    pub reveal_delay_ms: u64,

    /// Characters in a session code.
    #[serde(default = "default_session_code_length")]
    pub session_code_length: usize,

    /// Characters in a player token.
    #[serde(default = "default_player_token_length")]
    pub player_token_length: usize,

    /// Seconds a finished session is kept before removal; 0 keeps it
    /// until the process exits.
    #[serde(default)]
    pub finished_session_ttl_secs: u64,

    /// Seconds between reaper sweeps.
    #[serde(default = "default_reap_interval_secs")]
    pub reap_interval_secs: u64,
}

impl GameConfig {
    /// Reveal delay as a [`Duration`].
    pub const fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }

    /// Finished-session lifetime, or `None` when reaping is disabled.
    pub const fn finished_session_ttl(&self) -> Option<Duration> {
        if self.finished_session_ttl_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.finished_session_ttl_secs))
        }
    }

    /// Interval between reaper sweeps.
    pub const fn reap_interval(&self) -> Duration {
        Duration::from_secs(self.reap_interval_secs)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rounds: default_rounds(),
            reveal_delay_ms: default_reveal_delay_ms(),
            session_code_length: default_session_code_length(),
            player_token_length: default_player_token_length(),
            finished_session_ttl_secs: 0,
            reap_interval_secs: default_reap_interval_secs(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    3000
}

const fn default_rounds() -> usize {
    5
}

const fn default_reveal_delay_ms() -> u64 {
    7_000
}

const fn default_session_code_length() -> usize {
    4
}

const fn default_player_token_length() -> usize {
    8
}

const fn default_reap_interval_secs() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_owned()
}
