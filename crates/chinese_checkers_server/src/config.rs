//! Server configuration.

use std::path::Path;
use std::time::Duration;

use chinese_checkers::{ConfigurationError, SeatLayout, Variant};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Whether to start a fresh game or resume a saved one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum SessionChoice {
    /// Start a new game.
    New,
    /// Resume the game named by [`GameSetup::selected_saved_game_id`].
    Load,
}

/// Setup answers the coordinator needs before admitting players.
pub trait GameSetup {
    /// Rule variant of a new game.
    fn selected_variant(&self) -> Variant;

    /// Seat count of a new game.
    fn selected_player_count(&self) -> usize;

    /// How many of the seats of a new game are bots.
    fn selected_bot_count(&self) -> usize;

    /// New game or resume.
    fn new_or_load_choice(&self) -> SessionChoice;

    /// Id of the game to resume, if any.
    fn selected_saved_game_id(&self) -> Option<i32>;
}

/// Server settings, read from a TOML file and command-line overrides.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on.
    #[serde(default = "default_host")]
    host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    port: u16,

    /// Rule variant of a new game.
    #[serde(default)]
    variant: Variant,

    /// Seat count of a new game.
    #[serde(default = "default_players")]
    players: usize,

    /// Bot seats of a new game.
    #[serde(default)]
    bots: usize,

    /// Pause before every bot move, in milliseconds.
    #[serde(default = "default_bot_delay_ms")]
    bot_delay_ms: u64,

    /// Longest a human may think before their turn is skipped. Unbounded when unset.
    #[serde(default)]
    move_timeout_secs: Option<u64>,

    /// Sqlite database file. Games are kept in memory when unset.
    #[serde(default)]
    db_path: Option<String>,

    /// Saved game to resume.
    #[serde(default)]
    load_game: Option<i32>,
}

#[instrument]
fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[instrument]
fn default_port() -> u16 {
    12345
}

#[instrument]
fn default_players() -> usize {
    2
}

#[instrument]
fn default_bot_delay_ms() -> u64 {
    500
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            variant: Variant::default(),
            players: default_players(),
            bots: 0,
            bot_delay_ms: default_bot_delay_ms(),
            move_timeout_secs: None,
            db_path: None,
            load_game: None,
        }
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// See [`ServerConfig::host`].
    pub host: Option<String>,
    /// See [`ServerConfig::port`].
    pub port: Option<u16>,
    /// See [`ServerConfig::variant`].
    pub variant: Option<Variant>,
    /// See [`ServerConfig::players`].
    pub players: Option<usize>,
    /// See [`ServerConfig::bots`].
    pub bots: Option<usize>,
    /// See [`ServerConfig::bot_delay_ms`].
    pub bot_delay_ms: Option<u64>,
    /// See [`ServerConfig::move_timeout_secs`].
    pub move_timeout_secs: Option<u64>,
    /// See [`ServerConfig::db_path`].
    pub db_path: Option<String>,
    /// See [`ServerConfig::load_game`].
    pub load_game: Option<i32>,
}

impl ServerConfig {
    /// Loads configuration from a TOML file. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigurationError::new(format!("Failed to read config file: {}", e)))?;
        let config = Self::from_toml(&content)?;
        info!(port = config.port, variant = %config.variant, "Config loaded successfully");
        Ok(config)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if the text is not a valid configuration.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigurationError> {
        toml::from_str(content)
            .map_err(|e| ConfigurationError::new(format!("Failed to parse config: {}", e)))
    }

    /// Applies command-line overrides.
    #[instrument(skip(self))]
    pub fn apply(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(host) = overrides.host {
            self.host = host;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(variant) = overrides.variant {
            self.variant = variant;
        }
        if let Some(players) = overrides.players {
            self.players = players;
        }
        if let Some(bots) = overrides.bots {
            self.bots = bots;
        }
        if let Some(delay) = overrides.bot_delay_ms {
            self.bot_delay_ms = delay;
        }
        if overrides.move_timeout_secs.is_some() {
            self.move_timeout_secs = overrides.move_timeout_secs;
        }
        if overrides.db_path.is_some() {
            self.db_path = overrides.db_path;
        }
        if overrides.load_game.is_some() {
            self.load_game = overrides.load_game;
        }
        self
    }

    /// Checks the settings before anything is bound or opened.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] for an unsupported seat count, more
    /// bots than seats, or a resume request without a database.
    #[instrument(skip(self))]
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        SeatLayout::for_players(self.players)?;
        if self.bots > self.players {
            return Err(ConfigurationError::new(format!(
                "{} bots requested for {} seats",
                self.bots, self.players
            )));
        }
        if self.load_game.is_some() && self.db_path.is_none() {
            return Err(ConfigurationError::new(
                "Resuming a game requires a database path",
            ));
        }
        debug!("Configuration valid");
        Ok(())
    }

    /// Socket address string `host:port`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Bot thinking delay.
    pub fn bot_delay(&self) -> Duration {
        Duration::from_millis(self.bot_delay_ms)
    }

    /// Human move timeout, if bounded.
    pub fn move_timeout(&self) -> Option<Duration> {
        self.move_timeout_secs.map(Duration::from_secs)
    }
}

impl GameSetup for ServerConfig {
    fn selected_variant(&self) -> Variant {
        self.variant
    }

    fn selected_player_count(&self) -> usize {
        self.players
    }

    fn selected_bot_count(&self) -> usize {
        self.bots
    }

    fn new_or_load_choice(&self) -> SessionChoice {
        if self.load_game.is_some() {
            SessionChoice::Load
        } else {
            SessionChoice::New
        }
    }

    fn selected_saved_game_id(&self) -> Option<i32> {
        self.load_game
    }
}
