//! Command-line interface for the Chinese Checkers server.

use std::path::PathBuf;

use chinese_checkers::Variant;
use clap::{Parser, Subcommand};

use crate::config::ConfigOverrides;

/// Chinese Checkers - turn-based game server for network clients and bots
#[derive(Parser, Debug)]
#[command(name = "chinese_checkers_server")]
#[command(about = "Chinese Checkers game server", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Host one game and exit when it is over
    Serve {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Rule variant: classic or chaos
        #[arg(long)]
        variant: Option<Variant>,

        /// Number of seats (2, 3, 4 or 6)
        #[arg(long)]
        players: Option<usize>,

        /// How many seats are played by bots
        #[arg(long)]
        bots: Option<usize>,

        /// Resume the saved game with this id
        #[arg(long)]
        load: Option<i32>,

        /// Sqlite database file (created if it doesn't exist)
        #[arg(long)]
        db_path: Option<String>,

        /// Skip a human's turn after this many seconds
        #[arg(long)]
        move_timeout_secs: Option<u64>,

        /// Pause before each bot move, in milliseconds
        #[arg(long)]
        bot_delay_ms: Option<u64>,
    },

    /// List the games saved in a database
    Games {
        /// Sqlite database file
        #[arg(long, default_value = "chinese_checkers.db")]
        db_path: String,
    },
}

/// Collects the `serve` flags that override the config file.
#[allow(clippy::too_many_arguments)]
pub fn overrides(
    host: Option<String>,
    port: Option<u16>,
    variant: Option<Variant>,
    players: Option<usize>,
    bots: Option<usize>,
    load: Option<i32>,
    db_path: Option<String>,
    move_timeout_secs: Option<u64>,
    bot_delay_ms: Option<u64>,
) -> ConfigOverrides {
    ConfigOverrides {
        host,
        port,
        variant,
        players,
        bots,
        bot_delay_ms,
        move_timeout_secs,
        db_path,
        load_game: load,
    }
}
