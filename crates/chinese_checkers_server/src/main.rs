//! Chinese Checkers server CLI
//!
//! Hosts a game or lists saved games.

#![warn(missing_docs)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chinese_checkers_server::{
    Cli, Command, ConfigOverrides, GameStore, MemoryStore, ServerConfig, SqliteStore, host,
    overrides,
};
use clap::Parser;
use tracing::{info, instrument};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    initialize_tracing();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            host,
            port,
            variant,
            players,
            bots,
            load,
            db_path,
            move_timeout_secs,
            bot_delay_ms,
        } => {
            let overrides = overrides(
                host,
                port,
                variant,
                players,
                bots,
                load,
                db_path,
                move_timeout_secs,
                bot_delay_ms,
            );
            run_server(config, overrides).await
        }
        Command::Games { db_path } => list_games(db_path),
    }
}

/// Hosts one game and prints the final standings.
#[instrument(skip(overrides))]
async fn run_server(config_path: Option<PathBuf>, overrides: ConfigOverrides) -> Result<()> {
    let config = match config_path {
        Some(path) => ServerConfig::from_file(path)?,
        None => {
            info!("No config file given, using defaults");
            ServerConfig::default()
        }
    }
    .apply(overrides);
    config.validate()?;

    let store: Arc<dyn GameStore> = match config.db_path() {
        Some(path) => Arc::new(SqliteStore::open(path.clone())?),
        None => {
            info!("No database configured, games are kept in memory");
            Arc::new(MemoryStore::new())
        }
    };

    let listener = tokio::net::TcpListener::bind(config.address()).await?;
    info!(
        address = %config.address(),
        variant = %config.variant(),
        players = config.players(),
        bots = config.bots(),
        "Server listening"
    );

    let standings = host(&config, listener, store).await?;
    info!(?standings, "Game finished");
    Ok(())
}

/// Prints the games saved in a database.
#[instrument]
fn list_games(db_path: String) -> Result<()> {
    let store = SqliteStore::open(db_path)?;
    let games = store.all_games()?;
    info!(count = games.len(), "Saved games loaded");
    for game in games {
        let config = game.config();
        println!(
            "{}\t{}\t{} players ({} human)\torder {:?}\t{}",
            game.id(),
            config.variant(),
            config.max_players(),
            config.human_players(),
            config.player_order(),
            game.created_at(),
        );
    }
    Ok(())
}

#[instrument]
fn initialize_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,chinese_checkers=debug,chinese_checkers_server=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Tracing initialized");
}
