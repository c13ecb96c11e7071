//! Chinese Checkers server library
//!
//! Hosts one game at a time over a line-oriented TCP protocol. Network
//! clients and bots sit behind the same connection trait; a single
//! coordinator owns the board and runs the turns.
//!
//! # Architecture
//!
//! - **Admission**: accepts sockets and hands them to the coordinator
//! - **Connection**: human (TCP) and bot seats behind [`PlayerConnection`]
//! - **Coordinator**: seating, turn order, turn loop, standings
//! - **Store**: game, move and board persistence (sqlite or in-memory)
//! - **Session**: wires the above together for one hosted game
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use chinese_checkers_server::{MemoryStore, ServerConfig, host};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ServerConfig::default();
//! let listener = tokio::net::TcpListener::bind(config.address()).await?;
//! let standings = host(&config, listener, Arc::new(MemoryStore::new())).await?;
//! println!("{:?}", standings);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod admission;
mod cli;
mod config;
mod connection;
mod coordinator;
mod session;
mod store;

// Crate-level exports - Admission
pub use admission::{Joiner, spawn_acceptor};

// Crate-level exports - Command line
pub use cli::{Cli, Command, overrides};

// Crate-level exports - Configuration
pub use config::{ConfigOverrides, GameSetup, ServerConfig, SessionChoice};

// Crate-level exports - Connections
pub use connection::{BotConnection, HumanConnection, LineReader, LineWriter, PlayerConnection};

// Crate-level exports - Turn coordination
pub use coordinator::{CoordinatorError, Phase, TurnCoordinator};

// Crate-level exports - Session
pub use session::host;

// Crate-level exports - Persistence
pub use store::{
    GameConfig, GameStore, MemoryStore, SavedGame, SqliteStore, StoreError, StoreErrorKind,
};
