//! Player connections.
//!
//! The turn loop talks to every seat through [`PlayerConnection`], whether
//! the seat is a network client or a bot.

mod bot;
mod human;

pub use bot::BotConnection;
pub use human::{HumanConnection, LineReader, LineWriter};

use chinese_checkers::PlayerId;

/// A seat's line-oriented channel to the coordinator.
#[async_trait::async_trait]
pub trait PlayerConnection: Send {
    /// Seat of this connection.
    fn player_id(&self) -> PlayerId;

    /// Delivers one line. Delivery failures mark the connection as closed.
    async fn send(&mut self, line: &str);

    /// Waits for the player's next command. `None` means the player is gone.
    async fn receive_move(&mut self) -> Option<String>;

    /// Whether the player is still reachable.
    async fn is_connected(&mut self) -> bool;

    /// Releases the connection.
    async fn close(&mut self);
}
