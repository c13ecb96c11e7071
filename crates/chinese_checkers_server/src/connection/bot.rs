//! Computer-controlled seat.

use std::time::Duration;

use chinese_checkers::{
    Board, BoardError, ClientMessage, ConfigurationError, GreedyStrategy, PlayerId, SKIP_TURN,
    Strategy, Variant, board_state,
};
use tracing::{debug, info, instrument, warn};

use super::PlayerConnection;

/// A seat played by a [`Strategy`].
///
/// The bot keeps its own copy of the board and refreshes it from every
/// board state broadcast it receives.
pub struct BotConnection {
    player_id: PlayerId,
    board: Board,
    strategy: Box<dyn Strategy>,
    delay: Duration,
}

impl std::fmt::Debug for BotConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConnection")
            .field("player_id", &self.player_id)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl BotConnection {
    /// Creates a greedy bot for seat `player_id` of a `player_count`-seat game.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] for an unsupported seat count.
    #[instrument]
    pub fn new(
        player_id: PlayerId,
        variant: Variant,
        player_count: usize,
        delay: Duration,
    ) -> Result<Self, ConfigurationError> {
        Self::with_strategy(player_id, variant, player_count, delay, Box::new(GreedyStrategy))
    }

    /// Creates a bot driven by any strategy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] for an unsupported seat count.
    pub fn with_strategy(
        player_id: PlayerId,
        variant: Variant,
        player_count: usize,
        delay: Duration,
        strategy: Box<dyn Strategy>,
    ) -> Result<Self, ConfigurationError> {
        let mut board = Board::new(variant);
        board.initialize_opponent_base_mapping(player_count)?;
        info!(player_id, %variant, player_count, "Bot seated");
        Ok(Self {
            player_id,
            board,
            strategy,
            delay,
        })
    }

    /// Replaces the bot's board copy with a broadcast grid.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError`] if the text is not a valid grid; the copy is
    /// left unchanged.
    pub fn apply_broadcast_state(&mut self, state: &str) -> Result<(), BoardError> {
        self.board.deserialize(state)
    }

    /// The bot's current board copy.
    pub fn board(&self) -> &Board {
        &self.board
    }
}

#[async_trait::async_trait]
impl PlayerConnection for BotConnection {
    fn player_id(&self) -> PlayerId {
        self.player_id
    }

    async fn send(&mut self, line: &str) {
        if let Some(state) = board_state(line) {
            if let Err(e) = self.apply_broadcast_state(state) {
                warn!(player_id = self.player_id, error = %e, "Ignoring malformed board state");
            }
        }
    }

    #[instrument(skip(self), fields(player_id = self.player_id))]
    async fn receive_move(&mut self) -> Option<String> {
        tokio::time::sleep(self.delay).await;
        let reply = match self.strategy.choose_move(&self.board, self.player_id) {
            Some(mv) => ClientMessage::Move {
                from: mv.from,
                to: mv.to,
            }
            .to_string(),
            None => SKIP_TURN.to_string(),
        };
        debug!(%reply, "Bot answered");
        Some(reply)
    }

    async fn is_connected(&mut self) -> bool {
        true
    }

    async fn close(&mut self) {}
}
