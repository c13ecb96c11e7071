//! Persistence of games, moves and board snapshots.
//!
//! The coordinator only sees the [`GameStore`] trait. [`MemoryStore`] keeps
//! everything in process; [`SqliteStore`] writes to a sqlite file.

mod error;
mod memory;
mod models;
mod schema; // Diesel generated schema - internal use only
mod sqlite;

pub use error::{StoreError, StoreErrorKind};
pub use memory::MemoryStore;
pub use models::{GameConfig, SavedGame};
pub use sqlite::SqliteStore;

use chinese_checkers::Move;

/// Storage collaborator of the turn coordinator.
pub trait GameStore: Send + Sync + std::fmt::Debug {
    /// Saves a new game and returns its id.
    fn save_game(&self, config: &GameConfig) -> Result<i32, StoreError>;

    /// Appends an applied move to a game's history.
    fn save_move(&self, game_id: i32, mv: &Move) -> Result<(), StoreError>;

    /// Records a serialized board snapshot for a game.
    fn save_board(&self, game_id: i32, state: &str) -> Result<(), StoreError>;

    /// Latest board snapshot of a game.
    fn board_by_game(&self, game_id: i32) -> Result<Option<String>, StoreError>;

    /// Looks a game up by id.
    fn game_by_id(&self, id: i32) -> Result<Option<SavedGame>, StoreError>;

    /// Every saved game, oldest first.
    fn all_games(&self) -> Result<Vec<SavedGame>, StoreError>;

    /// Move history of a game in the order the moves were played.
    fn moves_by_game(&self, game_id: i32) -> Result<Vec<Move>, StoreError>;
}
