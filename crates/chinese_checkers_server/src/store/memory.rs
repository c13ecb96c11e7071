//! In-process store.

use std::sync::Mutex;

use chinese_checkers::Move;
use tracing::{debug, instrument};

use crate::store::{GameConfig, GameStore, SavedGame, StoreError, StoreErrorKind};

#[derive(Debug, Default)]
struct Tables {
    games: Vec<SavedGame>,
    moves: Vec<(i32, Move)>,
    boards: Vec<(i32, String)>,
}

/// Store that keeps every record in memory for the life of the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl GameStore for MemoryStore {
    #[instrument(skip(self))]
    fn save_game(&self, config: &GameConfig) -> Result<i32, StoreError> {
        let mut tables = self.tables.lock()?;
        let id = i32::try_from(tables.games.len() + 1)
            .map_err(|_| StoreError::new(StoreErrorKind::Exhausted, "Game id space exhausted"))?;
        let created_at = chrono::Utc::now().naive_utc();
        tables.games.push(SavedGame::new(id, config.clone(), created_at));
        debug!(game_id = id, "Game saved in memory");
        Ok(id)
    }

    #[instrument(skip(self))]
    fn save_move(&self, game_id: i32, mv: &Move) -> Result<(), StoreError> {
        self.tables.lock()?.moves.push((game_id, *mv));
        Ok(())
    }

    #[instrument(skip(self, state))]
    fn save_board(&self, game_id: i32, state: &str) -> Result<(), StoreError> {
        self.tables.lock()?.boards.push((game_id, state.to_string()));
        Ok(())
    }

    #[instrument(skip(self))]
    fn board_by_game(&self, game_id: i32) -> Result<Option<String>, StoreError> {
        let tables = self.tables.lock()?;
        Ok(tables
            .boards
            .iter()
            .rev()
            .find(|(id, _)| *id == game_id)
            .map(|(_, state)| state.clone()))
    }

    #[instrument(skip(self))]
    fn game_by_id(&self, id: i32) -> Result<Option<SavedGame>, StoreError> {
        let tables = self.tables.lock()?;
        Ok(tables.games.iter().find(|g| *g.id() == id).cloned())
    }

    #[instrument(skip(self))]
    fn all_games(&self) -> Result<Vec<SavedGame>, StoreError> {
        Ok(self.tables.lock()?.games.clone())
    }

    #[instrument(skip(self))]
    fn moves_by_game(&self, game_id: i32) -> Result<Vec<Move>, StoreError> {
        let tables = self.tables.lock()?;
        Ok(tables
            .moves
            .iter()
            .filter(|(id, _)| *id == game_id)
            .map(|(_, mv)| *mv)
            .collect())
    }
}
