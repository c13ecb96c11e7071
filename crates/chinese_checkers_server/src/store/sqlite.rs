//! Sqlite store backed by diesel.

use chinese_checkers::Move;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info, instrument};

use crate::store::models::{GameRow, MoveRow, NewBoardRow, NewGameRow, NewMoveRow};
use crate::store::{GameConfig, GameStore, SavedGame, StoreError, schema};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Store writing to a sqlite database file.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db_path: String,
}

impl SqliteStore {
    /// Opens the database at `db_path`, creating it if needed, and applies
    /// any pending migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be opened or migrated.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn open(db_path: String) -> Result<Self, StoreError> {
        info!(path = %db_path, "Opening SqliteStore");
        let store = Self { db_path };
        let mut conn = store.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| StoreError::unavailable(format!("Migration failed: {}", e)))?;
        info!(count = applied.len(), "Migrations applied");
        Ok(store)
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, StoreError> {
        debug!(path = %self.db_path, "Establishing connection");
        SqliteConnection::establish(&self.db_path).map_err(|e| {
            StoreError::unavailable(format!("Failed to connect to '{}': {}", self.db_path, e))
        })
    }
}

impl GameStore for SqliteStore {
    #[instrument(skip(self))]
    fn save_game(&self, config: &GameConfig) -> Result<i32, StoreError> {
        let mut conn = self.connection()?;
        let row = NewGameRow::from_config(config)?;
        let id = diesel::insert_into(schema::games::table)
            .values(&row)
            .returning(schema::games::id)
            .get_result::<i32>(&mut conn)?;
        info!(game_id = id, "Game saved");
        Ok(id)
    }

    #[instrument(skip(self))]
    fn save_move(&self, game_id: i32, mv: &Move) -> Result<(), StoreError> {
        let mut conn = self.connection()?;
        diesel::insert_into(schema::moves::table)
            .values(&NewMoveRow::new(game_id, mv))
            .execute(&mut conn)?;
        debug!(game_id, %mv, "Move saved");
        Ok(())
    }

    #[instrument(skip(self, state))]
    fn save_board(&self, game_id: i32, state: &str) -> Result<(), StoreError> {
        let mut conn = self.connection()?;
        diesel::insert_into(schema::boards::table)
            .values(&NewBoardRow::new(game_id, state.to_string()))
            .execute(&mut conn)?;
        debug!(game_id, "Board snapshot saved");
        Ok(())
    }

    #[instrument(skip(self))]
    fn board_by_game(&self, game_id: i32) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection()?;
        let state = schema::boards::table
            .filter(schema::boards::game_id.eq(game_id))
            .order(schema::boards::id.desc())
            .select(schema::boards::state)
            .first::<String>(&mut conn)
            .optional()?;
        debug!(game_id, found = state.is_some(), "Board lookup");
        Ok(state)
    }

    #[instrument(skip(self))]
    fn game_by_id(&self, id: i32) -> Result<Option<SavedGame>, StoreError> {
        let mut conn = self.connection()?;
        let row = schema::games::table
            .find(id)
            .select(GameRow::as_select())
            .first(&mut conn)
            .optional()?;
        row.map(GameRow::into_saved).transpose()
    }

    #[instrument(skip(self))]
    fn all_games(&self) -> Result<Vec<SavedGame>, StoreError> {
        let mut conn = self.connection()?;
        let rows = schema::games::table
            .order(schema::games::id.asc())
            .select(GameRow::as_select())
            .load(&mut conn)?;
        info!(count = rows.len(), "Games loaded");
        rows.into_iter().map(GameRow::into_saved).collect()
    }

    #[instrument(skip(self))]
    fn moves_by_game(&self, game_id: i32) -> Result<Vec<Move>, StoreError> {
        let mut conn = self.connection()?;
        let rows = schema::moves::table
            .filter(schema::moves::game_id.eq(game_id))
            .order(schema::moves::id.asc())
            .select(MoveRow::as_select())
            .load(&mut conn)?;
        rows.into_iter().map(MoveRow::into_move).collect()
    }
}
