//! Stored records and their database rows.

use chinese_checkers::{Cell, Move, PlayerId, Variant};
use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::store::{StoreError, schema};

/// Settings a game was started with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct GameConfig {
    /// Rule variant.
    variant: Variant,
    /// Number of seats.
    max_players: usize,
    /// Seats taken by network clients; the rest are bots.
    human_players: usize,
    /// Turn order fixed at the start of the game.
    player_order: Vec<PlayerId>,
}

/// A game as returned by a store.
#[derive(Debug, Clone, PartialEq, Eq, Getters, new)]
pub struct SavedGame {
    /// Store-assigned id.
    id: i32,
    /// Settings of the game.
    config: GameConfig,
    /// When the game was saved.
    created_at: NaiveDateTime,
}

/// Game row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = schema::games)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub(super) struct GameRow {
    id: i32,
    variant: String,
    max_players: i32,
    human_players: i32,
    player_order: String,
    created_at: NaiveDateTime,
}

impl GameRow {
    /// Decodes the row into a [`SavedGame`].
    #[instrument(skip(self), fields(id = self.id))]
    pub(super) fn into_saved(self) -> Result<SavedGame, StoreError> {
        let variant = self
            .variant
            .parse::<Variant>()
            .map_err(|e| StoreError::corrupt(format!("Invalid variant '{}': {}", self.variant, e)))?;
        let player_order: Vec<PlayerId> = serde_json::from_str(&self.player_order)?;
        let config = GameConfig::new(
            variant,
            to_count(self.max_players)?,
            to_count(self.human_players)?,
            player_order,
        );
        Ok(SavedGame::new(self.id, config, self.created_at))
    }
}

/// Insertable game row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::games)]
pub(super) struct NewGameRow {
    variant: String,
    max_players: i32,
    human_players: i32,
    player_order: String,
}

impl NewGameRow {
    /// Encodes a [`GameConfig`].
    #[instrument(skip(config))]
    pub(super) fn from_config(config: &GameConfig) -> Result<Self, StoreError> {
        Ok(Self {
            variant: config.variant().to_string(),
            max_players: to_column(*config.max_players())?,
            human_players: to_column(*config.human_players())?,
            player_order: serde_json::to_string(config.player_order())?,
        })
    }
}

/// Move row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = schema::moves)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub(super) struct MoveRow {
    id: i32,
    player: i32,
    start_row: i32,
    start_col: i32,
    end_row: i32,
    end_col: i32,
}

impl MoveRow {
    /// Decodes the row into a [`Move`].
    pub(super) fn into_move(self) -> Result<Move, StoreError> {
        let player = PlayerId::try_from(self.player)
            .map_err(|_| StoreError::corrupt(format!("Invalid player {} in move {}", self.player, self.id)))?;
        Ok(Move::new(
            Cell::new(self.start_row, self.start_col),
            Cell::new(self.end_row, self.end_col),
            player,
        ))
    }
}

/// Insertable move row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::moves)]
pub(super) struct NewMoveRow {
    game_id: i32,
    player: i32,
    start_row: i32,
    start_col: i32,
    end_row: i32,
    end_col: i32,
}

impl NewMoveRow {
    /// Encodes a move of game `game_id`.
    pub(super) fn new(game_id: i32, mv: &Move) -> Self {
        Self {
            game_id,
            player: i32::from(mv.player),
            start_row: mv.from.row,
            start_col: mv.from.col,
            end_row: mv.to.row,
            end_col: mv.to.col,
        }
    }
}

/// Insertable board snapshot row.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::boards)]
pub(super) struct NewBoardRow {
    game_id: i32,
    state: String,
}

fn to_column(count: usize) -> Result<i32, StoreError> {
    i32::try_from(count).map_err(|_| StoreError::corrupt(format!("Count {} out of range", count)))
}

fn to_count(value: i32) -> Result<usize, StoreError> {
    usize::try_from(value).map_err(|_| StoreError::corrupt(format!("Negative count {}", value)))
}
