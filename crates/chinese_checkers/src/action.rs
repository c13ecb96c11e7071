//! Coordinates, moves and move results.
//!
//! A [`Move`] is a single already-validated state transition. The engine does
//! not keep a history of them; callers log or persist them as they see fit.

use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Seat number of a player, `1..=6`.
pub type PlayerId = u8;

/// A grid coordinate. Signed so that off-board input can be represented and
/// rejected instead of failing to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    /// Row index, `0..17` on the board.
    pub row: i32,
    /// Column index, `0..25` on the board.
    pub col: i32,
}

impl Cell {
    /// Creates a cell.
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Returns the cell displaced by `(dr, dc)`.
    pub const fn offset(self, dr: i32, dc: i32) -> Self {
        Self::new(self.row + dr, self.col + dc)
    }

    /// Triangular-grid distance `|Δrow| + |Δcol| + |Δrow + Δcol|`.
    pub fn distance(self, other: Cell) -> i32 {
        let dr = self.row - other.row;
        let dc = self.col - other.col;
        dr.abs() + dc.abs() + (dr + dc).abs()
    }
}

impl From<(i32, i32)> for Cell {
    fn from((row, col): (i32, i32)) -> Self {
        Self::new(row, col)
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

/// A piece transfer by one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    /// Source cell.
    pub from: Cell,
    /// Destination cell.
    pub to: Cell,
    /// Player owning the piece.
    pub player: PlayerId,
}

impl Move {
    /// Creates a new move.
    #[instrument]
    pub fn new(from: Cell, to: Cell, player: PlayerId) -> Self {
        Self { from, to, player }
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Gracz {}: {} -> {}", self.player, self.from, self.to)
    }
}

/// Result descriptor of [`Board::move_piece`](crate::Board::move_piece).
///
/// The `Display` form is the line sent back to the moving player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum MoveOutcome {
    /// The move was legal and the grid was updated.
    #[display("Ruch wykonany z {} na {}.", _0.from, _0.to)]
    Applied(Move),
    /// The move was illegal; the grid is untouched.
    #[display("Nieprawidłowy ruch z {} na {}.", _0.from, _0.to)]
    Rejected(Move),
}

impl MoveOutcome {
    /// Whether the move was applied.
    pub fn is_applied(&self) -> bool {
        matches!(self, MoveOutcome::Applied(_))
    }

    /// The attempted move.
    pub fn attempted(&self) -> Move {
        match self {
            MoveOutcome::Applied(mv) | MoveOutcome::Rejected(mv) => *mv,
        }
    }
}
