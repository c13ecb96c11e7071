//! Error types for the board engine and the line protocol.

use derive_more::{Display, Error};
use tracing::instrument;

/// Invalid game setup, such as an unsupported number of seats.
///
/// Fatal to game setup: it must reach the operator before any socket is opened.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Configuration error: {} at {}:{}", message, file, line)]
pub struct ConfigurationError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigurationError {
    /// Creates a new configuration error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Error for a player count outside `{2, 3, 4, 6}`.
    #[track_caller]
    pub fn invalid_player_count(count: usize) -> Self {
        Self::new(format!("Nieprawidłowa ilość graczy: {}", count))
    }
}

/// Malformed client input. Recoverable: the sender is told and may retry.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum ProtocolError {
    /// The line is not a known command.
    #[display("Unknown command: {}", _0)]
    UnknownCommand(#[error(not(source))] String),

    /// A move command without exactly two coordinate pairs.
    #[display("Malformed move: {}", _0)]
    MalformedMove(#[error(not(source))] String),

    /// A coordinate that is not an integer.
    #[display("Invalid coordinate: {}", _0)]
    InvalidCoordinate(#[error(not(source))] String),
}

/// Failure to load a board from its serialized form or to edit a cell.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum BoardError {
    /// The text does not contain exactly 17 rows.
    #[display("Expected 17 rows, found {}", _0)]
    RowCount(#[error(not(source))] usize),

    /// A row does not contain exactly 25 cells.
    #[display("Row {} has {} cells, expected 25", row, found)]
    ColumnCount {
        /// Offending row.
        row: usize,
        /// Number of cells found.
        found: usize,
    },

    /// A cell is not a number in `0..=7`.
    #[display("Invalid cell value '{}' at ({},{})", value, row, col)]
    InvalidCell {
        /// Row of the cell.
        row: usize,
        /// Column of the cell.
        col: usize,
        /// Raw text of the cell.
        value: String,
    },

    /// A cell disagrees with the fixed board geometry.
    #[display("Cell ({},{}) does not match the board geometry", row, col)]
    GeometryMismatch {
        /// Row of the cell.
        row: usize,
        /// Column of the cell.
        col: usize,
    },

    /// Attempt to edit a cell that is not on the playable surface.
    #[display("Cell ({},{}) is not playable", _0, _1)]
    NotPlayable(i32, i32),
}
