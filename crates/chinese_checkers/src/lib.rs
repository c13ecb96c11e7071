//! Chinese Checkers game logic.
//!
//! Pure rules with no I/O: the star-shaped board, move legality including
//! multi-jump chains, both rule variants, the text line protocol and a
//! greedy computer player.
//!
//! # Architecture
//!
//! - **Geometry**: fixed grid, the six corner bases and seat layouts
//! - **Board**: piece placement, legality, win predicates, serialization
//! - **Protocol**: client commands and server lines
//! - **Bot**: one-ply greedy move selection
//!
//! # Example
//!
//! ```
//! use chinese_checkers::{Board, Cell, Variant};
//!
//! let mut board = Board::new(Variant::Classic);
//! board.initialize_for_players(2)?;
//! let outcome = board.move_piece(Cell::new(3, 9), Cell::new(4, 8), 1);
//! assert!(outcome.is_applied());
//! # Ok::<(), chinese_checkers::ConfigurationError>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod action;
mod board;
mod bot;
mod error;
mod geometry;
mod protocol;
mod variant;

// Crate-level exports - Board engine
pub use board::{Board, CELL_SEPARATOR, ROW_SEPARATOR, Square};

// Crate-level exports - Moves and coordinates
pub use action::{Cell, Move, MoveOutcome, PlayerId};

// Crate-level exports - Geometry
pub use geometry::{
    BASE_COUNT, BASES, BLOCKED, COLS, EMPTY, GRID, PIECES_PER_PLAYER, ROWS, SeatLayout,
    base_slot_of, is_playable,
};

// Crate-level exports - Rules
pub use variant::Variant;

// Crate-level exports - Protocol
pub use protocol::{
    BOARD_STATE_PREFIX, CLAIM_WIN, ClientMessage, MOVE_PREFIX, SKIP_TURN, ServerMessage,
    board_state, player_id,
};

// Crate-level exports - Computer player
pub use bot::{GreedyStrategy, Strategy};

// Crate-level exports - Errors
pub use error::{BoardError, ConfigurationError, ProtocolError};
