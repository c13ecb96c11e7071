//! Fixed board geometry: the star-shaped grid, the six corner bases and the
//! seat layouts for each supported player count.

use crate::action::{Cell, PlayerId};
use crate::error::ConfigurationError;
use tracing::instrument;

/// Number of grid rows.
pub const ROWS: usize = 17;
/// Number of grid columns.
pub const COLS: usize = 25;
/// Value of an empty playable cell.
pub const EMPTY: u8 = 0;
/// Value of a cell outside the playable surface.
pub const BLOCKED: u8 = 7;
/// Pieces each player owns.
pub const PIECES_PER_PLAYER: usize = 10;
/// Number of corner bases.
pub const BASE_COUNT: usize = 6;

const X: u8 = BLOCKED;

/// Empty board. Every game starts from this layout; only `0` cells are
/// ever written afterwards.
#[rustfmt::skip]
pub const GRID: [[u8; COLS]; ROWS] = [
    [X, X, X, X, X, X, X, X, X, X, X, X, 0, X, X, X, X, X, X, X, X, X, X, X, X],
    [X, X, X, X, X, X, X, X, X, X, X, 0, X, 0, X, X, X, X, X, X, X, X, X, X, X],
    [X, X, X, X, X, X, X, X, X, X, 0, X, 0, X, 0, X, X, X, X, X, X, X, X, X, X],
    [X, X, X, X, X, X, X, X, X, 0, X, 0, X, 0, X, 0, X, X, X, X, X, X, X, X, X],
    [0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0],
    [X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X],
    [X, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, X],
    [X, X, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, X, X],
    [X, X, X, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, X, X, X],
    [X, X, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, X, X],
    [X, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, X],
    [X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X],
    [0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0, X, 0],
    [X, X, X, X, X, X, X, X, X, 0, X, 0, X, 0, X, 0, X, X, X, X, X, X, X, X, X],
    [X, X, X, X, X, X, X, X, X, X, 0, X, 0, X, 0, X, X, X, X, X, X, X, X, X, X],
    [X, X, X, X, X, X, X, X, X, X, X, 0, X, 0, X, X, X, X, X, X, X, X, X, X, X],
    [X, X, X, X, X, X, X, X, X, X, X, X, 0, X, X, X, X, X, X, X, X, X, X, X, X],
];

const fn c(row: i32, col: i32) -> Cell {
    Cell::new(row, col)
}

/// Cells of the six corner bases, indexed by slot.
///
/// Within a base the cells are listed tip first, which is also the order in
/// which a goal base is filled.
pub const BASES: [[Cell; PIECES_PER_PLAYER]; BASE_COUNT] = [
    // 0: top
    [c(0, 12), c(1, 11), c(1, 13), c(2, 10), c(2, 12), c(2, 14), c(3, 9), c(3, 11), c(3, 13), c(3, 15)],
    // 1: bottom
    [c(16, 12), c(15, 11), c(15, 13), c(14, 10), c(14, 12), c(14, 14), c(13, 9), c(13, 11), c(13, 13), c(13, 15)],
    // 2: lower left
    [c(12, 0), c(11, 1), c(12, 2), c(10, 2), c(11, 3), c(12, 4), c(9, 3), c(10, 4), c(11, 5), c(12, 6)],
    // 3: lower right
    [c(12, 24), c(11, 23), c(12, 22), c(10, 22), c(9, 21), c(11, 21), c(10, 20), c(12, 20), c(11, 19), c(12, 18)],
    // 4: upper left
    [c(4, 0), c(5, 1), c(4, 2), c(6, 2), c(5, 3), c(4, 4), c(5, 5), c(6, 4), c(7, 3), c(4, 6)],
    // 5: upper right
    [c(4, 24), c(5, 23), c(4, 22), c(6, 22), c(5, 21), c(7, 21), c(4, 20), c(6, 20), c(4, 18), c(5, 19)],
];

/// The 8 unit displacements: 4 orthogonal, 4 diagonal.
pub const STEPS: [(i32, i32); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (1, 1),
    (-1, 1),
    (1, -1),
];

/// Whether `cell` lies inside the grid and on the playable surface.
pub fn is_playable(cell: Cell) -> bool {
    index(cell).is_some_and(|(r, c)| GRID[r][c] != BLOCKED)
}

/// Converts a cell into grid indices if it lies inside the 17x25 grid.
pub fn index(cell: Cell) -> Option<(usize, usize)> {
    let r = usize::try_from(cell.row).ok()?;
    let c = usize::try_from(cell.col).ok()?;
    (r < ROWS && c < COLS).then_some((r, c))
}

/// Slot of the base containing `cell`, if any.
pub fn base_slot_of(cell: Cell) -> Option<usize> {
    BASES.iter().position(|base| base.contains(&cell))
}

/// Home and goal slots for every seat of a game with a given player count.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct SeatLayout {
    /// Number of seated players.
    player_count: usize,
    /// Starting corner of each seat, indexed by `player_id - 1`.
    home_slots: Vec<usize>,
    /// Goal corner of each seat (the opponent base mapping).
    goal_slots: Vec<usize>,
}

impl SeatLayout {
    /// Returns the layout for `player_count` seats.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] unless `player_count` is 2, 3, 4 or 6.
    #[instrument]
    pub fn for_players(player_count: usize) -> Result<Self, ConfigurationError> {
        let (home, goal): (&[usize], &[usize]) = match player_count {
            2 => (&[0, 1], &[1, 0]),
            3 => (&[0, 3, 2], &[1, 4, 5]),
            4 => (&[4, 5, 2, 3], &[3, 2, 5, 4]),
            6 => (&[0, 1, 2, 3, 4, 5], &[1, 0, 5, 4, 3, 2]),
            other => return Err(ConfigurationError::invalid_player_count(other)),
        };
        Ok(Self {
            player_count,
            home_slots: home.to_vec(),
            goal_slots: goal.to_vec(),
        })
    }

    /// Home slot of `player`, if seated.
    pub fn home_slot(&self, player: PlayerId) -> Option<usize> {
        seat_index(player).and_then(|i| self.home_slots.get(i).copied())
    }

    /// Goal slot of `player`, if seated.
    pub fn goal_slot(&self, player: PlayerId) -> Option<usize> {
        seat_index(player).and_then(|i| self.goal_slots.get(i).copied())
    }

    /// Seated player ids in ascending order.
    pub fn players(&self) -> impl Iterator<Item = PlayerId> + '_ {
        (1..=self.player_count).filter_map(|p| PlayerId::try_from(p).ok())
    }
}

fn seat_index(player: PlayerId) -> Option<usize> {
    usize::from(player).checked_sub(1)
}
