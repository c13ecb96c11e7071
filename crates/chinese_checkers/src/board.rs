//! The board engine: grid state, legality rules and state (de)serialization.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, info, instrument, warn};

use crate::action::{Cell, Move, MoveOutcome, PlayerId};
use crate::error::{BoardError, ConfigurationError};
use crate::geometry::{
    self, BASES, BLOCKED, COLS, EMPTY, GRID, PIECES_PER_PLAYER, ROWS, STEPS, SeatLayout,
};
use crate::variant::Variant;

/// Separator between rows in the serialized grid.
pub const ROW_SEPARATOR: char = ';';
/// Separator between cells of a row in the serialized grid.
pub const CELL_SEPARATOR: char = ',';

/// Typed view of a single grid value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Square {
    /// Playable and unoccupied.
    Empty,
    /// Holds a piece of the given player.
    Occupied(PlayerId),
    /// Not part of the playable surface.
    Blocked,
}

/// A Chinese Checkers board.
///
/// The grid is a fixed 17x25 matrix. `0` is an empty playable cell, `1..=6`
/// a piece of that player and `7` a cell outside the star. Only validated
/// moves and the initializers write to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    grid: [[u8; COLS]; ROWS],
    variant: Variant,
    seats: Option<SeatLayout>,
}

impl Board {
    /// Creates an empty board for the given variant. No seats are assigned
    /// until one of the initializers runs.
    #[instrument]
    pub fn new(variant: Variant) -> Self {
        Self {
            grid: GRID,
            variant,
            seats: None,
        }
    }

    /// The rule variant.
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// The seat layout, once a player count is known.
    pub fn seats(&self) -> Option<&SeatLayout> {
        self.seats.as_ref()
    }

    /// Goal slot of every seat, once a player count is known.
    pub fn opponent_base_mapping(&self) -> Option<&[usize]> {
        self.seats.as_ref().map(|s| s.goal_slots().as_slice())
    }

    /// Raw value at `cell`, or `None` off the grid.
    pub fn value(&self, cell: Cell) -> Option<u8> {
        geometry::index(cell).map(|(r, c)| self.grid[r][c])
    }

    /// Typed value at `cell`, or `None` off the grid.
    pub fn square(&self, cell: Cell) -> Option<Square> {
        self.value(cell).map(|v| match v {
            EMPTY => Square::Empty,
            BLOCKED => Square::Blocked,
            player => Square::Occupied(player),
        })
    }

    /// The raw grid.
    pub fn grid(&self) -> &[[u8; COLS]; ROWS] {
        &self.grid
    }

    // ─────────────────────────────────────────────────────────────
    //  Setup
    // ─────────────────────────────────────────────────────────────

    /// Assigns home and goal bases for `player_count` seats.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] unless `player_count` is 2, 3, 4 or 6.
    #[instrument(skip(self))]
    pub fn initialize_opponent_base_mapping(
        &mut self,
        player_count: usize,
    ) -> Result<(), ConfigurationError> {
        let layout = SeatLayout::for_players(player_count)?;
        debug!(mapping = ?layout.goal_slots(), "Opponent base mapping set");
        self.seats = Some(layout);
        Ok(())
    }

    /// Clears the board and puts 10 pieces in each seated player's home base.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] unless `player_count` is 2, 3, 4 or 6.
    #[instrument(skip(self))]
    pub fn initialize_for_players(&mut self, player_count: usize) -> Result<(), ConfigurationError> {
        let layout = SeatLayout::for_players(player_count)?;
        self.grid = GRID;
        for player in layout.players() {
            if let Some(slot) = layout.home_slot(player) {
                for cell in &BASES[slot] {
                    self.write(*cell, player);
                }
            }
        }
        self.seats = Some(layout);
        info!(player_count, "Board initialized with pieces in home bases");
        Ok(())
    }

    /// Clears the board and scatters 10 pieces per player over the cells
    /// that belong to no base.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] unless `player_count` is 2, 3, 4 or 6.
    pub fn initialize_for_chaos(&mut self, player_count: usize) -> Result<(), ConfigurationError> {
        self.initialize_for_chaos_with(player_count, &mut rand::thread_rng())
    }

    /// [`initialize_for_chaos`](Self::initialize_for_chaos) with a caller-supplied
    /// random source.
    ///
    /// The free cells are shuffled uniformly; the first ten go to player 1,
    /// the next ten to player 2, and so on.
    #[instrument(skip(self, rng))]
    pub fn initialize_for_chaos_with<R: Rng + ?Sized>(
        &mut self,
        player_count: usize,
        rng: &mut R,
    ) -> Result<(), ConfigurationError> {
        let layout = SeatLayout::for_players(player_count)?;
        self.grid = GRID;

        let mut free: Vec<Cell> = playable_cells()
            .filter(|cell| geometry::base_slot_of(*cell).is_none())
            .collect();
        free.shuffle(rng);

        let needed = player_count * PIECES_PER_PLAYER;
        if free.len() < needed {
            return Err(ConfigurationError::new(format!(
                "Only {} free cells for {} pieces",
                free.len(),
                needed
            )));
        }

        for (player, chunk) in layout.players().zip(free.chunks(PIECES_PER_PLAYER)) {
            for cell in chunk {
                self.write(*cell, player);
            }
        }
        self.seats = Some(layout);
        info!(player_count, "Board initialized with scattered pieces");
        Ok(())
    }

    /// Puts a piece of `player` on `cell`, replacing whatever was there.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotPlayable`] for a cell outside the star.
    pub fn place_piece(&mut self, cell: Cell, player: PlayerId) -> Result<(), BoardError> {
        if !geometry::is_playable(cell) || player == EMPTY || player >= BLOCKED {
            return Err(BoardError::NotPlayable(cell.row, cell.col));
        }
        self.write(cell, player);
        Ok(())
    }

    /// Empties `cell`.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotPlayable`] for a cell outside the star.
    pub fn remove_piece(&mut self, cell: Cell) -> Result<(), BoardError> {
        if !geometry::is_playable(cell) {
            return Err(BoardError::NotPlayable(cell.row, cell.col));
        }
        self.write(cell, EMPTY);
        Ok(())
    }

    fn write(&mut self, cell: Cell, value: u8) {
        if let Some((r, c)) = geometry::index(cell) {
            self.grid[r][c] = value;
        }
    }

    // ─────────────────────────────────────────────────────────────
    //  Bases
    // ─────────────────────────────────────────────────────────────

    /// Home base cells of `player`, tip first. Empty for an unknown player.
    ///
    /// Player `p` gathers into slot `p - 1` when the variant targets home,
    /// and also before a player count is set. Classic seats start from the
    /// seat layout's home slot.
    pub fn home_base_positions(&self, player: PlayerId) -> &[Cell] {
        self.home_slot(player)
            .and_then(|s| BASES.get(s))
            .map_or(&[], |b| b.as_slice())
    }

    fn home_slot(&self, player: PlayerId) -> Option<usize> {
        let own = usize::from(player).checked_sub(1);
        match &self.seats {
            Some(layout) if self.variant.targets_home() => layout.home_slot(player).and(own),
            Some(layout) => layout.home_slot(player),
            None => own,
        }
    }

    /// Goal base cells of `player`, tip first. Empty until the opponent base
    /// mapping is initialized.
    pub fn opponent_base_positions(&self, player: PlayerId) -> &[Cell] {
        self.seats
            .as_ref()
            .and_then(|layout| layout.goal_slot(player))
            .and_then(|s| BASES.get(s))
            .map_or(&[], |b| b.as_slice())
    }

    /// Whether `cell` is in the home base of `player`.
    pub fn is_in_home_base(&self, cell: Cell, player: PlayerId) -> bool {
        self.home_base_positions(player).contains(&cell)
    }

    /// Whether `cell` is in the goal base of `player`.
    pub fn is_in_opponent_base(&self, cell: Cell, player: PlayerId) -> bool {
        self.opponent_base_positions(player).contains(&cell)
    }

    /// Whether every home base cell of `player` holds one of its pieces.
    pub fn all_pieces_in_home_base(&self, player: PlayerId) -> bool {
        self.base_filled_by(self.home_base_positions(player), player)
    }

    /// Whether every goal base cell of `player` holds one of its pieces.
    pub fn is_player_in_opponent_base(&self, player: PlayerId) -> bool {
        self.base_filled_by(self.opponent_base_positions(player), player)
    }

    fn base_filled_by(&self, base: &[Cell], player: PlayerId) -> bool {
        !base.is_empty() && base.iter().all(|cell| self.value(*cell) == Some(player))
    }

    // ─────────────────────────────────────────────────────────────
    //  Queries
    // ─────────────────────────────────────────────────────────────

    /// Whether `cell` holds any piece.
    pub fn has_piece(&self, cell: Cell) -> bool {
        matches!(self.square(cell), Some(Square::Occupied(_)))
    }

    /// Whether `cell` is an empty playable cell.
    pub fn is_empty(&self, cell: Cell) -> bool {
        self.value(cell) == Some(EMPTY)
    }

    /// Cells holding a piece of `player`, in row-major order.
    pub fn pieces_of(&self, player: PlayerId) -> Vec<Cell> {
        playable_cells()
            .filter(|cell| self.value(*cell) == Some(player))
            .collect()
    }

    /// Empty cells one step away from `from`.
    pub fn possible_moves(&self, from: Cell) -> Vec<Cell> {
        STEPS
            .iter()
            .map(|(dr, dc)| from.offset(*dr, *dc))
            .filter(|to| self.is_empty(*to))
            .collect()
    }

    /// Landing cells of every single jump available from `from`: the middle
    /// cell holds a piece and the landing cell two steps away is empty.
    pub fn possible_jumps(&self, from: Cell) -> Vec<Cell> {
        STEPS
            .iter()
            .filter(|(dr, dc)| self.has_piece(from.offset(*dr, *dc)))
            .map(|(dr, dc)| from.offset(2 * dr, 2 * dc))
            .filter(|to| self.is_empty(*to))
            .collect()
    }

    /// Every distinct cell reachable from `from` by a chain of one or more
    /// jumps, in discovery order.
    pub fn jump_destinations(&self, from: Cell) -> Vec<Cell> {
        let mut seen = HashSet::from([from]);
        let mut found = Vec::new();
        let mut stack = vec![from];
        while let Some(at) = stack.pop() {
            for next in self.possible_jumps(at) {
                if seen.insert(next) {
                    found.push(next);
                    stack.push(next);
                }
            }
        }
        found
    }

    /// Whether a chain of jumps leads from `from` to `to`.
    #[instrument(skip(self))]
    pub fn is_valid_multi_jump(&self, from: Cell, to: Cell, player: PlayerId) -> bool {
        let mut path = HashSet::new();
        let reachable = self.chain_reaches(from, to, &mut path);
        debug!(player, reachable, "Jump chain search finished");
        reachable
    }

    /// Depth-first path search. `path` holds the cells of the current branch
    /// only: each cell is pushed before recursing and popped on backtrack.
    fn chain_reaches(&self, at: Cell, to: Cell, path: &mut HashSet<Cell>) -> bool {
        if at == to {
            return true;
        }
        path.insert(at);
        for next in self.possible_jumps(at) {
            if !path.contains(&next) && self.chain_reaches(next, to, path) {
                path.remove(&at);
                return true;
            }
        }
        path.remove(&at);
        false
    }

    /// Whether moving `player`'s piece from `from` to `to` is legal.
    #[instrument(skip(self))]
    pub fn is_valid_move(&self, from: Cell, to: Cell, player: PlayerId) -> bool {
        if !geometry::is_playable(from) || !geometry::is_playable(to) {
            return false;
        }
        if self.value(from) != Some(player) || !self.is_empty(to) {
            return false;
        }

        match self.variant {
            Variant::OrderOutOfChaos => {
                if self.is_in_home_base(from, player) && !self.is_in_home_base(to, player) {
                    debug!("Piece may not leave its home base");
                    return false;
                }
            }
            Variant::Classic => {
                if self.is_in_opponent_base(from, player) && !self.is_in_opponent_base(to, player)
                {
                    debug!("Piece may not leave the goal base");
                    return false;
                }
            }
        }

        is_adjacent(from, to)
            || self.is_single_jump(from, to)
            || self.is_valid_multi_jump(from, to, player)
    }

    fn is_single_jump(&self, from: Cell, to: Cell) -> bool {
        let (dr, dc) = (to.row - from.row, to.col - from.col);
        let shape = matches!(dr, -2 | 0 | 2) && matches!(dc, -2 | 0 | 2) && (dr, dc) != (0, 0);
        shape && self.has_piece(from.offset(dr / 2, dc / 2))
    }

    /// Every cell `player`'s piece at `from` may legally move to: adjacent
    /// steps, single jumps and every multi-jump landing.
    pub fn legal_destinations(&self, from: Cell, player: PlayerId) -> Vec<Cell> {
        let mut seen = HashSet::new();
        self.possible_moves(from)
            .into_iter()
            .chain(self.jump_destinations(from))
            .filter(|to| seen.insert(*to))
            .filter(|to| self.is_valid_move(from, *to, player))
            .collect()
    }

    /// Validates and applies a move. The grid changes only when the move is
    /// legal, and then exactly the two affected cells change.
    #[instrument(skip(self))]
    pub fn move_piece(&mut self, from: Cell, to: Cell, player: PlayerId) -> MoveOutcome {
        let attempted = Move::new(from, to, player);
        if !self.is_valid_move(from, to, player) {
            warn!(%from, %to, player, "Rejected move");
            return MoveOutcome::Rejected(attempted);
        }
        let piece = self.value(from).unwrap_or(player);
        self.write(to, piece);
        self.write(from, EMPTY);
        info!(%from, %to, player, "Move applied");
        MoveOutcome::Applied(attempted)
    }

    // ─────────────────────────────────────────────────────────────
    //  Serialization
    // ─────────────────────────────────────────────────────────────

    /// Compact text form: rows joined by `;`, cells within a row by `,`.
    pub fn serialize(&self) -> String {
        self.grid
            .iter()
            .map(|row| {
                row.iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(&CELL_SEPARATOR.to_string())
            })
            .collect::<Vec<_>>()
            .join(&ROW_SEPARATOR.to_string())
    }

    /// Replaces the grid with the one encoded in `text`.
    ///
    /// The text must describe the full 17x25 grid with the fixed geometry;
    /// on any error the board is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError`] describing the first problem found.
    #[instrument(skip(self, text), fields(len = text.len()))]
    pub fn deserialize(&mut self, text: &str) -> Result<(), BoardError> {
        let rows: Vec<&str> = text.trim().split(ROW_SEPARATOR).collect();
        if rows.len() != ROWS {
            return Err(BoardError::RowCount(rows.len()));
        }

        let mut grid = GRID;
        for (r, row) in rows.iter().enumerate() {
            let cells: Vec<&str> = row.split(CELL_SEPARATOR).collect();
            if cells.len() != COLS {
                return Err(BoardError::ColumnCount {
                    row: r,
                    found: cells.len(),
                });
            }
            for (c, raw) in cells.iter().enumerate() {
                let value = raw
                    .trim()
                    .parse::<u8>()
                    .ok()
                    .filter(|v| *v <= BLOCKED)
                    .ok_or_else(|| BoardError::InvalidCell {
                        row: r,
                        col: c,
                        value: raw.to_string(),
                    })?;
                if (value == BLOCKED) != (GRID[r][c] == BLOCKED) {
                    return Err(BoardError::GeometryMismatch { row: r, col: c });
                }
                grid[r][c] = value;
            }
        }

        self.grid = grid;
        debug!("Board state replaced");
        Ok(())
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.serialize())
    }
}

/// One step in any of the 8 directions.
fn is_adjacent(from: Cell, to: Cell) -> bool {
    let (dr, dc) = ((to.row - from.row).abs(), (to.col - from.col).abs());
    dr.max(dc) == 1
}

/// All playable cells in row-major order.
fn playable_cells() -> impl Iterator<Item = Cell> {
    (0..ROWS).flat_map(|r| {
        (0..COLS)
            .filter(move |c| GRID[r][*c] != BLOCKED)
            .map(move |c| Cell::new(r as i32, c as i32))
    })
}
