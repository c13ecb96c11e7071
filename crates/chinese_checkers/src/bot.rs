//! Move selection for computer-controlled seats.

use tracing::{debug, instrument, warn};

use crate::action::{Cell, Move, PlayerId};
use crate::board::Board;

/// Picks a move for a seat from the current board.
pub trait Strategy: Send + Sync {
    /// Returns the chosen move, or `None` when no piece can move.
    fn choose_move(&self, board: &Board, player: PlayerId) -> Option<Move>;
}

/// One-ply greedy strategy.
///
/// Every legal destination of every piece that is not already parked in the
/// filled tip of the target base is scored by how much it shortens the
/// distance to the front-most unfilled target cell. The biggest gain wins;
/// on a tie the piece farthest from the target moves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GreedyStrategy;

impl GreedyStrategy {
    /// Target cells of `player` under the board's variant, tip first.
    fn targets(board: &Board, player: PlayerId) -> &[Cell] {
        if board.variant().targets_home() {
            board.home_base_positions(player)
        } else {
            board.opponent_base_positions(player)
        }
    }

    /// Number of leading target cells already holding the player's pieces.
    fn filled_prefix(board: &Board, targets: &[Cell], player: PlayerId) -> usize {
        targets
            .iter()
            .take_while(|cell| board.value(**cell) == Some(player))
            .count()
    }
}

impl Strategy for GreedyStrategy {
    #[instrument(skip(self, board))]
    fn choose_move(&self, board: &Board, player: PlayerId) -> Option<Move> {
        let targets = Self::targets(board, player);
        if targets.is_empty() {
            warn!(player, "No target base assigned");
            return None;
        }
        let filled = Self::filled_prefix(board, targets, player);
        let parked = &targets[..filled];
        let aim = targets.get(filled).or(targets.last()).copied()?;

        let mut best: Option<(i32, i32, Move)> = None;
        for piece in board.pieces_of(player) {
            if parked.contains(&piece) {
                continue;
            }
            let start = piece.distance(aim);
            for dest in board.legal_destinations(piece, player) {
                let progress = dest.distance(aim) - start;
                let better = match &best {
                    None => true,
                    Some((best_progress, best_start, _)) => {
                        progress < *best_progress
                            || (progress == *best_progress && start > *best_start)
                    }
                };
                if better {
                    best = Some((progress, start, Move::new(piece, dest, player)));
                }
            }
        }

        match &best {
            Some((progress, _, mv)) => debug!(%mv, progress, %aim, "Bot chose move"),
            None => debug!(player, "Bot has no legal move"),
        }
        best.map(|(_, _, mv)| mv)
    }
}
