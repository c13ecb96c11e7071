//! Tests for the greedy computer player.

use chinese_checkers::{
    BASES, Board, Cell, GreedyStrategy, Move, PIECES_PER_PLAYER, Strategy, Variant,
};

fn empty_board(variant: Variant, players: usize) -> Board {
    let mut board = Board::new(variant);
    board.initialize_opponent_base_mapping(players).unwrap();
    board
}

#[test]
fn test_takes_longest_jump_chain() {
    let mut board = empty_board(Variant::Classic, 2);
    board.place_piece(Cell::new(4, 4), 1).unwrap();
    for mid in [Cell::new(5, 5), Cell::new(7, 7), Cell::new(9, 9)] {
        board.place_piece(mid, 2).unwrap();
    }
    let mv = GreedyStrategy.choose_move(&board, 1);
    assert_eq!(mv, Some(Move::new(Cell::new(4, 4), Cell::new(10, 10), 1)));
}

#[test]
fn test_tie_moves_piece_farthest_behind() {
    let mut board = empty_board(Variant::Classic, 2);
    board.place_piece(Cell::new(8, 12), 1).unwrap();
    board.place_piece(Cell::new(4, 12), 1).unwrap();
    let mv = GreedyStrategy.choose_move(&board, 1).unwrap();
    assert_eq!(mv, Move::new(Cell::new(4, 12), Cell::new(5, 13), 1));
}

#[test]
fn test_parked_pieces_stay_put() {
    let mut board = empty_board(Variant::Classic, 2);
    board.place_piece(BASES[1][0], 1).unwrap();
    board.place_piece(Cell::new(8, 12), 1).unwrap();
    let mv = GreedyStrategy.choose_move(&board, 1).unwrap();
    assert_eq!(mv.from, Cell::new(8, 12));
}

#[test]
fn test_chaos_bot_heads_home() {
    let mut board = empty_board(Variant::OrderOutOfChaos, 2);
    board.place_piece(Cell::new(8, 12), 1).unwrap();
    let mv = GreedyStrategy.choose_move(&board, 1).unwrap();
    let home_tip = board.home_base_positions(1)[0];
    assert!(mv.to.distance(home_tip) < mv.from.distance(home_tip));
}

#[test]
fn test_choices_are_legal_for_every_seat() {
    for n in [2, 3, 4, 6] {
        let mut board = Board::new(Variant::Classic);
        board.initialize_for_players(n).unwrap();
        for player in 1..=n as u8 {
            let mv = GreedyStrategy.choose_move(&board, player).unwrap();
            assert_eq!(mv.player, player);
            assert!(board.is_valid_move(mv.from, mv.to, player), "{}", mv);
        }
    }
}

#[test]
fn test_self_play_keeps_piece_counts() {
    let mut board = Board::new(Variant::Classic);
    board.initialize_for_players(2).unwrap();
    for turn in 0..120 {
        let player = (turn % 2 + 1) as u8;
        if let Some(mv) = GreedyStrategy.choose_move(&board, player) {
            assert!(board.move_piece(mv.from, mv.to, player).is_applied(), "{}", mv);
        }
    }
    assert_eq!(board.pieces_of(1).len(), PIECES_PER_PLAYER);
    assert_eq!(board.pieces_of(2).len(), PIECES_PER_PLAYER);
}
