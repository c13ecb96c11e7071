//! Tests for board setup, move legality and serialization.

use chinese_checkers::{
    BASES, BLOCKED, Board, BoardError, Cell, EMPTY, MoveOutcome, PIECES_PER_PLAYER, Variant,
};

fn empty_board(variant: Variant, players: usize) -> Board {
    let mut board = Board::new(variant);
    board.initialize_opponent_base_mapping(players).unwrap();
    board
}

fn started(players: usize) -> Board {
    let mut board = Board::new(Variant::Classic);
    board.initialize_for_players(players).unwrap();
    board
}

fn changed_cells(before: &Board, after: &Board) -> Vec<(usize, usize)> {
    let mut changed = Vec::new();
    for (r, (a, b)) in before.grid().iter().zip(after.grid()).enumerate() {
        for (c, (x, y)) in a.iter().zip(b).enumerate() {
            if x != y {
                changed.push((r, c));
            }
        }
    }
    changed
}

#[test]
fn test_initialize_places_ten_pieces_in_each_home() {
    for n in [2, 3, 4, 6] {
        let board = started(n);
        for player in 1..=n as u8 {
            let pieces = board.pieces_of(player);
            assert_eq!(pieces.len(), PIECES_PER_PLAYER, "{} players, player {}", n, player);
            assert!(pieces.iter().all(|p| board.is_in_home_base(*p, player)));
            assert!(board.all_pieces_in_home_base(player));
        }
        assert!(board.pieces_of(n as u8 + 1).is_empty());
    }
}

#[test]
fn test_opponent_base_mapping_tables() {
    let expected: [(usize, &[usize]); 4] = [
        (2, &[1, 0]),
        (3, &[1, 4, 5]),
        (4, &[3, 2, 5, 4]),
        (6, &[1, 0, 5, 4, 3, 2]),
    ];
    for (n, mapping) in expected {
        let board = empty_board(Variant::Classic, n);
        assert_eq!(board.opponent_base_mapping(), Some(mapping));
        for (i, slot) in mapping.iter().enumerate() {
            assert_eq!(board.opponent_base_positions(i as u8 + 1), &BASES[*slot]);
        }
    }
}

#[test]
fn test_five_players_rejected() {
    let mut board = Board::new(Variant::Classic);
    let err = board.initialize_for_players(5).unwrap_err();
    assert!(err.message.contains("5"));
    assert!(board.initialize_opponent_base_mapping(5).is_err());
    assert!(board.initialize_for_chaos(5).is_err());
    assert!(board.pieces_of(1).is_empty());
}

#[test]
fn test_bottom_tip_is_goal_of_player_one() {
    let board = empty_board(Variant::Classic, 2);
    assert!(board.is_in_opponent_base(Cell::new(16, 12), 1));
    assert!(board.is_in_opponent_base(Cell::new(0, 12), 2));
}

#[test]
fn test_opening_step() {
    let mut board = started(2);
    assert!(board.is_valid_move(Cell::new(3, 9), Cell::new(4, 8), 1));
    let outcome = board.move_piece(Cell::new(3, 9), Cell::new(4, 8), 1);
    assert!(outcome.is_applied());
    assert_eq!(outcome.to_string(), "Ruch wykonany z (3,9) na (4,8).");
    assert_eq!(board.value(Cell::new(4, 8)), Some(1));
    assert_eq!(board.value(Cell::new(3, 9)), Some(EMPTY));
}

#[test]
fn test_valid_move_changes_exactly_two_cells() {
    let mut board = started(3);
    let before = board.clone();
    assert!(board.move_piece(Cell::new(3, 11), Cell::new(4, 12), 1).is_applied());
    assert_eq!(changed_cells(&before, &board), vec![(3, 11), (4, 12)]);
}

#[test]
fn test_invalid_move_leaves_grid_untouched() {
    let mut board = started(2);
    let before = board.clone();
    let attempts = [
        (Cell::new(3, 9), Cell::new(5, 9), 1),   // not a step or jump
        (Cell::new(3, 9), Cell::new(3, 11), 1),  // destination occupied
        (Cell::new(3, 9), Cell::new(4, 8), 2),   // someone else's piece
        (Cell::new(4, 8), Cell::new(5, 9), 1),   // empty source
        (Cell::new(3, 9), Cell::new(3, 8), 1),   // blocked cell
        (Cell::new(3, 9), Cell::new(-1, 9), 1),  // off the grid
        (Cell::new(0, 12), Cell::new(0, 12), 1), // no displacement
    ];
    for (from, to, player) in attempts {
        let outcome = board.move_piece(from, to, player);
        assert!(
            matches!(outcome, MoveOutcome::Rejected(_)),
            "{} -> {} by {}",
            from,
            to,
            player
        );
    }
    assert_eq!(board, before);
}

#[test]
fn test_single_jump_over_occupied_neighbour() {
    let mut board = empty_board(Variant::Classic, 2);
    board.place_piece(Cell::new(4, 8), 1).unwrap();
    board.place_piece(Cell::new(5, 7), 2).unwrap();
    assert!(board.is_valid_move(Cell::new(4, 8), Cell::new(6, 6), 1));
    assert!(board.possible_jumps(Cell::new(4, 8)).contains(&Cell::new(6, 6)));
}

#[test]
fn test_two_hop_chain() {
    let mut board = empty_board(Variant::Classic, 2);
    board.place_piece(Cell::new(6, 6), 1).unwrap();
    board.place_piece(Cell::new(7, 5), 2).unwrap();
    board.place_piece(Cell::new(9, 3), 2).unwrap();
    assert!(board.is_valid_move(Cell::new(6, 6), Cell::new(10, 2), 1));
}

#[test]
fn test_three_hop_chain() {
    let mut board = empty_board(Variant::Classic, 2);
    let start = Cell::new(4, 4);
    let target = Cell::new(10, 10);
    board.place_piece(start, 1).unwrap();
    for mid in [Cell::new(5, 5), Cell::new(7, 7), Cell::new(9, 9)] {
        board.place_piece(mid, 2).unwrap();
    }

    let single = board.possible_jumps(start);
    assert_eq!(single, vec![Cell::new(6, 6)]);
    assert!(board.is_valid_multi_jump(start, target, 1));
    assert!(board.is_valid_move(start, target, 1));
    assert!(board.jump_destinations(start).contains(&target));

    board.remove_piece(Cell::new(7, 7)).unwrap();
    assert!(!board.is_valid_move(start, target, 1));
}

#[test]
fn test_classic_piece_cannot_leave_goal_base() {
    let mut board = empty_board(Variant::Classic, 2);
    board.place_piece(Cell::new(13, 11), 1).unwrap();
    assert!(board.is_in_opponent_base(Cell::new(13, 11), 1));
    assert!(!board.is_valid_move(Cell::new(13, 11), Cell::new(12, 10), 1));
    assert!(board.is_valid_move(Cell::new(13, 11), Cell::new(14, 12), 1));
}

#[test]
fn test_chaos_piece_cannot_leave_home_base() {
    let mut board = empty_board(Variant::OrderOutOfChaos, 2);
    board.place_piece(Cell::new(3, 9), 1).unwrap();
    assert!(!board.is_valid_move(Cell::new(3, 9), Cell::new(4, 8), 1));
    assert!(board.is_valid_move(Cell::new(3, 9), Cell::new(2, 10), 1));

    board.place_piece(Cell::new(4, 10), 1).unwrap();
    assert!(board.is_valid_move(Cell::new(4, 10), Cell::new(3, 11), 1));
}

#[test]
fn test_goal_predicates() {
    let mut board = empty_board(Variant::Classic, 2);
    assert!(!board.is_player_in_opponent_base(1));
    for cell in &BASES[1][..9] {
        board.place_piece(*cell, 1).unwrap();
    }
    assert!(!board.is_player_in_opponent_base(1));
    board.place_piece(BASES[1][9], 1).unwrap();
    assert!(board.is_player_in_opponent_base(1));
    assert!(!board.is_player_in_opponent_base(2));
}

#[test]
fn test_legal_destinations_are_all_valid() {
    let mut board = started(2);
    board.place_piece(Cell::new(4, 10), 2).unwrap();
    let from = Cell::new(3, 9);
    let dests = board.legal_destinations(from, 1);
    assert!(dests.contains(&Cell::new(4, 8)));
    assert!(dests.contains(&Cell::new(5, 11)));
    assert!(dests.iter().all(|to| board.is_valid_move(from, *to, 1)));
    assert!(board.legal_destinations(Cell::new(0, 12), 1).is_empty());
}

#[test]
fn test_serialize_shape() {
    let text = started(2).serialize();
    let rows: Vec<&str> = text.split(';').collect();
    assert_eq!(rows.len(), 17);
    assert!(rows.iter().all(|r| r.split(',').count() == 25));
    assert!(rows[0].starts_with(&format!("{},", BLOCKED)));
}

#[test]
fn test_round_trip_after_play() {
    let mut board = started(6);
    assert!(board.move_piece(Cell::new(3, 9), Cell::new(4, 8), 1).is_applied());
    assert!(board.move_piece(Cell::new(13, 13), Cell::new(12, 14), 2).is_applied());

    let mut copy = Board::new(Variant::Classic);
    copy.initialize_opponent_base_mapping(6).unwrap();
    copy.deserialize(&board.serialize()).unwrap();
    assert_eq!(copy, board);
    assert_eq!(copy.to_string(), board.serialize());
}

#[test]
fn test_round_trip_chaos() {
    let mut board = Board::new(Variant::OrderOutOfChaos);
    board.initialize_for_chaos(4).unwrap();
    let mut copy = Board::new(Variant::OrderOutOfChaos);
    copy.initialize_opponent_base_mapping(4).unwrap();
    copy.deserialize(&board.serialize()).unwrap();
    assert_eq!(copy, board);
}

#[test]
fn test_deserialize_tolerates_surrounding_whitespace() {
    let board = started(2);
    let mut copy = Board::new(Variant::Classic);
    copy.initialize_opponent_base_mapping(2).unwrap();
    copy.deserialize(&format!(" {}\n", board.serialize())).unwrap();
    assert_eq!(copy, board);
}

#[test]
fn test_deserialize_rejects_out_of_range_value() {
    let mut board = Board::new(Variant::Classic);
    let text = board.serialize().replacen(",0,", ",9,", 1);
    assert!(matches!(
        board.deserialize(&text),
        Err(BoardError::InvalidCell { .. })
    ));
}

#[test]
fn test_chaos_home_is_own_slot_for_any_seat_count() {
    for count in [3, 4] {
        let mut board = Board::new(Variant::OrderOutOfChaos);
        board.initialize_opponent_base_mapping(count).unwrap();
        for cell in BASES[0] {
            board.place_piece(cell, 1).unwrap();
        }
        assert_eq!(board.home_base_positions(1), &BASES[0]);
        assert_eq!(board.home_base_positions(3), &BASES[2]);
        assert!(board.all_pieces_in_home_base(1), "{count} seats");
        assert!(!board.all_pieces_in_home_base(2));
    }

    let mut classic = Board::new(Variant::Classic);
    classic.initialize_for_players(4).unwrap();
    assert_eq!(classic.home_base_positions(1), &BASES[4]);
}

#[test]
fn test_chaos_piece_cannot_leave_own_slot() {
    let mut board = Board::new(Variant::OrderOutOfChaos);
    board.initialize_opponent_base_mapping(4).unwrap();
    board.place_piece(Cell::new(3, 9), 1).unwrap();
    assert!(!board.is_valid_move(Cell::new(3, 9), Cell::new(4, 8), 1));
    assert!(board.is_valid_move(Cell::new(3, 9), Cell::new(2, 10), 1));
}
