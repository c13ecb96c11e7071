//! Turn loop tests driven by scripted connections.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chinese_checkers::{
    BASES, Board, Cell, ClientMessage, Move, PlayerId, ServerMessage, Variant,
};
use chinese_checkers_server::{
    ConfigOverrides, CoordinatorError, GameConfig, GameStore, MemoryStore, Phase, PlayerConnection,
    SavedGame, ServerConfig, StoreError, TurnCoordinator,
};

/// Lines a scripted seat received, shared with the test.
type Inbox = Arc<Mutex<Vec<String>>>;

/// A seat that answers turn prompts from a fixed script.
///
/// An exhausted script reads as a dropped connection.
struct Scripted {
    id: PlayerId,
    replies: VecDeque<String>,
    inbox: Inbox,
    connected: bool,
}

impl Scripted {
    fn new(id: PlayerId, replies: &[&str]) -> (Box<dyn PlayerConnection>, Inbox) {
        let inbox = Inbox::default();
        let seat = Self {
            id,
            replies: replies.iter().map(|r| r.to_string()).collect(),
            inbox: Arc::clone(&inbox),
            connected: true,
        };
        (Box::new(seat), inbox)
    }

    fn gone(id: PlayerId) -> (Box<dyn PlayerConnection>, Inbox) {
        let inbox = Inbox::default();
        let seat = Self {
            id,
            replies: VecDeque::new(),
            inbox: Arc::clone(&inbox),
            connected: false,
        };
        (Box::new(seat), inbox)
    }
}

#[async_trait::async_trait]
impl PlayerConnection for Scripted {
    fn player_id(&self) -> PlayerId {
        self.id
    }

    async fn send(&mut self, line: &str) {
        self.inbox.lock().unwrap().push(line.to_string());
    }

    async fn receive_move(&mut self) -> Option<String> {
        self.replies.pop_front()
    }

    async fn is_connected(&mut self) -> bool {
        self.connected
    }

    async fn close(&mut self) {
        self.connected = false;
    }
}

/// Store whose every call fails.
#[derive(Debug)]
struct BrokenStore;

impl GameStore for BrokenStore {
    fn save_game(&self, _: &GameConfig) -> Result<i32, StoreError> {
        Err(StoreError::unavailable("disk full"))
    }
    fn save_move(&self, _: i32, _: &Move) -> Result<(), StoreError> {
        Err(StoreError::unavailable("disk full"))
    }
    fn save_board(&self, _: i32, _: &str) -> Result<(), StoreError> {
        Err(StoreError::unavailable("disk full"))
    }
    fn board_by_game(&self, _: i32) -> Result<Option<String>, StoreError> {
        Err(StoreError::unavailable("disk full"))
    }
    fn game_by_id(&self, _: i32) -> Result<Option<SavedGame>, StoreError> {
        Err(StoreError::unavailable("disk full"))
    }
    fn all_games(&self) -> Result<Vec<SavedGame>, StoreError> {
        Err(StoreError::unavailable("disk full"))
    }
    fn moves_by_game(&self, _: i32) -> Result<Vec<Move>, StoreError> {
        Err(StoreError::unavailable("disk full"))
    }
}

fn config(players: usize, bots: usize) -> ServerConfig {
    ServerConfig::default().apply(ConfigOverrides {
        players: Some(players),
        bots: Some(bots),
        bot_delay_ms: Some(0),
        ..Default::default()
    })
}

fn lines(inbox: &Inbox) -> Vec<String> {
    inbox.lock().unwrap().clone()
}

fn received(inbox: &Inbox, message: ServerMessage) -> bool {
    lines(inbox).contains(&message.to_string())
}

/// Two scripted seats with turn order `[1, 2]`, ready to play.
async fn two_player_game(
    store: Arc<dyn GameStore>,
    first: &[&str],
    second: &[&str],
) -> (TurnCoordinator, Inbox, Inbox) {
    let mut coordinator = TurnCoordinator::new(&config(2, 0), store).unwrap();
    let (one, inbox_one) = Scripted::new(1, first);
    let (two, inbox_two) = Scripted::new(2, second);
    coordinator.attach(one).await.unwrap();
    coordinator.attach(two).await.unwrap();
    coordinator.start_with_order(vec![1, 2]).await.unwrap();
    (coordinator, inbox_one, inbox_two)
}

#[tokio::test]
async fn test_handshake_and_start_broadcast() {
    let (coordinator, inbox_one, inbox_two) =
        two_player_game(Arc::new(MemoryStore::new()), &[], &[]).await;

    assert_eq!(*coordinator.phase(), Phase::InProgress);
    let board_line = ServerMessage::BoardState(coordinator.board().serialize()).to_string();
    assert_eq!(
        lines(&inbox_two),
        vec![
            "Witaj, Graczu 2!".to_string(),
            "PLAYER_ID:2".to_string(),
            "Liczba graczy:2".to_string(),
            "Wariant gry:Rozgrywka klasyczna".to_string(),
            "Kolejność gry: [1, 2]".to_string(),
            board_line,
        ]
    );
    assert!(received(&inbox_one, ServerMessage::Welcome(1)));
}

#[tokio::test]
async fn test_claimed_win_places_last_contender_and_ends() {
    let store = Arc::new(MemoryStore::new());
    let (mut coordinator, inbox_one, inbox_two) =
        two_player_game(store, &["WYGRANA"], &[]).await;

    let standings = coordinator.run().await.unwrap();

    assert_eq!(standings, vec![1, 2]);
    assert_eq!(*coordinator.phase(), Phase::Finished);
    assert!(received(&inbox_two, ServerMessage::TurnOf(1)));
    assert!(received(&inbox_two, ServerMessage::Placed(1, 1)));
    assert!(received(&inbox_one, ServerMessage::Placed(2, 2)));
    assert!(received(&inbox_one, ServerMessage::GameOver));
    assert!(received(&inbox_one, ServerMessage::Standing(2, 2)));
    assert!(!lines(&inbox_two).contains(&ServerMessage::YourTurn.to_string()));
}

#[tokio::test]
async fn test_drop_during_turn_is_recorded() {
    let (mut coordinator, _inbox_one, inbox_two) =
        two_player_game(Arc::new(MemoryStore::new()), &[], &[]).await;

    let standings = coordinator.run().await.unwrap();

    assert_eq!(standings, vec![2]);
    assert_eq!(coordinator.disconnected(), &vec![1]);
    assert!(received(&inbox_two, ServerMessage::DisconnectedDuringTurn(1)));
    assert!(received(&inbox_two, ServerMessage::DroppedOut(1)));
}

#[tokio::test]
async fn test_unreachable_seat_is_skipped_as_disconnected() {
    let mut coordinator = TurnCoordinator::new(&config(3, 0), Arc::new(MemoryStore::new())).unwrap();
    let (one, inbox_one) = Scripted::new(1, &["SKIP TURN"]);
    let (two, _) = Scripted::gone(2);
    let (three, _) = Scripted::new(3, &["WYGRANA"]);
    for seat in [one, two, three] {
        coordinator.attach(seat).await.unwrap();
    }
    coordinator.start_with_order(vec![2, 1, 3]).await.unwrap();

    coordinator.play_turn().await.unwrap();
    assert_eq!(coordinator.disconnected(), &vec![2]);
    assert!(received(&inbox_one, ServerMessage::Disconnected(2)));
    assert_eq!(*coordinator.current_index(), 1);

    coordinator.play_turn().await.unwrap();
    assert!(received(&inbox_one, ServerMessage::Skipped(1)));

    // Player 3 claims the win, which leaves player 1 as the last contender.
    coordinator.play_turn().await.unwrap();
    assert!(coordinator.is_over());
    assert_eq!(coordinator.standings(), &vec![3, 1]);
}

#[tokio::test]
async fn test_illegal_move_consumes_turn() {
    let (mut coordinator, inbox_one, _) =
        two_player_game(Arc::new(MemoryStore::new()), &["Ruch-3,9:9,9"], &[]).await;
    let before = coordinator.board().clone();

    coordinator.play_turn().await.unwrap();

    assert_eq!(coordinator.board(), &before);
    assert_eq!(*coordinator.current_index(), 1);
    assert!(received(&inbox_one, ServerMessage::TryAgain));
    let prompts = lines(&inbox_one)
        .iter()
        .filter(|l| **l == ServerMessage::YourTurn.to_string())
        .count();
    assert_eq!(prompts, 1);
}

#[tokio::test]
async fn test_unparseable_input_reprompts_same_turn() {
    let store = Arc::new(MemoryStore::new());
    let (mut coordinator, inbox_one, inbox_two) = two_player_game(
        store.clone(),
        &["hello", "Ruch-a,9:4,8", "Ruch-3,9:4,8"],
        &[],
    )
    .await;

    coordinator.play_turn().await.unwrap();

    let received_one = lines(&inbox_one);
    assert!(received_one.contains(&ServerMessage::UnknownCommand("hello".into()).to_string()));
    assert!(received_one.contains(&ServerMessage::InvalidCoordinates.to_string()));
    let prompts = received_one
        .iter()
        .filter(|l| **l == ServerMessage::YourTurn.to_string())
        .count();
    assert_eq!(prompts, 3);

    assert!(coordinator.board().has_piece(Cell::new(4, 8)));
    let echoed = ClientMessage::Move {
        from: Cell::new(3, 9),
        to: Cell::new(4, 8),
    }
    .to_string();
    assert!(received(&inbox_two, ServerMessage::Moved(1, echoed)));

    let game_id = coordinator.game_id().expect("game saved at start");
    let moves = store.moves_by_game(game_id).unwrap();
    assert_eq!(moves, vec![Move::new(Cell::new(3, 9), Cell::new(4, 8), 1)]);
    assert_eq!(
        store.board_by_game(game_id).unwrap(),
        Some(coordinator.board().serialize())
    );
}

#[tokio::test]
async fn test_store_failures_do_not_stop_play() {
    let (mut coordinator, _, _) =
        two_player_game(Arc::new(BrokenStore), &["Ruch-3,9:4,8"], &["WYGRANA"]).await;

    assert!(coordinator.game_id().is_none());
    coordinator.play_turn().await.unwrap();
    assert!(coordinator.board().has_piece(Cell::new(4, 8)));

    let standings = coordinator.run().await.unwrap();
    assert_eq!(standings, vec![2, 1]);
}

#[tokio::test]
async fn test_saved_game_resumes_board_and_order() {
    let store = Arc::new(MemoryStore::new());
    let mut board = Board::new(Variant::Classic);
    board.initialize_for_players(2).unwrap();
    assert!(board.move_piece(Cell::new(3, 9), Cell::new(4, 8), 1).is_applied());

    let id = store
        .save_game(&GameConfig::new(Variant::Classic, 2, 2, vec![2, 1]))
        .unwrap();
    store.save_board(id, &board.serialize()).unwrap();

    let resume = ServerConfig::default().apply(ConfigOverrides {
        load_game: Some(id),
        ..Default::default()
    });
    let mut coordinator = TurnCoordinator::new(&resume, store.clone()).unwrap();
    assert_eq!(coordinator.board().grid(), board.grid());

    let (one, _) = Scripted::new(1, &[]);
    let (two, inbox_two) = Scripted::new(2, &[]);
    coordinator.attach(one).await.unwrap();
    coordinator.attach(two).await.unwrap();
    coordinator.assign_order().await.unwrap();

    assert_eq!(coordinator.player_order(), &vec![2, 1]);
    assert_eq!(*coordinator.game_id(), Some(id));
    assert_eq!(store.all_games().unwrap().len(), 1);
    assert!(received(&inbox_two, ServerMessage::Order(vec![2, 1])));
}

#[tokio::test]
async fn test_missing_saved_game() {
    let resume = ServerConfig::default().apply(ConfigOverrides {
        load_game: Some(7),
        ..Default::default()
    });
    let result = TurnCoordinator::new(&resume, Arc::new(MemoryStore::new()));
    assert!(matches!(result, Err(CoordinatorError::SavedGameNotFound(7))));
}

#[tokio::test]
async fn test_seating_rules() {
    let mut coordinator = TurnCoordinator::new(&config(2, 0), Arc::new(MemoryStore::new())).unwrap();

    let (outside, _) = Scripted::new(3, &[]);
    assert!(matches!(
        coordinator.attach(outside).await,
        Err(CoordinatorError::SeatUnavailable(3))
    ));

    let (one, _) = Scripted::new(1, &[]);
    coordinator.attach(one).await.unwrap();
    let (again, _) = Scripted::new(1, &[]);
    assert!(matches!(
        coordinator.attach(again).await,
        Err(CoordinatorError::SeatUnavailable(1))
    ));

    assert!(matches!(
        coordinator.start_with_order(vec![1, 2]).await,
        Err(CoordinatorError::MissingPlayers {
            expected: 2,
            seated: 1
        })
    ));

    let (two, _) = Scripted::new(2, &[]);
    coordinator.attach(two).await.unwrap();
    assert!(matches!(
        coordinator.start_with_order(vec![1, 1]).await,
        Err(CoordinatorError::Configuration(_))
    ));
    assert_eq!(*coordinator.phase(), Phase::AwaitingPlayers);
    assert!(matches!(
        coordinator.play_turn().await,
        Err(CoordinatorError::WrongPhase { .. })
    ));
}

#[tokio::test]
async fn test_bots_fill_remaining_seats() {
    let mut coordinator = TurnCoordinator::new(&config(2, 1), Arc::new(MemoryStore::new())).unwrap();
    let (human, inbox) = Scripted::new(1, &["WYGRANA"]);
    coordinator.attach(human).await.unwrap();
    coordinator.attach_bots(Duration::ZERO).await.unwrap();
    assert_eq!(coordinator.seated(), vec![1, 2]);

    coordinator.start_with_order(vec![1, 2]).await.unwrap();
    let standings = coordinator.run().await.unwrap();

    assert_eq!(standings, vec![1, 2]);
    assert!(received(&inbox, ServerMessage::Standing(1, 1)));
}

#[tokio::test]
async fn test_bot_moves_are_applied() {
    let mut coordinator = TurnCoordinator::new(&config(2, 1), Arc::new(MemoryStore::new())).unwrap();
    let (human, inbox) = Scripted::new(1, &["SKIP TURN"]);
    coordinator.attach(human).await.unwrap();
    coordinator.attach_bots(Duration::ZERO).await.unwrap();
    coordinator.start_with_order(vec![2, 1]).await.unwrap();
    let before = coordinator.board().pieces_of(2);

    coordinator.play_turn().await.unwrap();

    assert_ne!(coordinator.board().pieces_of(2), before);
    assert_eq!(coordinator.board().pieces_of(2).len(), 10);
    assert!(
        lines(&inbox)
            .iter()
            .any(|l| l.starts_with("Gracz 2 wykonał ruch: Ruch-"))
    );
}

/// Resumes `board` from a store with the given turn order, seating one
/// scripted connection per entry of `scripts` (seat `i + 1`).
async fn resume_with(
    board: &Board,
    order: Vec<PlayerId>,
    scripts: &[&[&str]],
) -> (TurnCoordinator, Vec<Inbox>) {
    let store = Arc::new(MemoryStore::new());
    let id = store
        .save_game(&GameConfig::new(
            board.variant(),
            scripts.len(),
            scripts.len(),
            order,
        ))
        .unwrap();
    store.save_board(id, &board.serialize()).unwrap();

    let resume = ServerConfig::default().apply(ConfigOverrides {
        load_game: Some(id),
        ..Default::default()
    });
    let mut coordinator = TurnCoordinator::new(&resume, store).unwrap();
    let mut inboxes = Vec::new();
    for (seat, script) in (1..).zip(scripts) {
        let (connection, inbox) = Scripted::new(seat, script);
        coordinator.attach(connection).await.unwrap();
        inboxes.push(inbox);
    }
    coordinator.assign_order().await.unwrap();
    (coordinator, inboxes)
}

#[tokio::test]
async fn test_move_filling_goal_base_wins_classic() {
    let mut board = Board::new(Variant::Classic);
    board.initialize_opponent_base_mapping(2).unwrap();
    // Player 1's goal is the bottom corner; all but its last cell are taken.
    for cell in &BASES[1][..9] {
        board.place_piece(*cell, 1).unwrap();
    }
    board.place_piece(Cell::new(12, 14), 1).unwrap();
    board.place_piece(Cell::new(8, 12), 2).unwrap();

    let (mut coordinator, inboxes) =
        resume_with(&board, vec![1, 2], &[&["Ruch-12,14:13,15"], &[]]).await;
    let standings = coordinator.run().await.unwrap();

    assert_eq!(standings, vec![1, 2]);
    assert!(coordinator.board().is_player_in_opponent_base(1));
    assert!(received(&inboxes[1], ServerMessage::Placed(1, 1)));
    assert!(received(&inboxes[0], ServerMessage::Placed(2, 2)));
    assert!(!lines(&inboxes[1]).contains(&ServerMessage::YourTurn.to_string()));
}

#[tokio::test]
async fn test_move_filling_home_base_wins_chaos() {
    let mut board = Board::new(Variant::OrderOutOfChaos);
    board.initialize_opponent_base_mapping(3).unwrap();
    // Player 2 gathers into slot 1, the bottom corner.
    for cell in &BASES[1][..9] {
        board.place_piece(*cell, 2).unwrap();
    }
    board.place_piece(Cell::new(12, 14), 2).unwrap();
    board.place_piece(Cell::new(8, 10), 1).unwrap();
    board.place_piece(Cell::new(8, 14), 3).unwrap();

    let (mut coordinator, inboxes) = resume_with(
        &board,
        vec![2, 1, 3],
        &[&["WYGRANA"], &["Ruch-12,14:13,15"], &[]],
    )
    .await;

    coordinator.play_turn().await.unwrap();
    assert!(coordinator.board().all_pieces_in_home_base(2));
    assert_eq!(coordinator.standings(), &vec![2]);
    assert!(received(&inboxes[0], ServerMessage::Placed(2, 1)));

    let standings = coordinator.run().await.unwrap();
    assert_eq!(standings, vec![2, 1, 3]);
    assert!(received(&inboxes[1], ServerMessage::Placed(3, 3)));
}
