//! The turn coordinator: seats players, fixes the turn order and runs the
//! turn loop until every seat has either finished or dropped out.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chinese_checkers::{
    Board, BoardError, Cell, ClientMessage, ConfigurationError, PlayerId, ProtocolError,
    SeatLayout, ServerMessage, Variant,
};
use derive_getters::Getters;
use derive_more::{Display, Error, From};
use rand::seq::SliceRandom;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::admission::Joiner;
use crate::config::{GameSetup, SessionChoice};
use crate::connection::{BotConnection, PlayerConnection};
use crate::store::{GameConfig, GameStore, StoreError};

/// Lifecycle of a game. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum Phase {
    /// Seats are being filled.
    AwaitingPlayers,
    /// The turn order is fixed and being announced.
    OrderAssigned,
    /// Turns are being played.
    InProgress,
    /// Final standings were announced.
    Finished,
}

/// Errors that stop a game from being set up or run.
#[derive(Debug, Display, Error, From)]
pub enum CoordinatorError {
    /// Unsupported setup.
    #[display("{}", _0)]
    #[from]
    Configuration(ConfigurationError),

    /// Storage failure while loading a saved game.
    #[display("{}", _0)]
    #[from]
    Store(StoreError),

    /// A saved board could not be restored.
    #[display("Saved board is invalid: {}", _0)]
    #[from]
    Board(BoardError),

    /// No saved game has the requested id.
    #[display("Saved game {} not found", _0)]
    SavedGameNotFound(#[error(not(source))] i32),

    /// The saved game has no board snapshot.
    #[display("No board saved for game {}", _0)]
    SavedBoardNotFound(#[error(not(source))] i32),

    /// The seat is outside the game or already taken.
    #[display("Seat {} is not available", _0)]
    SeatUnavailable(#[error(not(source))] PlayerId),

    /// Not every seat is filled.
    #[display("Expected {} players, {} seated", expected, seated)]
    MissingPlayers {
        /// Seat count of the game.
        expected: usize,
        /// Seats filled.
        seated: usize,
    },

    /// The joiner channel closed before every human seat was filled.
    #[display("Admission closed with {} of {} human seats filled", seated, expected)]
    AdmissionClosed {
        /// Human seats of the game.
        expected: usize,
        /// Human seats filled.
        seated: usize,
    },

    /// The operation belongs to another phase.
    #[display("Expected phase {}, game is in phase {}", expected, actual)]
    WrongPhase {
        /// Phase the operation needs.
        expected: Phase,
        /// Current phase.
        actual: Phase,
    },
}

/// Drives one game from seating to final standings.
///
/// All board mutation and every broadcast happens on the task that owns the
/// coordinator; the acceptor only hands over new clients through a channel.
#[derive(Getters)]
pub struct TurnCoordinator {
    /// Authoritative board.
    board: Board,
    /// Seat count.
    player_count: usize,
    /// Seats reserved for network clients.
    human_count: usize,
    #[getter(skip)]
    connections: Vec<Box<dyn PlayerConnection>>,
    /// Current lifecycle phase.
    phase: Phase,
    /// Turn order, empty until assigned.
    player_order: Vec<PlayerId>,
    #[getter(skip)]
    restored_order: Option<Vec<PlayerId>>,
    /// Index into the turn order of the seat to play next.
    current_index: usize,
    /// Finishing order.
    standings: Vec<PlayerId>,
    /// Seats that dropped out, in the order they were noticed.
    disconnected: Vec<PlayerId>,
    #[getter(skip)]
    store: Arc<dyn GameStore>,
    /// Store id of the game, once saved or loaded.
    game_id: Option<i32>,
    #[getter(skip)]
    started: Arc<AtomicBool>,
}

impl std::fmt::Debug for TurnCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnCoordinator")
            .field("phase", &self.phase)
            .field("player_count", &self.player_count)
            .field("player_order", &self.player_order)
            .field("standings", &self.standings)
            .field("disconnected", &self.disconnected)
            .field("game_id", &self.game_id)
            .finish_non_exhaustive()
    }
}

impl TurnCoordinator {
    /// Sets up a new or saved game as chosen by `setup`.
    ///
    /// # Errors
    ///
    /// * [`CoordinatorError::Configuration`] for an unsupported seat or bot count.
    /// * [`CoordinatorError::SavedGameNotFound`] / [`CoordinatorError::SavedBoardNotFound`]
    ///   when resuming a game the store does not know.
    #[instrument(skip(setup, store))]
    pub fn new(setup: &impl GameSetup, store: Arc<dyn GameStore>) -> Result<Self, CoordinatorError> {
        let choice = setup.new_or_load_choice();
        info!(%choice, "Setting up game");
        match choice {
            SessionChoice::New => Self::fresh(
                setup.selected_variant(),
                setup.selected_player_count(),
                setup.selected_bot_count(),
                store,
            ),
            SessionChoice::Load => {
                let id = setup
                    .selected_saved_game_id()
                    .ok_or_else(|| ConfigurationError::new("No saved game selected"))?;
                Self::load(id, store)
            }
        }
    }

    fn fresh(
        variant: Variant,
        player_count: usize,
        bot_count: usize,
        store: Arc<dyn GameStore>,
    ) -> Result<Self, CoordinatorError> {
        if bot_count > player_count {
            return Err(ConfigurationError::new(format!(
                "{} bots requested for {} seats",
                bot_count, player_count
            ))
            .into());
        }
        let mut board = Board::new(variant);
        if variant.targets_home() {
            board.initialize_for_chaos(player_count)?;
        } else {
            board.initialize_for_players(player_count)?;
        }
        info!(%variant, player_count, bot_count, "New game prepared");
        Ok(Self::with_board(board, player_count, player_count - bot_count, None, None, store))
    }

    fn load(id: i32, store: Arc<dyn GameStore>) -> Result<Self, CoordinatorError> {
        let saved = store
            .game_by_id(id)?
            .ok_or(CoordinatorError::SavedGameNotFound(id))?;
        let state = store
            .board_by_game(id)?
            .ok_or(CoordinatorError::SavedBoardNotFound(id))?;
        let config = saved.config();
        let player_count = *config.max_players();

        let mut board = Board::new(*config.variant());
        board.initialize_opponent_base_mapping(player_count)?;
        board.deserialize(&state)?;
        check_order(config.player_order(), player_count)?;

        info!(
            game_id = id,
            variant = %config.variant(),
            order = ?config.player_order(),
            "Saved game restored"
        );
        Ok(Self::with_board(
            board,
            player_count,
            (*config.human_players()).min(player_count),
            Some(config.player_order().clone()),
            Some(id),
            store,
        ))
    }

    fn with_board(
        board: Board,
        player_count: usize,
        human_count: usize,
        restored_order: Option<Vec<PlayerId>>,
        game_id: Option<i32>,
        store: Arc<dyn GameStore>,
    ) -> Self {
        Self {
            board,
            player_count,
            human_count,
            connections: Vec::with_capacity(player_count),
            phase: Phase::AwaitingPlayers,
            player_order: Vec::new(),
            restored_order,
            current_index: 0,
            standings: Vec::new(),
            disconnected: Vec::new(),
            store,
            game_id,
            started: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag raised once the turn order is assigned. The acceptor rejects new
    /// clients from then on.
    pub fn started_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.started)
    }

    /// Seats already filled, ascending.
    pub fn seated(&self) -> Vec<PlayerId> {
        let mut ids: Vec<PlayerId> = self.connections.iter().map(|c| c.player_id()).collect();
        ids.sort_unstable();
        ids
    }

    /// Whether every seat has finished or dropped out.
    pub fn is_over(&self) -> bool {
        self.standings.len() + self.disconnected.len() >= self.player_count
    }

    fn expect_phase(&self, expected: Phase) -> Result<(), CoordinatorError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(CoordinatorError::WrongPhase {
                expected,
                actual: self.phase,
            })
        }
    }

    fn free_seats(&self) -> impl Iterator<Item = PlayerId> + '_ {
        let taken = self.seated();
        (1..=self.player_count)
            .filter_map(|p| PlayerId::try_from(p).ok())
            .filter(move |p| !taken.contains(p))
    }

    // ─────────────────────────────────────────────────────────────
    //  AwaitingPlayers
    // ─────────────────────────────────────────────────────────────

    /// Seats a connection and sends it the handshake.
    ///
    /// # Errors
    ///
    /// * [`CoordinatorError::WrongPhase`] once the order is assigned.
    /// * [`CoordinatorError::SeatUnavailable`] for a seat outside the game or
    ///   already taken.
    #[instrument(skip(self, connection), fields(player_id = connection.player_id()))]
    pub async fn attach(
        &mut self,
        mut connection: Box<dyn PlayerConnection>,
    ) -> Result<(), CoordinatorError> {
        self.expect_phase(Phase::AwaitingPlayers)?;
        let id = connection.player_id();
        if !self.free_seats().any(|p| p == id) {
            return Err(CoordinatorError::SeatUnavailable(id));
        }
        for line in [
            ServerMessage::Welcome(id),
            ServerMessage::PlayerId(id),
            ServerMessage::PlayerCount(self.player_count),
            ServerMessage::Variant(self.board.variant()),
        ] {
            connection.send(&line.to_string()).await;
        }
        self.connections.push(connection);
        info!(seated = self.connections.len(), "Player joined");
        Ok(())
    }

    /// Fills the human seats from `joiners`, lowest free seat first.
    ///
    /// Seated clients that hang up before the game starts are dropped and
    /// their seat is given to the next client.
    ///
    /// # Errors
    ///
    /// [`CoordinatorError::AdmissionClosed`] if the channel closes first.
    #[instrument(skip(self, joiners))]
    pub async fn admit_humans(
        &mut self,
        joiners: &mut mpsc::Receiver<Joiner>,
        move_timeout: Option<Duration>,
    ) -> Result<(), CoordinatorError> {
        self.expect_phase(Phase::AwaitingPlayers)?;
        info!(humans = self.human_count, "Waiting for players");
        while self.connections.len() < self.human_count {
            let Some(joiner) = joiners.recv().await else {
                return Err(CoordinatorError::AdmissionClosed {
                    expected: self.human_count,
                    seated: self.connections.len(),
                });
            };
            let seat = self.free_seats().next();
            let Some(seat) = seat else {
                joiner.reject().await;
                continue;
            };
            self.attach(Box::new(joiner.seat(seat, move_timeout))).await?;
            self.prune_lobby().await;
        }
        info!("All human players joined");
        Ok(())
    }

    async fn prune_lobby(&mut self) {
        let mut kept = Vec::with_capacity(self.connections.len());
        for mut connection in std::mem::take(&mut self.connections) {
            if connection.is_connected().await {
                kept.push(connection);
            } else {
                info!(player_id = connection.player_id(), "Player left before the start");
                connection.close().await;
            }
        }
        self.connections = kept;
    }

    /// Gives every free seat to a greedy bot.
    ///
    /// # Errors
    ///
    /// Propagates seating errors.
    #[instrument(skip(self))]
    pub async fn attach_bots(&mut self, delay: Duration) -> Result<(), CoordinatorError> {
        let seats: Vec<PlayerId> = self.free_seats().collect();
        for seat in seats {
            let bot = BotConnection::new(seat, self.board.variant(), self.player_count, delay)?;
            self.attach(Box::new(bot)).await?;
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────
    //  OrderAssigned
    // ─────────────────────────────────────────────────────────────

    /// Fixes the turn order (the saved one when resuming, otherwise a fresh
    /// shuffle), announces it with the initial board and starts play.
    ///
    /// # Errors
    ///
    /// [`CoordinatorError::MissingPlayers`] unless every seat is filled.
    pub async fn assign_order(&mut self) -> Result<(), CoordinatorError> {
        let order = match self.restored_order.take() {
            Some(order) => order,
            None => {
                let mut order = self.seated();
                order.shuffle(&mut rand::thread_rng());
                order
            }
        };
        self.start_with_order(order).await
    }

    /// [`assign_order`](Self::assign_order) with a caller-chosen order.
    ///
    /// # Errors
    ///
    /// * [`CoordinatorError::MissingPlayers`] unless every seat is filled.
    /// * [`CoordinatorError::Configuration`] if `order` is not a permutation
    ///   of the seats.
    #[instrument(skip(self))]
    pub async fn start_with_order(&mut self, order: Vec<PlayerId>) -> Result<(), CoordinatorError> {
        self.expect_phase(Phase::AwaitingPlayers)?;
        if self.connections.len() != self.player_count {
            return Err(CoordinatorError::MissingPlayers {
                expected: self.player_count,
                seated: self.connections.len(),
            });
        }
        check_order(&order, self.player_count)?;

        self.phase = Phase::OrderAssigned;
        self.started.store(true, Ordering::SeqCst);
        self.board.initialize_opponent_base_mapping(self.player_count)?;
        self.player_order = order;
        self.current_index = 0;
        info!(order = ?self.player_order, "Turn order assigned");

        self.save_new_game();
        self.broadcast(&ServerMessage::Order(self.player_order.clone()).to_string())
            .await;
        self.broadcast_board().await;

        self.phase = Phase::InProgress;
        Ok(())
    }

    /// Turns away clients still queued after the start.
    pub async fn reject_late_joiners(&mut self, joiners: &mut mpsc::Receiver<Joiner>) {
        while let Ok(joiner) = joiners.try_recv() {
            joiner.reject().await;
        }
    }

    fn save_new_game(&mut self) {
        if self.game_id.is_some() {
            return;
        }
        let config = GameConfig::new(
            self.board.variant(),
            self.player_count,
            self.human_count,
            self.player_order.clone(),
        );
        match self.store.save_game(&config) {
            Ok(id) => {
                self.game_id = Some(id);
                self.save_board(id);
            }
            Err(e) => warn!(error = %e, "Could not save game, continuing without persistence"),
        }
    }

    fn save_board(&self, game_id: i32) {
        if let Err(e) = self.store.save_board(game_id, &self.board.serialize()) {
            warn!(game_id, error = %e, "Could not save board");
        }
    }

    // ─────────────────────────────────────────────────────────────
    //  InProgress
    // ─────────────────────────────────────────────────────────────

    /// Plays the turn of the seat at the current index and moves the index on.
    ///
    /// # Errors
    ///
    /// [`CoordinatorError::WrongPhase`] outside of play.
    #[instrument(skip(self), fields(index = self.current_index))]
    pub async fn play_turn(&mut self) -> Result<(), CoordinatorError> {
        self.expect_phase(Phase::InProgress)?;
        let player = self.player_order[self.current_index % self.player_order.len()];

        if self.standings.contains(&player) || self.disconnected.contains(&player) {
            debug!(player_id = player, "Seat no longer plays");
        } else {
            let reachable = match self.slot_of(player) {
                Some(slot) => self.connections[slot].is_connected().await.then_some(slot),
                None => None,
            };
            match reachable {
                Some(slot) => self.take_turn(slot, player).await,
                None => {
                    self.mark_disconnected(player);
                    self.broadcast(&ServerMessage::Disconnected(player).to_string())
                        .await;
                }
            }
        }

        self.current_index = (self.current_index + 1) % self.player_order.len();
        self.award_last_place().await;
        Ok(())
    }

    fn slot_of(&self, player: PlayerId) -> Option<usize> {
        self.connections.iter().position(|c| c.player_id() == player)
    }

    async fn take_turn(&mut self, slot: usize, player: PlayerId) {
        info!(player_id = player, "Turn started");
        self.broadcast_except(player, &ServerMessage::TurnOf(player).to_string())
            .await;
        loop {
            self.connections[slot]
                .send(&ServerMessage::YourTurn.to_string())
                .await;
            let Some(line) = self.connections[slot].receive_move().await else {
                self.mark_disconnected(player);
                self.broadcast(&ServerMessage::DisconnectedDuringTurn(player).to_string())
                    .await;
                return;
            };

            let reply = match ClientMessage::parse(&line) {
                Ok(ClientMessage::Move { from, to }) => {
                    self.apply_move(slot, player, from, to).await;
                    return;
                }
                Ok(ClientMessage::Skip) => {
                    info!(player_id = player, "Turn skipped");
                    self.broadcast(&ServerMessage::Skipped(player).to_string())
                        .await;
                    return;
                }
                Ok(ClientMessage::ClaimWin) => {
                    info!(player_id = player, "Win claimed");
                    self.place(player).await;
                    return;
                }
                Err(ProtocolError::UnknownCommand(command)) => {
                    ServerMessage::UnknownCommand(command)
                }
                Err(e) => {
                    debug!(player_id = player, error = %e, "Unparseable move");
                    ServerMessage::InvalidCoordinates
                }
            };
            self.connections[slot].send(&reply.to_string()).await;
        }
    }

    async fn apply_move(&mut self, slot: usize, player: PlayerId, from: Cell, to: Cell) {
        let outcome = self.board.move_piece(from, to, player);
        self.connections[slot]
            .send(&ServerMessage::MoveResult(outcome.to_string()).to_string())
            .await;
        if !outcome.is_applied() {
            self.connections[slot]
                .send(&ServerMessage::TryAgain.to_string())
                .await;
            return;
        }

        let command = ClientMessage::Move { from, to }.to_string();
        self.broadcast_except(player, &ServerMessage::Moved(player, command).to_string())
            .await;
        self.broadcast_board().await;

        if let Some(game_id) = self.game_id {
            if let Err(e) = self.store.save_move(game_id, &outcome.attempted()) {
                warn!(game_id, error = %e, "Could not save move");
            }
            self.save_board(game_id);
        }

        if self.has_won(player) {
            self.place(player).await;
        }
    }

    fn has_won(&self, player: PlayerId) -> bool {
        (self.board.variant().targets_home() && self.board.all_pieces_in_home_base(player))
            || self.board.is_player_in_opponent_base(player)
    }

    async fn place(&mut self, player: PlayerId) {
        if self.standings.contains(&player) || self.disconnected.contains(&player) {
            return;
        }
        self.standings.push(player);
        let rank = self.standings.len();
        info!(player_id = player, rank, "Player finished");
        self.broadcast(&ServerMessage::Placed(player, rank).to_string())
            .await;
    }

    fn mark_disconnected(&mut self, player: PlayerId) {
        if !self.disconnected.contains(&player) && !self.standings.contains(&player) {
            info!(player_id = player, "Player disconnected");
            self.disconnected.push(player);
        }
    }

    /// When a single contender is left it takes the next place without playing.
    async fn award_last_place(&mut self) {
        if self.standings.len() + self.disconnected.len() + 1 != self.player_count {
            return;
        }
        let last = self
            .player_order
            .iter()
            .copied()
            .find(|p| !self.standings.contains(p) && !self.disconnected.contains(p));
        if let Some(player) = last {
            debug!(player_id = player, "Last contender placed");
            self.place(player).await;
        }
    }

    // ─────────────────────────────────────────────────────────────
    //  Finished
    // ─────────────────────────────────────────────────────────────

    /// Plays turns until the game is over, then announces the standings.
    ///
    /// Assigns the turn order first if that has not happened yet.
    ///
    /// # Errors
    ///
    /// Propagates setup errors from [`assign_order`](Self::assign_order).
    #[instrument(skip(self))]
    pub async fn run(&mut self) -> Result<Vec<PlayerId>, CoordinatorError> {
        if self.phase == Phase::AwaitingPlayers {
            self.assign_order().await?;
        }
        self.expect_phase(Phase::InProgress)?;
        while !self.is_over() {
            self.play_turn().await?;
        }
        self.finish().await;
        Ok(self.standings.clone())
    }

    async fn finish(&mut self) {
        self.phase = Phase::Finished;
        info!(standings = ?self.standings, disconnected = ?self.disconnected, "Game over");
        self.broadcast(&ServerMessage::GameOver.to_string()).await;
        for (i, player) in self.standings.clone().into_iter().enumerate() {
            self.broadcast(&ServerMessage::Standing(i + 1, player).to_string())
                .await;
        }
        for player in self.disconnected.clone() {
            self.broadcast(&ServerMessage::DroppedOut(player).to_string())
                .await;
        }
        for connection in &mut self.connections {
            connection.close().await;
        }
    }

    // ─────────────────────────────────────────────────────────────
    //  Broadcast
    // ─────────────────────────────────────────────────────────────

    async fn broadcast(&mut self, line: &str) {
        for connection in &mut self.connections {
            connection.send(line).await;
        }
    }

    async fn broadcast_except(&mut self, excluded: PlayerId, line: &str) {
        for connection in &mut self.connections {
            if connection.player_id() != excluded {
                connection.send(line).await;
            }
        }
    }

    async fn broadcast_board(&mut self) {
        let line = ServerMessage::BoardState(self.board.serialize()).to_string();
        self.broadcast(&line).await;
    }
}

/// Checks that `order` seats each of `1..=player_count` exactly once.
fn check_order(order: &[PlayerId], player_count: usize) -> Result<(), ConfigurationError> {
    SeatLayout::for_players(player_count)?;
    let mut sorted = order.to_vec();
    sorted.sort_unstable();
    let expected: Vec<PlayerId> = (1..=player_count)
        .filter_map(|p| PlayerId::try_from(p).ok())
        .collect();
    if sorted == expected {
        Ok(())
    } else {
        Err(ConfigurationError::new(format!(
            "Turn order {:?} does not seat players 1..={}",
            order, player_count
        )))
    }
}
