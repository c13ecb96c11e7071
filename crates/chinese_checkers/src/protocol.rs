//! The line protocol spoken between the server and its clients.
//!
//! Every message is a single UTF-8 line. Clients send [`ClientMessage`]s;
//! the server answers with [`ServerMessage`]s.

use derive_more::Display;
use tracing::instrument;

use crate::action::{Cell, PlayerId};
use crate::error::ProtocolError;
use crate::variant::Variant;

/// Prefix of a move command.
pub const MOVE_PREFIX: &str = "Ruch-";
/// Skip command.
pub const SKIP_TURN: &str = "SKIP TURN";
/// Win claim command.
pub const CLAIM_WIN: &str = "WYGRANA";
/// Prefix of a board state broadcast.
pub const BOARD_STATE_PREFIX: &str = "Stan planszy:";

/// A command sent by a client on its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ClientMessage {
    /// `Ruch-<sr>,<sc>:<er>,<ec>`
    #[display("Ruch-{},{}:{},{}", from.row, from.col, to.row, to.col)]
    Move {
        /// Source cell.
        from: Cell,
        /// Destination cell.
        to: Cell,
    },
    /// `SKIP TURN`
    #[display("SKIP TURN")]
    Skip,
    /// `WYGRANA`
    #[display("WYGRANA")]
    ClaimWin,
}

impl ClientMessage {
    /// Parses one client line.
    ///
    /// # Errors
    ///
    /// * [`ProtocolError::UnknownCommand`] for anything that is not a command.
    /// * [`ProtocolError::MalformedMove`] for a move without two coordinate pairs.
    /// * [`ProtocolError::InvalidCoordinate`] for a non-integer coordinate.
    #[instrument]
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let line = line.trim();
        if line.starts_with(SKIP_TURN) {
            return Ok(Self::Skip);
        }
        if line.eq_ignore_ascii_case(CLAIM_WIN) {
            return Ok(Self::ClaimWin);
        }
        let Some(body) = line.strip_prefix(MOVE_PREFIX) else {
            return Err(ProtocolError::UnknownCommand(line.to_string()));
        };

        let (start, end) = body
            .split_once(':')
            .filter(|(_, end)| !end.contains(':'))
            .ok_or_else(|| ProtocolError::MalformedMove(line.to_string()))?;
        Ok(Self::Move {
            from: parse_cell(start, line)?,
            to: parse_cell(end, line)?,
        })
    }
}

impl std::str::FromStr for ClientMessage {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_cell(pair: &str, line: &str) -> Result<Cell, ProtocolError> {
    let (row, col) = pair
        .split_once(',')
        .filter(|(_, col)| !col.contains(','))
        .ok_or_else(|| ProtocolError::MalformedMove(line.to_string()))?;
    let number = |raw: &str| {
        raw.trim()
            .parse::<i32>()
            .map_err(|_| ProtocolError::InvalidCoordinate(raw.to_string()))
    };
    Ok(Cell::new(number(row)?, number(col)?))
}

/// A line sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ServerMessage {
    /// Greeting sent first on admission.
    #[display("Witaj, Graczu {}!", _0)]
    Welcome(PlayerId),

    /// Seat assignment.
    #[display("PLAYER_ID:{}", _0)]
    PlayerId(PlayerId),

    /// Number of seats in the game.
    #[display("Liczba graczy:{}", _0)]
    PlayerCount(usize),

    /// Rule variant of the game.
    #[display("Wariant gry:{}", _0)]
    Variant(Variant),

    /// The randomized turn order.
    #[display("Kolejność gry: [{}]", format_order(_0))]
    Order(Vec<PlayerId>),

    /// Sent to the active player.
    #[display("Twoja tura!")]
    YourTurn,

    /// Sent to everyone but the active player.
    #[display("Gracz {} wykonuje ruch.", _0)]
    TurnOf(PlayerId),

    /// Serialized board.
    #[display("Stan planszy:{}", _0)]
    BoardState(String),

    /// A successful move, echoed to the other players.
    #[display("Gracz {} wykonał ruch: {}", _0, _1)]
    Moved(PlayerId, String),

    /// The move-result descriptor sent back to the mover.
    #[display("{}", _0)]
    MoveResult(String),

    /// Follow-up to a rejected move.
    #[display("Nieprawidłowy ruch. Spróbuj ponownie.")]
    TryAgain,

    /// Follow-up to unparseable coordinates.
    #[display("Nieprawidłowe współrzędne. Spróbuj ponownie.")]
    InvalidCoordinates,

    /// Follow-up to an unknown command.
    #[display("Nieznane polecenie: {}", _0)]
    UnknownCommand(String),

    /// The active player passed.
    #[display("Gracz {} zrezygnował z ruchu.", _0)]
    Skipped(PlayerId),

    /// The active player did not answer in time.
    #[display("Gracz {} nie wykonał ruchu w wyznaczonym czasie.", _0)]
    TimedOut(PlayerId),

    /// A player finished.
    #[display("Gracz {} zajął miejsce {}!", _0, _1)]
    Placed(PlayerId, usize),

    /// A player was found disconnected outside their turn.
    #[display("Gracz {} rozłączył się.", _0)]
    Disconnected(PlayerId),

    /// A player dropped while it was their turn.
    #[display("Gracz {} rozłączył się w trakcie swojej tury!", _0)]
    DisconnectedDuringTurn(PlayerId),

    /// Header of the final standings.
    #[display("Gra zakończona! Kolejność końcowa: ")]
    GameOver,

    /// One line of the final standings.
    #[display("{}. miejsce: Gracz {}", _0, _1)]
    Standing(usize, PlayerId),

    /// A player that dropped before the end, listed after the standings.
    #[display("Gracz {} rozłączył się przed zakończeniem gry", _0)]
    DroppedOut(PlayerId),

    /// Sent to a connection that arrives after the start.
    #[display("Gra już się rozpoczęła.")]
    AlreadyStarted,
}

fn format_order(order: &[PlayerId]) -> String {
    order
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Returns the grid text of a board state line.
pub fn board_state(line: &str) -> Option<&str> {
    line.strip_prefix(BOARD_STATE_PREFIX).map(str::trim)
}

/// Returns the seat announced in a `PLAYER_ID:` line.
pub fn player_id(line: &str) -> Option<PlayerId> {
    line.strip_prefix("PLAYER_ID:")?.trim().parse().ok()
}
