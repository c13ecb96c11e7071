//! Errors raised while saving or restoring games.

use derive_more::{Display, Error};
use tracing::instrument;

/// What part of the game store failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum StoreErrorKind {
    /// The backing database could not be opened, migrated or locked.
    #[display("store unavailable")]
    Unavailable,
    /// A read or write against a reachable store failed.
    #[display("query failed")]
    Query,
    /// A saved row does not describe a valid game, move or board.
    #[display("corrupt record")]
    Corrupt,
    /// No more game ids can be handed out.
    #[display("ids exhausted")]
    Exhausted,
}

/// Game store failure, tagged with its kind and the call site that raised it.
#[derive(Debug, Clone, Display, Error)]
#[display("Game store {}: {} at {}:{}", kind, message, file, line)]
pub struct StoreError {
    /// Failure class.
    pub kind: StoreErrorKind,
    /// Details, usually naming the game or row involved.
    pub message: String,
    /// Line of the call that raised the error.
    pub line: u32,
    /// File of the call that raised the error.
    pub file: &'static str,
}

impl StoreError {
    /// Creates a store error at the caller's location.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// The database cannot be reached.
    #[track_caller]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Unavailable, message)
    }

    /// A stored row failed to decode.
    #[track_caller]
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Corrupt, message)
    }
}

impl From<diesel::result::Error> for StoreError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        Self::new(StoreErrorKind::Query, err.to_string())
    }
}

impl From<diesel::ConnectionError> for StoreError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        Self::unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::corrupt(format!("turn order is not a JSON list of seats: {}", err))
    }
}

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    #[track_caller]
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Self::unavailable("in-memory store lock poisoned by a panicked writer")
    }
}
