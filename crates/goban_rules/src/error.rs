//! Error types for the rules engine.
//!
//! Every rejection leaves the game exactly as it was before the attempt, so
//! callers can surface these errors to players without any cleanup.

use crate::types::Color;
use thiserror::Error;

/// Why a stone placement was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IllegalMove {
    #[error("point is outside the board")]
    OutOfBounds,
    #[error("point is already occupied")]
    Occupied,
    #[error("stone would have no liberties")]
    Suicide,
    #[error("move repeats an earlier board position")]
    KoViolation,
}

/// Errors raised by operations on a running game.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("illegal move: {0}")]
    IllegalMove(#[from] IllegalMove),
    #[error("it is not {0}'s turn")]
    NotYourTurn(Color),
    #[error("the game is already over")]
    GameAlreadyOver,
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("the game is still in play")]
    StillInPlay,
}

/// Errors raised while reading or replaying a game record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("malformed record at byte {offset}: {reason}")]
    Malformed { offset: usize, reason: String },
    #[error("unsupported record property {0}")]
    Unsupported(String),
    #[error("invalid value {value:?} for property {property}")]
    InvalidValue { property: String, value: String },
    #[error("record is for a {found}x{found} board, match uses {expected}x{expected}")]
    SizeMismatch { expected: usize, found: usize },
    #[error("move {ply} cannot be replayed: {source}")]
    Replay {
        ply: usize,
        #[source]
        source: GameError,
    },
}

/// Errors raised when validating match settings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("board size {0} is outside the supported range 2..=25")]
    BoardSize(usize),
    #[error("komi must be a finite, non-negative number, got {0}")]
    Komi(f64),
    #[error("{0} overtime periods configured with a zero-length overtime window")]
    EmptyOvertime(u32),
    #[error("both seats are taken by {0}")]
    SamePlayer(String),
    #[error("player identity must not be empty")]
    EmptyIdentity,
}
