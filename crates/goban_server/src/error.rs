//! Error types for match hosting.

use crate::ids::MatchId;
use goban_rules::{ConfigError, GameError};
use thiserror::Error;

/// Errors returned by the registry, fanout and action handlers.
///
/// Rule violations are wrapped unchanged in [`ServerError::Game`]; they
/// never alter shared state.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("match {0} not found")]
    NotFound(MatchId),
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("invalid match configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("invalid action: {0}")]
    InvalidAction(String),
    #[error("malformed message: {0}")]
    Protocol(#[from] serde_json::Error),
}
