//! # Wire Protocol
//!
//! Payload shapes exchanged with the transport collaborator. Inbound actions
//! and outbound messages are JSON objects tagged by a `type` field; field
//! names are camelCase.
//!
//! ## Inbound
//!
//! ```json
//! {"type": "move", "matchId": "…", "x": 3, "y": 4}
//! {"type": "move", "matchId": "…"}                      // pass
//! {"type": "resign", "matchId": "…", "color": "black"}
//! {"type": "mark_dead_stone", "matchId": "…", "x": 0, "y": 0}
//! {"type": "confirm_scoring", "matchId": "…"}
//! ```
//!
//! Unknown `type` values are rejected rather than guessed at.

use crate::error::ServerError;
use crate::ids::{ChannelId, MatchId};
use goban_rules::{Captures, ClockState, Color, Match, Point};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Inbound actions
// ============================================================================

/// A player action, already attributed to an identity by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientAction {
    /// Place a stone, or pass when both coordinates are absent.
    Move {
        match_id: MatchId,
        #[serde(default)]
        x: Option<i64>,
        #[serde(default)]
        y: Option<i64>,
    },
    Resign {
        match_id: MatchId,
        color: Color,
    },
    MarkDeadStone {
        match_id: MatchId,
        x: i64,
        y: i64,
    },
    ConfirmScoring {
        match_id: MatchId,
    },
}

impl ClientAction {
    /// Decodes an action from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ServerError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn match_id(&self) -> MatchId {
        match self {
            ClientAction::Move { match_id, .. }
            | ClientAction::Resign { match_id, .. }
            | ClientAction::MarkDeadStone { match_id, .. }
            | ClientAction::ConfirmScoring { match_id } => *match_id,
        }
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientAction::Move { .. } => "move",
            ClientAction::Resign { .. } => "resign",
            ClientAction::MarkDeadStone { .. } => "mark_dead_stone",
            ClientAction::ConfirmScoring { .. } => "confirm_scoring",
        }
    }
}

// ============================================================================
// Outbound messages
// ============================================================================

/// Everything the core pushes to connections.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Full match state after any change.
    GameUpdate(MatchSnapshot),
    /// Opaque payload produced by the matchmaking collaborator.
    LobbyUpdate { data: Value },
    /// Opaque payload for a pre-match room.
    RoomUpdate { room_id: String, data: Value },
    /// A channel the recipient was subscribed to no longer exists.
    ChannelClosed { channel: ChannelId },
    /// An action from the recipient was refused.
    ActionRejected {
        match_id: Option<MatchId>,
        reason: String,
    },
}

impl ServerMessage {
    pub fn to_json(&self) -> Result<String, ServerError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Remaining time for one side, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockView {
    pub main_time: f64,
    pub overtime: f64,
    pub periods: u32,
}

impl From<&ClockState> for ClockView {
    fn from(state: &ClockState) -> Self {
        Self {
            main_time: state.main_remaining().as_secs_f64(),
            overtime: state.overtime_remaining().as_secs_f64(),
            periods: state.periods_left(),
        }
    }
}

/// Dead stones and the provisional or final count.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringData {
    pub dead_stones: Vec<Point>,
    pub black_score: f64,
    pub white_score: f64,
}

/// Serializable view of a match. `board[y][x]`, row 0 is the bottom edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSnapshot {
    pub match_id: MatchId,
    pub board: Vec<Vec<Option<Color>>>,
    pub side_to_move: Color,
    pub black_id: String,
    pub white_id: String,
    pub game_over: bool,
    pub winner: Option<Color>,
    pub result: Option<String>,
    pub captures: Captures,
    pub black_clock: ClockView,
    pub white_clock: ClockView,
    pub move_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scoring_data: Option<ScoringData>,
}

impl MatchSnapshot {
    pub fn capture(match_id: MatchId, game: &Match) -> Self {
        let result = game.result();
        let scoring_data = game.provisional_score().map(|score| ScoringData {
            dead_stones: game.dead_stones().iter().copied().collect(),
            black_score: score.black,
            white_score: score.white,
        });
        Self {
            match_id,
            board: game.game().board().rows(),
            side_to_move: game.game().to_move(),
            black_id: game.player(Color::Black).to_string(),
            white_id: game.player(Color::White).to_string(),
            game_over: game.is_over(),
            winner: result.and_then(|r| r.winner),
            result: result.map(ToString::to_string),
            captures: game.game().captures(),
            black_clock: game.clock().state(Color::Black).into(),
            white_clock: game.clock().state(Color::White).into(),
            move_count: game.game().moves().len(),
            scoring_data,
        }
    }
}
