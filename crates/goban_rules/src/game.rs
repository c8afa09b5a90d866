//! # Board Engine
//!
//! Move legality, capture resolution and positional superko for a single
//! game, independent of clocks and players.
//!
//! ## Move application
//!
//! 1. The game must still be in play and it must be the mover's turn.
//! 2. A pass flips the side to move; two passes in a row end play.
//! 3. A placement must be on the board and on an empty point.
//! 4. Adjacent opponent groups left without liberties are removed first.
//! 5. The mover's own group must then have a liberty (no suicide).
//! 6. The resulting position must never have occurred before (superko).
//!
//! Any rejection restores the board and capture counts exactly.

use crate::board::Board;
use crate::error::{GameError, IllegalMove};
use crate::record::RecordedMove;
use crate::types::{Captures, Color, Move, Point};
use crate::zobrist::{Fingerprint, ZobristTable};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::trace;

// ============================================================================
// Phases and results
// ============================================================================

/// What happens after two consecutive passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    /// Players mark dead stones and confirm a score.
    #[default]
    Manual,
    /// The game ends immediately as a draw.
    Skip,
}

/// How a finished game was decided.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultReason {
    Resignation,
    Timeout,
    Score { black: f64, white: f64 },
    DoublePass,
}

/// Final outcome of a game. `winner` is `None` for a draw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GameResult {
    pub winner: Option<Color>,
    pub reason: ResultReason,
}

impl GameResult {
    /// Result code in game-record notation: `B+R`, `W+T`, `B+3.5`, `0`.
    pub fn record_code(&self) -> String {
        let Some(winner) = self.winner else {
            return "0".to_string();
        };
        let tag = winner.record_tag();
        match self.reason {
            ResultReason::Resignation => format!("{tag}+R"),
            ResultReason::Timeout => format!("{tag}+T"),
            ResultReason::Score { black, white } => format!("{tag}+{}", (black - white).abs()),
            ResultReason::DoublePass => "0".to_string(),
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.winner, self.reason) {
            (Some(w), ResultReason::Resignation) => write!(f, "{w} wins by resignation"),
            (Some(w), ResultReason::Timeout) => write!(f, "{w} wins on time"),
            (Some(w), ResultReason::Score { black, white }) => {
                write!(f, "{w} wins by score ({black} to {white})")
            }
            (None, ResultReason::Score { black, white }) => {
                write!(f, "draw by score ({black} to {white})")
            }
            (_, ResultReason::DoublePass) | (None, _) => write!(f, "draw after consecutive passes"),
        }
    }
}

/// Lifecycle of a game.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Playing,
    /// Play has ended by two passes; dead stones are being marked.
    Scoring,
    Finished(GameResult),
}

/// What a successful move did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Placed { captured: usize },
    Passed,
    /// A second consecutive pass ended play.
    PlayEnded,
    /// The mover's opponent ran out of time before the move was made.
    TimedOut { loser: Color },
}

// ============================================================================
// Game
// ============================================================================

/// Board state plus everything needed to judge the next move.
#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    to_move: Color,
    passes: u32,
    captures: Captures,
    history: Vec<Fingerprint>,
    seen: HashSet<Fingerprint>,
    zobrist: ZobristTable,
    moves: Vec<RecordedMove>,
    phase: Phase,
    scoring_mode: ScoringMode,
}

impl Game {
    pub fn new(size: usize, scoring_mode: ScoringMode) -> Self {
        Self {
            board: Board::new(size),
            to_move: Color::Black,
            passes: 0,
            captures: Captures::default(),
            history: Vec::new(),
            seen: HashSet::new(),
            zobrist: ZobristTable::new(size),
            moves: Vec::new(),
            phase: Phase::Playing,
            scoring_mode,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn to_move(&self) -> Color {
        self.to_move
    }

    pub fn passes(&self) -> u32 {
        self.passes
    }

    pub fn captures(&self) -> Captures {
        self.captures
    }

    /// Every accepted move in order, passes included.
    pub fn moves(&self) -> &[RecordedMove] {
        &self.moves
    }

    /// Fingerprints of every position produced by a placement, oldest first.
    pub fn history(&self) -> &[Fingerprint] {
        &self.history
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase == Phase::Playing
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished(_))
    }

    pub fn result(&self) -> Option<&GameResult> {
        match &self.phase {
            Phase::Finished(result) => Some(result),
            _ => None,
        }
    }

    /// Applies a move for `color`.
    ///
    /// # Arguments
    ///
    /// * `color` - The side attempting the move
    /// * `mv` - A placement or a pass
    ///
    /// # Returns
    ///
    /// What the move did, or the reason it was rejected. A rejected move
    /// leaves the game untouched.
    pub fn play(&mut self, color: Color, mv: Move) -> Result<MoveOutcome, GameError> {
        if !self.is_playing() {
            return Err(GameError::GameAlreadyOver);
        }
        if color != self.to_move {
            return Err(GameError::NotYourTurn(color));
        }

        match mv {
            Move::Pass => Ok(self.pass(color)),
            Move::Place(point) => {
                let captured = self.place(color, point)?;
                Ok(MoveOutcome::Placed { captured })
            }
        }
    }

    fn pass(&mut self, color: Color) -> MoveOutcome {
        self.passes += 1;
        self.to_move = color.opponent();
        self.moves.push(RecordedMove { color, point: None });
        trace!("{} passes ({} in a row)", color, self.passes);

        if self.passes < 2 {
            return MoveOutcome::Passed;
        }
        self.phase = match self.scoring_mode {
            ScoringMode::Manual => Phase::Scoring,
            ScoringMode::Skip => Phase::Finished(GameResult {
                winner: None,
                reason: ResultReason::DoublePass,
            }),
        };
        MoveOutcome::PlayEnded
    }

    fn place(&mut self, color: Color, point: Point) -> Result<usize, IllegalMove> {
        if !self.board.contains(point) {
            return Err(IllegalMove::OutOfBounds);
        }
        if self.board.get(point).is_some() {
            return Err(IllegalMove::Occupied);
        }

        let board_before = self.board.clone();
        let captures_before = self.captures;

        self.board.set(point, Some(color));
        let opponent = color.opponent();
        let mut captured = 0;
        for neighbor in self.board.neighbors(point) {
            if self.board.get(neighbor) != Some(opponent) {
                continue;
            }
            if let Some(group) = self.board.group_at(neighbor) {
                if group.liberties == 0 {
                    captured += group.stones.len();
                    self.board.remove(&group.stones);
                }
            }
        }
        self.captures.add(color, captured);

        let rejection = match self.board.group_at(point) {
            Some(own) if own.liberties == 0 => Some(IllegalMove::Suicide),
            _ => None,
        };
        let fingerprint = self.zobrist.hash(&self.board);
        let rejection = rejection.or_else(|| {
            self.seen
                .contains(&fingerprint)
                .then_some(IllegalMove::KoViolation)
        });
        if let Some(reason) = rejection {
            self.board = board_before;
            self.captures = captures_before;
            trace!("{} at {} rejected: {}", color, point, reason);
            return Err(reason);
        }

        self.history.push(fingerprint);
        self.seen.insert(fingerprint);
        self.moves.push(RecordedMove {
            color,
            point: Some(point),
        });
        self.passes = 0;
        self.to_move = opponent;
        Ok(captured)
    }

    /// Ends the game in favour of `color`'s opponent.
    ///
    /// Allowed while playing and while marking dead stones.
    pub fn resign(&mut self, color: Color) -> Result<GameResult, GameError> {
        if self.is_finished() {
            return Err(GameError::GameAlreadyOver);
        }
        let result = GameResult {
            winner: Some(color.opponent()),
            reason: ResultReason::Resignation,
        };
        self.phase = Phase::Finished(result);
        Ok(result)
    }

    pub(crate) fn finish(&mut self, result: GameResult) {
        self.phase = Phase::Finished(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(game: &mut Game, x: usize, y: usize) -> Result<MoveOutcome, GameError> {
        let color = game.to_move();
        game.play(color, Move::Place(Point::new(x, y)))
    }

    #[test]
    fn single_stone_capture() {
        let mut game = Game::new(9, ScoringMode::Manual);
        // Black surrounds a white stone at (1,1).
        place(&mut game, 1, 0).unwrap();
        place(&mut game, 1, 1).unwrap();
        place(&mut game, 0, 1).unwrap();
        place(&mut game, 8, 8).unwrap();
        place(&mut game, 2, 1).unwrap();
        place(&mut game, 8, 7).unwrap();
        let outcome = place(&mut game, 1, 2).unwrap();

        assert_eq!(outcome, MoveOutcome::Placed { captured: 1 });
        assert_eq!(game.board().get(Point::new(1, 1)), None);
        assert_eq!(game.captures().black, 1);
        assert_eq!(game.to_move(), Color::White);
    }

    #[test]
    fn wrong_turn_is_rejected_without_change() {
        let mut game = Game::new(9, ScoringMode::Manual);
        let err = game.play(Color::White, Move::Place(Point::new(0, 0))).unwrap_err();
        assert_eq!(err, GameError::NotYourTurn(Color::White));
        assert_eq!(game.board(), &Board::new(9));
        assert!(game.history().is_empty());
    }

    #[test]
    fn out_of_bounds_and_occupied() {
        let mut game = Game::new(9, ScoringMode::Manual);
        assert_eq!(
            place(&mut game, 9, 0).unwrap_err(),
            GameError::IllegalMove(IllegalMove::OutOfBounds)
        );
        place(&mut game, 4, 4).unwrap();
        assert_eq!(
            place(&mut game, 4, 4).unwrap_err(),
            GameError::IllegalMove(IllegalMove::Occupied)
        );
        assert_eq!(game.to_move(), Color::White);
    }

    #[test]
    fn suicide_is_rejected_and_board_restored() {
        let mut game = Game::new(5, ScoringMode::Manual);
        place(&mut game, 1, 0).unwrap();
        place(&mut game, 4, 4).unwrap();
        place(&mut game, 0, 1).unwrap();
        let before = game.board().clone();

        let err = place(&mut game, 0, 0).unwrap_err();
        assert_eq!(err, GameError::IllegalMove(IllegalMove::Suicide));
        assert_eq!(game.board(), &before);
        assert_eq!(game.to_move(), Color::White);
    }

    #[test]
    fn double_pass_enters_scoring_or_draws() {
        let mut manual = Game::new(9, ScoringMode::Manual);
        assert_eq!(manual.play(Color::Black, Move::Pass).unwrap(), MoveOutcome::Passed);
        assert_eq!(manual.play(Color::White, Move::Pass).unwrap(), MoveOutcome::PlayEnded);
        assert_eq!(manual.phase(), &Phase::Scoring);

        let mut skip = Game::new(9, ScoringMode::Skip);
        skip.play(Color::Black, Move::Pass).unwrap();
        skip.play(Color::White, Move::Pass).unwrap();
        let result = skip.result().unwrap();
        assert_eq!(result.winner, None);
        assert_eq!(result.record_code(), "0");
    }

    #[test]
    fn placement_resets_pass_count() {
        let mut game = Game::new(9, ScoringMode::Manual);
        game.play(Color::Black, Move::Pass).unwrap();
        place(&mut game, 2, 2).unwrap();
        assert_eq!(game.passes(), 0);
        game.play(Color::Black, Move::Pass).unwrap();
        assert!(game.is_playing());
    }

    #[test]
    fn resign_is_final() {
        let mut game = Game::new(9, ScoringMode::Manual);
        let result = game.resign(Color::Black).unwrap();
        assert_eq!(result.winner, Some(Color::White));
        assert_eq!(result.to_string(), "white wins by resignation");
        assert_eq!(result.record_code(), "W+R");
        assert_eq!(game.resign(Color::White).unwrap_err(), GameError::GameAlreadyOver);
        assert_eq!(place(&mut game, 0, 0).unwrap_err(), GameError::GameAlreadyOver);
    }
}
