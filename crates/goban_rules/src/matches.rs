//! # Match Aggregate
//!
//! A [`Match`] ties one [`Game`] to its clocks, its dead-stone set and the
//! identities seated at each colour. Every rules-affecting operation a player
//! can trigger goes through this type, and every way a game can end
//! (resignation, timeout, double pass, confirmed score) lands in the same
//! finished phase of the underlying game.

use crate::board::{MAX_BOARD_SIZE, MIN_BOARD_SIZE};
use crate::clock::{ClockSettings, ClockTick, GameClock};
use crate::error::{ConfigError, GameError, RecordError};
use crate::game::{Game, GameResult, MoveOutcome, Phase, ResultReason, ScoringMode};
use crate::record::{GameRecord, RecordedMove};
use crate::scoring::{self, Score};
use crate::types::{Color, Move, Point};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{debug, info};

// ============================================================================
// Configuration
// ============================================================================

/// Position to start a match from instead of an empty board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum MatchSeed {
    Moves(Vec<RecordedMove>),
    /// Game record text; only its moves are used.
    Record(String),
}

/// Everything needed to start a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub board_size: usize,
    pub komi: f64,
    pub main_time_secs: u64,
    pub overtime_secs: u64,
    pub overtime_periods: u32,
    pub scoring: ScoringMode,
    pub seed: Option<MatchSeed>,
    pub black: String,
    pub white: String,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            board_size: 19,
            komi: 6.5,
            main_time_secs: 600,
            overtime_secs: 30,
            overtime_periods: 3,
            scoring: ScoringMode::Manual,
            seed: None,
            black: String::new(),
            white: String::new(),
        }
    }
}

impl MatchConfig {
    /// Default settings for the given pair of players.
    pub fn between(black: impl Into<String>, white: impl Into<String>) -> Self {
        Self {
            black: black.into(),
            white: white.into(),
            ..Self::default()
        }
    }

    /// Checks the time control and board settings only.
    pub fn validate_settings(&self) -> Result<(), ConfigError> {
        if !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&self.board_size) {
            return Err(ConfigError::BoardSize(self.board_size));
        }
        if !self.komi.is_finite() || self.komi < 0.0 {
            return Err(ConfigError::Komi(self.komi));
        }
        if self.overtime_periods > 0 && self.overtime_secs == 0 {
            return Err(ConfigError::EmptyOvertime(self.overtime_periods));
        }
        Ok(())
    }

    /// Checks settings plus the two seats.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_settings()?;
        if self.black.trim().is_empty() || self.white.trim().is_empty() {
            return Err(ConfigError::EmptyIdentity);
        }
        if self.black == self.white {
            return Err(ConfigError::SamePlayer(self.black.clone()));
        }
        Ok(())
    }

    pub fn clock_settings(&self) -> ClockSettings {
        ClockSettings::from_secs(self.main_time_secs, self.overtime_secs, self.overtime_periods)
    }
}

// ============================================================================
// Match
// ============================================================================

/// A live game between two seated players.
#[derive(Debug, Clone)]
pub struct Match {
    game: Game,
    clock: GameClock,
    dead_stones: BTreeSet<Point>,
    komi: f64,
    black: String,
    white: String,
}

impl Match {
    /// Creates a fresh match and starts black's clock at `now`.
    ///
    /// The seed in `config` is not applied here; see [`Match::apply_seed`].
    pub fn new(config: &MatchConfig, now: Instant) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut clock = GameClock::new(config.clock_settings());
        clock.start(Color::Black, now);
        Ok(Self {
            game: Game::new(config.board_size, config.scoring),
            clock,
            dead_stones: BTreeSet::new(),
            komi: config.komi,
            black: config.black.clone(),
            white: config.white.clone(),
        })
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    pub fn dead_stones(&self) -> &BTreeSet<Point> {
        &self.dead_stones
    }

    pub fn komi(&self) -> f64 {
        self.komi
    }

    /// Identity seated at `color`.
    pub fn player(&self, color: Color) -> &str {
        match color {
            Color::Black => &self.black,
            Color::White => &self.white,
        }
    }

    /// Colour played by `identity`, if it is seated in this match.
    pub fn color_of(&self, identity: &str) -> Option<Color> {
        if identity == self.black {
            Some(Color::Black)
        } else if identity == self.white {
            Some(Color::White)
        } else {
            None
        }
    }

    pub fn is_over(&self) -> bool {
        self.game.is_finished()
    }

    pub fn result(&self) -> Option<&GameResult> {
        self.game.result()
    }

    /// Replays `moves` without touching the clocks.
    ///
    /// On failure the match may be partially advanced; callers that need
    /// all-or-nothing semantics replay into a fresh match and discard it.
    pub fn replay(&mut self, moves: &[RecordedMove]) -> Result<usize, RecordError> {
        for (ply, recorded) in moves.iter().enumerate() {
            self.game
                .play(recorded.color, Move::from(recorded.point))
                .map_err(|source| RecordError::Replay { ply: ply + 1, source })?;
        }
        Ok(moves.len())
    }

    /// Advances a fresh match to the position described by `seed`, then
    /// restarts the clock for whichever side is to move.
    pub fn apply_seed(&mut self, seed: &MatchSeed, now: Instant) -> Result<usize, RecordError> {
        let applied = match seed {
            MatchSeed::Moves(moves) => self.replay(moves)?,
            MatchSeed::Record(text) => {
                let record = GameRecord::parse(text)?;
                let expected = self.game.board().size();
                if record.size != expected {
                    return Err(RecordError::SizeMismatch {
                        expected,
                        found: record.size,
                    });
                }
                self.replay(&record.moves)?
            }
        };
        self.clock.start(self.game.to_move(), now);
        debug!("Seeded match with {} moves", applied);
        Ok(applied)
    }

    /// Applies a move for `color`, charging clocks at `now`.
    ///
    /// # Arguments
    ///
    /// * `color` - The side attempting the move
    /// * `mv` - Placement or pass
    /// * `now` - Current time used by the clocks
    ///
    /// # Returns
    ///
    /// The move outcome. If the waiting side's clock ran out before the move
    /// the game ends by timeout and [`MoveOutcome::TimedOut`] is returned; the
    /// move itself is not applied. Rejected moves leave the match unchanged,
    /// clocks included.
    pub fn play(&mut self, color: Color, mv: Move, now: Instant) -> Result<MoveOutcome, GameError> {
        if !self.game.is_playing() {
            return Err(GameError::GameAlreadyOver);
        }
        if color != self.game.to_move() {
            return Err(GameError::NotYourTurn(color));
        }

        let mut clock = self.clock.clone();
        if let ClockTick::Expired(loser) = clock.tick(color, now) {
            self.clock = clock;
            self.finish(GameResult {
                winner: Some(loser.opponent()),
                reason: ResultReason::Timeout,
            });
            return Ok(MoveOutcome::TimedOut { loser });
        }

        let outcome = self.game.play(color, mv)?;
        self.clock = clock;
        if self.game.is_playing() {
            // The charged side was stamped by the first tick, so this cannot expire.
            self.clock.tick(self.game.to_move(), now);
        } else {
            info!("Play ended after {} moves", self.game.moves().len());
        }
        Ok(outcome)
    }

    /// Resigns on behalf of `color`.
    pub fn resign(&mut self, color: Color) -> Result<GameResult, GameError> {
        let result = self.game.resign(color)?;
        info!("{} resigned: {}", self.player(color), result);
        Ok(result)
    }

    /// Toggles a dead-stone mark. Only valid while scoring.
    pub fn mark_dead_stone(&mut self, point: Point, color: Color) -> Result<bool, GameError> {
        match self.game.phase() {
            Phase::Playing => return Err(GameError::StillInPlay),
            Phase::Finished(_) => return Err(GameError::GameAlreadyOver),
            Phase::Scoring => {}
        }
        scoring::toggle_dead_stone(self.game.board(), &mut self.dead_stones, point, color)
    }

    /// Current area count while scoring, or the count a game was decided by.
    ///
    /// Games that ended by resignation, timeout or a skipped scoring phase
    /// have no count.
    pub fn provisional_score(&self) -> Option<Score> {
        match self.game.phase() {
            Phase::Scoring
            | Phase::Finished(GameResult {
                reason: ResultReason::Score { .. },
                ..
            }) => Some(scoring::count_area(self.game.board(), &self.dead_stones, self.komi)),
            _ => None,
        }
    }

    /// Scores the position and finishes the game.
    ///
    /// Calling this again on a game already finished by score recomputes the
    /// same result without further changes.
    pub fn finalize_score(&mut self) -> Result<Score, GameError> {
        match self.game.phase() {
            Phase::Playing => return Err(GameError::StillInPlay),
            Phase::Finished(result) if !matches!(result.reason, ResultReason::Score { .. }) => {
                return Err(GameError::GameAlreadyOver)
            }
            _ => {}
        }

        let score = scoring::count_area(self.game.board(), &self.dead_stones, self.komi);
        if self.game.phase() == &Phase::Scoring {
            self.finish(GameResult {
                winner: score.winner(),
                reason: ResultReason::Score {
                    black: score.black,
                    white: score.white,
                },
            });
        }
        Ok(score)
    }

    fn finish(&mut self, result: GameResult) {
        info!("Match between {} and {} finished: {}", self.black, self.white, result);
        self.game.finish(result);
    }

    /// Archival record of the game so far.
    pub fn to_record(&self) -> GameRecord {
        GameRecord {
            size: self.game.board().size(),
            komi: Some(self.komi),
            black: Some(self.black.clone()),
            white: Some(self.white.clone()),
            result: None,
            moves: self.game.moves().to_vec(),
        }
        .with_result(self.game.result())
    }
}
