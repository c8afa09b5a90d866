//! # Goban Rules
//!
//! Pure rules for live two-player Go matches. Nothing in this crate performs
//! I/O or spawns tasks; time is always passed in by the caller.
//!
//! ## Modules
//!
//! - [`board`] - Grid storage, neighbours, iterative group and liberty discovery
//! - [`zobrist`] - Deterministic whole-board fingerprints for superko
//! - [`game`] - Move legality, capture, superko, passes and resignation
//! - [`clock`] - Main time plus renewable overtime windows
//! - [`scoring`] - Dead-stone marking and area scoring
//! - [`record`] - Game record import and export
//! - [`matches`] - The [`Match`] aggregate that ties the pieces together
//!
//! ## Quick Start
//!
//! ```rust
//! use goban_rules::{Color, Match, MatchConfig, Move, Point};
//! use std::time::Instant;
//!
//! let config = MatchConfig { board_size: 9, ..MatchConfig::between("alice", "bob") };
//! let mut game = Match::new(&config, Instant::now())?;
//! game.play(Color::Black, Move::Place(Point::new(4, 4)), Instant::now())?;
//! assert_eq!(game.game().to_move(), Color::White);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod board;
pub mod clock;
pub mod error;
pub mod game;
pub mod matches;
pub mod record;
pub mod scoring;
pub mod types;
pub mod zobrist;

pub use board::{Board, Group, MAX_BOARD_SIZE, MIN_BOARD_SIZE};
pub use clock::{ClockSettings, ClockState, ClockTick, GameClock};
pub use error::{ConfigError, GameError, IllegalMove, RecordError};
pub use game::{Game, GameResult, MoveOutcome, Phase, ResultReason, ScoringMode};
pub use matches::{Match, MatchConfig, MatchSeed};
pub use record::{GameRecord, RecordedMove};
pub use scoring::Score;
pub use types::{Captures, Color, Move, Point};
pub use zobrist::{Fingerprint, ZobristTable};
