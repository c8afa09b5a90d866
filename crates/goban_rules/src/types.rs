//! # Core Type Definitions
//!
//! The small value types every other module in the rules engine builds on.
//!
//! ## Key Types
//!
//! - [`Color`] - The two sides of a match
//! - [`Point`] - A board intersection, origin at the bottom-left corner
//! - [`Move`] - Either a stone placement or a pass
//! - [`Captures`] - Per-colour count of opponent stones taken off the board

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Colour
// ============================================================================

/// One of the two sides in a match. Black always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Black,
    White,
}

impl Color {
    /// Returns the other side.
    pub fn opponent(self) -> Self {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// Stable index used for per-colour tables (black = 0, white = 1).
    pub fn index(self) -> usize {
        match self {
            Color::Black => 0,
            Color::White => 1,
        }
    }

    /// Single-letter tag used by the game record format.
    pub fn record_tag(self) -> char {
        match self {
            Color::Black => 'B',
            Color::White => 'W',
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Black => write!(f, "black"),
            Color::White => write!(f, "white"),
        }
    }
}

// ============================================================================
// Coordinates and moves
// ============================================================================

/// A board intersection.
///
/// `x` is the column counted from the left edge and `y` is the row counted
/// from the bottom edge. The game record format counts rows from the top;
/// conversion happens only in [`crate::record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

impl Point {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Converts signed wire coordinates into a point, rejecting negatives.
    ///
    /// Upper bounds depend on the board size and are checked by the board.
    pub fn from_signed(x: i64, y: i64) -> Option<Self> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        Some(Self { x, y })
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A single turn: place a stone or pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Move {
    Place(Point),
    Pass,
}

impl Move {
    /// The placed point, or `None` for a pass.
    pub fn point(self) -> Option<Point> {
        match self {
            Move::Place(point) => Some(point),
            Move::Pass => None,
        }
    }
}

impl From<Option<Point>> for Move {
    fn from(point: Option<Point>) -> Self {
        point.map_or(Move::Pass, Move::Place)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Place(point) => write!(f, "{point}"),
            Move::Pass => write!(f, "pass"),
        }
    }
}

// ============================================================================
// Captures
// ============================================================================

/// Opponent stones removed by each side over the course of the game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Captures {
    pub black: usize,
    pub white: usize,
}

impl Captures {
    pub fn get(&self, color: Color) -> usize {
        match color {
            Color::Black => self.black,
            Color::White => self.white,
        }
    }

    pub(crate) fn add(&mut self, color: Color, stones: usize) {
        match color {
            Color::Black => self.black += stones,
            Color::White => self.white += stones,
        }
    }
}
