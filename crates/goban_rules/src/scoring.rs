//! # Scoring Engine
//!
//! Dead-stone marking and area scoring once play has ended.
//!
//! Scoring works on a scratch copy of the board with every marked dead stone
//! removed. Each maximal empty region is flood-filled; it counts as territory
//! for a colour only when every stone bordering it is that colour. A side's
//! score is its territory plus its living stones, and white adds komi.

use crate::board::Board;
use crate::error::{GameError, IllegalMove};
use crate::types::{Color, Point};
use serde::Serialize;
use std::collections::BTreeSet;

/// Final or provisional area count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Score {
    pub black: f64,
    pub white: f64,
    pub black_territory: usize,
    pub white_territory: usize,
}

impl Score {
    /// The higher score wins; equal scores are a draw.
    pub fn winner(&self) -> Option<Color> {
        if self.black > self.white {
            Some(Color::Black)
        } else if self.white > self.black {
            Some(Color::White)
        } else {
            None
        }
    }
}

/// Toggles `point` in `dead`. Only the requester's own stones may be marked.
///
/// # Returns
///
/// `true` when the stone is now marked dead, `false` when the mark was lifted.
pub fn toggle_dead_stone(
    board: &Board,
    dead: &mut BTreeSet<Point>,
    point: Point,
    requester: Color,
) -> Result<bool, GameError> {
    if !board.contains(point) {
        return Err(IllegalMove::OutOfBounds.into());
    }
    match board.get(point) {
        Some(owner) if owner == requester => {}
        Some(_) => {
            return Err(GameError::Forbidden(format!(
                "{requester} may only mark its own stones dead"
            )))
        }
        None => return Err(GameError::Forbidden(format!("no stone at {point}"))),
    }

    if dead.remove(&point) {
        Ok(false)
    } else {
        dead.insert(point);
        Ok(true)
    }
}

/// Area score of `board` with `dead` stones removed.
pub fn count_area(board: &Board, dead: &BTreeSet<Point>, komi: f64) -> Score {
    let mut scratch = board.clone();
    scratch.remove(&dead.iter().copied().collect::<Vec<_>>());

    let mut territory = [0usize; 2];
    let mut visited = vec![false; board.size() * board.size()];
    for (point, stone) in scratch.points() {
        if stone.is_some() {
            continue;
        }
        let (region, borders) = scratch.empty_region(point, &mut visited);
        match borders {
            [true, false] => territory[Color::Black.index()] += region.len(),
            [false, true] => territory[Color::White.index()] += region.len(),
            _ => {}
        }
    }

    let black_territory = territory[Color::Black.index()];
    let white_territory = territory[Color::White.index()];
    Score {
        black: (black_territory + scratch.count(Color::Black)) as f64,
        white: (white_territory + scratch.count(Color::White)) as f64 + komi,
        black_territory,
        white_territory,
    }
}
