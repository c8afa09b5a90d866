//! Zobrist fingerprints for board positions.
//!
//! Each (intersection, colour) pair gets a fixed 64-bit key drawn from a
//! seeded PCG generator. A position's fingerprint is the XOR of the keys of
//! all stones on the board, so equal boards always produce equal
//! fingerprints and the keys are identical across processes.

use crate::board::Board;
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64;

/// Fingerprint of a whole-board position.
pub type Fingerprint = u64;

const ZOBRIST_SEED: u64 = 0x676f_6261_6e5f_6b6f;

/// Per-size table of random keys.
#[derive(Debug, Clone)]
pub struct ZobristTable {
    keys: Vec<[u64; 2]>,
}

impl ZobristTable {
    pub fn new(size: usize) -> Self {
        Self::with_seed(size, ZOBRIST_SEED)
    }

    pub fn with_seed(size: usize, seed: u64) -> Self {
        let mut rng = Pcg64::seed_from_u64(seed);
        let keys = (0..size * size)
            .map(|_| [rng.next_u64(), rng.next_u64()])
            .collect();
        Self { keys }
    }

    /// Fingerprint of `board`. The board must match the table's size.
    pub fn hash(&self, board: &Board) -> Fingerprint {
        board
            .points()
            .enumerate()
            .filter_map(|(i, (_, stone))| stone.map(|c| self.keys[i][c.index()]))
            .fold(0, |acc, key| acc ^ key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Color, Point};

    #[test]
    fn empty_board_hashes_to_zero() {
        let table = ZobristTable::new(9);
        assert_eq!(table.hash(&Board::new(9)), 0);
    }

    #[test]
    fn colour_and_placement_change_the_fingerprint() {
        let table = ZobristTable::new(9);
        let mut black = Board::new(9);
        black.set(Point::new(4, 4), Some(Color::Black));
        let mut white = Board::new(9);
        white.set(Point::new(4, 4), Some(Color::White));
        assert_ne!(table.hash(&black), table.hash(&white));

        // Same stones in a different order of placement.
        let mut a = Board::new(9);
        a.set(Point::new(1, 1), Some(Color::Black));
        a.set(Point::new(2, 2), Some(Color::White));
        let mut b = Board::new(9);
        b.set(Point::new(2, 2), Some(Color::White));
        b.set(Point::new(1, 1), Some(Color::Black));
        assert_eq!(table.hash(&a), table.hash(&b));
    }

    #[test]
    fn tables_are_deterministic() {
        let mut board = Board::new(19);
        board.set(Point::new(3, 15), Some(Color::Black));
        assert_eq!(ZobristTable::new(19).hash(&board), ZobristTable::new(19).hash(&board));
    }
}
