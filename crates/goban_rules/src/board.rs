//! # Board Representation
//!
//! A square grid of intersections, each empty or holding one stone.
//!
//! Group and liberty discovery is iterative (explicit stack plus visited
//! bitmap) so very large connected groups cannot exhaust the call stack.

use crate::types::{Color, Point};

/// Smallest supported board edge.
pub const MIN_BOARD_SIZE: usize = 2;
/// Largest supported board edge. Record coordinates use one letter per axis.
pub const MAX_BOARD_SIZE: usize = 25;

const NEIGHBOR_OFFSETS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// A maximal set of orthogonally connected same-colour stones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub color: Color,
    pub stones: Vec<Point>,
    /// Number of distinct empty intersections adjacent to the group.
    pub liberties: usize,
}

/// Grid contents. Cells are stored row-major starting from the bottom row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    size: usize,
    cells: Vec<Option<Color>>,
}

impl Board {
    /// Creates an empty board.
    ///
    /// Size validation happens at match configuration time; the board itself
    /// accepts any edge length.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x < self.size && point.y < self.size
    }

    fn index(&self, point: Point) -> Option<usize> {
        self.contains(point).then(|| point.y * self.size + point.x)
    }

    /// Contents of an intersection. Off-board points read as empty.
    pub fn get(&self, point: Point) -> Option<Color> {
        self.index(point).and_then(|i| self.cells[i])
    }

    pub(crate) fn set(&mut self, point: Point, stone: Option<Color>) {
        if let Some(i) = self.index(point) {
            self.cells[i] = stone;
        }
    }

    pub(crate) fn remove(&mut self, stones: &[Point]) {
        for &point in stones {
            self.set(point, None);
        }
    }

    /// On-board orthogonal neighbours of `point`.
    pub fn neighbors(&self, point: Point) -> impl Iterator<Item = Point> {
        let size = self.size;
        NEIGHBOR_OFFSETS.into_iter().filter_map(move |(dx, dy)| {
            let x = point.x.checked_add_signed(dx)?;
            let y = point.y.checked_add_signed(dy)?;
            (x < size && y < size).then_some(Point::new(x, y))
        })
    }

    /// Every intersection with its contents, bottom row first.
    pub fn points(&self) -> impl Iterator<Item = (Point, Option<Color>)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, stone)| (Point::new(i % self.size, i / self.size), *stone))
    }

    /// Number of stones of `color` on the board.
    pub fn count(&self, color: Color) -> usize {
        self.cells.iter().filter(|c| **c == Some(color)).count()
    }

    /// Rows indexed by `y`, each row indexed by `x`.
    pub fn rows(&self) -> Vec<Vec<Option<Color>>> {
        if self.size == 0 {
            return Vec::new();
        }
        self.cells.chunks(self.size).map(|row| row.to_vec()).collect()
    }

    /// The group containing the stone at `point`, or `None` if it is empty.
    pub fn group_at(&self, point: Point) -> Option<Group> {
        let color = self.get(point)?;
        let mut visited = vec![false; self.cells.len()];
        let mut liberty_seen = vec![false; self.cells.len()];
        let mut stack = vec![point];
        let mut stones = Vec::new();
        let mut liberties = 0;

        visited[self.index(point)?] = true;
        while let Some(current) = stack.pop() {
            stones.push(current);
            for next in self.neighbors(current) {
                let Some(i) = self.index(next) else { continue };
                match self.cells[i] {
                    None if !liberty_seen[i] => {
                        liberty_seen[i] = true;
                        liberties += 1;
                    }
                    Some(c) if c == color && !visited[i] => {
                        visited[i] = true;
                        stack.push(next);
                    }
                    _ => {}
                }
            }
        }

        Some(Group {
            color,
            stones,
            liberties,
        })
    }

    /// Collects the empty region containing `point` together with the set of
    /// colours that border it. Used by area scoring.
    pub(crate) fn empty_region(&self, point: Point, visited: &mut [bool]) -> (Vec<Point>, [bool; 2]) {
        let mut region = Vec::new();
        let mut borders = [false; 2];
        let Some(start) = self.index(point) else {
            return (region, borders);
        };
        if self.cells[start].is_some() || visited[start] {
            return (region, borders);
        }

        visited[start] = true;
        let mut stack = vec![point];
        while let Some(current) = stack.pop() {
            region.push(current);
            for next in self.neighbors(current) {
                let Some(i) = self.index(next) else { continue };
                match self.cells[i] {
                    Some(color) => borders[color.index()] = true,
                    None if !visited[i] => {
                        visited[i] = true;
                        stack.push(next);
                    }
                    None => {}
                }
            }
        }
        (region, borders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_has_two_neighbors() {
        let board = Board::new(9);
        let n: Vec<_> = board.neighbors(Point::new(0, 0)).collect();
        assert_eq!(n.len(), 2);
        assert!(n.contains(&Point::new(1, 0)));
        assert!(n.contains(&Point::new(0, 1)));
    }

    #[test]
    fn shared_liberties_are_counted_once() {
        let mut board = Board::new(5);
        board.set(Point::new(1, 1), Some(Color::Black));
        board.set(Point::new(2, 1), Some(Color::Black));
        board.set(Point::new(1, 2), Some(Color::Black));
        let group = board.group_at(Point::new(1, 1)).unwrap();
        assert_eq!(group.stones.len(), 3);
        // (2,2) touches two stones of the group but counts once.
        assert_eq!(group.liberties, 7);
    }

    #[test]
    fn board_filling_group_does_not_recurse() {
        let size = MAX_BOARD_SIZE;
        let mut board = Board::new(size);
        for y in 0..size {
            for x in 0..size {
                board.set(Point::new(x, y), Some(Color::White));
            }
        }
        board.set(Point::new(size - 1, size - 1), None);
        let group = board.group_at(Point::new(0, 0)).unwrap();
        assert_eq!(group.stones.len(), size * size - 1);
        assert_eq!(group.liberties, 1);
    }

    #[test]
    fn rows_are_indexed_by_y_then_x() {
        let mut board = Board::new(3);
        board.set(Point::new(2, 0), Some(Color::Black));
        let rows = board.rows();
        assert_eq!(rows[0][2], Some(Color::Black));
        assert_eq!(rows[2][0], None);
    }
}
