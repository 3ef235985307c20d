//! Core data types shared by the knowledge base and the board.
//!
//! Cells are addressed as `(row, col)`. Grid-shaped storage is flat and
//! row-major: `cells[row * width + col]`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A board coordinate. Ordering is row-major, which gives constraints and
/// snapshots a canonical cell order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    #[inline(always)]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl From<(usize, usize)> for Cell {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Fixed board dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    pub height: usize,
    pub width: usize,
}

impl Bounds {
    pub const fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    #[inline(always)]
    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.height && cell.col < self.width
    }

    #[inline(always)]
    pub fn area(&self) -> usize {
        self.height * self.width
    }

    #[inline(always)]
    pub fn index(&self, cell: Cell) -> usize {
        cell.row * self.width + cell.col
    }

    /// Every cell on the board in row-major order.
    pub fn cells(self) -> impl Iterator<Item = Cell> {
        (0..self.height).flat_map(move |row| (0..self.width).map(move |col| Cell::new(row, col)))
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.height, self.width)
    }
}

/// Pre-computed neighbour lists for every cell.
///
/// Stores the 8-directional neighbours (clipped to the board) of each cell.
/// Indexed by `row * width + col`, each entry is a slice of cells.
pub struct NeighborCache {
    bounds: Bounds,
    /// Flat storage of all neighbour cells.
    data: Vec<Cell>,
    /// offsets[i] = start index in `data` for cell i.
    /// offsets[i+1] - offsets[i] = number of neighbours for cell i.
    offsets: Vec<usize>,
}

impl NeighborCache {
    /// Build the neighbour cache for a board of the given dimensions.
    pub fn new(bounds: Bounds) -> Self {
        let total = bounds.area();
        let mut data = Vec::with_capacity(total * 8);
        let mut offsets = Vec::with_capacity(total + 1);

        for cell in bounds.cells() {
            offsets.push(data.len());
            for dr in -1i64..=1 {
                for dc in -1i64..=1 {
                    if dr == 0 && dc == 0 {
                        continue;
                    }
                    let nr = cell.row as i64 + dr;
                    let nc = cell.col as i64 + dc;
                    if nr >= 0 && nr < bounds.height as i64 && nc >= 0 && nc < bounds.width as i64 {
                        data.push(Cell::new(nr as usize, nc as usize));
                    }
                }
            }
        }
        offsets.push(data.len()); // sentinel

        Self { bounds, data, offsets }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Neighbours of `cell`. The cell must lie inside the board.
    #[inline(always)]
    pub fn get(&self, cell: Cell) -> &[Cell] {
        let idx = self.bounds.index(cell);
        let start = self.offsets[idx];
        let end = self.offsets[idx + 1];
        &self.data[start..end]
    }
}
