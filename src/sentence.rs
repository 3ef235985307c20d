//! Constraints: "exactly `count` of these cells are mines".
//!
//! Cells are kept in a `BTreeSet` so two constraints over the same cells
//! compare, hash and print identically regardless of insertion order.

use crate::error::KbError;
use crate::types::Cell;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// A linear equality over board cells.
///
/// Invariant: `count <= cells.len()` after every mutation.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Constraint {
    cells: BTreeSet<Cell>,
    count: usize,
}

impl Constraint {
    /// Build a constraint. Returns `None` when `count` exceeds the number of
    /// cells, since no assignment could satisfy it.
    pub fn new(cells: impl IntoIterator<Item = Cell>, count: usize) -> Option<Self> {
        let cells: BTreeSet<Cell> = cells.into_iter().collect();
        if count > cells.len() {
            return None;
        }
        Some(Self { cells, count })
    }

    pub fn cells(&self) -> &BTreeSet<Cell> {
        &self.cells
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// An empty constraint carries no information.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, cell: &Cell) -> bool {
        self.cells.contains(cell)
    }

    /// Every cell, when the count covers all of them.
    pub fn extract_known_hazards(&self) -> BTreeSet<Cell> {
        if !self.cells.is_empty() && self.count == self.cells.len() {
            return self.cells.clone();
        }
        BTreeSet::new()
    }

    /// Every cell, when the count is zero.
    pub fn extract_known_safe(&self) -> BTreeSet<Cell> {
        if self.count == 0 {
            return self.cells.clone();
        }
        BTreeSet::new()
    }

    /// Remove a cell known to be a mine, taking its contribution off the count.
    ///
    /// The caller guarantees `count > 0` whenever `cell` is present;
    /// [`KnowledgeBase::mark_hazard`](crate::KnowledgeBase::mark_hazard)
    /// checks this before touching any constraint.
    pub fn record_hazard(&mut self, cell: Cell) {
        if self.cells.contains(&cell) {
            assert!(self.count > 0, "hazard {cell} removed from a zero-count constraint");
            self.cells.remove(&cell);
            self.count -= 1;
        }
    }

    /// Remove a cell known to be safe. The count is unchanged.
    ///
    /// The caller guarantees `count < len()` whenever `cell` is present.
    pub fn record_safe(&mut self, cell: Cell) {
        self.cells.remove(&cell);
    }

    /// `other.cells ⊆ self.cells` resolution: what remains of `self` once the
    /// cells and mines of `other` are taken out.
    ///
    /// `None` when `other` is not a subset. `Some(Err(_))` when the result
    /// would be unsatisfiable (negative count or count above its size).
    pub(crate) fn subtract(&self, other: &Constraint) -> Option<Result<Constraint, KbError>> {
        if !other.cells.is_subset(&self.cells) {
            return None;
        }
        let Some(count) = self.count.checked_sub(other.count) else {
            return Some(Err(KbError::InvalidResolution));
        };
        let cells = self.cells.difference(&other.cells).copied();
        Some(Constraint::new(cells, count).ok_or(KbError::InvalidResolution))
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, cell) in self.cells.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{cell}")?;
        }
        write!(f, "}} = {}", self.count)
    }
}
