//! Error types for the knowledge base and game configuration.

use crate::types::{Bounds, Cell};
use thiserror::Error;

/// Contract violations rejected by [`crate::knowledge::KnowledgeBase`].
///
/// Every variant means the caller or the board disagrees with what the base
/// has already proven. Nothing is clamped or ignored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KbError {
    #[error("cell {cell} is outside the {bounds} board")]
    OutOfBounds { cell: Cell, bounds: Bounds },
    #[error("cell {0} has already been observed")]
    AlreadyObserved(Cell),
    #[error("cell {0} is a known hazard and cannot be observed")]
    ObservedHazard(Cell),
    #[error(
        "count {count} at {cell} is inconsistent: {known_hazards} neighbours are known hazards and {unknown} are undecided"
    )]
    InconsistentCount {
        cell: Cell,
        count: usize,
        known_hazards: usize,
        unknown: usize,
    },
    #[error("cell {cell} was derived to be both safe and a hazard")]
    Contradiction { cell: Cell },
    #[error("subset resolution produced an unsatisfiable constraint")]
    InvalidResolution,
}

/// Rejected [`crate::config::GameConfig`] values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("board must have at least one cell (got {0})")]
    EmptyBoard(Bounds),
    #[error("{mines} mines do not fit on a {bounds} board")]
    TooManyMines { mines: usize, bounds: Bounds },
    #[error("mine at {cell} is outside the {bounds} board")]
    HazardOutOfBounds { cell: Cell, bounds: Bounds },
    #[error("first move {cell} is outside the {bounds} board")]
    StartOutOfBounds { cell: Cell, bounds: Bounds },
}

/// Anything that can stop an automated game.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Knowledge(#[from] KbError),
}
