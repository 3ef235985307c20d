//! Game configuration.
//!
//! Deserializable from any serde format (a JS object on the wasm surface).
//! Missing fields fall back to an 8x8 board with 8 mines.

use crate::error::ConfigError;
use crate::knowledge::InferencePolicy;
use crate::types::{Bounds, Cell};
use serde::{Deserialize, Serialize};

/// Radius of the mine-free zone around a configured first move.
pub const FIRST_MOVE_SAFE_RADIUS: usize = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub height: usize,
    pub width: usize,
    pub mines: usize,
    /// Seed for mine placement and random moves. Entropy when absent.
    pub seed: Option<u64>,
    /// Opening cell. Its neighbourhood is kept free of mines.
    pub first_move: Option<Cell>,
    pub policy: InferencePolicy,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            height: 8,
            width: 8,
            mines: 8,
            seed: None,
            first_move: None,
            policy: InferencePolicy::default(),
        }
    }
}

impl GameConfig {
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.height, self.width)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let bounds = self.bounds();
        if bounds.area() == 0 {
            return Err(ConfigError::EmptyBoard(bounds));
        }

        let reserved = match self.first_move {
            Some(cell) if !bounds.contains(cell) => {
                return Err(ConfigError::StartOutOfBounds { cell, bounds });
            }
            Some(cell) => bounds
                .cells()
                .filter(|c| {
                    c.row.abs_diff(cell.row) <= FIRST_MOVE_SAFE_RADIUS
                        && c.col.abs_diff(cell.col) <= FIRST_MOVE_SAFE_RADIUS
                })
                .count(),
            None => 0,
        };
        if self.mines > bounds.area() - reserved {
            return Err(ConfigError::TooManyMines {
                mines: self.mines,
                bounds,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.bounds(), Bounds::new(8, 8));
        assert_eq!(config.mines, 8);
        assert_eq!(config.policy, InferencePolicy::SinglePass);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: GameConfig = serde_json::from_str(
            r#"{"height": 4, "width": 5, "seed": 7, "policy": "joint_fixpoint", "first_move": {"row": 0, "col": 1}}"#,
        )
        .unwrap();
        assert_eq!(config.bounds(), Bounds::new(4, 5));
        assert_eq!(config.mines, 8);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.first_move, Some(Cell::new(0, 1)));
        assert_eq!(config.policy, InferencePolicy::JointFixpoint);
    }

    #[test]
    fn test_validate_rejects_empty_board() {
        let config = GameConfig {
            height: 0,
            ..GameConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyBoard(Bounds::new(0, 8))));
    }

    #[test]
    fn test_validate_rejects_too_many_mines() {
        let config = GameConfig {
            height: 3,
            width: 3,
            mines: 10,
            ..GameConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::TooManyMines { mines: 10, .. })));

        // A centred first move on 3x3 reserves every cell.
        let config = GameConfig {
            height: 3,
            width: 3,
            mines: 1,
            first_move: Some(Cell::new(1, 1)),
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_start_out_of_bounds() {
        let config = GameConfig {
            first_move: Some(Cell::new(8, 0)),
            ..GameConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::StartOutOfBounds { .. })));
    }
}
