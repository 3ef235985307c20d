//! Automated play: the knowledge base driving a hidden board.
//!
//! Each turn takes a known-safe cell if there is one, otherwise guesses
//! uniformly among cells not known to be mines, reveals it and feeds the
//! count back into the base.

use crate::board::{generate_solvable_board, BoardResult, Minefield};
use crate::config::{GameConfig, FIRST_MOVE_SAFE_RADIUS};
use crate::error::{GameError, KbError};
use crate::knowledge::{InferencePolicy, KnowledgeBase};
use crate::rng::GameRng;
use crate::types::Cell;
use serde::Serialize;
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// Every non-mine cell has been revealed.
    Won,
    /// A guess landed on a mine.
    Lost { at: Cell },
    /// No unplayed cell is left that is not a known mine.
    Exhausted,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GameReport {
    pub outcome: Outcome,
    pub moves: usize,
    pub guesses: usize,
    pub known_hazards: usize,
    /// The proven mines are exactly the board's mines.
    pub all_hazards_found: bool,
}

/// Build a board from `config` and play it to the end.
pub fn play(config: &GameConfig) -> Result<GameReport, GameError> {
    config.validate()?;
    let mut rng = GameRng::from_optional_seed(config.seed);
    let field = match config.first_move {
        Some(start) => Minefield::random_with_safe_zone(
            config.bounds(),
            config.mines,
            start,
            FIRST_MOVE_SAFE_RADIUS,
            &mut rng,
        )?,
        None => Minefield::random(config.bounds(), config.mines, &mut rng)?,
    };
    Ok(play_on(&field, config.first_move, config.policy, &mut rng)?)
}

/// Play an existing board. `first_move` is revealed before any inference.
pub fn play_on(
    field: &Minefield,
    first_move: Option<Cell>,
    policy: InferencePolicy,
    rng: &mut GameRng,
) -> Result<GameReport, KbError> {
    let mut kb = KnowledgeBase::with_policy(field.bounds(), policy);
    let safe_total = field.bounds().area() - field.hazard_count();
    let mut guesses = 0;
    let mut next = first_move;

    let outcome = loop {
        if kb.moves_made().len() == safe_total {
            break Outcome::Won;
        }
        let cell = match next.take().or_else(|| kb.safe_move_candidate()) {
            Some(cell) => cell,
            None => match kb.random_move_candidate(rng, true) {
                Some(cell) => {
                    guesses += 1;
                    cell
                }
                None => break Outcome::Exhausted,
            },
        };
        match field.reveal(cell) {
            Some(count) => kb.observe(cell, count)?,
            None => break Outcome::Lost { at: cell },
        }
    };

    let report = GameReport {
        outcome,
        moves: kb.moves_made().len(),
        guesses,
        known_hazards: kb.known_hazard().len(),
        all_hazards_found: field.won(kb.known_hazard()),
    };
    info!(
        outcome = ?report.outcome,
        moves = report.moves,
        guesses = report.guesses,
        known_hazards = report.known_hazards,
        "game finished"
    );
    Ok(report)
}

/// Whether the base can clear the board from `start` without a single guess.
/// A `start` off the board is an `OutOfBounds` error.
pub fn is_solvable(field: &Minefield, start: Cell, policy: InferencePolicy) -> Result<bool, KbError> {
    if !field.bounds().contains(start) {
        return Err(KbError::OutOfBounds {
            cell: start,
            bounds: field.bounds(),
        });
    }
    if field.is_hazard(start) {
        return Ok(false);
    }
    let mut kb = KnowledgeBase::with_policy(field.bounds(), policy);
    let mut next = Some(start);
    while let Some(cell) = next {
        let Some(count) = field.reveal(cell) else {
            // The base proved a mine safe.
            return Err(KbError::Contradiction { cell });
        };
        kb.observe(cell, count)?;
        next = kb.safe_move_candidate();
    }
    Ok(kb.moves_made().len() == field.bounds().area() - field.hazard_count())
}

/// Generate a board that can be cleared from the configured first move (the
/// board centre when unset) without guessing.
pub fn generate_no_guess(config: &GameConfig, max_attempts: u32) -> Result<BoardResult, GameError> {
    let bounds = config.bounds();
    let start = config
        .first_move
        .unwrap_or(Cell::new(bounds.height / 2, bounds.width / 2));
    let check = GameConfig {
        first_move: Some(start),
        ..config.clone()
    };
    check.validate()?;

    let mut rng = GameRng::from_optional_seed(config.seed);
    let result = generate_solvable_board(
        bounds,
        config.mines,
        start,
        FIRST_MOVE_SAFE_RADIUS,
        max_attempts,
        &mut rng,
        |field, start| Ok::<_, GameError>(is_solvable(field, start, config.policy)?),
    )?;
    info!(attempts = result.attempts, success = result.success, "board generated");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Bounds;

    fn corner_mine() -> Minefield {
        Minefield::with_hazards(Bounds::new(3, 3), [Cell::new(0, 0)]).unwrap()
    }

    #[test]
    fn test_play_simple_board_without_guessing() {
        let field = corner_mine();
        let mut rng = GameRng::from_seed(1);
        let report = play_on(&field, Some(Cell::new(2, 2)), InferencePolicy::SinglePass, &mut rng).unwrap();
        assert_eq!(report.outcome, Outcome::Won);
        assert_eq!(report.moves, 8);
        assert_eq!(report.guesses, 0);
        assert_eq!(report.known_hazards, 1);
        assert!(report.all_hazards_found);
    }

    #[test]
    fn test_play_first_move_on_mine() {
        let field = corner_mine();
        let mut rng = GameRng::from_seed(1);
        let report = play_on(&field, Some(Cell::new(0, 0)), InferencePolicy::SinglePass, &mut rng).unwrap();
        assert_eq!(report.outcome, Outcome::Lost { at: Cell::new(0, 0) });
        assert_eq!(report.moves, 0);
    }

    #[test]
    fn test_play_all_mines_is_trivially_won() {
        let field = Minefield::with_hazards(Bounds::new(1, 2), [Cell::new(0, 0), Cell::new(0, 1)]).unwrap();
        let mut rng = GameRng::from_seed(1);
        let report = play_on(&field, None, InferencePolicy::SinglePass, &mut rng).unwrap();
        assert_eq!(report.outcome, Outcome::Won);
        assert_eq!(report.moves, 0);
    }

    #[test]
    fn test_play_config_is_deterministic() {
        let config = GameConfig {
            seed: Some(99),
            ..GameConfig::default()
        };
        let first = play(&config).unwrap();
        let second = play(&config).unwrap();
        assert_eq!(first, second);
        if first.outcome == Outcome::Won {
            assert_eq!(first.moves, 64 - 8);
        }
    }

    #[test]
    fn test_play_never_loses_to_inference() {
        // Losses only ever come from guesses, never from a cell the base proved safe.
        for seed in 0..40 {
            let config = GameConfig {
                seed: Some(seed),
                first_move: Some(Cell::new(4, 4)),
                ..GameConfig::default()
            };
            let report = play(&config).unwrap();
            if let Outcome::Lost { .. } = report.outcome {
                assert!(report.guesses > 0);
            }
        }
    }

    #[test]
    fn test_play_rejects_bad_config() {
        let config = GameConfig {
            mines: 100,
            ..GameConfig::default()
        };
        assert!(matches!(play(&config), Err(GameError::Config(_))));
    }

    #[test]
    fn test_is_solvable_simple() {
        assert!(is_solvable(&corner_mine(), Cell::new(2, 2), InferencePolicy::SinglePass).unwrap());
        assert!(!is_solvable(&corner_mine(), Cell::new(0, 0), InferencePolicy::SinglePass).unwrap());
    }

    #[test]
    fn test_is_solvable_start_off_board() {
        let field = corner_mine();
        assert_eq!(
            is_solvable(&field, Cell::new(3, 0), InferencePolicy::SinglePass),
            Err(KbError::OutOfBounds {
                cell: Cell::new(3, 0),
                bounds: field.bounds(),
            })
        );
        assert!(is_solvable(&field, Cell::new(0, 7), InferencePolicy::JointFixpoint).is_err());
    }

    #[test]
    fn test_is_solvable_coin_flip() {
        // One mine among three unrevealed cells around (1, 1): no safe deduction.
        let field = Minefield::with_hazards(Bounds::new(2, 2), [Cell::new(0, 0)]).unwrap();
        assert!(!is_solvable(&field, Cell::new(1, 1), InferencePolicy::JointFixpoint).unwrap());
    }

    #[test]
    fn test_generate_no_guess() {
        let config = GameConfig {
            height: 6,
            width: 6,
            mines: 4,
            seed: Some(11),
            ..GameConfig::default()
        };
        let result = generate_no_guess(&config, 500).unwrap();
        assert_eq!(result.field.hazard_count(), 4);
        let start = Cell::new(3, 3);
        assert!(!result.field.is_hazard(start));
        if result.success {
            assert!(is_solvable(&result.field, start, config.policy).unwrap());
        }
    }
}
