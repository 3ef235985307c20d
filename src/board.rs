//! The hidden board: mine placement and neighbour counts.
//!
//! `Minefield` plays the part of the game the knowledge base reasons about.
//! It answers "is this cell a mine" and "how many mines touch this cell";
//! the knowledge base never reads it directly.

use crate::error::ConfigError;
use crate::rng::GameRng;
use crate::types::{Bounds, Cell, NeighborCache};
use std::collections::HashSet;

/// Mine layout plus precomputed neighbour counts (flat, row-major).
pub struct Minefield {
    bounds: Bounds,
    mines: Vec<bool>,
    numbers: Vec<u8>,
    hazard_count: usize,
}

impl Minefield {
    /// Board with mines exactly at `hazards`.
    pub fn with_hazards(
        bounds: Bounds,
        hazards: impl IntoIterator<Item = Cell>,
    ) -> Result<Self, ConfigError> {
        if bounds.area() == 0 {
            return Err(ConfigError::EmptyBoard(bounds));
        }
        let mut mines = vec![false; bounds.area()];
        for cell in hazards {
            if !bounds.contains(cell) {
                return Err(ConfigError::HazardOutOfBounds { cell, bounds });
            }
            mines[bounds.index(cell)] = true;
        }
        Ok(Self::from_mines(bounds, mines))
    }

    /// Place `mine_count` mines uniformly at random.
    pub fn random(bounds: Bounds, mine_count: usize, rng: &mut GameRng) -> Result<Self, ConfigError> {
        place_mines_random(bounds, mine_count, None, rng)
    }

    /// Place mines at random, keeping every cell within Chebyshev distance
    /// `safe_radius` of `start` clear.
    pub fn random_with_safe_zone(
        bounds: Bounds,
        mine_count: usize,
        start: Cell,
        safe_radius: usize,
        rng: &mut GameRng,
    ) -> Result<Self, ConfigError> {
        place_mines_random(bounds, mine_count, Some((start, safe_radius)), rng)
    }

    fn from_mines(bounds: Bounds, mines: Vec<bool>) -> Self {
        let hazard_count = mines.iter().filter(|&&m| m).count();
        let numbers = calculate_numbers(bounds, &mines, &NeighborCache::new(bounds));
        Self {
            bounds,
            mines,
            numbers,
            hazard_count,
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Total mines on the board.
    pub fn hazard_count(&self) -> usize {
        self.hazard_count
    }

    #[inline(always)]
    pub fn is_hazard(&self, cell: Cell) -> bool {
        self.bounds.contains(cell) && self.mines[self.bounds.index(cell)]
    }

    /// Mines among the (up to 8) cells touching `cell`, not counting itself.
    /// `None` off the board.
    #[inline(always)]
    pub fn nearby_hazards(&self, cell: Cell) -> Option<usize> {
        if !self.bounds.contains(cell) {
            return None;
        }
        Some(self.numbers[self.bounds.index(cell)] as usize)
    }

    /// The count shown when `cell` is revealed, or `None` if it is a mine
    /// or off the board.
    pub fn reveal(&self, cell: Cell) -> Option<usize> {
        if self.is_hazard(cell) {
            return None;
        }
        self.nearby_hazards(cell)
    }

    pub fn hazards(&self) -> impl Iterator<Item = Cell> + '_ {
        self.bounds.cells().filter(move |&c| self.is_hazard(c))
    }

    /// True when `found` is exactly the set of mines.
    pub fn won(&self, found: &HashSet<Cell>) -> bool {
        found.len() == self.hazard_count && found.iter().all(|&c| self.is_hazard(c))
    }
}

/// Place mines randomly, optionally with an exclusion zone.
///
/// Rejection sampling: draw a cell, skip it when it is already a mine or
/// inside the exclusion zone.
fn place_mines_random(
    bounds: Bounds,
    mine_count: usize,
    safe_zone: Option<(Cell, usize)>,
    rng: &mut GameRng,
) -> Result<Minefield, ConfigError> {
    if bounds.area() == 0 {
        return Err(ConfigError::EmptyBoard(bounds));
    }
    let in_zone = |cell: Cell| {
        safe_zone.is_some_and(|(start, radius)| {
            cell.row.abs_diff(start.row) <= radius && cell.col.abs_diff(start.col) <= radius
        })
    };
    let available = bounds.cells().filter(|&c| !in_zone(c)).count();
    if mine_count > available {
        return Err(ConfigError::TooManyMines {
            mines: mine_count,
            bounds,
        });
    }

    let mut mines = vec![false; bounds.area()];
    let mut placed = 0;
    while placed < mine_count {
        let cell = Cell::new(rng.gen_range(bounds.height), rng.gen_range(bounds.width));
        if in_zone(cell) {
            continue;
        }
        let idx = bounds.index(cell);
        if !mines[idx] {
            mines[idx] = true;
            placed += 1;
        }
    }

    Ok(Minefield::from_mines(bounds, mines))
}

/// Neighbour mine counts for every cell. Mine cells carry their own count
/// too; nothing reads it since revealing a mine ends the game.
fn calculate_numbers(bounds: Bounds, mines: &[bool], neighbor_cache: &NeighborCache) -> Vec<u8> {
    bounds
        .cells()
        .map(|cell| {
            neighbor_cache
                .get(cell)
                .iter()
                .filter(|&&n| mines[bounds.index(n)])
                .count() as u8
        })
        .collect()
}

/// Result of a board generation attempt.
pub struct BoardResult {
    pub field: Minefield,
    /// How many random layouts were tried before finding a solvable one.
    pub attempts: u32,
    /// True if a solvable board was found within max_attempts.
    pub success: bool,
}

/// Generate a board that `is_solvable_fn` accepts, retrying random layouts.
///
/// The mine-free zone of `safe_radius` around `start` is always honoured.
/// After `max_attempts` the last layout is returned with `success == false`.
/// The solver is injected so this module stays independent of it.
pub fn generate_solvable_board<F, E>(
    bounds: Bounds,
    mine_count: usize,
    start: Cell,
    safe_radius: usize,
    max_attempts: u32,
    rng: &mut GameRng,
    mut is_solvable_fn: F,
) -> Result<BoardResult, E>
where
    F: FnMut(&Minefield, Cell) -> Result<bool, E>,
    E: From<ConfigError>,
{
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;

        let field = Minefield::random_with_safe_zone(bounds, mine_count, start, safe_radius, rng)?;

        if is_solvable_fn(&field, start)? {
            return Ok(BoardResult {
                field,
                attempts,
                success: true,
            });
        }

        if attempts >= max_attempts.max(1) {
            // Best effort: the last layout, not solvable.
            return Ok(BoardResult {
                field,
                attempts,
                success: false,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_mine_count() {
        let mut rng = GameRng::from_seed(42);
        let field = Minefield::random(Bounds::new(16, 30), 99, &mut rng).unwrap();
        assert_eq!(field.hazard_count(), 99);
        assert_eq!(field.hazards().count(), 99);
    }

    #[test]
    fn test_full_board() {
        let mut rng = GameRng::from_seed(1);
        let field = Minefield::random(Bounds::new(2, 2), 4, &mut rng).unwrap();
        assert!(field.bounds().cells().all(|c| field.is_hazard(c)));
    }

    #[test]
    fn test_too_many_mines() {
        let mut rng = GameRng::from_seed(1);
        assert!(matches!(
            Minefield::random(Bounds::new(2, 2), 5, &mut rng),
            Err(ConfigError::TooManyMines { mines: 5, .. })
        ));
        // 3x3 board fully covered by a radius-1 zone around its centre.
        assert!(Minefield::random_with_safe_zone(Bounds::new(3, 3), 1, Cell::new(1, 1), 1, &mut rng).is_err());
    }

    #[test]
    fn test_empty_board_rejected() {
        let mut rng = GameRng::from_seed(1);
        assert_eq!(
            Minefield::random(Bounds::new(0, 4), 0, &mut rng).err(),
            Some(ConfigError::EmptyBoard(Bounds::new(0, 4)))
        );
    }

    #[test]
    fn test_safe_zone() {
        let mut rng = GameRng::from_seed(42);
        let field =
            Minefield::random_with_safe_zone(Bounds::new(10, 10), 20, Cell::new(5, 5), 2, &mut rng).unwrap();
        for row in 3..=7 {
            for col in 3..=7 {
                assert!(!field.is_hazard(Cell::new(row, col)), "mine in safe zone at ({row}, {col})");
            }
        }
        assert_eq!(field.hazard_count(), 20);
    }

    #[test]
    fn test_numbers_center_mine() {
        let field = Minefield::with_hazards(Bounds::new(3, 3), [Cell::new(1, 1)]).unwrap();
        for cell in Bounds::new(3, 3).cells() {
            if cell != Cell::new(1, 1) {
                assert_eq!(field.nearby_hazards(cell), Some(1));
            }
        }
    }

    #[test]
    fn test_numbers_corner_mine() {
        let field = Minefield::with_hazards(Bounds::new(3, 3), [Cell::new(0, 0)]).unwrap();
        assert_eq!(field.nearby_hazards(Cell::new(1, 0)), Some(1));
        assert_eq!(field.nearby_hazards(Cell::new(0, 1)), Some(1));
        assert_eq!(field.nearby_hazards(Cell::new(1, 1)), Some(1));
        assert_eq!(field.nearby_hazards(Cell::new(0, 2)), Some(0));
        assert_eq!(field.nearby_hazards(Cell::new(2, 2)), Some(0));
    }

    #[test]
    fn test_nearby_hazards_off_board() {
        // Mine at (1, 0); (0, 3) would alias it in row-major storage.
        let field = Minefield::with_hazards(Bounds::new(2, 3), [Cell::new(1, 0)]).unwrap();
        assert_eq!(field.nearby_hazards(Cell::new(0, 2)), Some(0));
        assert_eq!(field.nearby_hazards(Cell::new(0, 3)), None);
        assert_eq!(field.nearby_hazards(Cell::new(2, 0)), None);
        assert_eq!(field.reveal(Cell::new(0, 3)), None);
        assert!(!field.is_hazard(Cell::new(0, 3)));
    }

    #[test]
    fn test_reveal() {
        let field = Minefield::with_hazards(Bounds::new(1, 3), [Cell::new(0, 2)]).unwrap();
        assert_eq!(field.reveal(Cell::new(0, 0)), Some(0));
        assert_eq!(field.reveal(Cell::new(0, 1)), Some(1));
        assert_eq!(field.reveal(Cell::new(0, 2)), None);
        assert_eq!(field.reveal(Cell::new(5, 5)), None);
    }

    #[test]
    fn test_hazard_out_of_bounds() {
        assert!(matches!(
            Minefield::with_hazards(Bounds::new(2, 2), [Cell::new(2, 0)]),
            Err(ConfigError::HazardOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_won() {
        let field = Minefield::with_hazards(Bounds::new(2, 2), [Cell::new(0, 0), Cell::new(1, 1)]).unwrap();
        let mut found = HashSet::from([Cell::new(0, 0)]);
        assert!(!field.won(&found));
        found.insert(Cell::new(1, 1));
        assert!(field.won(&found));
        found.insert(Cell::new(0, 1));
        assert!(!field.won(&found));
    }

    #[test]
    fn test_generate_always_solvable() {
        let mut rng = GameRng::from_seed(3);
        let result = generate_solvable_board(Bounds::new(5, 5), 3, Cell::new(2, 2), 1, 100, &mut rng, |_, _| {
            Ok::<_, ConfigError>(true)
        })
        .unwrap();
        assert!(result.success);
        assert_eq!(result.attempts, 1);
        assert_eq!(result.field.hazard_count(), 3);
    }

    #[test]
    fn test_generate_never_solvable() {
        let mut rng = GameRng::from_seed(3);
        let result = generate_solvable_board(Bounds::new(5, 5), 3, Cell::new(2, 2), 1, 10, &mut rng, |_, _| {
            Ok::<_, ConfigError>(false)
        })
        .unwrap();
        assert!(!result.success);
        assert_eq!(result.attempts, 10);
    }
}
