//! The knowledge base: accumulated facts plus live constraints.
//!
//! Each observation adds one constraint built from the observed cell's
//! undecided neighbours, then runs:
//! 1. Propagation: pull every directly decidable cell out of every
//!    constraint, apply it back to all of them, repeat until a round
//!    learns nothing.
//! 2. Subset resolution: for every pair with `A.cells ⊆ B.cells`, stage
//!    `B - A` unless an equal constraint already exists.
//!
//! Constraints always exclude decided cells, are never empty and never
//! duplicate one another once an observation returns.

use crate::error::KbError;
use crate::rng::GameRng;
use crate::sentence::Constraint;
use crate::types::{Bounds, Cell, NeighborCache};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, trace, warn};

/// How much resolution runs per observation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferencePolicy {
    /// One resolution pass per observation, followed by propagation of
    /// whatever it added. Constraints it stages are combined with each other
    /// only on the next observation.
    #[default]
    SinglePass,
    /// Alternate propagation and resolution until resolution adds nothing.
    JointFixpoint,
}

/// Serializable view of the base for display and telemetry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KnowledgeSnapshot {
    pub bounds: Bounds,
    pub moves_made: Vec<Cell>,
    pub known_safe: Vec<Cell>,
    pub known_hazard: Vec<Cell>,
    pub constraints: Vec<Constraint>,
}

pub struct KnowledgeBase {
    bounds: Bounds,
    neighbors: NeighborCache,
    policy: InferencePolicy,
    moves_made: HashSet<Cell>,
    known_safe: HashSet<Cell>,
    known_hazard: HashSet<Cell>,
    constraints: Vec<Constraint>,
}

impl KnowledgeBase {
    pub fn new(bounds: Bounds) -> Self {
        Self::with_policy(bounds, InferencePolicy::default())
    }

    pub fn with_policy(bounds: Bounds, policy: InferencePolicy) -> Self {
        Self {
            bounds,
            neighbors: NeighborCache::new(bounds),
            policy,
            moves_made: HashSet::new(),
            known_safe: HashSet::new(),
            known_hazard: HashSet::new(),
            constraints: Vec::new(),
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn policy(&self) -> InferencePolicy {
        self.policy
    }

    pub fn moves_made(&self) -> &HashSet<Cell> {
        &self.moves_made
    }

    pub fn known_safe(&self) -> &HashSet<Cell> {
        &self.known_safe
    }

    pub fn known_hazard(&self) -> &HashSet<Cell> {
        &self.known_hazard
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Cells not yet proven safe or hazardous, in row-major order.
    pub fn undecided(&self) -> impl Iterator<Item = Cell> + '_ {
        self.bounds
            .cells()
            .filter(move |c| !self.known_safe.contains(c) && !self.known_hazard.contains(c))
    }

    /// True once every cell on the board has been classified.
    pub fn is_complete(&self) -> bool {
        self.known_safe.len() + self.known_hazard.len() == self.bounds.area()
    }

    /// Record `cell` as a mine and strike it from every constraint.
    ///
    /// Rejected with `Contradiction`, leaving the base untouched, when the
    /// cell is known safe or sits in a constraint with no mines left.
    pub fn mark_hazard(&mut self, cell: Cell) -> Result<(), KbError> {
        self.check_hazard(cell)?;
        self.known_hazard.insert(cell);
        for constraint in &mut self.constraints {
            constraint.record_hazard(cell);
        }
        Ok(())
    }

    /// Record `cell` as safe and strike it from every constraint.
    ///
    /// Rejected with `Contradiction`, leaving the base untouched, when the
    /// cell is a known mine or sits in a constraint whose cells must all be
    /// mines.
    pub fn mark_safe(&mut self, cell: Cell) -> Result<(), KbError> {
        self.check_safe(cell)?;
        self.known_safe.insert(cell);
        for constraint in &mut self.constraints {
            constraint.record_safe(cell);
        }
        Ok(())
    }

    /// Feed in a revealed cell and the number of mines touching it.
    ///
    /// The observation is validated before anything changes, so a rejected
    /// call leaves the base as it was. Errors raised later (contradictions
    /// during propagation or resolution) mean the board and the accumulated
    /// facts disagree; the base should be discarded.
    pub fn observe(&mut self, cell: Cell, count: usize) -> Result<(), KbError> {
        let sentence = self.sentence_for(cell, count).inspect_err(|error| {
            warn!(%cell, count, %error, "rejected observation");
        })?;

        self.moves_made.insert(cell);
        self.mark_safe(cell)?;

        if let Some(sentence) = sentence {
            if !self.constraints.contains(&sentence) {
                debug!(%cell, count, %sentence, "new constraint");
                self.constraints.push(sentence);
            }
        }

        let mut learned = self.propagate()?;
        match self.policy {
            InferencePolicy::SinglePass => {
                if self.resolve()? > 0 {
                    learned += self.propagate()?;
                }
            }
            InferencePolicy::JointFixpoint => {
                while self.resolve()? > 0 {
                    learned += self.propagate()?;
                }
            }
        }

        debug!(
            %cell,
            learned,
            constraints = self.constraints.len(),
            safe = self.known_safe.len(),
            hazards = self.known_hazard.len(),
            "observation applied"
        );
        Ok(())
    }

    /// A known-safe cell that has not been played yet. The smallest such
    /// cell in row-major order, so repeated calls agree.
    pub fn safe_move_candidate(&self) -> Option<Cell> {
        self.known_safe.difference(&self.moves_made).min().copied()
    }

    /// A uniformly chosen unplayed cell, skipping known mines unless
    /// `exclude_hazards` is false.
    pub fn random_move_candidate(&self, rng: &mut GameRng, exclude_hazards: bool) -> Option<Cell> {
        let eligible: Vec<Cell> = self
            .bounds
            .cells()
            .filter(|c| !self.moves_made.contains(c))
            .filter(|c| !exclude_hazards || !self.known_hazard.contains(c))
            .collect();
        rng.choose(&eligible).copied()
    }

    pub fn snapshot(&self) -> KnowledgeSnapshot {
        let sorted = |set: &HashSet<Cell>| {
            let mut cells: Vec<Cell> = set.iter().copied().collect();
            cells.sort_unstable();
            cells
        };
        let mut constraints = self.constraints.clone();
        constraints.sort_unstable();
        KnowledgeSnapshot {
            bounds: self.bounds,
            moves_made: sorted(&self.moves_made),
            known_safe: sorted(&self.known_safe),
            known_hazard: sorted(&self.known_hazard),
            constraints,
        }
    }

    fn check_bounds(&self, cell: Cell) -> Result<(), KbError> {
        if !self.bounds.contains(cell) {
            return Err(KbError::OutOfBounds {
                cell,
                bounds: self.bounds,
            });
        }
        Ok(())
    }

    fn check_hazard(&self, cell: Cell) -> Result<(), KbError> {
        self.check_bounds(cell)?;
        let no_mines_left = self
            .constraints
            .iter()
            .any(|c| c.contains(&cell) && c.count() == 0);
        if self.known_safe.contains(&cell) || no_mines_left {
            return Err(KbError::Contradiction { cell });
        }
        Ok(())
    }

    fn check_safe(&self, cell: Cell) -> Result<(), KbError> {
        self.check_bounds(cell)?;
        let all_mines = self
            .constraints
            .iter()
            .any(|c| c.contains(&cell) && c.count() == c.len());
        if self.known_hazard.contains(&cell) || all_mines {
            return Err(KbError::Contradiction { cell });
        }
        Ok(())
    }

    /// Validate an observation and build its constraint over the undecided
    /// neighbours. `None` when every neighbour is already decided.
    fn sentence_for(&self, cell: Cell, count: usize) -> Result<Option<Constraint>, KbError> {
        self.check_bounds(cell)?;
        if self.moves_made.contains(&cell) {
            return Err(KbError::AlreadyObserved(cell));
        }
        if self.known_hazard.contains(&cell) {
            return Err(KbError::ObservedHazard(cell));
        }
        self.check_safe(cell)?;

        let mut known_hazards = 0;
        let mut unknown = Vec::with_capacity(8);
        for &neighbor in self.neighbors.get(cell) {
            if self.known_hazard.contains(&neighbor) {
                known_hazards += 1;
            } else if !self.known_safe.contains(&neighbor) {
                unknown.push(neighbor);
            }
        }

        let inconsistent = KbError::InconsistentCount {
            cell,
            count,
            known_hazards,
            unknown: unknown.len(),
        };
        let Some(remaining) = count.checked_sub(known_hazards) else {
            return Err(inconsistent);
        };
        if unknown.is_empty() {
            return if remaining == 0 { Ok(None) } else { Err(inconsistent) };
        }
        Constraint::new(unknown, remaining).map(Some).ok_or(inconsistent)
    }

    /// Apply directly decidable cells until a round learns nothing.
    /// Returns the number of newly decided cells.
    fn propagate(&mut self) -> Result<usize, KbError> {
        let mut learned = 0;
        let mut round = 0;

        loop {
            round += 1;
            let mut safe = BTreeSet::new();
            let mut hazards = BTreeSet::new();
            for constraint in &self.constraints {
                safe.extend(constraint.extract_known_safe());
                hazards.extend(constraint.extract_known_hazards());
            }
            if let Some(&cell) = safe.intersection(&hazards).next() {
                return Err(KbError::Contradiction { cell });
            }

            let before = learned;
            for cell in safe {
                if !self.known_safe.contains(&cell) {
                    self.mark_safe(cell)?;
                    learned += 1;
                }
            }
            for cell in hazards {
                if !self.known_hazard.contains(&cell) {
                    self.mark_hazard(cell)?;
                    learned += 1;
                }
            }

            trace!(round, new = learned - before, "propagation round");
            if learned == before {
                break;
            }
        }

        self.prune();
        Ok(learned)
    }

    /// Drop fully resolved constraints and collapse duplicates that
    /// shrinking may have produced.
    fn prune(&mut self) {
        let mut seen = HashSet::with_capacity(self.constraints.len());
        self.constraints
            .retain(|constraint| !constraint.is_empty() && seen.insert(constraint.clone()));
    }

    /// One pairwise subset-resolution pass. Candidates are staged and
    /// committed together, so the result does not depend on scan order.
    /// Returns the number of constraints added.
    fn resolve(&mut self) -> Result<usize, KbError> {
        let existing: HashSet<&Constraint> = self.constraints.iter().collect();
        let mut staged_set = HashSet::new();
        let mut staged = Vec::new();

        for (i, subset) in self.constraints.iter().enumerate() {
            for (j, superset) in self.constraints.iter().enumerate() {
                if i == j || subset.len() > superset.len() {
                    continue;
                }
                let Some(candidate) = superset.subtract(subset) else {
                    continue;
                };
                let candidate = candidate?;
                if candidate.is_empty() || existing.contains(&candidate) {
                    continue;
                }
                if staged_set.insert(candidate.clone()) {
                    staged.push(candidate);
                }
            }
        }

        let added = staged.len();
        if added > 0 {
            debug!(added, total = self.constraints.len() + added, "subset resolution");
        }
        self.constraints.extend(staged);
        Ok(added)
    }
}
