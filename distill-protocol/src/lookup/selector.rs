//! Per-cell candidate selection

use super::LookupCell;
use crate::cascade::CascadeOutcome;

/// One evaluated (depth, α) candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub depth: u32,
    pub alpha: f64,
    pub outcome: CascadeOutcome,
}

impl From<Candidate> for LookupCell {
    fn from(candidate: Candidate) -> Self {
        Self {
            depth: candidate.depth,
            alpha: candidate.alpha,
            achieved: Some(candidate.outcome),
        }
    }
}

/// Two-tier best-candidate tracker for one grid cell
///
/// Candidates must be offered in generation order. A candidate whose mean
/// fidelity reaches the target is eligible. The first eligible candidate
/// always takes the cell and locks it; after that only an eligible candidate
/// with strictly higher yield replaces the best, and ineligible candidates
/// are ignored. Until the cell is locked, the candidate with strictly highest
/// fidelity is kept as a fallback.
#[derive(Debug, Clone)]
pub struct CellSelector {
    target_fidelity: f64,
    best: Option<Candidate>,
    locked: bool,
}

impl CellSelector {
    pub fn new(target_fidelity: f64) -> Self {
        Self {
            target_fidelity,
            best: None,
            locked: false,
        }
    }

    /// Offer a candidate; returns true if it became the best
    pub fn offer(&mut self, candidate: Candidate) -> bool {
        let outcome = candidate.outcome;
        let replace = if outcome.fidelity >= self.target_fidelity {
            match (&self.best, self.locked) {
                (Some(best), true) => outcome.yield_rate > best.outcome.yield_rate,
                _ => true,
            }
        } else if self.locked {
            false
        } else {
            match &self.best {
                Some(best) => outcome.fidelity > best.outcome.fidelity,
                None => true,
            }
        };

        if replace {
            if outcome.fidelity >= self.target_fidelity {
                self.locked = true;
            }
            self.best = Some(candidate);
        }
        replace
    }

    /// Whether some candidate met the fidelity target
    pub fn is_feasible(&self) -> bool {
        self.locked
    }

    pub fn best(&self) -> Option<&Candidate> {
        self.best.as_ref()
    }

    pub fn finish(self) -> Option<LookupCell> {
        self.best.map(LookupCell::from)
    }
}
