//! Local filtering
//!
//! Both parties apply the same non-unitary single-qubit operator
//!
//! ```text
//! F(α) = diag(√α, √(1-α))
//! ```
//!
//! to their half of a pair and keep the pair only if the filter heralds
//! success. The operation is trace-decreasing: the trace of F⊗F ρ F⊗F† is
//! the success probability. α = 1/2 reduces F⊗F to I/2 and leaves the state
//! unchanged (with acceptance 1/4); α = 1 keeps only the |00⟩ component.

use crate::pair::{Pair, ALICE, BOB};
use distill_core::noise::KrausOperator;
use distill_core::{clamp_probability, DistillError, Result};

/// Filter of strength α applied identically to both halves of a pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalFilter {
    alpha: f64,
}

/// A pair that passed the filter
#[derive(Debug, Clone)]
pub struct Filtered {
    /// Renormalized post-filter state
    pub pair: Pair,
    /// Probability that the filter heralds success
    pub success_probability: f64,
}

impl LocalFilter {
    /// Create a filter of strength `alpha`
    ///
    /// # Errors
    /// Returns error if alpha is not in [0, 1]
    pub fn new(alpha: f64) -> Result<Self> {
        Ok(Self {
            alpha: DistillError::check_unit_interval("alpha", alpha)?,
        })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Single-qubit filter operator diag(√α, √(1-α))
    pub fn operator(&self) -> KrausOperator {
        KrausOperator::single_qubit_real(self.alpha.sqrt(), 0.0, 0.0, (1.0 - self.alpha).sqrt())
    }

    /// Filter both halves of `pair`
    ///
    /// Returns `Ok(None)` when the filter annihilates the state (success
    /// probability zero); the caller must discard the pair. Whether a pair
    /// with non-zero success probability is actually kept is decided by the
    /// caller with its own Bernoulli draw.
    pub fn apply(&self, pair: &Pair) -> Result<Option<Filtered>> {
        let local = self.operator();
        let mut state = pair.state().conjugate(&local, &[ALICE])?;
        state = state.conjugate(&local, &[BOB])?;

        let success_probability = clamp_probability(state.trace());
        if success_probability == 0.0 || state.normalize().is_none() {
            return Ok(None);
        }

        Ok(Some(Filtered {
            pair: Pair::from_state(state)?,
            success_probability,
        }))
    }
}
