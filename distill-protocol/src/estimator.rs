//! Channel estimation from single-qubit probes
//!
//! Amplitude damping is calibrated by sending |1⟩ through the damping-only
//! channel and counting how often it is still found in |1⟩:
//! γ̂ = 1 − n₁/N. Dephasing is calibrated by sending |+⟩ through the
//! dephasing-only channel and counting |−⟩ outcomes: p̂ = 2·m₋/M.
//!
//! Estimates are point estimates and are not clamped into [0, 1]; lookups on
//! them resolve to the nearest grid point.

use distill_core::noise::ChannelParams;
use distill_core::{clamp_probability, Complex64, DistillError, QubitLabel, Result};
use distill_state::{DensityMatrix, QubitLayout};
use rand::Rng;
use tracing::debug;

use crate::rng::accept;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

const PROBE: QubitLabel = QubitLabel::probe(0);

/// Number of probe qubits spent on each calibration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct ProbeBudget {
    /// N: |1⟩ probes through the amplitude-damping channel
    pub amplitude_probes: usize,
    /// M: |+⟩ probes through the dephasing channel
    pub phase_probes: usize,
}

impl Default for ProbeBudget {
    fn default() -> Self {
        Self {
            amplitude_probes: 50,
            phase_probes: 50,
        }
    }
}

impl ProbeBudget {
    /// # Errors
    /// Returns error if either budget is zero
    pub fn new(amplitude_probes: usize, phase_probes: usize) -> Result<Self> {
        let budget = Self {
            amplitude_probes,
            phase_probes,
        };
        budget.validate()?;
        Ok(budget)
    }

    pub fn validate(&self) -> Result<()> {
        if self.amplitude_probes == 0 {
            return Err(DistillError::invalid_parameter("amplitude_probes", "must be positive"));
        }
        if self.phase_probes == 0 {
            return Err(DistillError::invalid_parameter("phase_probes", "must be positive"));
        }
        Ok(())
    }

    /// Total probe cost N + M
    pub fn total(&self) -> usize {
        self.amplitude_probes + self.phase_probes
    }
}

/// Estimated link parameters and the probes spent on them
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct ChannelEstimate {
    pub gamma_hat: f64,
    pub p_hat: f64,
    pub probe_cost: usize,
}

/// Probability that a probe prepared in `input` is found in `reference`
/// after the single-qubit version of `channel`
fn survival_probability(
    channel: &ChannelParams,
    input: &[Complex64; 2],
    reference: &[Complex64; 2],
) -> Result<f64> {
    let mut probe = DensityMatrix::from_state_vector(QubitLayout::single(PROBE), input)?;
    probe.apply_kraus_channel(&channel.single_qubit_kraus(), &[PROBE])?;
    Ok(clamp_probability(probe.overlap(reference)?))
}

/// Estimate (γ, p) of the true link `channel` with `budget` probes
pub fn estimate_channel<R: Rng + ?Sized>(
    channel: &ChannelParams,
    budget: &ProbeBudget,
    rng: &mut R,
) -> Result<ChannelEstimate> {
    budget.validate()?;

    let zero = Complex64::new(0.0, 0.0);
    let one = Complex64::new(1.0, 0.0);
    let s = Complex64::new(std::f64::consts::FRAC_1_SQRT_2, 0.0);

    let damping_only = ChannelParams::new(channel.gamma(), 0.0)?;
    let still_excited = survival_probability(&damping_only, &[zero, one], &[zero, one])?;
    let n1 = (0..budget.amplitude_probes)
        .filter(|_| accept(rng, still_excited))
        .count();

    let dephasing_only = ChannelParams::new(0.0, channel.p())?;
    let flipped = survival_probability(&dephasing_only, &[s, s], &[s, -s])?;
    let m_minus = (0..budget.phase_probes)
        .filter(|_| accept(rng, flipped))
        .count();

    let estimate = ChannelEstimate {
        gamma_hat: 1.0 - n1 as f64 / budget.amplitude_probes as f64,
        p_hat: 2.0 * m_minus as f64 / budget.phase_probes as f64,
        probe_cost: budget.total(),
    };
    debug!(
        gamma = channel.gamma(),
        p = channel.p(),
        gamma_hat = estimate.gamma_hat,
        p_hat = estimate.p_hat,
        "channel estimated"
    );
    Ok(estimate)
}
