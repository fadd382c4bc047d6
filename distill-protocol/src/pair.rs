//! Entangled pairs and the link noise that creates them

use distill_core::noise::ChannelParams;
use distill_core::{Complex64, DistillError, QubitLabel, Result};
use distill_state::{DensityMatrix, QubitLayout};

/// Alice's qubit of a stand-alone pair
pub const ALICE: QubitLabel = QubitLabel::alice(1);
/// Bob's qubit of a stand-alone pair
pub const BOB: QubitLabel = QubitLabel::bob(1);

/// |Φ⁺⟩ amplitudes in the `[A, B]` basis order
pub fn phi_plus_amplitudes() -> [Complex64; 4] {
    let s = std::f64::consts::FRAC_1_SQRT_2;
    [
        Complex64::new(s, 0.0),
        Complex64::new(0.0, 0.0),
        Complex64::new(0.0, 0.0),
        Complex64::new(s, 0.0),
    ]
}

/// One entangled link: a two-qubit state laid out as `[A1, B1]`
#[derive(Debug, Clone, PartialEq)]
pub struct Pair {
    state: DensityMatrix,
}

impl Pair {
    /// The ideal |Φ⁺⟩ pair
    pub fn ideal() -> Self {
        Self {
            state: DensityMatrix::bell_phi_plus(1),
        }
    }

    /// A fresh |Φ⁺⟩ pair sent through the link channel
    pub fn noisy(channel: &ChannelParams) -> Result<Self> {
        Self::ideal().with_noise(channel)
    }

    /// Wrap a two-qubit state
    ///
    /// The two factors are renamed to `[A1, B1]` in their existing order.
    ///
    /// # Errors
    /// Returns error if the state does not have exactly two qubits
    pub fn from_state(mut state: DensityMatrix) -> Result<Self> {
        if state.num_qubits() != 2 {
            return Err(DistillError::DimensionMismatch {
                expected: 2,
                actual: state.num_qubits(),
            });
        }

        let labels = state.layout().labels().to_vec();
        if labels[0] != ALICE || labels[1] != BOB {
            // Two-step rename so intermediate layouts never hold a duplicate.
            let tmp_a = QubitLabel::alice(u8::MAX);
            let tmp_b = QubitLabel::bob(u8::MAX);
            state.relabel(labels[0], tmp_a)?;
            state.relabel(labels[1], tmp_b)?;
            state.relabel(tmp_a, ALICE)?;
            state.relabel(tmp_b, BOB)?;
        }
        debug_assert_eq!(state.layout(), &QubitLayout::pair(1));

        Ok(Self { state })
    }

    /// Apply the link channel: amplitude damping on A, phase damping on B
    pub fn with_noise(mut self, channel: &ChannelParams) -> Result<Self> {
        if !channel.is_noiseless() {
            self.state.apply_channel(channel, &[ALICE, BOB])?;
        }
        Ok(self)
    }

    #[inline]
    pub fn state(&self) -> &DensityMatrix {
        &self.state
    }

    pub fn into_state(self) -> DensityMatrix {
        self.state
    }

    /// Overlap ⟨Φ⁺|ρ|Φ⁺⟩ with the ideal pair
    pub fn fidelity(&self) -> f64 {
        let s = &self.state;
        // Only the |00⟩,|11⟩ block contributes.
        0.5 * (s.get(0, 0) + s.get(0, 3) + s.get(3, 0) + s.get(3, 3)).re
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const TOL: f64 = 1e-10;

    #[test]
    fn test_ideal_pair_fidelity() {
        assert_abs_diff_eq!(Pair::ideal().fidelity(), 1.0, epsilon = TOL);
    }

    #[test]
    fn test_fidelity_matches_overlap() {
        let pair = Pair::noisy(&ChannelParams::new(0.2, 0.1).unwrap()).unwrap();
        let overlap = pair.state().overlap(&phi_plus_amplitudes()).unwrap();
        assert_abs_diff_eq!(pair.fidelity(), overlap, epsilon = TOL);
    }

    #[test]
    fn test_noise_keeps_trace_and_positivity() {
        for &gamma in &[0.0, 0.05, 0.2, 0.5, 1.0] {
            for &p in &[0.0, 0.05, 0.2, 0.5, 1.0] {
                let pair = Pair::noisy(&ChannelParams::new(gamma, p).unwrap()).unwrap();
                assert!((pair.state().trace() - 1.0).abs() < 1e-9, "({}, {})", gamma, p);
                assert!(pair.state().is_positive_semidefinite(1e-9), "({}, {})", gamma, p);
            }
        }
    }

    #[test]
    fn test_noisy_fidelity_closed_form() {
        // Amplitude damping on A and dephasing on B give
        // F = (2 - γ + 2(1-2p)√(1-γ)) / 4
        let (gamma, p) = (0.12, 0.07);
        let pair = Pair::noisy(&ChannelParams::new(gamma, p).unwrap()).unwrap();
        let expected = (2.0 - gamma + 2.0 * (1.0 - 2.0 * p) * (1.0 - gamma).sqrt()) / 4.0;
        assert_abs_diff_eq!(pair.fidelity(), expected, epsilon = TOL);
    }

    #[test]
    fn test_noiseless_channel_is_identity() {
        let pair = Pair::noisy(&ChannelParams::noiseless()).unwrap();
        assert_eq!(pair, Pair::ideal());
    }

    #[test]
    fn test_from_state_relabels() {
        let state = DensityMatrix::bell_phi_plus(3);
        let pair = Pair::from_state(state).unwrap();
        assert_eq!(pair.state().layout(), &QubitLayout::pair(1));

        let single = DensityMatrix::new(QubitLayout::single(QubitLabel::probe(0)));
        assert!(Pair::from_state(single).is_err());
    }
}
