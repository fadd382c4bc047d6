//! One DEJMPS purification round
//!
//! Two pairs are combined into a four-qubit state `[A1, B1, A2, B2]`. Each
//! party applies a CNOT from its first qubit to its second, then both measure
//! their second qubit. The round succeeds when the outcomes agree, and the
//! surviving pair `[A1, B1]` is kept.

use crate::pair::{Pair, ALICE, BOB};
use distill_core::noise::KrausOperator;
use distill_core::{clamp_probability, Complex64, QubitLabel, Result};

/// Alice's qubit of the sacrificed pair
pub const ALICE_TARGET: QubitLabel = ALICE.with_slot(2);
/// Bob's qubit of the sacrificed pair
pub const BOB_TARGET: QubitLabel = BOB.with_slot(2);

/// Outcome of a successful round
#[derive(Debug, Clone)]
pub struct Purified {
    /// Renormalized surviving pair
    pub pair: Pair,
    /// Probability that the measured outcomes agree
    pub success_probability: f64,
}

/// CNOT on `[control, target]`: |0⟩⟨0| ⊗ I + |1⟩⟨1| ⊗ X
pub fn cnot() -> KrausOperator {
    let one = Complex64::new(1.0, 0.0);
    let mut matrix = vec![Complex64::new(0.0, 0.0); 16];
    matrix[0] = one; // |00⟩ → |00⟩
    matrix[4 + 1] = one; // |01⟩ → |01⟩
    matrix[8 + 3] = one; // |11⟩ → |10⟩
    matrix[12 + 2] = one; // |10⟩ → |11⟩
    KrausOperator {
        matrix,
        dimension: 4,
    }
}

/// Purify `first` by sacrificing `second`
///
/// Returns `Ok(None)` when the agreeing outcomes have zero probability. The
/// caller decides with its own draw whether a non-zero outcome is kept.
///
/// # Example
/// ```
/// use distill_protocol::{dejmps, Pair};
///
/// let out = dejmps::purify(&Pair::ideal(), &Pair::ideal()).unwrap().unwrap();
/// assert!((out.success_probability - 1.0).abs() < 1e-12);
/// assert!((out.pair.fidelity() - 1.0).abs() < 1e-12);
/// ```
pub fn purify(first: &Pair, second: &Pair) -> Result<Option<Purified>> {
    let mut sacrificed = second.state().clone();
    sacrificed.relabel(ALICE, ALICE_TARGET)?;
    sacrificed.relabel(BOB, BOB_TARGET)?;

    let mut combined = first.state().tensor(&sacrificed)?;
    let gate = cnot();
    combined.apply_unitary(&gate, &[ALICE, ALICE_TARGET])?;
    combined.apply_unitary(&gate, &[BOB, BOB_TARGET])?;

    let measured = [ALICE_TARGET, BOB_TARGET];
    let both_zero = combined.project(&measured, &[false, false])?;
    let both_one = combined.project(&measured, &[true, true])?;
    let mut kept = both_zero.sum(&both_one)?;

    let success_probability = clamp_probability(kept.trace());
    if success_probability == 0.0 || kept.normalize().is_none() {
        return Ok(None);
    }

    let reduced = kept.partial_trace(&measured)?;
    Ok(Some(Purified {
        pair: Pair::from_state(reduced)?,
        success_probability,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use distill_core::noise::ChannelParams;
    use distill_state::{DensityMatrix, QubitLayout};

    const TOL: f64 = 1e-10;

    /// Bell-diagonal pair with weights on Φ⁺, Ψ⁻, Ψ⁺, Φ⁻
    fn bell_diagonal(weights: [f64; 4]) -> Pair {
        let s = std::f64::consts::FRAC_1_SQRT_2;
        let basis = [
            [s, 0.0, 0.0, s],
            [0.0, s, -s, 0.0],
            [0.0, s, s, 0.0],
            [s, 0.0, 0.0, -s],
        ];
        let mut matrix = vec![Complex64::new(0.0, 0.0); 16];
        for (w, v) in weights.iter().zip(basis.iter()) {
            for i in 0..4 {
                for j in 0..4 {
                    matrix[i * 4 + j] += Complex64::new(w * v[i] * v[j], 0.0);
                }
            }
        }
        Pair::from_state(DensityMatrix::from_matrix(QubitLayout::pair(1), matrix).unwrap()).unwrap()
    }

    #[test]
    fn test_cnot_is_unitary() {
        let gate = cnot();
        let product = gate.adjoint().compose(&gate).unwrap();
        assert_eq!(product, KrausOperator::identity(2));
    }

    #[test]
    fn test_ideal_pairs_are_a_fixed_point() {
        let out = purify(&Pair::ideal(), &Pair::ideal()).unwrap().unwrap();
        assert_abs_diff_eq!(out.success_probability, 1.0, epsilon = TOL);
        assert_abs_diff_eq!(out.pair.fidelity(), 1.0, epsilon = TOL);
        assert_eq!(out.pair.state().layout(), &QubitLayout::pair(1));
    }

    #[test]
    fn test_bell_diagonal_recurrence() {
        // Agreeing parity: (a + d)² + (b + c)²
        // Φ⁺ survives from (Φ⁺,Φ⁺) and (Φ⁻,Φ⁻)
        let (a, b, c, d) = (0.7, 0.1, 0.1, 0.1);
        let pair = bell_diagonal([a, b, c, d]);
        let out = purify(&pair, &pair).unwrap().unwrap();

        let success = (a + d) * (a + d) + (b + c) * (b + c);
        assert_abs_diff_eq!(out.success_probability, success, epsilon = TOL);
        assert_abs_diff_eq!(out.pair.fidelity(), (a * a + d * d) / success, epsilon = TOL);
    }

    #[test]
    fn test_maximally_mixed_inputs() {
        let mixed = Pair::from_state(DensityMatrix::maximally_mixed(QubitLayout::pair(1))).unwrap();
        let out = purify(&mixed, &mixed).unwrap().unwrap();
        assert_abs_diff_eq!(out.success_probability, 0.5, epsilon = TOL);
        assert_abs_diff_eq!(out.pair.fidelity(), 0.25, epsilon = TOL);
    }

    #[test]
    fn test_round_against_damping_and_dephasing() {
        // Amplitude damping errors are caught by the parity check
        let damped = Pair::noisy(&ChannelParams::new(0.2, 0.0).unwrap()).unwrap();
        let out = purify(&damped, &damped).unwrap().unwrap();
        assert_abs_diff_eq!(out.success_probability, 0.82, epsilon = 1e-9);
        assert!(out.pair.fidelity() > damped.fidelity());

        // Phase errors pass the parity check and are amplified
        let dephased = Pair::noisy(&ChannelParams::new(0.0, 0.1).unwrap()).unwrap();
        let out = purify(&dephased, &dephased).unwrap().unwrap();
        assert_abs_diff_eq!(out.success_probability, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(out.pair.fidelity(), 0.82, epsilon = 1e-9);
        assert!(out.pair.state().is_valid(1e-9));
    }

    #[test]
    fn test_orthogonal_parity_fails() {
        // Φ⁺ against Ψ⁺ never gives agreeing outcomes
        let phi = bell_diagonal([1.0, 0.0, 0.0, 0.0]);
        let psi = bell_diagonal([0.0, 0.0, 1.0, 0.0]);
        assert!(purify(&phi, &psi).unwrap().is_none());
    }
}
