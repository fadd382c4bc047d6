//! Amplitude damping, phase damping and the two-parameter link channel

use super::types::{compose_kraus, tensor_kraus, KrausOperator, NoiseChannel};
use crate::{DistillError, Result};

/// Amplitude damping channel
///
/// Models energy relaxation where the qubit loses energy to the environment:
/// |1⟩ → |0⟩ with probability γ.
///
/// # Kraus Operators
/// ```text
/// K₀ = [[1, 0], [0, √(1-γ)]]
/// K₁ = [[0, √γ], [0, 0]]
/// ```
///
/// # Example
/// ```
/// # use distill_core::noise::AmplitudeDamping;
/// let channel = AmplitudeDamping::new(0.02).unwrap();
/// assert_eq!(channel.gamma(), 0.02);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmplitudeDamping {
    /// Decay probability γ ∈ [0, 1]
    gamma: f64,
}

impl AmplitudeDamping {
    /// Create a new amplitude damping channel
    ///
    /// # Errors
    /// Returns error if gamma is not in [0, 1]
    pub fn new(gamma: f64) -> Result<Self> {
        let gamma = DistillError::check_unit_interval("gamma", gamma)?;
        Ok(Self { gamma })
    }

    /// Get the decay probability
    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

impl NoiseChannel for AmplitudeDamping {
    fn kraus_operators(&self) -> Vec<KrausOperator> {
        let gamma = self.gamma;
        vec![
            KrausOperator::single_qubit_real(1.0, 0.0, 0.0, (1.0 - gamma).sqrt()),
            KrausOperator::single_qubit_real(0.0, gamma.sqrt(), 0.0, 0.0),
        ]
    }

    fn num_qubits(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "amplitude_damping"
    }
}

/// Phase damping channel
///
/// Models pure dephasing: the qubit acquires a Z error with probability p
/// and keeps its populations.
///
/// # Kraus Operators
/// ```text
/// K₀ = √(1-p) I
/// K₁ = √p Z
/// ```
///
/// Off-diagonal coherences shrink by a factor (1 - 2p), so p = 1/2 fully
/// dephases and p = 1 is a deterministic Z flip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseDamping {
    /// Dephasing probability p ∈ [0, 1]
    p: f64,
}

impl PhaseDamping {
    /// Create a new phase damping channel
    ///
    /// # Errors
    /// Returns error if p is not in [0, 1]
    pub fn new(p: f64) -> Result<Self> {
        let p = DistillError::check_unit_interval("p", p)?;
        Ok(Self { p })
    }

    /// Get the dephasing probability
    pub fn p(&self) -> f64 {
        self.p
    }
}

impl NoiseChannel for PhaseDamping {
    fn kraus_operators(&self) -> Vec<KrausOperator> {
        let keep = (1.0 - self.p).sqrt();
        let flip = self.p.sqrt();
        vec![
            KrausOperator::single_qubit_real(keep, 0.0, 0.0, keep),
            KrausOperator::single_qubit_real(flip, 0.0, 0.0, -flip),
        ]
    }

    fn num_qubits(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "phase_damping"
    }
}

/// Noise parameters of the communication link: (γ, p)
///
/// As a channel on a pair it acts as amplitude damping on Alice's qubit and
/// phase damping on Bob's qubit, i.e. the Kraus set {A_i ⊗ P_j}. Setting
/// either parameter to zero leaves the corresponding half untouched.
///
/// # Example
/// ```
/// # use distill_core::noise::{ChannelParams, NoiseChannel};
/// let link = ChannelParams::new(0.1, 0.05).unwrap();
/// assert_eq!(link.num_qubits(), 2);
/// assert!(link.verify_completeness(1e-12));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelParams {
    gamma: f64,
    p: f64,
}

impl ChannelParams {
    /// Create link parameters
    ///
    /// # Errors
    /// Returns error if either parameter is outside [0, 1]
    pub fn new(gamma: f64, p: f64) -> Result<Self> {
        Ok(Self {
            gamma: DistillError::check_unit_interval("gamma", gamma)?,
            p: DistillError::check_unit_interval("p", p)?,
        })
    }

    /// The ideal link
    pub const fn noiseless() -> Self {
        Self { gamma: 0.0, p: 0.0 }
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn p(&self) -> f64 {
        self.p
    }

    pub fn amplitude_damping(&self) -> AmplitudeDamping {
        AmplitudeDamping { gamma: self.gamma }
    }

    pub fn phase_damping(&self) -> PhaseDamping {
        PhaseDamping { p: self.p }
    }

    /// Both damping processes acting on one qubit, amplitude damping first
    ///
    /// Kraus set {P_j A_i}. Used for single-qubit calibration probes.
    pub fn single_qubit_kraus(&self) -> Vec<KrausOperator> {
        // Both sets are 2×2, so composition cannot fail.
        compose_kraus(
            &self.amplitude_damping().kraus_operators(),
            &self.phase_damping().kraus_operators(),
        )
        .unwrap_or_default()
    }

    pub fn is_noiseless(&self) -> bool {
        self.gamma == 0.0 && self.p == 0.0
    }
}

impl NoiseChannel for ChannelParams {
    fn kraus_operators(&self) -> Vec<KrausOperator> {
        tensor_kraus(
            &self.amplitude_damping().kraus_operators(),
            &self.phase_damping().kraus_operators(),
        )
    }

    fn num_qubits(&self) -> usize {
        2
    }

    fn name(&self) -> &str {
        "link_damping"
    }
}
