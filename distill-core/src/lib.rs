//! Core types for entanglement distillation simulation
//!
//! This crate provides the vocabulary shared by the rest of the workspace:
//! - [`DistillError`]: the single error type of the engine
//! - [`QubitLabel`]: logical names for the qubits of one or more Bell pairs
//! - [`noise`]: Kraus operators and the amplitude/phase damping channels
//!
//! # Example
//! ```
//! use distill_core::noise::{ChannelParams, NoiseChannel};
//!
//! let channel = ChannelParams::new(0.05, 0.02).unwrap();
//! assert_eq!(channel.kraus_operators().len(), 4);
//! assert!(channel.verify_completeness(1e-10));
//! ```

pub mod error;
pub mod noise;
pub mod qubit;

pub use error::DistillError;
pub use noise::{AmplitudeDamping, ChannelParams, KrausOperator, NoiseChannel, PhaseDamping};
pub use num_complex::Complex64;
pub use qubit::{Party, QubitLabel};

/// Type alias for results in the distillation engine
pub type Result<T> = std::result::Result<T, DistillError>;

/// Probabilities at or below this value are treated as exactly zero.
pub const PROBABILITY_EPSILON: f64 = 1e-12;

/// Clamp a probability computed from a trace into `[0, 1]`.
///
/// Round-off can push a trace slightly below zero or above one; those values
/// are folded back instead of being reported as failures. Anything at or below
/// [`PROBABILITY_EPSILON`] becomes `0.0`.
#[inline]
pub fn clamp_probability(value: f64) -> f64 {
    if !value.is_finite() || value <= PROBABILITY_EPSILON {
        0.0
    } else {
        value.min(1.0)
    }
}
