//! Density matrices with explicit qubit layouts
//!
//! This crate provides the quantum-state layer of the distillation engine:
//!
//! - [`QubitLayout`]: maps logical [`QubitLabel`](distill_core::QubitLabel)s to
//!   tensor-factor positions
//! - [`DensityMatrix`]: mixed states supporting tensor composition, Kraus
//!   channels, projection, partial trace and overlap with a reference state
//!
//! States of 1, 2 and 4 qubits are what the purification protocol needs; the
//! implementation is general but stores the full 4^n matrix.
//!
//! # Example
//!
//! ```
//! use distill_core::{noise::ChannelParams, QubitLabel};
//! use distill_state::DensityMatrix;
//!
//! let mut pair = DensityMatrix::bell_phi_plus(1);
//! let link = ChannelParams::new(0.1, 0.05).unwrap();
//! pair.apply_channel(&link, &[QubitLabel::alice(1), QubitLabel::bob(1)]).unwrap();
//! assert!((pair.trace() - 1.0).abs() < 1e-12);
//! ```

pub mod density_matrix;
pub mod layout;

pub use density_matrix::DensityMatrix;
pub use distill_core::{DistillError, Result};
pub use layout::QubitLayout;
