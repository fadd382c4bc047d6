//! Link noise as Kraus channels
//!
//! - **Amplitude damping** (γ): energy loss, |1⟩ → |0⟩
//! - **Phase damping** (p): dephasing, coherences shrink by (1 - 2p)
//! - **Link channel** ([`ChannelParams`]): amplitude damping on Alice's qubit
//!   and phase damping on Bob's qubit, combined as a tensor product of Kraus sets
//!
//! # Usage
//!
//! ```
//! use distill_core::noise::{ChannelParams, NoiseChannel};
//!
//! let link = ChannelParams::new(0.05, 0.01).unwrap();
//! for kraus in link.kraus_operators() {
//!     assert_eq!(kraus.dimension, 4);
//! }
//! ```

pub mod channels;
pub mod types;

pub use channels::{AmplitudeDamping, ChannelParams, PhaseDamping};
pub use types::{compose_kraus, tensor_kraus, KrausOperator, NoiseChannel};
