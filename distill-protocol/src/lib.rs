//! Entanglement purification over a damped link
//!
//! This crate builds the DEJMPS protocol on top of the density-matrix layer
//! and exposes the decision engine that picks purification parameters:
//!
//! - **Pairs and noise**: [`Pair`] is one |Φ⁺⟩ link after amplitude damping
//!   on Alice's qubit and dephasing on Bob's
//! - **Protocol steps**: [`LocalFilter`] and [`dejmps::purify`], both
//!   returning `None` when post-selection cannot succeed
//! - **Cascades**: single-branch and tree runners in [`cascade`]
//! - **Estimation**: probe-based (γ̂, p̂) estimates in [`estimator`]
//! - **Lookup**: a parallel exhaustive search over (depth, α) per grid cell,
//!   producing an immutable [`LookupTable`]
//! - **Engine**: static and adaptive runs with throughput accounting
//! - **Sweeps**: static-vs-adaptive, relative-gain and depth sweeps over a
//!   (γ, p) grid
//!
//! All stochastic calls take an explicit random generator. Parallel work
//! derives one stream per task from a base seed, so seeded runs are
//! reproducible regardless of thread count.
//!
//! # Example
//!
//! ```
//! use distill_protocol::{dejmps, LocalFilter, Pair};
//! use distill_core::noise::ChannelParams;
//!
//! let link = ChannelParams::new(0.2, 0.0).unwrap();
//! let pair = Pair::noisy(&link).unwrap();
//!
//! let filtered = LocalFilter::new(0.5).unwrap().apply(&pair).unwrap().unwrap();
//! let out = dejmps::purify(&filtered.pair, &filtered.pair).unwrap().unwrap();
//! assert!(out.pair.fidelity() > pair.fidelity());
//! ```

pub mod cascade;
pub mod config;
pub mod dejmps;
pub mod engine;
pub mod estimator;
pub mod filter;
pub mod grid;
pub mod lookup;
pub mod pair;
pub mod rng;
pub mod sweep;
pub mod throughput;

pub use cascade::{
    baseline, run_single_branch, run_single_branch_trials, run_tree, BranchSampling, CascadeOutcome,
    CascadeParams, TreeOutcome,
};
pub use config::{EngineConfig, LookupConfig, SweepConfig};
pub use dejmps::Purified;
pub use engine::{AdaptiveRun, PurificationEngine, StaticRun};
pub use estimator::{estimate_channel, ChannelEstimate, ProbeBudget};
pub use filter::{Filtered, LocalFilter};
pub use grid::{Grid, GridMap};
pub use lookup::{build_lookup_table, LookupCell, LookupTable, LookupTableBuilder};
pub use pair::Pair;
pub use sweep::{
    compare_static_adaptive, depth_sweep, relative_gain, relative_improvement, Comparison,
    DepthPoint, RunStats, SweepGrid, UNMATCHED_GAIN,
};
pub use throughput::Throughput;

pub use distill_core::{DistillError, Result};
