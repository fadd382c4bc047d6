//! Grid sweeps over (γ, p)
//!
//! Every grid point is an independent task with its own random stream; results
//! come back in row-major order and are stored by integer grid position.

use crate::cascade::{
    baseline, run_single_branch, run_single_branch_trials, CascadeOutcome, CascadeParams,
};
use crate::config::SweepConfig;
use crate::engine::{adaptive_run, static_run};
use crate::estimator::estimate_channel;
use crate::grid::{Grid, GridMap};
use crate::lookup::LookupTable;
use crate::rng::{resolve_seed, task_rng};
use crate::throughput::Throughput;
use distill_core::noise::ChannelParams;
use distill_core::{DistillError, Result};
use rand::rngs::StdRng;
use rayon::prelude::*;
use std::time::Instant;
use tracing::{info, warn};

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Per-point results of a sweep together with its axes
#[derive(Debug, Clone, PartialEq)]
pub struct SweepGrid<T> {
    pub gammas: Grid,
    pub ps: Grid,
    pub cells: GridMap<T>,
}

impl<T> SweepGrid<T> {
    /// Result at the grid point nearest to (γ, p)
    pub fn at(&self, gamma: f64, p: f64) -> &T {
        self.cells
            .get(self.gammas.nearest_index(gamma), self.ps.nearest_index(p))
    }
}

/// Mean fidelity, yield and throughput of repeated runs
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct RunStats {
    pub fidelity: f64,
    pub yield_rate: f64,
    pub throughput: f64,
}

impl RunStats {
    fn accumulate(&mut self, fidelity: f64, yield_rate: f64, throughput: f64) {
        self.fidelity += fidelity;
        self.yield_rate += yield_rate;
        self.throughput += throughput;
    }

    fn scaled(self, factor: f64) -> Self {
        Self {
            fidelity: self.fidelity * factor,
            yield_rate: self.yield_rate * factor,
            throughput: self.throughput * factor,
        }
    }
}

/// Static and adaptive results at one grid point
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Comparison {
    pub static_run: RunStats,
    pub adaptive_run: RunStats,
}

impl Comparison {
    /// Adaptive minus static: (ΔF, ΔY, ΔR)
    pub fn delta(&self) -> RunStats {
        RunStats {
            fidelity: self.adaptive_run.fidelity - self.static_run.fidelity,
            yield_rate: self.adaptive_run.yield_rate - self.static_run.yield_rate,
            throughput: self.adaptive_run.throughput - self.static_run.throughput,
        }
    }
}

/// Purified and unpurified results at one grid point
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct DepthPoint {
    pub purified: CascadeOutcome,
    pub baseline: CascadeOutcome,
}

impl DepthPoint {
    pub fn delta_fidelity(&self) -> f64 {
        self.purified.fidelity - self.baseline.fidelity
    }

    pub fn delta_yield(&self) -> f64 {
        self.purified.yield_rate - self.baseline.yield_rate
    }
}

/// Evaluate `f` at every grid point in parallel, one random stream per point
fn sweep_grid<T, F>(config: &SweepConfig, what: &str, f: F) -> Result<SweepGrid<T>>
where
    T: Default + Send,
    F: Fn(&ChannelParams, &mut StdRng) -> Result<T> + Sync,
{
    config.validate()?;
    let gammas = Grid::new(config.gammas.clone())?;
    let ps = Grid::new(config.ps.clone())?;
    let seed = resolve_seed(config.seed);
    let (rows, cols) = (gammas.len(), ps.len());

    info!(sweep = what, rows, cols, trials = config.trials, seed, "starting sweep");
    let start = Instant::now();

    let cells: Vec<T> = (0..rows * cols)
        .into_par_iter()
        .map(|k| {
            let (gamma, p) = (gammas.value(k / cols), ps.value(k % cols));
            let mut rng = task_rng(seed, k as u64);
            match ChannelParams::new(gamma, p).and_then(|channel| f(&channel, &mut rng)) {
                Ok(cell) => cell,
                Err(e) => {
                    warn!(
                        sweep = what,
                        error = %e,
                        gamma,
                        p,
                        "sweep point failed, recording zeros"
                    );
                    T::default()
                }
            }
        })
        .collect();

    info!(sweep = what, elapsed_ms = start.elapsed().as_millis() as u64, "sweep finished");
    Ok(SweepGrid {
        cells: GridMap::from_cells(rows, cols, cells)?,
        gammas,
        ps,
    })
}

/// Compare static and adaptive runs at every grid point
///
/// Both runs execute on the true link; the adaptive one chooses its
/// parameters from a probe estimate and pays for the probes in throughput.
pub fn compare_static_adaptive(
    table: &LookupTable,
    config: &SweepConfig,
) -> Result<SweepGrid<Comparison>> {
    let throughput = Throughput::new(config.engine.cycle_time)?;
    let budget = config.engine.probe_budget;
    let norm = 1.0 / config.trials as f64;

    sweep_grid(config, "static_vs_adaptive", |channel, rng| {
        let mut stat = RunStats::default();
        let mut adapt = RunStats::default();
        for _ in 0..config.trials {
            let s = static_run(table, channel, &throughput, rng)?;
            stat.accumulate(s.outcome.fidelity, s.outcome.yield_rate, s.throughput);

            let a = adaptive_run(table, channel, &budget, &throughput, rng)?;
            adapt.accumulate(a.outcome.fidelity, a.outcome.yield_rate, a.throughput);
        }
        Ok(Comparison {
            static_run: stat.scaled(norm),
            adaptive_run: adapt.scaled(norm),
        })
    })
}

/// Single-branch cascade at a fixed depth over the grid, with the
/// unpurified baseline at each point
pub fn depth_sweep(params: &CascadeParams, config: &SweepConfig) -> Result<SweepGrid<DepthPoint>> {
    sweep_grid(config, "depth", |channel, rng| {
        Ok(DepthPoint {
            purified: run_single_branch_trials(
                channel,
                params,
                config.sampling,
                config.trials,
                rng,
            )?,
            baseline: baseline(channel)?,
        })
    })
}

/// Gain reported when no static depth reaches the adaptive fidelity
pub const UNMATCHED_GAIN: f64 = 100.0;

/// Relative yield gain of an adaptive outcome over the best matching static depth
///
/// Among the static outcomes whose fidelity is at least the adaptive one,
/// the highest yield `Y*` is the reference and the gain is
/// `100 · (Y_adapt − Y*) / Y*` percent. Without such an outcome (or when
/// all of them have zero yield) the gain is [`UNMATCHED_GAIN`].
pub fn relative_gain(adaptive: &CascadeOutcome, statics: &[CascadeOutcome]) -> f64 {
    let best = statics
        .iter()
        .filter(|s| s.fidelity >= adaptive.fidelity)
        .map(|s| s.yield_rate)
        .fold(0.0, f64::max);

    if best > 0.0 {
        100.0 * (adaptive.yield_rate - best) / best
    } else {
        UNMATCHED_GAIN
    }
}

/// Relative yield gain (percent) of adaptive over static purification
///
/// At every grid point the adaptive single-branch cascade estimates the
/// link once per trial and runs the table's parameters for the estimate on
/// the true link. Each of `depths` is run as an unfiltered static cascade,
/// and the point's value is [`relative_gain`] of the two.
///
/// # Errors
/// Returns error if `depths` is empty or the sweep configuration is invalid
pub fn relative_improvement(
    table: &LookupTable,
    depths: &[u32],
    config: &SweepConfig,
) -> Result<SweepGrid<f64>> {
    if depths.is_empty() {
        return Err(DistillError::InvalidConfig("depths must not be empty".to_string()));
    }
    let budget = config.engine.probe_budget;

    sweep_grid(config, "relative_improvement", |channel, rng| {
        let mut runs = Vec::with_capacity(config.trials);
        for _ in 0..config.trials {
            let estimate = estimate_channel(channel, &budget, rng)?;
            let params = table.lookup(estimate.gamma_hat, estimate.p_hat).params()?;
            runs.push(run_single_branch(channel, &params, config.sampling, rng)?);
        }
        let adaptive = CascadeOutcome::mean(&runs);

        let statics = depths
            .iter()
            .map(|&depth| {
                let params = CascadeParams::unfiltered(depth);
                run_single_branch_trials(channel, &params, config.sampling, config.trials, rng)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(relative_gain(&adaptive, &statics))
    })
}
