//! Parallel lookup-table search

use super::{Candidate, CellSelector, LookupTable};
use crate::cascade::{run_single_branch_trials, CascadeOutcome, CascadeParams};
use crate::config::LookupConfig;
use crate::grid::{Grid, GridMap};
use crate::rng::{resolve_seed, task_rng};
use distill_core::noise::ChannelParams;
use distill_core::{DistillError, Result};
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info, warn};

/// One (cell, candidate) evaluation
#[derive(Debug, Clone, Copy)]
struct Task {
    row: usize,
    col: usize,
    depth: u32,
    alpha: f64,
}

/// Builds a [`LookupTable`] from a [`LookupConfig`]
///
/// Every (cell, candidate) pair is an independent task with its own random
/// stream derived from the base seed and the task's position, so a fixed
/// seed gives the same table on any number of threads. Task results are
/// merged into the per-cell selectors sequentially, in generation order.
#[derive(Debug, Clone)]
pub struct LookupTableBuilder {
    config: LookupConfig,
}

impl LookupTableBuilder {
    /// # Errors
    /// Returns error if the configuration is invalid
    pub fn new(config: LookupConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    /// Candidates in search order: depth-major, then α
    fn candidates(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.config
            .depths
            .iter()
            .flat_map(move |&d| self.config.alphas.iter().map(move |&a| (d, a)))
    }

    fn tasks(&self) -> Vec<Task> {
        let mut tasks = Vec::with_capacity(
            self.config.gammas.len() * self.config.ps.len() * self.config.num_candidates(),
        );
        for row in 0..self.config.gammas.len() {
            for col in 0..self.config.ps.len() {
                tasks.extend(self.candidates().map(|(depth, alpha)| Task {
                    row,
                    col,
                    depth,
                    alpha,
                }));
            }
        }
        tasks
    }

    /// Mean outcome of one task; failures are logged and scored as zero
    fn evaluate(&self, task: &Task, seed: u64, index: usize) -> CascadeOutcome {
        let gamma = self.config.gammas[task.row];
        let p = self.config.ps[task.col];
        let mut rng = task_rng(seed, index as u64);

        let result = ChannelParams::new(gamma, p).and_then(|channel| {
            let params = CascadeParams::filtered(task.depth, task.alpha)?;
            run_single_branch_trials(
                &channel,
                &params,
                self.config.sampling,
                self.config.trials,
                &mut rng,
            )
        });

        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    error = %e,
                    gamma,
                    p,
                    depth = task.depth,
                    alpha = task.alpha,
                    "lookup task failed, scoring as zero"
                );
                CascadeOutcome::failed()
            }
        }
    }

    /// Run the search
    ///
    /// # Errors
    /// Returns error only for malformed grids; individual task failures are
    /// recorded as zero outcomes
    pub fn build(&self) -> Result<LookupTable> {
        let gammas = Grid::new(self.config.gammas.clone())?;
        let ps = Grid::new(self.config.ps.clone())?;
        let seed = resolve_seed(self.config.seed);
        let tasks = self.tasks();

        info!(
            gammas = gammas.len(),
            ps = ps.len(),
            candidates = self.config.num_candidates(),
            tasks = tasks.len(),
            trials = self.config.trials,
            seed,
            "building lookup table"
        );
        let start = Instant::now();

        let outcomes: Vec<CascadeOutcome> = tasks
            .par_iter()
            .enumerate()
            .map(|(index, task)| self.evaluate(task, seed, index))
            .collect();

        let mut selectors =
            vec![CellSelector::new(self.config.target_fidelity); gammas.len() * ps.len()];
        for (task, outcome) in tasks.iter().zip(outcomes) {
            selectors[task.row * ps.len() + task.col].offer(Candidate {
                depth: task.depth,
                alpha: task.alpha,
                outcome,
            });
        }

        let mut infeasible = 0usize;
        let mut cells = Vec::with_capacity(selectors.len());
        for (k, selector) in selectors.into_iter().enumerate() {
            if !selector.is_feasible() {
                infeasible += 1;
                debug!(
                    gamma = gammas.value(k / ps.len()),
                    p = ps.value(k % ps.len()),
                    "fidelity target not reached, keeping highest-fidelity candidate"
                );
            }
            let cell = selector
                .finish()
                .ok_or_else(|| DistillError::EmptyGrid("lookup candidates".to_string()))?;
            cells.push(cell);
        }

        if infeasible > 0 {
            warn!(
                infeasible,
                target = self.config.target_fidelity,
                "cells fell back to the highest-fidelity candidate"
            );
        }
        info!(elapsed_ms = start.elapsed().as_millis() as u64, "lookup table built");

        let cells = GridMap::from_cells(gammas.len(), ps.len(), cells)?;
        LookupTable::new(gammas, ps, cells)
    }
}

/// Build a table over the given grids with default sampling and a random seed
pub fn build_lookup_table(
    gammas: &[f64],
    ps: &[f64],
    depths: &[u32],
    alphas: &[f64],
    target_fidelity: f64,
    trials: usize,
) -> Result<LookupTable> {
    let config = LookupConfig::new()
        .with_gammas(gammas.to_vec())
        .with_ps(ps.to_vec())
        .with_depths(depths.to_vec())
        .with_alphas(alphas.to_vec())
        .with_target_fidelity(target_fidelity)
        .with_trials(trials);
    LookupTableBuilder::new(config)?.build()
}
