//! Static and adaptive protocol runs
//!
//! A static run picks (depth, α) from the lookup table at the true link
//! parameters. An adaptive run first spends probes estimating the link,
//! picks (depth, α) at the estimate, and then runs on the true link. Both
//! execute the tree cascade.

use crate::cascade::{run_tree, CascadeOutcome, CascadeParams, TreeOutcome};
use crate::config::EngineConfig;
use crate::estimator::{self, ChannelEstimate, ProbeBudget};
use crate::lookup::{LookupCell, LookupTable};
use crate::rng::rng_from_seed;
use crate::throughput::Throughput;
use distill_core::noise::ChannelParams;
use distill_core::Result;
use rand::rngs::StdRng;
use rand::Rng;
use tracing::debug;

/// Result of a run whose parameters came from the lookup table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticRun {
    pub cell: LookupCell,
    pub outcome: TreeOutcome,
    pub throughput: f64,
}

/// Result of an adaptive run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveRun {
    pub estimate: ChannelEstimate,
    pub cell: LookupCell,
    pub outcome: TreeOutcome,
    /// Throughput with the probe cost subtracted
    pub throughput: f64,
}

impl AdaptiveRun {
    pub fn probe_cost(&self) -> usize {
        self.estimate.probe_cost
    }
}

/// Run the tree cascade with the table's parameters at the true (γ, p)
pub fn static_run<R: Rng + ?Sized>(
    table: &LookupTable,
    channel: &ChannelParams,
    throughput: &Throughput,
    rng: &mut R,
) -> Result<StaticRun> {
    let cell = *table.lookup(channel.gamma(), channel.p());
    let outcome = run_tree(channel, &cell.params()?, rng)?;
    Ok(StaticRun {
        cell,
        outcome,
        throughput: throughput.static_rate(cell.depth, outcome.yield_rate),
    })
}

/// Estimate the link, look up parameters at the estimate, run on the true link
pub fn adaptive_run<R: Rng + ?Sized>(
    table: &LookupTable,
    channel: &ChannelParams,
    budget: &ProbeBudget,
    throughput: &Throughput,
    rng: &mut R,
) -> Result<AdaptiveRun> {
    let estimate = estimator::estimate_channel(channel, budget, rng)?;
    let cell = *table.lookup(estimate.gamma_hat, estimate.p_hat);
    debug!(
        gamma_hat = estimate.gamma_hat,
        p_hat = estimate.p_hat,
        depth = cell.depth,
        alpha = cell.alpha,
        "adaptive parameters chosen"
    );

    let outcome = run_tree(channel, &cell.params()?, rng)?;
    Ok(AdaptiveRun {
        estimate,
        cell,
        outcome,
        throughput: throughput.adaptive_rate(cell.depth, outcome.yield_rate, estimate.probe_cost),
    })
}

/// Owns a lookup table and a random stream and exposes the protocol runs
///
/// # Example
/// ```
/// use distill_protocol::{EngineConfig, LookupConfig, LookupTableBuilder, PurificationEngine};
///
/// let table = LookupTableBuilder::new(
///     LookupConfig::new()
///         .with_gammas(vec![0.05])
///         .with_ps(vec![0.05])
///         .with_depths(vec![1])
///         .with_alphas(vec![0.5])
///         .with_seed(1),
/// )
/// .unwrap()
/// .build()
/// .unwrap();
///
/// let mut engine = PurificationEngine::new(table, EngineConfig::new().with_seed(7)).unwrap();
/// let run = engine.run_static(0.05, 0.05, 1, 0.5).unwrap();
/// assert!(run.yield_rate <= 0.5);
/// ```
#[derive(Debug)]
pub struct PurificationEngine {
    table: LookupTable,
    config: EngineConfig,
    throughput: Throughput,
    rng: StdRng,
}

impl PurificationEngine {
    /// # Errors
    /// Returns error if the configuration is invalid
    pub fn new(table: LookupTable, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            throughput: Throughput::new(config.cycle_time)?,
            rng: rng_from_seed(config.seed),
            table,
            config,
        })
    }

    pub fn table(&self) -> &LookupTable {
        &self.table
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn throughput(&self) -> &Throughput {
        &self.throughput
    }

    /// Tree cascade with explicit depth and filter strength
    pub fn run_static(
        &mut self,
        gamma: f64,
        p: f64,
        depth: u32,
        alpha: f64,
    ) -> Result<CascadeOutcome> {
        let channel = ChannelParams::new(gamma, p)?;
        let params = CascadeParams::filtered(depth, alpha)?;
        Ok(run_tree(&channel, &params, &mut self.rng)?.into())
    }

    /// Tree cascade with the table's parameters at the true (γ, p)
    pub fn run_static_lookup(&mut self, gamma: f64, p: f64) -> Result<StaticRun> {
        let channel = ChannelParams::new(gamma, p)?;
        static_run(&self.table, &channel, &self.throughput, &mut self.rng)
    }

    /// Adaptive run spending `budget` probes
    pub fn run_adaptive(
        &mut self,
        gamma: f64,
        p: f64,
        budget: &ProbeBudget,
    ) -> Result<AdaptiveRun> {
        let channel = ChannelParams::new(gamma, p)?;
        adaptive_run(&self.table, &channel, budget, &self.throughput, &mut self.rng)
    }

    /// Adaptive run with the configured probe budget
    pub fn run_adaptive_default(&mut self, gamma: f64, p: f64) -> Result<AdaptiveRun> {
        let budget = self.config.probe_budget;
        self.run_adaptive(gamma, p, &budget)
    }

    /// Estimate (γ, p) with `n` amplitude and `m` phase probes
    pub fn estimate_channel(
        &mut self,
        gamma: f64,
        p: f64,
        n: usize,
        m: usize,
    ) -> Result<ChannelEstimate> {
        let channel = ChannelParams::new(gamma, p)?;
        estimator::estimate_channel(&channel, &ProbeBudget::new(n, m)?, &mut self.rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Grid, GridMap};
    use approx::assert_relative_eq;

    fn fixed_table(depth: u32, alpha: f64) -> LookupTable {
        let gammas = Grid::new(vec![0.0, 0.1, 0.2]).unwrap();
        let ps = Grid::new(vec![0.0, 0.1, 0.2]).unwrap();
        let cells = GridMap::filled(
            3,
            3,
            LookupCell {
                depth,
                alpha,
                achieved: None,
            },
        );
        LookupTable::new(gammas, ps, cells).unwrap()
    }

    fn engine(seed: u64) -> PurificationEngine {
        PurificationEngine::new(fixed_table(1, 0.5), EngineConfig::new().with_seed(seed)).unwrap()
    }

    #[test]
    fn test_invalid_inputs() {
        let mut e = engine(1);
        assert!(e.run_static(1.5, 0.0, 1, 0.5).is_err());
        assert!(e.run_static(0.1, 0.1, 1, 2.0).is_err());
        assert!(e.estimate_channel(0.1, 0.1, 0, 10).is_err());
        let config = EngineConfig::new().with_cycle_time(0.0);
        assert!(PurificationEngine::new(fixed_table(1, 0.5), config).is_err());
    }

    #[test]
    fn test_zero_noise_estimate() {
        let est = engine(2).estimate_channel(0.0, 0.0, 30, 40).unwrap();
        assert_eq!(est.gamma_hat, 0.0);
        assert_eq!(est.p_hat, 0.0);
        assert_eq!(est.probe_cost, 70);
    }

    #[test]
    fn test_adaptive_run_accounts_for_probes() {
        let mut e = engine(3);
        let run = e.run_adaptive(0.0, 0.0, &ProbeBudget::new(5, 5).unwrap()).unwrap();
        assert_eq!(run.probe_cost(), 10);
        let expected = e.throughput().adaptive_rate(run.cell.depth, run.outcome.yield_rate, 10);
        assert_relative_eq!(run.throughput, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_static_lookup_uses_nearest_cell() {
        let mut e = engine(4);
        let run = e.run_static_lookup(0.12, 0.03).unwrap();
        assert_eq!(run.cell.depth, 1);
        assert_eq!(run.outcome.initial, 2);
        assert_relative_eq!(
            run.throughput,
            e.throughput().static_rate(1, run.outcome.yield_rate),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_seeded_engines_agree() {
        let a = engine(9).run_adaptive_default(0.1, 0.1).unwrap();
        let b = engine(9).run_adaptive_default(0.1, 0.1).unwrap();
        assert_eq!(a, b);
    }
}
