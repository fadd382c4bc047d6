//! Purification cascades
//!
//! Two runners share the same filter-then-purify step:
//!
//! - [`run_single_branch`] keeps one pair and purifies it `depth` times
//!   against fresh noisy partners. This is the cheap runner the lookup-table
//!   search is built on.
//! - [`run_tree`] starts from `2^depth` noisy pairs and halves the survivor
//!   set at every level, drawing every filter and purification acceptance.
//!
//! Physical failures (annihilating filter, purification with zero success
//! probability, empty survivor set) are ordinary outcomes and end the run
//! with zero fidelity and zero yield.

use crate::dejmps;
use crate::filter::LocalFilter;
use crate::pair::Pair;
use crate::rng::accept;
use distill_core::noise::ChannelParams;
use distill_core::{DistillError, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Largest supported tree depth (2^20 initial pairs)
pub const MAX_TREE_DEPTH: u32 = 20;

/// How the single-branch runner accounts for post-selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum BranchSampling {
    /// Yield is the product of all success probabilities; no random draws
    #[default]
    Expected,
    /// Every acceptance is a Bernoulli draw; yield is 1 or 0 per trial
    Heralded,
}

/// Depth and optional filter of a cascade
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeParams {
    pub depth: u32,
    pub filter: Option<LocalFilter>,
}

impl CascadeParams {
    /// Purification only, no filtering
    pub fn unfiltered(depth: u32) -> Self {
        Self {
            depth,
            filter: None,
        }
    }

    /// Filter of strength `alpha` before every purification round
    pub fn filtered(depth: u32, alpha: f64) -> Result<Self> {
        Ok(Self {
            depth,
            filter: Some(LocalFilter::new(alpha)?),
        })
    }

    /// Filter strength, if any
    pub fn alpha(&self) -> Option<f64> {
        self.filter.map(|f| f.alpha())
    }
}

/// Final fidelity and yield of a run, or the mean over several runs
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct CascadeOutcome {
    pub fidelity: f64,
    pub yield_rate: f64,
}

impl CascadeOutcome {
    /// The zero outcome reported for an eliminated branch
    pub const fn failed() -> Self {
        Self {
            fidelity: 0.0,
            yield_rate: 0.0,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.yield_rate == 0.0
    }

    /// Component-wise mean; an empty slice gives the failed outcome
    pub fn mean(outcomes: &[CascadeOutcome]) -> Self {
        if outcomes.is_empty() {
            return Self::failed();
        }
        let n = outcomes.len() as f64;
        let (f, y) = outcomes
            .iter()
            .fold((0.0, 0.0), |(f, y), o| (f + o.fidelity, y + o.yield_rate));
        Self {
            fidelity: f / n,
            yield_rate: y / n,
        }
    }
}

/// Result of a tree cascade
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeOutcome {
    /// Mean overlap of the survivors with Φ⁺ (0 if none survive)
    pub fidelity: f64,
    /// `survivors / initial`
    pub yield_rate: f64,
    pub survivors: usize,
    pub initial: usize,
}

impl From<TreeOutcome> for CascadeOutcome {
    fn from(outcome: TreeOutcome) -> Self {
        Self {
            fidelity: outcome.fidelity,
            yield_rate: outcome.yield_rate,
        }
    }
}

/// Running yield of a single branch
struct Branch<'a, R: Rng + ?Sized> {
    sampling: BranchSampling,
    yield_rate: f64,
    rng: &'a mut R,
}

impl<R: Rng + ?Sized> Branch<'_, R> {
    /// Account for a post-selection with success probability `p`.
    /// Returns false when the branch is eliminated.
    fn keep(&mut self, p: f64) -> bool {
        match self.sampling {
            BranchSampling::Expected => {
                self.yield_rate *= p;
                self.yield_rate > 0.0
            }
            BranchSampling::Heralded => accept(&mut *self.rng, p),
        }
    }
}

/// One trial of the single-branch cascade
///
/// Each round filters the current pair and a fresh noisy partner (when a
/// filter is set) and purifies the current pair against the partner. The
/// final fidelity is the overlap of the surviving pair with Φ⁺. Depth 0
/// returns the unpurified pair with yield 1.
pub fn run_single_branch<R: Rng + ?Sized>(
    channel: &ChannelParams,
    params: &CascadeParams,
    sampling: BranchSampling,
    rng: &mut R,
) -> Result<CascadeOutcome> {
    let fresh = Pair::noisy(channel)?;
    let mut current = fresh.clone();
    let mut branch = Branch {
        sampling,
        yield_rate: 1.0,
        rng,
    };

    for _ in 0..params.depth {
        let mut partner = fresh.clone();

        if let Some(filter) = &params.filter {
            let Some(filtered) = filter.apply(&current)? else {
                return Ok(CascadeOutcome::failed());
            };
            if !branch.keep(filtered.success_probability) {
                return Ok(CascadeOutcome::failed());
            }
            current = filtered.pair;

            let Some(filtered) = filter.apply(&partner)? else {
                return Ok(CascadeOutcome::failed());
            };
            if !branch.keep(filtered.success_probability) {
                return Ok(CascadeOutcome::failed());
            }
            partner = filtered.pair;
        }

        let Some(purified) = dejmps::purify(&current, &partner)? else {
            return Ok(CascadeOutcome::failed());
        };
        if !branch.keep(purified.success_probability) {
            return Ok(CascadeOutcome::failed());
        }
        current = purified.pair;
    }

    Ok(CascadeOutcome {
        fidelity: current.fidelity(),
        yield_rate: branch.yield_rate,
    })
}

/// Mean of `trials` single-branch trials
///
/// In [`BranchSampling::Expected`] mode a trial consumes no randomness, so a
/// single evaluation already is the mean.
pub fn run_single_branch_trials<R: Rng + ?Sized>(
    channel: &ChannelParams,
    params: &CascadeParams,
    sampling: BranchSampling,
    trials: usize,
    rng: &mut R,
) -> Result<CascadeOutcome> {
    if trials == 0 {
        return Err(DistillError::invalid_parameter("trials", "must be positive"));
    }
    match sampling {
        BranchSampling::Expected => run_single_branch(channel, params, sampling, rng),
        BranchSampling::Heralded => {
            let outcomes = (0..trials)
                .map(|_| run_single_branch(channel, params, sampling, &mut *rng))
                .collect::<Result<Vec<_>>>()?;
            Ok(CascadeOutcome::mean(&outcomes))
        }
    }
}

/// One run of the tree cascade
///
/// # Errors
/// Returns error if `params.depth` exceeds [`MAX_TREE_DEPTH`]
pub fn run_tree<R: Rng + ?Sized>(
    channel: &ChannelParams,
    params: &CascadeParams,
    rng: &mut R,
) -> Result<TreeOutcome> {
    if params.depth > MAX_TREE_DEPTH {
        return Err(DistillError::invalid_parameter(
            "depth",
            format!("tree depth {} exceeds {}", params.depth, MAX_TREE_DEPTH),
        ));
    }

    let initial = 1usize << params.depth;
    let mut survivors = vec![Pair::noisy(channel)?; initial];

    for level in 0..params.depth {
        if let Some(filter) = &params.filter {
            let mut kept = Vec::with_capacity(survivors.len());
            for pair in &survivors {
                if let Some(filtered) = filter.apply(pair)? {
                    if accept(rng, filtered.success_probability) {
                        kept.push(filtered.pair);
                    }
                }
            }
            survivors = kept;
        }

        survivors.shuffle(rng);
        let mut next = Vec::with_capacity(survivors.len() / 2);
        for couple in survivors.chunks_exact(2) {
            if let Some(purified) = dejmps::purify(&couple[0], &couple[1])? {
                if accept(rng, purified.success_probability) {
                    next.push(purified.pair);
                }
            }
        }
        survivors = next;

        debug!(level, survivors = survivors.len(), "tree level done");
        if survivors.is_empty() {
            break;
        }
    }

    let fidelity = if survivors.is_empty() {
        0.0
    } else {
        survivors.iter().map(Pair::fidelity).sum::<f64>() / survivors.len() as f64
    };

    Ok(TreeOutcome {
        fidelity,
        yield_rate: survivors.len() as f64 / initial as f64,
        survivors: survivors.len(),
        initial,
    })
}

/// A single unpurified link: its fidelity at yield 1
pub fn baseline(channel: &ChannelParams) -> Result<CascadeOutcome> {
    Ok(CascadeOutcome {
        fidelity: Pair::noisy(channel)?.fidelity(),
        yield_rate: 1.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::rng_from_seed;
    use approx::assert_abs_diff_eq;

    const TOL: f64 = 1e-10;

    fn channel(gamma: f64, p: f64) -> ChannelParams {
        ChannelParams::new(gamma, p).unwrap()
    }

    #[test]
    fn test_noiseless_unfiltered_depth_one() {
        let mut rng = rng_from_seed(Some(3));
        for sampling in [BranchSampling::Expected, BranchSampling::Heralded] {
            let out = run_single_branch(
                &ChannelParams::noiseless(),
                &CascadeParams::unfiltered(1),
                sampling,
                &mut rng,
            )
            .unwrap();
            assert_abs_diff_eq!(out.fidelity, 1.0, epsilon = TOL);
            assert_abs_diff_eq!(out.yield_rate, 1.0, epsilon = TOL);
        }
    }

    #[test]
    fn test_depth_zero_is_baseline() {
        let mut rng = rng_from_seed(Some(3));
        let ch = channel(0.1, 0.05);
        let params = CascadeParams::unfiltered(0);
        let out = run_single_branch(&ch, &params, BranchSampling::Expected, &mut rng).unwrap();
        assert_eq!(out, baseline(&ch).unwrap());
    }

    #[test]
    fn test_expected_yield_is_product() {
        let mut rng = rng_from_seed(Some(5));
        let ch = channel(0.1, 0.1);
        let filter = LocalFilter::new(0.6).unwrap();

        let pair = Pair::noisy(&ch).unwrap();
        let f = filter.apply(&pair).unwrap().unwrap();
        let purified = dejmps::purify(&f.pair, &f.pair).unwrap().unwrap();
        let expected = f.success_probability * f.success_probability * purified.success_probability;

        let out = run_single_branch(
            &ch,
            &CascadeParams::filtered(1, 0.6).unwrap(),
            BranchSampling::Expected,
            &mut rng,
        )
        .unwrap();
        assert_abs_diff_eq!(out.yield_rate, expected, epsilon = TOL);
        assert_abs_diff_eq!(out.fidelity, purified.pair.fidelity(), epsilon = TOL);
    }

    #[test]
    fn test_heralded_yield_is_binary() {
        let mut rng = rng_from_seed(Some(11));
        let params = CascadeParams::filtered(2, 0.5).unwrap();
        for _ in 0..50 {
            let out =
                run_single_branch(&channel(0.1, 0.1), &params, BranchSampling::Heralded, &mut rng)
                    .unwrap();
            assert!(out.yield_rate == 0.0 || out.yield_rate == 1.0);
            if out.is_failed() {
                assert_eq!(out.fidelity, 0.0);
            }
        }
    }

    #[test]
    fn test_annihilating_filter_fails_branch() {
        // A fully damped link leaves A in |0⟩; α = 0 only passes |1⟩ on both sides
        let mut rng = rng_from_seed(Some(1));
        let out = run_single_branch(
            &channel(1.0, 0.0),
            &CascadeParams::filtered(1, 0.0).unwrap(),
            BranchSampling::Expected,
            &mut rng,
        )
        .unwrap();
        assert_eq!(out, CascadeOutcome::failed());
    }

    #[test]
    fn test_trials_mean_in_expected_mode() {
        let mut rng = rng_from_seed(Some(2));
        let ch = channel(0.05, 0.02);
        let params = CascadeParams::filtered(2, 0.4).unwrap();
        let single = run_single_branch(&ch, &params, BranchSampling::Expected, &mut rng).unwrap();
        let mean = run_single_branch_trials(&ch, &params, BranchSampling::Expected, 100, &mut rng)
            .unwrap();
        assert_eq!(single, mean);
        let none = run_single_branch_trials(&ch, &params, BranchSampling::Expected, 0, &mut rng);
        assert!(none.is_err());
    }

    #[test]
    fn test_tree_noiseless_keeps_everything() {
        let mut rng = rng_from_seed(Some(7));
        let params = CascadeParams::unfiltered(3);
        let out = run_tree(&ChannelParams::noiseless(), &params, &mut rng).unwrap();
        assert_eq!(out.initial, 8);
        assert_eq!(out.survivors, 1);
        assert_abs_diff_eq!(out.yield_rate, 1.0 / 8.0, epsilon = TOL);
        assert_abs_diff_eq!(out.fidelity, 1.0, epsilon = TOL);
    }

    #[test]
    fn test_tree_bounds() {
        let mut rng = rng_from_seed(Some(9));
        let params = CascadeParams::filtered(3, 0.5).unwrap();
        for _ in 0..20 {
            let out = run_tree(&channel(0.15, 0.1), &params, &mut rng).unwrap();
            assert!(out.survivors <= 1);
            assert!((0.0..=1.0).contains(&out.fidelity));
            if out.survivors == 0 {
                assert_eq!(out.fidelity, 0.0);
                assert_eq!(out.yield_rate, 0.0);
            }
        }
    }

    #[test]
    fn test_tree_depth_limit() {
        let mut rng = rng_from_seed(Some(1));
        let params = CascadeParams::unfiltered(MAX_TREE_DEPTH + 1);
        assert!(run_tree(&ChannelParams::noiseless(), &params, &mut rng).is_err());
    }

    #[test]
    fn test_outcome_mean() {
        let outcomes = [
            CascadeOutcome { fidelity: 0.9, yield_rate: 1.0 },
            CascadeOutcome::failed(),
        ];
        let mean = CascadeOutcome::mean(&outcomes);
        assert_abs_diff_eq!(mean.fidelity, 0.45, epsilon = TOL);
        assert_abs_diff_eq!(mean.yield_rate, 0.5, epsilon = TOL);
        assert_eq!(CascadeOutcome::mean(&[]), CascadeOutcome::failed());
    }
}
