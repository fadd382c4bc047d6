//! Engine, lookup-table and sweep configuration

use crate::cascade::BranchSampling;
use crate::estimator::ProbeBudget;
use crate::grid::linspace;
use distill_core::{DistillError, Result};

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

fn check_axis(name: &str, values: &[f64]) -> Result<()> {
    if values.is_empty() {
        return Err(DistillError::InvalidConfig(format!("{} must not be empty", name)));
    }
    if let Some(bad) = values.iter().find(|v| !(0.0..=1.0).contains(*v)) {
        return Err(DistillError::InvalidConfig(format!(
            "{} values must be in [0,1], got {}",
            name, bad
        )));
    }
    Ok(())
}

/// Configuration for building a lookup table
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialization", serde(default))]
pub struct LookupConfig {
    /// Amplitude-damping grid (table rows)
    ///
    /// Default: 20 points from 0.01 to 0.20
    pub gammas: Vec<f64>,

    /// Dephasing grid (table columns)
    ///
    /// Default: 20 points from 0.01 to 0.20
    pub ps: Vec<f64>,

    /// Candidate purification depths, searched in this order
    ///
    /// Default: [1, 2, 3]
    pub depths: Vec<u32>,

    /// Candidate filter strengths, searched in this order for every depth
    ///
    /// Default: 20 points from 0.1 to 0.9
    pub alphas: Vec<f64>,

    /// Fidelity a candidate must reach to be chosen by yield
    ///
    /// Default: 0.90
    pub target_fidelity: f64,

    /// Single-branch trials averaged per candidate
    ///
    /// Default: 500
    pub trials: usize,

    /// How trials account for post-selection
    ///
    /// Default: [`BranchSampling::Expected`]
    pub sampling: BranchSampling,

    /// Base seed for the per-task random streams
    ///
    /// Default: None (random)
    pub seed: Option<u64>,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            gammas: linspace(0.01, 0.20, 20),
            ps: linspace(0.01, 0.20, 20),
            depths: vec![1, 2, 3],
            alphas: linspace(0.1, 0.9, 20),
            target_fidelity: 0.90,
            trials: 500,
            sampling: BranchSampling::Expected,
            seed: None,
        }
    }
}

impl LookupConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Coarse 5×5 table with 5 filter strengths, for smoke runs
    pub fn coarse() -> Self {
        Self {
            gammas: linspace(0.01, 0.20, 5),
            ps: linspace(0.01, 0.20, 5),
            alphas: linspace(0.1, 0.9, 5),
            trials: 50,
            ..Default::default()
        }
    }

    pub fn with_gammas(mut self, gammas: Vec<f64>) -> Self {
        self.gammas = gammas;
        self
    }

    pub fn with_ps(mut self, ps: Vec<f64>) -> Self {
        self.ps = ps;
        self
    }

    pub fn with_depths(mut self, depths: Vec<u32>) -> Self {
        self.depths = depths;
        self
    }

    pub fn with_alphas(mut self, alphas: Vec<f64>) -> Self {
        self.alphas = alphas;
        self
    }

    pub fn with_target_fidelity(mut self, target: f64) -> Self {
        self.target_fidelity = target;
        self
    }

    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    pub fn with_sampling(mut self, sampling: BranchSampling) -> Self {
        self.sampling = sampling;
        self
    }

    /// Set the base seed for reproducible tables
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of (depth, α) candidates per cell
    pub fn num_candidates(&self) -> usize {
        self.depths.len() * self.alphas.len()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        check_axis("gammas", &self.gammas)?;
        check_axis("ps", &self.ps)?;
        check_axis("alphas", &self.alphas)?;

        if self.depths.is_empty() {
            return Err(DistillError::InvalidConfig("depths must not be empty".to_string()));
        }
        if self.depths.contains(&0) {
            return Err(DistillError::InvalidConfig("depths must be > 0".to_string()));
        }
        if !(0.0..=1.0).contains(&self.target_fidelity) {
            return Err(DistillError::InvalidConfig(format!(
                "target_fidelity must be in [0,1], got {}",
                self.target_fidelity
            )));
        }
        if self.trials == 0 {
            return Err(DistillError::InvalidConfig("trials must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Configuration for [`PurificationEngine`](crate::PurificationEngine)
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialization", serde(default))]
pub struct EngineConfig {
    /// Probes spent by every adaptive run
    ///
    /// Default: 50 + 50
    pub probe_budget: ProbeBudget,

    /// Duration of one link-generation cycle in seconds
    ///
    /// Default: 0.01
    pub cycle_time: f64,

    /// Random number generator seed for reproducibility
    ///
    /// Default: None (random)
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            probe_budget: ProbeBudget::default(),
            cycle_time: 0.01,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_probe_budget(mut self, budget: ProbeBudget) -> Self {
        self.probe_budget = budget;
        self
    }

    pub fn with_cycle_time(mut self, cycle_time: f64) -> Self {
        self.cycle_time = cycle_time;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.probe_budget
            .validate()
            .map_err(|e| DistillError::InvalidConfig(e.to_string()))?;
        if !(self.cycle_time.is_finite() && self.cycle_time > 0.0) {
            return Err(DistillError::InvalidConfig(format!(
                "cycle_time must be positive, got {}",
                self.cycle_time
            )));
        }
        Ok(())
    }
}

/// Configuration for grid sweeps
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialization", serde(default))]
pub struct SweepConfig {
    /// Default: 20 points from 0.01 to 0.20
    pub gammas: Vec<f64>,

    /// Default: 20 points from 0.01 to 0.20
    pub ps: Vec<f64>,

    /// Monte-Carlo runs averaged per grid point
    ///
    /// Default: 100
    pub trials: usize,

    /// Post-selection accounting for single-branch depth sweeps
    ///
    /// Default: [`BranchSampling::Expected`]
    pub sampling: BranchSampling,

    /// Base seed for the per-cell random streams
    ///
    /// Default: None (random)
    pub seed: Option<u64>,

    /// Probe budget and cycle time for static/adaptive comparisons
    pub engine: EngineConfig,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            gammas: linspace(0.01, 0.20, 20),
            ps: linspace(0.01, 0.20, 20),
            trials: 100,
            sampling: BranchSampling::Expected,
            seed: None,
            engine: EngineConfig::default(),
        }
    }
}

impl SweepConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gammas(mut self, gammas: Vec<f64>) -> Self {
        self.gammas = gammas;
        self
    }

    pub fn with_ps(mut self, ps: Vec<f64>) -> Self {
        self.ps = ps;
        self
    }

    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    pub fn with_sampling(mut self, sampling: BranchSampling) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_axis("gammas", &self.gammas)?;
        check_axis("ps", &self.ps)?;
        if self.trials == 0 {
            return Err(DistillError::InvalidConfig("trials must be > 0".to_string()));
        }
        self.engine.validate()
    }
}

#[cfg(feature = "serialization")]
macro_rules! impl_from_json {
    ($($config:ty),*) => {
        $(
            impl $config {
                /// Parse and validate a JSON configuration; missing fields take defaults
                pub fn from_json(json: &str) -> Result<Self> {
                    let config: Self = serde_json::from_str(json).map_err(|e| {
                        DistillError::DeserializationError(format!(
                            "JSON deserialization failed: {}",
                            e
                        ))
                    })?;
                    config.validate()?;
                    Ok(config)
                }

                pub fn to_json(&self) -> Result<String> {
                    serde_json::to_string_pretty(self).map_err(|e| {
                        DistillError::SerializationError(format!(
                            "JSON serialization failed: {}",
                            e
                        ))
                    })
                }
            }
        )*
    };
}

#[cfg(feature = "serialization")]
impl_from_json!(LookupConfig, EngineConfig, SweepConfig);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lookup_config() {
        let config = LookupConfig::default();
        assert_eq!(config.gammas.len(), 20);
        assert_eq!(config.alphas.len(), 20);
        assert_eq!(config.depths, vec![1, 2, 3]);
        assert_eq!(config.trials, 500);
        assert_eq!(config.target_fidelity, 0.90);
        assert_eq!(config.num_candidates(), 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = LookupConfig::coarse()
            .with_depths(vec![1, 2])
            .with_target_fidelity(0.8)
            .with_seed(42);
        assert_eq!(config.gammas.len(), 5);
        assert_eq!(config.num_candidates(), 10);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn test_lookup_validate() {
        assert!(LookupConfig::new().with_depths(vec![]).validate().is_err());
        assert!(LookupConfig::new().with_depths(vec![0, 1]).validate().is_err());
        assert!(LookupConfig::new().with_gammas(vec![1.5]).validate().is_err());
        assert!(LookupConfig::new().with_alphas(vec![]).validate().is_err());
        assert!(LookupConfig::new().with_trials(0).validate().is_err());
        assert!(LookupConfig::new().with_target_fidelity(1.1).validate().is_err());
        assert!(LookupConfig::new().with_ps(vec![f64::NAN]).validate().is_err());
    }

    #[test]
    fn test_engine_validate() {
        let config = EngineConfig::default();
        assert_eq!(config.cycle_time, 0.01);
        assert!(config.validate().is_ok());
        assert!(EngineConfig::new().with_cycle_time(0.0).validate().is_err());

        let zero_budget = EngineConfig {
            probe_budget: ProbeBudget {
                amplitude_probes: 0,
                phase_probes: 5,
            },
            ..Default::default()
        };
        assert!(matches!(zero_budget.validate(), Err(DistillError::InvalidConfig(_))));
    }

    #[test]
    fn test_sweep_validate() {
        assert!(SweepConfig::default().validate().is_ok());
        assert!(SweepConfig::new().with_trials(0).validate().is_err());
        let bad_engine = SweepConfig::new().with_engine(EngineConfig::new().with_cycle_time(-1.0));
        assert!(bad_engine.validate().is_err());
    }

    #[cfg(feature = "serialization")]
    #[test]
    fn test_json_partial_config() {
        let json = r#"{"depths": [2], "trials": 10, "seed": 7}"#;
        let config = LookupConfig::from_json(json).unwrap();
        assert_eq!(config.depths, vec![2]);
        assert_eq!(config.trials, 10);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.gammas.len(), 20);

        assert!(LookupConfig::from_json(r#"{"trials": 0}"#).is_err());
        assert!(EngineConfig::from_json("not json").is_err());
    }

    #[cfg(feature = "serialization")]
    #[test]
    fn test_json_round_trip() {
        let config = SweepConfig::new().with_trials(3).with_seed(1);
        let back = SweepConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);

        let lookup = LookupConfig::default().with_seed(4);
        assert_eq!(LookupConfig::from_json(&lookup.to_json().unwrap()).unwrap(), lookup);
    }
}
