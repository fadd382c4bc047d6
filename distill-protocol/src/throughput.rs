//! Pair throughput accounting
//!
//! A run at depth d consumes 2^d raw pairs per cycle. Static runs deliver
//! `R = 2^d / t · Y`; adaptive runs also pay for their probes,
//! `R = 2^d / t · Y − cost / t`.

use distill_core::{DistillError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Throughput {
    cycle_time: f64,
}

impl Throughput {
    /// # Errors
    /// Returns error unless `cycle_time` is positive and finite
    pub fn new(cycle_time: f64) -> Result<Self> {
        if !(cycle_time.is_finite() && cycle_time > 0.0) {
            return Err(DistillError::invalid_parameter(
                "cycle_time",
                format!("must be positive, got {}", cycle_time),
            ));
        }
        Ok(Self { cycle_time })
    }

    pub fn cycle_time(&self) -> f64 {
        self.cycle_time
    }

    pub fn static_rate(&self, depth: u32, yield_rate: f64) -> f64 {
        2f64.powi(depth as i32) / self.cycle_time * yield_rate
    }

    pub fn adaptive_rate(&self, depth: u32, yield_rate: f64, probe_cost: usize) -> f64 {
        self.static_rate(depth, yield_rate) - probe_cost as f64 / self.cycle_time
    }
}
