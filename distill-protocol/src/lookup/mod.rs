//! Precomputed (depth, α) lookup table
//!
//! For every (γ, p) grid cell the builder scores each (depth, α) candidate by
//! the mean of repeated single-branch cascades and keeps one per cell with
//! [`CellSelector`]. At evaluation time arbitrary (γ, p) queries, including
//! estimates, resolve to the nearest grid cell without interpolation.
//!
//! The flat artifact form is a row-major `|γ| × |p| × 2` array of
//! `(depth, α)`; see [`LookupTable::to_flat`].

mod builder;
mod selector;
#[cfg(feature = "serialization")]
mod serialization;

pub use builder::{build_lookup_table, LookupTableBuilder};
pub use selector::{Candidate, CellSelector};
#[cfg(feature = "serialization")]
pub use serialization::{SerializedLookupTable, LOOKUP_FORMAT_VERSION};

use crate::cascade::{CascadeOutcome, CascadeParams};
use crate::grid::{Grid, GridMap};
use distill_core::{DistillError, Result};

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Chosen parameters for one grid cell
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct LookupCell {
    pub depth: u32,
    pub alpha: f64,
    /// Mean fidelity and yield of the chosen candidate. `None` for tables
    /// loaded from the flat artifact, which only stores (depth, α).
    pub achieved: Option<CascadeOutcome>,
}

impl LookupCell {
    /// Cascade parameters for this cell
    pub fn params(&self) -> Result<CascadeParams> {
        CascadeParams::filtered(self.depth, self.alpha)
    }
}

/// Immutable (γ, p) → (depth, α) table
#[derive(Debug, Clone, PartialEq)]
pub struct LookupTable {
    gammas: Grid,
    ps: Grid,
    cells: GridMap<LookupCell>,
}

impl LookupTable {
    /// # Errors
    /// Returns error if the cell grid does not match the axes
    pub fn new(gammas: Grid, ps: Grid, cells: GridMap<LookupCell>) -> Result<Self> {
        if cells.rows() != gammas.len() || cells.cols() != ps.len() {
            return Err(DistillError::DimensionMismatch {
                expected: gammas.len() * ps.len(),
                actual: cells.rows() * cells.cols(),
            });
        }
        Ok(Self { gammas, ps, cells })
    }

    pub fn gammas(&self) -> &Grid {
        &self.gammas
    }

    pub fn ps(&self) -> &Grid {
        &self.ps
    }

    pub fn cells(&self) -> &GridMap<LookupCell> {
        &self.cells
    }

    #[inline]
    pub fn cell(&self, row: usize, col: usize) -> &LookupCell {
        self.cells.get(row, col)
    }

    /// Grid position nearest to (γ, p)
    pub fn index_of(&self, gamma: f64, p: f64) -> (usize, usize) {
        (self.gammas.nearest_index(gamma), self.ps.nearest_index(p))
    }

    /// Cell nearest to (γ, p)
    pub fn lookup(&self, gamma: f64, p: f64) -> &LookupCell {
        let (row, col) = self.index_of(gamma, p);
        self.cell(row, col)
    }

    /// Flat `(depth, α)` array, row-major over (γ, p)
    pub fn to_flat(&self) -> Vec<f64> {
        self.cells
            .cells()
            .iter()
            .flat_map(|cell| [f64::from(cell.depth), cell.alpha])
            .collect()
    }

    /// Rebuild a table from its flat `(depth, α)` form
    ///
    /// # Errors
    /// Returns error if the length is not `2 * |γ| * |p|`, a depth is not a
    /// non-negative integer, or an α lies outside [0, 1]
    pub fn from_flat(gammas: Grid, ps: Grid, flat: &[f64]) -> Result<Self> {
        let expected = 2 * gammas.len() * ps.len();
        if flat.len() != expected {
            return Err(DistillError::DimensionMismatch {
                expected,
                actual: flat.len(),
            });
        }

        let cells = flat
            .chunks_exact(2)
            .map(|entry| {
                let (depth, alpha) = (entry[0], entry[1]);
                let whole = depth.is_finite() && depth.fract() == 0.0;
                if !(whole && depth >= 0.0 && depth <= f64::from(u32::MAX)) {
                    return Err(DistillError::invalid_parameter(
                        "depth",
                        format!("{} is not a valid depth", depth),
                    ));
                }
                Ok(LookupCell {
                    depth: depth as u32,
                    alpha: DistillError::check_unit_interval("alpha", alpha)?,
                    achieved: None,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let cells = GridMap::from_cells(gammas.len(), ps.len(), cells)?;
        Self::new(gammas, ps, cells)
    }
}
