//! Parameter grids and dense per-cell storage
//!
//! Results are stored by integer grid position. Floating-point coordinates are
//! only used at the boundary, through [`Grid::nearest_index`].

use distill_core::{DistillError, Result};

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// One axis of a parameter grid
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialization", serde(try_from = "Vec<f64>", into = "Vec<f64>"))]
pub struct Grid {
    values: Vec<f64>,
}

impl Grid {
    /// Create an axis from explicit values
    ///
    /// # Errors
    /// Returns error if `values` is empty or contains a non-finite value
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(DistillError::EmptyGrid("values".to_string()));
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(DistillError::invalid_parameter(
                "grid",
                format!("non-finite grid value {}", bad),
            ));
        }
        Ok(Self { values })
    }

    /// `count` evenly spaced points from `start` to `end` inclusive
    ///
    /// # Example
    /// ```
    /// use distill_protocol::Grid;
    ///
    /// let g = Grid::linspace(0.01, 0.20, 20).unwrap();
    /// assert_eq!(g.len(), 20);
    /// assert!((g.values()[19] - 0.20).abs() < 1e-12);
    /// ```
    pub fn linspace(start: f64, end: f64, count: usize) -> Result<Self> {
        Self::new(linspace(start, end, count))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[inline]
    pub fn value(&self, index: usize) -> f64 {
        self.values[index]
    }

    /// Index of the grid point closest to `value`
    ///
    /// Ties resolve to the lower index. A NaN query maps to index 0.
    pub fn nearest_index(&self, value: f64) -> usize {
        let mut best = 0;
        let mut best_distance = f64::INFINITY;
        for (i, &v) in self.values.iter().enumerate() {
            let distance = (v - value).abs();
            if distance < best_distance {
                best = i;
                best_distance = distance;
            }
        }
        best
    }
}

/// `count` evenly spaced values from `start` to `end`; the last one is exactly `end`
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count)
                .map(|i| if i == count - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

impl TryFrom<Vec<f64>> for Grid {
    type Error = DistillError;

    fn try_from(values: Vec<f64>) -> Result<Self> {
        Self::new(values)
    }
}

impl From<Grid> for Vec<f64> {
    fn from(grid: Grid) -> Self {
        grid.values
    }
}

/// Dense row-major storage for one value per (γ-index, p-index) cell
#[derive(Debug, Clone, PartialEq)]
pub struct GridMap<T> {
    rows: usize,
    cols: usize,
    cells: Vec<T>,
}

impl<T> GridMap<T> {
    /// Build from cells in row-major order
    ///
    /// # Errors
    /// Returns error if `cells.len() != rows * cols`
    pub fn from_cells(rows: usize, cols: usize, cells: Vec<T>) -> Result<Self> {
        if cells.len() != rows * cols {
            return Err(DistillError::DimensionMismatch {
                expected: rows * cols,
                actual: cells.len(),
            });
        }
        Ok(Self { rows, cols, cells })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> &T {
        &self.cells[row * self.cols + col]
    }

    /// Cells in row-major order
    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    /// Iterate `((row, col), cell)` in row-major order
    pub fn iter_indexed(&self) -> impl Iterator<Item = ((usize, usize), &T)> + '_ {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .map(move |(k, cell)| ((k / cols, k % cols), cell))
    }

    /// Apply `f` to every cell, keeping positions
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> GridMap<U> {
        GridMap {
            rows: self.rows,
            cols: self.cols,
            cells: self.cells.iter().map(f).collect(),
        }
    }
}

impl<T: Clone> GridMap<T> {
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            rows,
            cols,
            cells: vec![value; rows * cols],
        }
    }
}
