//! Density matrices over labelled qubits
//!
//! A density matrix ρ is a positive semi-definite, Hermitian matrix with Tr(ρ) = 1.
//! Intermediate results of post-selection (projections, filtered states) are
//! stored in the same type with Tr(ρ) ≤ 1 until they are renormalized.
//!
//! # Qubit addressing
//!
//! Each matrix carries a [`QubitLayout`]. Gates, Kraus channels, projections
//! and partial traces take [`QubitLabel`]s and resolve them through the layout,
//! so tensor/partial-trace bookkeeping stays correct across compositions.
//!
//! # Example
//!
//! ```
//! use distill_core::QubitLabel;
//! use distill_state::DensityMatrix;
//!
//! let bell = DensityMatrix::bell_phi_plus(1);
//! let reduced = bell.partial_trace(&[QubitLabel::bob(1)]).unwrap();
//! assert!((reduced.purity() - 0.5).abs() < 1e-12);
//! ```

use crate::layout::QubitLayout;
use distill_core::noise::{KrausOperator, NoiseChannel};
use distill_core::{DistillError, QubitLabel, Result};
use num_complex::Complex64;
use smallvec::SmallVec;
use std::fmt;

const ZERO: Complex64 = Complex64::new(0.0, 0.0);

/// Density matrix representation of a (possibly unnormalized) mixed state
///
/// Stores the full 2^n × 2^n matrix in row-major order.
#[derive(Clone, PartialEq)]
pub struct DensityMatrix {
    /// Labels of the tensor factors
    layout: QubitLayout,

    /// Dimension (2^num_qubits)
    dimension: usize,

    /// Matrix elements in row-major order, length dimension²
    matrix: Vec<Complex64>,
}

impl DensityMatrix {
    /// Create a density matrix initialized to |0...0⟩⟨0...0|
    pub fn new(layout: QubitLayout) -> Self {
        let dimension = 1usize << layout.num_qubits();
        let mut matrix = vec![ZERO; dimension * dimension];
        matrix[0] = Complex64::new(1.0, 0.0);

        Self {
            layout,
            dimension,
            matrix,
        }
    }

    /// Create density matrix from a pure state vector: ρ = |ψ⟩⟨ψ|
    ///
    /// # Arguments
    /// * `layout` - Labels of the qubits, in tensor order
    /// * `amplitudes` - State vector amplitudes (length 2^n)
    pub fn from_state_vector(layout: QubitLayout, amplitudes: &[Complex64]) -> Result<Self> {
        let dimension = 1usize << layout.num_qubits();

        if amplitudes.len() != dimension {
            return Err(DistillError::DimensionMismatch {
                expected: dimension,
                actual: amplitudes.len(),
            });
        }

        let mut matrix = vec![ZERO; dimension * dimension];
        for i in 0..dimension {
            for j in 0..dimension {
                matrix[i * dimension + j] = amplitudes[i] * amplitudes[j].conj();
            }
        }

        Ok(Self {
            layout,
            dimension,
            matrix,
        })
    }

    /// Create density matrix from a raw row-major matrix
    pub fn from_matrix(layout: QubitLayout, matrix: Vec<Complex64>) -> Result<Self> {
        let dimension = 1usize << layout.num_qubits();
        if matrix.len() != dimension * dimension {
            return Err(DistillError::DimensionMismatch {
                expected: dimension * dimension,
                actual: matrix.len(),
            });
        }

        Ok(Self {
            layout,
            dimension,
            matrix,
        })
    }

    /// Create maximally mixed state: ρ = I/2^n
    pub fn maximally_mixed(layout: QubitLayout) -> Self {
        let dimension = 1usize << layout.num_qubits();
        let mut matrix = vec![ZERO; dimension * dimension];

        let value = Complex64::new(1.0 / dimension as f64, 0.0);
        for i in 0..dimension {
            matrix[i * dimension + i] = value;
        }

        Self {
            layout,
            dimension,
            matrix,
        }
    }

    /// The |Φ⁺⟩ = (|00⟩ + |11⟩)/√2 Bell state on pair `slot`
    pub fn bell_phi_plus(slot: u8) -> Self {
        let half = Complex64::new(0.5, 0.0);
        let mut matrix = vec![ZERO; 16];
        for &i in &[0usize, 3] {
            for &j in &[0usize, 3] {
                matrix[i * 4 + j] = half;
            }
        }

        Self {
            layout: QubitLayout::pair(slot),
            dimension: 4,
            matrix,
        }
    }

    /// Get the qubit layout
    #[inline]
    pub fn layout(&self) -> &QubitLayout {
        &self.layout
    }

    /// Get number of qubits
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.layout.num_qubits()
    }

    /// Get matrix dimension (2^num_qubits)
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Get a matrix element ρᵢⱼ
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Complex64 {
        self.matrix[row * self.dimension + col]
    }

    /// Get reference to the full matrix data
    pub fn matrix(&self) -> &[Complex64] {
        &self.matrix
    }

    /// Calculate trace: Tr(ρ)
    pub fn trace(&self) -> f64 {
        (0..self.dimension).map(|i| self.get(i, i).re).sum()
    }

    /// Calculate the purity: Tr(ρ²)
    pub fn purity(&self) -> f64 {
        let dim = self.dimension;
        let mut trace = ZERO;
        for i in 0..dim {
            for j in 0..dim {
                trace += self.get(i, j) * self.get(j, i);
            }
        }
        trace.re
    }

    /// Multiply every element by `factor`
    pub fn scale(&mut self, factor: f64) {
        for elem in self.matrix.iter_mut() {
            *elem *= factor;
        }
    }

    /// Divide by the trace, returning the trace that was removed
    ///
    /// Returns `None` (leaving the matrix untouched) when the trace is not
    /// positive, i.e. when there is no state left to normalize.
    pub fn normalize(&mut self) -> Option<f64> {
        let trace = self.trace();
        if !(trace.is_finite() && trace > 0.0) {
            return None;
        }
        self.scale(1.0 / trace);
        Some(trace)
    }

    /// Element-wise sum of two matrices on the same layout
    ///
    /// # Errors
    /// Returns error if the layouts differ
    pub fn sum(&self, other: &Self) -> Result<Self> {
        if self.layout != other.layout {
            return Err(DistillError::DimensionMismatch {
                expected: self.dimension,
                actual: other.dimension,
            });
        }

        let matrix = self
            .matrix
            .iter()
            .zip(other.matrix.iter())
            .map(|(a, b)| a + b)
            .collect();

        Ok(Self {
            layout: self.layout.clone(),
            dimension: self.dimension,
            matrix,
        })
    }

    /// Tensor product ρ_self ⊗ ρ_other
    ///
    /// The result's layout is `self.layout` followed by `other.layout`.
    ///
    /// # Errors
    /// Returns error if the two states share a qubit label
    pub fn tensor(&self, other: &Self) -> Result<Self> {
        let layout = self.layout.tensor(&other.layout)?;
        let da = self.dimension;
        let db = other.dimension;
        let dim = da * db;
        let mut matrix = vec![ZERO; dim * dim];

        for ia in 0..da {
            for ja in 0..da {
                let a = self.get(ia, ja);
                if a == ZERO {
                    continue;
                }
                for ib in 0..db {
                    let row = (ia * db + ib) * dim;
                    for jb in 0..db {
                        matrix[row + ja * db + jb] = a * other.get(ib, jb);
                    }
                }
            }
        }

        Ok(Self {
            layout,
            dimension: dim,
            matrix,
        })
    }

    /// Rename a qubit without moving it
    pub fn relabel(&mut self, from: QubitLabel, to: QubitLabel) -> Result<()> {
        self.layout = self.layout.relabel(from, to)?;
        Ok(())
    }

    /// Compute K ρ K† for an operator acting on `qubits`
    ///
    /// `qubits[0]` is the most significant bit of the operator's index. The
    /// result is not renormalized.
    ///
    /// # Errors
    /// Returns error if a label is unknown or repeated, or if the operator
    /// dimension does not match the number of qubits.
    pub fn conjugate(&self, op: &KrausOperator, qubits: &[QubitLabel]) -> Result<Self> {
        let strides = self.layout.strides(qubits)?;
        let op_dim = 1usize << strides.len();
        if op.dimension != op_dim {
            return Err(DistillError::DimensionMismatch {
                expected: op_dim,
                actual: op.dimension,
            });
        }

        let dim = self.dimension;
        let mask = strides.iter().fold(0usize, |acc, &s| acc | s);

        // temp = K ρ
        let mut temp = vec![ZERO; dim * dim];
        for i in 0..dim {
            let si = sub_index(i, &strides);
            let base = i & !mask;
            for s in 0..op_dim {
                let k = op.get(si, s);
                if k == ZERO {
                    continue;
                }
                let source = with_sub_index(base, s, &strides) * dim;
                let target = i * dim;
                for j in 0..dim {
                    temp[target + j] += k * self.matrix[source + j];
                }
            }
        }

        // result = temp K†
        let mut result = vec![ZERO; dim * dim];
        for j in 0..dim {
            let sj = sub_index(j, &strides);
            let base = j & !mask;
            for s in 0..op_dim {
                let k_dag = op.get(sj, s).conj();
                if k_dag == ZERO {
                    continue;
                }
                let source = with_sub_index(base, s, &strides);
                for i in 0..dim {
                    result[i * dim + j] += temp[i * dim + source] * k_dag;
                }
            }
        }

        Ok(Self {
            layout: self.layout.clone(),
            dimension: dim,
            matrix: result,
        })
    }

    /// Apply a unitary gate: ρ → U ρ U†
    pub fn apply_unitary(&mut self, unitary: &KrausOperator, qubits: &[QubitLabel]) -> Result<()> {
        *self = self.conjugate(unitary, qubits)?;
        Ok(())
    }

    /// Apply a Kraus operator channel: ρ → Σᵢ Kᵢ ρ Kᵢ†
    ///
    /// # Arguments
    /// * `kraus_ops` - Kraus operators, each of dimension 2^qubits.len()
    /// * `qubits` - Target qubit labels
    pub fn apply_kraus_channel(
        &mut self,
        kraus_ops: &[KrausOperator],
        qubits: &[QubitLabel],
    ) -> Result<()> {
        let dim = self.dimension;
        let mut result = vec![ZERO; dim * dim];

        for kraus in kraus_ops {
            let branch = self.conjugate(kraus, qubits)?;
            for (acc, value) in result.iter_mut().zip(branch.matrix.iter()) {
                *acc += *value;
            }
        }

        self.matrix = result;
        Ok(())
    }

    /// Apply a [`NoiseChannel`] to the given qubits
    pub fn apply_channel(
        &mut self,
        channel: &dyn NoiseChannel,
        qubits: &[QubitLabel],
    ) -> Result<()> {
        if channel.num_qubits() != qubits.len() {
            return Err(DistillError::DimensionMismatch {
                expected: channel.num_qubits(),
                actual: qubits.len(),
            });
        }
        self.apply_kraus_channel(&channel.kraus_operators(), qubits)
    }

    /// Project `qubits` onto the computational basis outcome `bits`: P ρ P
    ///
    /// `bits[k]` is the outcome for `qubits[k]`. The result is unnormalized;
    /// its trace is the probability of the outcome.
    pub fn project(&self, qubits: &[QubitLabel], bits: &[bool]) -> Result<Self> {
        if qubits.len() != bits.len() {
            return Err(DistillError::DimensionMismatch {
                expected: qubits.len(),
                actual: bits.len(),
            });
        }

        let strides = self.layout.strides(qubits)?;
        let mask = strides.iter().fold(0usize, |acc, &s| acc | s);
        let wanted = strides
            .iter()
            .zip(bits.iter())
            .fold(0usize, |acc, (&s, &bit)| if bit { acc | s } else { acc });

        let dim = self.dimension;
        let mut matrix = vec![ZERO; dim * dim];
        for i in (0..dim).filter(|i| i & mask == wanted) {
            for j in (0..dim).filter(|j| j & mask == wanted) {
                matrix[i * dim + j] = self.get(i, j);
            }
        }

        Ok(Self {
            layout: self.layout.clone(),
            dimension: dim,
            matrix,
        })
    }

    /// Compute partial trace over the given qubits
    ///
    /// The remaining qubits keep their relative order and labels.
    ///
    /// # Errors
    /// Returns error if a label is unknown or repeated
    pub fn partial_trace(&self, traced: &[QubitLabel]) -> Result<Self> {
        let traced_strides = self.layout.strides(traced)?;
        let traced_mask = traced_strides.iter().fold(0usize, |acc, &s| acc | s);
        let layout = self.layout.without(traced)?;

        let kept_strides: SmallVec<[usize; 4]> = self.layout.strides(layout.labels())?;
        let reduced_dim = 1usize << layout.num_qubits();
        let mut reduced = vec![ZERO; reduced_dim * reduced_dim];

        for i in 0..self.dimension {
            let ri = sub_index(i, &kept_strides);
            for j in 0..self.dimension {
                if (i & traced_mask) != (j & traced_mask) {
                    continue;
                }
                let rj = sub_index(j, &kept_strides);
                reduced[ri * reduced_dim + rj] += self.get(i, j);
            }
        }

        Ok(Self {
            layout,
            dimension: reduced_dim,
            matrix: reduced,
        })
    }

    /// Overlap ⟨ψ|ρ|ψ⟩ with a pure reference state
    pub fn overlap(&self, amplitudes: &[Complex64]) -> Result<f64> {
        if amplitudes.len() != self.dimension {
            return Err(DistillError::DimensionMismatch {
                expected: self.dimension,
                actual: amplitudes.len(),
            });
        }

        let mut value = ZERO;
        for i in 0..self.dimension {
            if amplitudes[i] == ZERO {
                continue;
            }
            for j in 0..self.dimension {
                value += amplitudes[i].conj() * self.get(i, j) * amplitudes[j];
            }
        }
        Ok(value.re)
    }

    /// Check trace, Hermiticity and a non-negative diagonal
    pub fn is_valid(&self, tolerance: f64) -> bool {
        if (self.trace() - 1.0).abs() > tolerance {
            return false;
        }

        for i in 0..self.dimension {
            for j in (i + 1)..self.dimension {
                if (self.get(i, j) - self.get(j, i).conj()).norm() > tolerance {
                    return false;
                }
            }
        }

        (0..self.dimension).all(|i| self.get(i, i).re >= -tolerance)
    }

    /// Check positive semi-definiteness up to `tolerance`
    ///
    /// Runs a Cholesky factorisation of ρ + tolerance·I; it succeeds exactly
    /// when every eigenvalue of ρ is above -tolerance.
    pub fn is_positive_semidefinite(&self, tolerance: f64) -> bool {
        let dim = self.dimension;
        let mut lower = vec![ZERO; dim * dim];

        for j in 0..dim {
            let mut diag = self.get(j, j).re + tolerance;
            for k in 0..j {
                diag -= lower[j * dim + k].norm_sqr();
            }
            if !(diag > 0.0) {
                return false;
            }
            let ljj = diag.sqrt();
            lower[j * dim + j] = Complex64::new(ljj, 0.0);

            for i in (j + 1)..dim {
                let mut sum = self.get(i, j);
                for k in 0..j {
                    sum -= lower[i * dim + k] * lower[j * dim + k].conj();
                }
                lower[i * dim + j] = sum / ljj;
            }
        }

        true
    }
}

/// Gather the bits selected by `strides` into a compact index, first stride most significant
#[inline]
fn sub_index(index: usize, strides: &[usize]) -> usize {
    strides
        .iter()
        .fold(0usize, |acc, &s| (acc << 1) | usize::from(index & s != 0))
}

/// Scatter the compact index `sub` back into the positions given by `strides`
#[inline]
fn with_sub_index(base: usize, sub: usize, strides: &[usize]) -> usize {
    let k = strides.len();
    strides.iter().enumerate().fold(base, |acc, (t, &s)| {
        if (sub >> (k - 1 - t)) & 1 == 1 {
            acc | s
        } else {
            acc
        }
    })
}

impl fmt::Debug for DensityMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DensityMatrix {{ qubits: {:?}, dim: {}, trace: {:.4}, purity: {:.4} }}",
            self.layout,
            self.dimension,
            self.trace(),
            self.purity()
        )
    }
}
