//! Kraus operators and the noise channel trait

use crate::{DistillError, Result};
use num_complex::Complex64;
use std::fmt;

/// A Kraus operator representing one branch of a quantum operation
///
/// Quantum channels are described by a set of Kraus operators {K_i}
/// that satisfy the completeness relation: Σ K_i† K_i = I
///
/// The channel transforms a density matrix ρ as:
/// ρ → Σ_i K_i ρ K_i†
#[derive(Clone, Debug, PartialEq)]
pub struct KrausOperator {
    /// The matrix elements in row-major order
    pub matrix: Vec<Complex64>,
    /// Dimension of the operator (2^n for n qubits)
    pub dimension: usize,
}

impl KrausOperator {
    /// Create a new Kraus operator from a matrix
    ///
    /// # Arguments
    /// * `matrix` - Flattened matrix in row-major order
    /// * `dimension` - Size of the square matrix (must be power of 2)
    ///
    /// # Errors
    /// Returns error if dimension is not a power of 2 or matrix size doesn't match
    pub fn new(matrix: Vec<Complex64>, dimension: usize) -> Result<Self> {
        if dimension == 0 || !dimension.is_power_of_two() {
            return Err(DistillError::InvalidKraus(format!(
                "dimension must be a power of 2, got {}",
                dimension
            )));
        }

        if matrix.len() != dimension * dimension {
            return Err(DistillError::InvalidKraus(format!(
                "matrix size {} doesn't match dimension {}×{}",
                matrix.len(),
                dimension,
                dimension
            )));
        }

        Ok(Self { matrix, dimension })
    }

    /// Build a single-qubit operator from real entries `[[a, b], [c, d]]`
    pub fn single_qubit_real(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self {
            matrix: vec![
                Complex64::new(a, 0.0),
                Complex64::new(b, 0.0),
                Complex64::new(c, 0.0),
                Complex64::new(d, 0.0),
            ],
            dimension: 2,
        }
    }

    /// Identity on `num_qubits` qubits
    pub fn identity(num_qubits: usize) -> Self {
        let dimension = 1usize << num_qubits;
        let mut matrix = vec![Complex64::new(0.0, 0.0); dimension * dimension];
        for i in 0..dimension {
            matrix[i * dimension + i] = Complex64::new(1.0, 0.0);
        }
        Self { matrix, dimension }
    }

    /// Get the number of qubits this operator acts on
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.dimension.trailing_zeros() as usize
    }

    /// Get a matrix element at (row, col)
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Complex64 {
        self.matrix[row * self.dimension + col]
    }

    /// Compute the adjoint (conjugate transpose) of this operator
    pub fn adjoint(&self) -> Self {
        let mut adj_matrix = vec![Complex64::new(0.0, 0.0); self.matrix.len()];

        for i in 0..self.dimension {
            for j in 0..self.dimension {
                adj_matrix[j * self.dimension + i] = self.matrix[i * self.dimension + j].conj();
            }
        }

        Self {
            matrix: adj_matrix,
            dimension: self.dimension,
        }
    }

    /// Tensor product `self ⊗ other`
    ///
    /// `self` acts on the leading (most significant) factor.
    pub fn kron(&self, other: &Self) -> Self {
        let da = self.dimension;
        let db = other.dimension;
        let dim = da * db;
        let mut matrix = vec![Complex64::new(0.0, 0.0); dim * dim];

        for ia in 0..da {
            for ja in 0..da {
                let a = self.get(ia, ja);
                if a == Complex64::new(0.0, 0.0) {
                    continue;
                }
                for ib in 0..db {
                    for jb in 0..db {
                        matrix[(ia * db + ib) * dim + (ja * db + jb)] = a * other.get(ib, jb);
                    }
                }
            }
        }

        Self {
            matrix,
            dimension: dim,
        }
    }

    /// Matrix product `self · other` (apply `other` first, then `self`)
    ///
    /// # Errors
    /// Returns error if the dimensions differ
    pub fn compose(&self, other: &Self) -> Result<Self> {
        if self.dimension != other.dimension {
            return Err(DistillError::DimensionMismatch {
                expected: self.dimension,
                actual: other.dimension,
            });
        }

        let dim = self.dimension;
        let mut matrix = vec![Complex64::new(0.0, 0.0); dim * dim];
        for i in 0..dim {
            for j in 0..dim {
                let mut sum = Complex64::new(0.0, 0.0);
                for k in 0..dim {
                    sum += self.get(i, k) * other.get(k, j);
                }
                matrix[i * dim + j] = sum;
            }
        }

        Ok(Self {
            matrix,
            dimension: dim,
        })
    }
}

/// Kraus set of two independent channels acting side by side: {A_i ⊗ B_j}
///
/// Ordering is A-major, matching the order the channels are listed.
pub fn tensor_kraus(first: &[KrausOperator], second: &[KrausOperator]) -> Vec<KrausOperator> {
    first
        .iter()
        .flat_map(|a| second.iter().map(move |b| a.kron(b)))
        .collect()
}

/// Kraus set of two channels applied in sequence on the same qubits: {B_j A_i}
///
/// # Errors
/// Returns error if the operator dimensions differ
pub fn compose_kraus(
    first: &[KrausOperator],
    then: &[KrausOperator],
) -> Result<Vec<KrausOperator>> {
    let mut composed = Vec::with_capacity(first.len() * then.len());
    for a in first {
        for b in then {
            composed.push(b.compose(a)?);
        }
    }
    Ok(composed)
}

/// Trait for quantum noise channels
///
/// A noise channel describes how errors affect quantum states.
/// Channels are represented using the Kraus operator formalism.
pub trait NoiseChannel: Send + Sync + fmt::Debug {
    /// Get the Kraus operators defining this channel
    ///
    /// The operators must satisfy the completeness relation:
    /// Σ_i K_i† K_i = I (within numerical precision)
    fn kraus_operators(&self) -> Vec<KrausOperator>;

    /// Number of qubits this channel acts on
    fn num_qubits(&self) -> usize;

    /// Name of this noise channel (e.g., "amplitude_damping")
    fn name(&self) -> &str;

    /// Verify the completeness relation Σ K_i† K_i = I
    ///
    /// Returns true if the channel is valid (within tolerance)
    fn verify_completeness(&self, tolerance: f64) -> bool {
        let operators = self.kraus_operators();
        if operators.is_empty() {
            return false;
        }

        let dim = operators[0].dimension;
        let mut sum = vec![Complex64::new(0.0, 0.0); dim * dim];

        for kraus in &operators {
            if kraus.dimension != dim {
                return false;
            }
            let adj = kraus.adjoint();
            for i in 0..dim {
                for j in 0..dim {
                    let mut element = Complex64::new(0.0, 0.0);
                    for k in 0..dim {
                        element += adj.get(i, k) * kraus.get(k, j);
                    }
                    sum[i * dim + j] += element;
                }
            }
        }

        for i in 0..dim {
            for j in 0..dim {
                let expected = if i == j {
                    Complex64::new(1.0, 0.0)
                } else {
                    Complex64::new(0.0, 0.0)
                };
                if (sum[i * dim + j] - expected).norm() > tolerance {
                    return false;
                }
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kraus_operator_creation() {
        let op = KrausOperator::new(KrausOperator::identity(1).matrix, 2).unwrap();
        assert_eq!(op.num_qubits(), 1);
        assert_eq!(op.dimension, 2);
    }

    #[test]
    fn test_kraus_operator_invalid_dimension() {
        let matrix = vec![Complex64::new(1.0, 0.0); 9];
        assert!(KrausOperator::new(matrix, 3).is_err());

        let matrix = vec![Complex64::new(1.0, 0.0); 3];
        assert!(KrausOperator::new(matrix, 2).is_err());
    }

    #[test]
    fn test_kraus_operator_adjoint() {
        let matrix = vec![
            Complex64::new(1.0, 1.0),
            Complex64::new(2.0, 0.0),
            Complex64::new(0.0, 3.0),
            Complex64::new(4.0, -1.0),
        ];
        let op = KrausOperator::new(matrix, 2).unwrap();
        let adj = op.adjoint();

        assert_eq!(adj.get(0, 0), Complex64::new(1.0, -1.0));
        assert_eq!(adj.get(0, 1), Complex64::new(0.0, -3.0));
        assert_eq!(adj.get(1, 0), Complex64::new(2.0, 0.0));
        assert_eq!(adj.get(1, 1), Complex64::new(4.0, 1.0));
    }

    #[test]
    fn test_kron_ordering() {
        // X ⊗ I maps |00⟩ → |10⟩, i.e. index 0 → index 2
        let x = KrausOperator::single_qubit_real(0.0, 1.0, 1.0, 0.0);
        let xi = x.kron(&KrausOperator::identity(1));
        assert_eq!(xi.dimension, 4);
        assert_eq!(xi.get(2, 0), Complex64::new(1.0, 0.0));
        assert_eq!(xi.get(1, 0), Complex64::new(0.0, 0.0));

        let ix = KrausOperator::identity(1).kron(&x);
        assert_eq!(ix.get(1, 0), Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_compose_order() {
        // |1⟩⟨0| then Z: Z·|1⟩⟨0| = -|1⟩⟨0|
        let raise = KrausOperator::single_qubit_real(0.0, 0.0, 1.0, 0.0);
        let z = KrausOperator::single_qubit_real(1.0, 0.0, 0.0, -1.0);
        let product = z.compose(&raise).unwrap();
        assert_eq!(product.get(1, 0), Complex64::new(-1.0, 0.0));

        let wide = KrausOperator::identity(2);
        assert!(z.compose(&wide).is_err());
    }

    #[test]
    fn test_tensor_kraus_count() {
        let a = vec![KrausOperator::identity(1), KrausOperator::identity(1)];
        let b = vec![KrausOperator::identity(1); 3];
        let ops = tensor_kraus(&a, &b);
        assert_eq!(ops.len(), 6);
        assert!(ops.iter().all(|op| op.dimension == 4));
    }
}
