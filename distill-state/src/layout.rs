//! Qubit layout: which tensor factor holds which logical qubit
//!
//! A composite state over n qubits is stored as a 2^n × 2^n matrix. The layout
//! records the label of every tensor factor, in order. Factor 0 is the most
//! significant bit of a basis index, so `A ⊗ B` puts A's labels first, exactly
//! as in the Kronecker product.
//!
//! Every operation that touches specific qubits (gates, Kraus channels,
//! projections, partial traces) resolves labels through the layout. Positional
//! indices never leave this module.

use distill_core::{DistillError, QubitLabel, Result};
use smallvec::SmallVec;
use std::fmt;

/// Ordered labels of the tensor factors of a state
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct QubitLayout {
    labels: SmallVec<[QubitLabel; 4]>,
}

impl QubitLayout {
    /// Create a layout from labels in tensor order
    ///
    /// # Errors
    /// Returns error if a label appears more than once
    pub fn new(labels: impl IntoIterator<Item = QubitLabel>) -> Result<Self> {
        let mut collected: SmallVec<[QubitLabel; 4]> = SmallVec::new();
        for label in labels {
            if collected.contains(&label) {
                return Err(DistillError::DuplicateQubit(label));
            }
            collected.push(label);
        }
        Ok(Self { labels: collected })
    }

    /// Layout of a single qubit
    pub fn single(label: QubitLabel) -> Self {
        let mut labels = SmallVec::new();
        labels.push(label);
        Self { labels }
    }

    /// Layout `[A_slot, B_slot]` of one Bell pair
    pub fn pair(slot: u8) -> Self {
        let mut labels = SmallVec::new();
        labels.push(QubitLabel::alice(slot));
        labels.push(QubitLabel::bob(slot));
        Self { labels }
    }

    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn labels(&self) -> &[QubitLabel] {
        &self.labels
    }

    pub fn contains(&self, label: QubitLabel) -> bool {
        self.labels.contains(&label)
    }

    /// Tensor-factor position of `label`
    ///
    /// # Errors
    /// Returns error if the label is not in the layout
    pub fn position(&self, label: QubitLabel) -> Result<usize> {
        self.labels
            .iter()
            .position(|&l| l == label)
            .ok_or(DistillError::UnknownQubit(label))
    }

    /// Bit mask of `label` inside a basis index
    pub fn stride(&self, label: QubitLabel) -> Result<usize> {
        let position = self.position(label)?;
        Ok(1usize << (self.num_qubits() - 1 - position))
    }

    /// Bit masks of several distinct labels, in the order given
    ///
    /// # Errors
    /// Returns error on unknown or repeated labels
    pub fn strides(&self, labels: &[QubitLabel]) -> Result<SmallVec<[usize; 4]>> {
        let mut strides = SmallVec::new();
        for (i, &label) in labels.iter().enumerate() {
            if labels[..i].contains(&label) {
                return Err(DistillError::DuplicateQubit(label));
            }
            strides.push(self.stride(label)?);
        }
        Ok(strides)
    }

    /// Layout of `self ⊗ other`
    ///
    /// # Errors
    /// Returns error if the two layouts share a label
    pub fn tensor(&self, other: &Self) -> Result<Self> {
        Self::new(self.labels.iter().chain(other.labels.iter()).copied())
    }

    /// Layout left after tracing out `traced`
    ///
    /// # Errors
    /// Returns error if any traced label is unknown
    pub fn without(&self, traced: &[QubitLabel]) -> Result<Self> {
        for &label in traced {
            self.position(label)?;
        }
        Ok(Self {
            labels: self
                .labels
                .iter()
                .copied()
                .filter(|l| !traced.contains(l))
                .collect(),
        })
    }

    /// Rename `from` to `to`, keeping its position
    ///
    /// # Errors
    /// Returns error if `from` is unknown or `to` already exists elsewhere
    pub fn relabel(&self, from: QubitLabel, to: QubitLabel) -> Result<Self> {
        let position = self.position(from)?;
        if from != to && self.contains(to) {
            return Err(DistillError::DuplicateQubit(to));
        }
        let mut labels = self.labels.clone();
        labels[position] = to;
        Ok(Self { labels })
    }
}

impl fmt::Debug for QubitLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, label) in self.labels.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", label)?;
        }
        write!(f, "]")
    }
}
