//! Error types for the distillation engine

use crate::QubitLabel;
use thiserror::Error;

/// Errors that can occur while building states, channels or protocol runs
///
/// Physical outcomes such as a filter annihilating a pair or a failed
/// purification round are not errors; they are reported as `None` by the
/// operations that produce them.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DistillError {
    /// A numeric parameter is outside its allowed range
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Configuration failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Kraus operator has an invalid shape
    #[error("Invalid Kraus operator: {0}")]
    InvalidKraus(String),

    /// Qubit label not present in a layout
    #[error("Qubit {0} is not part of the state layout")]
    UnknownQubit(QubitLabel),

    /// Qubit label used twice in one layout or operation
    #[error("Duplicate qubit {0} in layout")]
    DuplicateQubit(QubitLabel),

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A parameter grid axis has no points
    #[error("Grid axis '{0}' must contain at least one point")]
    EmptyGrid(String),

    /// Serialization of a table or configuration failed
    #[error("Serialization failed: {0}")]
    SerializationError(String),

    /// Deserialization of a table or configuration failed
    #[error("Deserialization failed: {0}")]
    DeserializationError(String),
}

impl DistillError {
    /// Create an invalid parameter error
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Check that `value` lies in the closed unit interval
    pub fn check_unit_interval(name: &str, value: f64) -> crate::Result<f64> {
        if (0.0..=1.0).contains(&value) {
            Ok(value)
        } else {
            Err(Self::invalid_parameter(
                name,
                format!("must be in [0,1], got {}", value),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_error() {
        let err = DistillError::invalid_parameter("gamma", "must be in [0,1], got 2");
        let msg = format!("{}", err);
        assert!(msg.contains("gamma"));
        assert!(msg.contains("[0,1]"));
    }

    #[test]
    fn test_check_unit_interval() {
        assert_eq!(DistillError::check_unit_interval("p", 0.0), Ok(0.0));
        assert_eq!(DistillError::check_unit_interval("p", 1.0), Ok(1.0));
        assert!(DistillError::check_unit_interval("p", -0.01).is_err());
        assert!(DistillError::check_unit_interval("p", 1.01).is_err());
        assert!(DistillError::check_unit_interval("p", f64::NAN).is_err());
    }

    #[test]
    fn test_unknown_qubit_error() {
        let err = DistillError::UnknownQubit(QubitLabel::alice(2));
        assert!(format!("{}", err).contains("A2"));
    }
}
