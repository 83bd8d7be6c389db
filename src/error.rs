//! Error hierarchy for the hypersphere engine.
//!
//! Every failure is surfaced synchronously to the immediate caller. Nothing in
//! the crate logs an error and carries on.

use thiserror::Error;

use crate::hypersphere::Label;

/// Root error type for all classifier failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HyperionError {
    /// Two vectors that must share the feature dimension do not.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Dimension fixed by the first participant (sphere center or first point).
        expected: usize,
        /// Dimension of the offending vector.
        found: usize,
    },

    /// A class has no hyperspheres, so no boundary can be measured.
    #[error("no hyperspheres for the {0} class")]
    EmptyClass(Label),

    /// A scalar parameter is outside its admissible range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A training label is not +1 or -1.
    #[error("invalid training label {0}: expected +1 or -1")]
    InvalidLabel(i64),

    /// A class has fewer training points than hyperspheres to seed.
    #[error("insufficient data for the {label} class: need {required} points, found {found}")]
    InsufficientData {
        /// Class that is short of points.
        label: Label,
        /// Points needed (one per hypersphere).
        required: usize,
        /// Points available.
        found: usize,
    },

    /// NaN or infinity where a finite value is required.
    #[error("numerical error: {0}")]
    Numerical(String),

    /// Configuration failed validation.
    #[error("config error: {0}")]
    Config(String),
}

/// Convenience alias used throughout the crate.
pub type HyperionResult<T> = Result<T, HyperionError>;

/// Reject `found` unless it equals `expected`.
pub(crate) fn ensure_dim(expected: usize, found: usize) -> HyperionResult<()> {
    if expected == found {
        Ok(())
    } else {
        Err(HyperionError::DimensionMismatch { expected, found })
    }
}
