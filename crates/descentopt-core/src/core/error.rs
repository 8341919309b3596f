//! Error types for descent methods and line searches.
//!
//! Only conditions with no sensible fallback value are errors. Reaching an
//! iteration ceiling is reported through a status on the result instead.

use thiserror::Error;

/// Errors that can occur while configuring or running an optimizer.
#[derive(Debug, Clone, Error)]
pub enum OptimizerError {
    /// Invalid optimizer configuration.
    ///
    /// This error occurs when the optimizer is configured with invalid
    /// parameters (e.g., negative step, zero tolerance) or when a supplied
    /// gradient cannot be applied to the start point.
    #[error("Invalid optimizer configuration: {reason}")]
    InvalidConfiguration {
        /// Description of the configuration error
        reason: String,
        /// Name of the invalid parameter
        parameter: String,
        /// Value that was invalid
        value: String,
    },

    /// Dimension mismatch between vectors.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions
        expected: String,
        /// Actual dimensions
        actual: String,
    },

    /// Interval handed to a one-dimensional search is unusable.
    ///
    /// Raised for reversed or non-finite bounds and for brackets that break
    /// the equal-spacing requirement of the quadratic interpolation.
    #[error("Invalid interval: {reason}")]
    InvalidInterval {
        /// Description of why the interval is invalid
        reason: String,
    },

    /// Numerical degeneracy detected.
    ///
    /// This error occurs when a computation would otherwise divide by a
    /// near-zero value or produce NaN/infinity, such as a flat parabola in
    /// quadratic interpolation.
    #[error("Numerical degeneracy: {reason}")]
    NumericalDegeneracy {
        /// Description of the numerical issue
        reason: String,
    },
}

impl OptimizerError {
    /// Create an InvalidConfiguration error.
    pub fn invalid_configuration<S1, S2, S3>(reason: S1, parameter: S2, value: S3) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self::InvalidConfiguration {
            reason: reason.into(),
            parameter: parameter.into(),
            value: value.into(),
        }
    }

    /// Create a DimensionMismatch error.
    pub fn dimension_mismatch<S1, S2>(expected: S1, actual: S2) -> Self
    where
        S1: std::fmt::Display,
        S2: std::fmt::Display,
    {
        Self::DimensionMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create an InvalidInterval error with a custom reason.
    pub fn invalid_interval<S: Into<String>>(reason: S) -> Self {
        Self::InvalidInterval {
            reason: reason.into(),
        }
    }

    /// Create a NumericalDegeneracy error with a custom reason.
    pub fn numerical_degeneracy<S: Into<String>>(reason: S) -> Self {
        Self::NumericalDegeneracy {
            reason: reason.into(),
        }
    }
}

/// Result type alias for optimizer operations.
pub type Result<T> = std::result::Result<T, OptimizerError>;
