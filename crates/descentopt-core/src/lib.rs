//! Core traits and types for gradient descent and line search.
//!
//! This crate provides the building blocks shared by the algorithms in
//! `descentopt-optim`: the scalar abstraction, the error taxonomy, the
//! objective interface and the iteration history.
//!
//! # Modules
//!
//! - [`cost_function`]: Objective interface, closure adapter and counting wrapper
//! - [`error`]: Error types for optimizers and line searches
//! - [`history`]: Per-iteration records of a descent run
//! - [`numerical`]: Finite-difference derivatives
//! - [`types`]: Scalar trait and vector aliases

pub mod core;
pub mod numerical;
pub mod optimization;
pub mod utils;

pub use self::core::{cost_function, error, types};
pub use self::optimization::history;

#[cfg(any(test, feature = "test-utils"))]
pub use self::utils::test_functions;

// Re-export commonly used items at the crate root
pub use error::{OptimizerError, Result};

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use descentopt_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::cost_function::{CostFunction, CountingCostFunction, FnCost, QuadraticCost};
    pub use crate::error::{OptimizerError, Result};
    pub use crate::history::{IterationHistory, IterationRecord};
    pub use crate::numerical::{central_derivative, forward_gradient};
    pub use crate::types::{DMatrix, DVector, Direction, Point, Scalar};
}
