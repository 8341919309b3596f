//! DescentOpt - steepest descent with derivative-free line searches.
//!
//! This crate bundles [`descentopt_core`] and [`descentopt_optim`] behind a
//! single dependency.
//!
//! # Quick start
//!
//! ```rust
//! use descentopt::prelude::*;
//!
//! // f(x1, x2) = 3x1² + x1x2 + 2x2²
//! let cost = QuadraticCost::<f64>::textbook();
//!
//! let config = DescentConfig::new()
//!     .with_one_dim_method(OneDimMethod::GoldenSection)
//!     .with_criterion(ConvergenceCriterion::GradientNorm);
//!
//! let result = minimize(&cost, DVector::from_vec(vec![6.0, 4.0]), config).unwrap();
//! assert!(result.converged);
//! assert!(result.point.norm() < 1e-3);
//! ```
//!
//! # Crates
//!
//! - [`core`]: scalar trait, objective interface, errors and iteration history
//! - [`optim`]: Sven bracketing, golden section, DSK-Powell and the descent engine

pub use descentopt_core as core;
pub use descentopt_optim as optim;

pub use nalgebra;

pub use descentopt_core::{OptimizerError, Result};

/// Everything needed to set up and run a descent.
pub mod prelude {
    pub use descentopt_core::prelude::*;
    pub use descentopt_optim::{
        minimize, ConvergenceCriterion, DescentConfig, DescentResult, DescentState,
        GradientDescent, Interval, IntervalReduction, LineSearch, Modification, OneDimMethod,
        StepPolicy, SvenBracketing,
    };
}
