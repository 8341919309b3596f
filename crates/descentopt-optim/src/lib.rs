//! DescentOpt Optimization - gradient descent and one-dimensional searches.
//!
//! This crate provides the steepest-descent engine together with the line
//! searches it relies on.
//!
//! # Components
//!
//! - **Sven bracketing**: exponential expansion until the function turns uphill
//! - **Golden section**: interval reduction with one evaluation per iteration
//! - **DSK-Powell**: interval reduction by successive parabolic fits
//! - **Gradient descent**: constant or optimal step, with damped, momentum
//!   and adaptive-ratio variants
//!
//! # Examples
//!
//! ```rust
//! use descentopt_core::prelude::*;
//! use descentopt_optim::{minimize, ConvergenceCriterion, DescentConfig, OneDimMethod};
//!
//! let cost = QuadraticCost::<f64>::textbook();
//!
//! let config = DescentConfig::new()
//!     .with_one_dim_method(OneDimMethod::QuadraticInterpolation)
//!     .with_criterion(ConvergenceCriterion::GradientNorm)
//!     .with_criterion_eps(1e-4);
//!
//! let result = minimize(&cost, DVector::from_vec(vec![6.0, 4.0]), config).unwrap();
//! assert!(result.converged);
//! ```

pub mod bracket;
pub mod config;
pub mod convergence;
pub mod golden_section;
pub mod gradient_descent;
pub mod line_search;
pub mod quadratic_interpolation;
pub mod step_policy;

pub use bracket::{Bracket, Interval, SvenBracketing};
pub use config::{DescentConfig, Modification, OneDimMethod};
pub use convergence::ConvergenceCriterion;
pub use golden_section::GoldenSection;
pub use gradient_descent::{minimize, DescentResult, DescentState, GradientDescent};
pub use line_search::{
    restrict, IntervalReducer, IntervalReduction, LineSearch, LineSearchResult, OneDimResult,
    SearchStatus,
};
pub use quadratic_interpolation::{dsk_vertex, powell_vertex, QuadraticInterpolation};
pub use step_policy::{
    AdaptiveRatio, ConstantStep, Damped, Momentum, OptimalStep, StepPlan, StepPolicy, StepState,
    StepStrategy,
};
