//! One-dimensional searches and their composition into a line search.
//!
//! Given a point `x` and a descent direction `d`, the line search minimizes
//! the restriction
//!
//! ```text
//! φ(α) = f(x + α·d)
//! ```
//!
//! in two phases: [`SvenBracketing`] finds an interval around a minimizer
//! starting from `α = 0`, then an [`IntervalReduction`] method narrows that
//! interval to the requested tolerance.

use crate::{
    bracket::{Bracket, Interval, SvenBracketing},
    config::OneDimMethod,
    golden_section::GoldenSection,
    quadratic_interpolation::QuadraticInterpolation,
};
use descentopt_core::{
    cost_function::CostFunction,
    error::{OptimizerError, Result},
    types::{DVector, Scalar},
};
use num_traits::Float;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::debug;

/// How a one-dimensional search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SearchStatus {
    /// Tolerance reached
    Converged,
    /// Iteration ceiling reached; the result is the best estimate so far
    MaxIterations,
    /// Least sampled value at the edge of the sampled points
    BoundaryOptimum,
    /// A refit was degenerate; the result is the best point sampled so far
    Degenerate,
}

/// Result of an interval reduction.
#[derive(Debug, Clone, PartialEq)]
pub struct OneDimResult<T> {
    /// Estimated minimizer
    pub point: T,
    /// Function value at `point`
    pub value: T,
    /// Final interval
    pub interval: Interval<T>,
    /// Number of iterations
    pub iterations: usize,
    /// Number of function evaluations
    pub evaluations: usize,
    /// How the search ended
    pub status: SearchStatus,
}

/// Derivative-free methods narrowing a bracket down to a point.
pub trait IntervalReduction<T>: Debug
where
    T: Scalar,
{
    /// Returns the name of the method.
    fn name(&self) -> &'static str;

    /// Stopping tolerance.
    fn tolerance(&self) -> T;

    /// Narrows `interval` around a minimizer of `f`.
    fn reduce<F>(&self, f: F, interval: Interval<T>) -> Result<OneDimResult<T>>
    where
        F: Fn(T) -> T;

    /// Checks the tolerance and the interval before a search.
    fn validate_inputs(&self, interval: &Interval<T>) -> Result<()> {
        let eps = self.tolerance();
        if !<T as Float>::is_finite(eps) || eps <= T::zero() {
            return Err(OptimizerError::invalid_configuration(
                "tolerance must be positive and finite",
                "one_dim_eps",
                eps.to_string(),
            ));
        }
        interval.validate()
    }
}

/// Either interval-reduction method, selected at run time.
#[derive(Debug, Clone)]
pub enum IntervalReducer<T> {
    /// Golden-section search
    GoldenSection(GoldenSection<T>),
    /// DSK-Powell quadratic interpolation
    QuadraticInterpolation(QuadraticInterpolation<T>),
}

impl<T> IntervalReducer<T>
where
    T: Scalar,
{
    /// Builds the reducer for `method` with tolerance `eps`.
    pub fn from_method(method: OneDimMethod, eps: T) -> Self {
        match method {
            OneDimMethod::GoldenSection => Self::GoldenSection(GoldenSection::new(eps)),
            OneDimMethod::QuadraticInterpolation => {
                Self::QuadraticInterpolation(QuadraticInterpolation::new(eps))
            }
        }
    }

    /// The method this reducer runs.
    pub fn method(&self) -> OneDimMethod {
        match self {
            Self::GoldenSection(_) => OneDimMethod::GoldenSection,
            Self::QuadraticInterpolation(_) => OneDimMethod::QuadraticInterpolation,
        }
    }
}

impl<T> IntervalReduction<T> for IntervalReducer<T>
where
    T: Scalar,
{
    fn name(&self) -> &'static str {
        match self {
            Self::GoldenSection(m) => m.name(),
            Self::QuadraticInterpolation(m) => m.name(),
        }
    }

    fn tolerance(&self) -> T {
        match self {
            Self::GoldenSection(m) => m.tolerance(),
            Self::QuadraticInterpolation(m) => m.tolerance(),
        }
    }

    fn reduce<F>(&self, f: F, interval: Interval<T>) -> Result<OneDimResult<T>>
    where
        F: Fn(T) -> T,
    {
        match self {
            Self::GoldenSection(m) => m.reduce(f, interval),
            Self::QuadraticInterpolation(m) => m.reduce(f, interval),
        }
    }
}

/// Restriction of `cost` to the line through `point` along `direction`.
pub fn restrict<'a, T, C>(
    cost: &'a C,
    point: &'a DVector<T>,
    direction: &'a DVector<T>,
) -> impl Fn(T) -> T + 'a
where
    T: Scalar,
    C: CostFunction<T> + ?Sized,
{
    move |alpha| cost.cost(&(point + direction * alpha))
}

/// Result of a line search.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSearchResult<T> {
    /// Chosen step length `α`
    pub step: T,
    /// `φ(α)`
    pub value: T,
    /// Probe step handed to the bracketing phase
    pub probe: T,
    /// Bracketing outcome
    pub bracket: Bracket<T>,
    /// Reduction outcome
    pub reduction: OneDimResult<T>,
}

/// Bracketing followed by interval reduction along a direction.
#[derive(Debug, Clone)]
pub struct LineSearch<T> {
    bracketing: SvenBracketing<T>,
    reducer: IntervalReducer<T>,
    probe: Option<T>,
}

impl<T> LineSearch<T>
where
    T: Scalar,
{
    /// Creates a line search around `reducer`.
    ///
    /// Without a fixed probe, the bracketing step is `0.1·‖x‖/‖d‖`, or
    /// `0.1/‖d‖` at the origin.
    pub fn new(reducer: IntervalReducer<T>) -> Self {
        Self {
            bracketing: SvenBracketing::new(),
            reducer,
            probe: None,
        }
    }

    /// Uses a fixed bracketing probe step.
    pub fn with_probe(mut self, probe: T) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Replaces the bracketing routine.
    pub fn with_bracketing(mut self, bracketing: SvenBracketing<T>) -> Self {
        self.bracketing = bracketing;
        self
    }

    /// The interval-reduction method.
    pub fn reducer(&self) -> &IntervalReducer<T> {
        &self.reducer
    }

    /// Probe step used at `point` along `direction`.
    pub fn probe_step(&self, point: &DVector<T>, direction: &DVector<T>) -> Result<T> {
        if let Some(probe) = self.probe {
            return Ok(probe);
        }

        let direction_norm = direction.norm();
        if direction_norm == T::zero() {
            return Err(OptimizerError::numerical_degeneracy(
                "cannot scale the probe step along a zero direction",
            ));
        }

        let tenth = <T as Scalar>::from_f64(0.1);
        let point_norm = point.norm();
        if point_norm == T::zero() {
            Ok(tenth / direction_norm)
        } else {
            Ok(tenth * point_norm / direction_norm)
        }
    }

    /// Minimizes `φ(α) = f(x + α·d)`.
    pub fn search<C>(
        &self,
        cost: &C,
        point: &DVector<T>,
        direction: &DVector<T>,
    ) -> Result<LineSearchResult<T>>
    where
        C: CostFunction<T> + ?Sized,
    {
        if point.len() != direction.len() {
            return Err(OptimizerError::dimension_mismatch(point.len(), direction.len()));
        }

        let probe = self.probe_step(point, direction)?;
        let phi = restrict(cost, point, direction);

        let bracket = self.bracketing.bracket(&phi, T::zero(), probe)?;
        let reduction = self.reducer.reduce(&phi, bracket.interval)?;

        debug!(
            step = %reduction.point,
            value = %reduction.value,
            method = self.reducer.name(),
            "line search finished"
        );
        Ok(LineSearchResult {
            step: reduction.point,
            value: reduction.value,
            probe,
            bracket,
            reduction,
        })
    }
}
