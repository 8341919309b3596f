//! Sven bracketing.
//!
//! Finds an interval containing a minimizer of a one-dimensional function by
//! walking downhill from a start point with doubling steps:
//!
//! ```text
//! x_{k+1} = x_k + Δ·2^k
//! ```
//!
//! until the function starts increasing. The returned bracket is
//! `[x_k - Δ·2^(k-1), x_k + Δ·2^(k-1)]`.
//!
//! On a unimodal function the bracket contains the minimizer. Its midpoint
//! `x_k` is not necessarily lower than both ends: the right half may be
//! almost entirely downhill.

use crate::line_search::SearchStatus;
use descentopt_core::{
    error::{OptimizerError, Result},
    types::Scalar,
};
use num_traits::Float;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, debug_span, trace, warn};

/// Closed interval `[low, high]` with `low <= high`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Interval<T> {
    /// Lower bound
    pub low: T,
    /// Upper bound
    pub high: T,
}

impl<T> Interval<T>
where
    T: Scalar,
{
    /// Creates an interval from two bounds in any order.
    pub fn new(a: T, b: T) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    /// Creates an interval, rejecting reversed or non-finite bounds.
    pub fn try_new(low: T, high: T) -> Result<Self> {
        let interval = Self { low, high };
        interval.validate()?;
        Ok(interval)
    }

    /// Checks that both bounds are finite and ordered.
    pub fn validate(&self) -> Result<()> {
        if !<T as Float>::is_finite(self.low) || !<T as Float>::is_finite(self.high) {
            return Err(OptimizerError::invalid_interval(format!(
                "bounds must be finite, got [{}, {}]",
                self.low, self.high
            )));
        }
        if self.low > self.high {
            return Err(OptimizerError::invalid_interval(format!(
                "low bound {} exceeds high bound {}",
                self.low, self.high
            )));
        }
        Ok(())
    }

    /// Width `high - low`.
    pub fn width(&self) -> T {
        self.high - self.low
    }

    /// Midpoint of the interval.
    pub fn midpoint(&self) -> T {
        (self.low + self.high) * <T as Scalar>::from_f64(0.5)
    }

    /// Whether `x` lies in the closed interval.
    pub fn contains(&self, x: T) -> bool {
        self.low <= x && x <= self.high
    }
}

impl<T: fmt::Display> fmt::Display for Interval<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.low, self.high)
    }
}

/// Outcome of a bracketing run.
#[derive(Debug, Clone, PartialEq)]
pub struct Bracket<T> {
    /// Interval believed to contain a minimizer
    pub interval: Interval<T>,
    /// Number of expansion steps taken
    pub iterations: usize,
    /// Number of function evaluations
    pub evaluations: usize,
    /// How the run ended
    pub status: SearchStatus,
}

/// Sven's exponential-expansion bracketing.
#[derive(Debug, Clone)]
pub struct SvenBracketing<T> {
    max_iterations: usize,
    _marker: std::marker::PhantomData<T>,
}

impl<T> Default for SvenBracketing<T>
where
    T: Scalar,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SvenBracketing<T>
where
    T: Scalar,
{
    /// Default ceiling on expansion steps.
    pub const DEFAULT_MAX_ITERATIONS: usize = 2000;

    /// Creates a bracketing routine with the default iteration ceiling.
    pub fn new() -> Self {
        Self {
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
            _marker: std::marker::PhantomData,
        }
    }

    /// Sets the iteration ceiling.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Iteration ceiling.
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Brackets a minimizer of `f` starting from `x0` with probe `step`.
    ///
    /// The sign of `step` is ignored; the direction of expansion is chosen
    /// from `f(x0 - |step|)`, `f(x0)` and `f(x0 + |step|)`. When `x0` already
    /// sits in a valley the interval `[x0 - |step|, x0 + |step|]` is returned
    /// without expanding.
    ///
    /// Reaching the iteration ceiling is not an error: the last interval is
    /// returned with [`SearchStatus::MaxIterations`].
    ///
    /// # Errors
    ///
    /// - `InvalidConfiguration` when `step` is zero or non-finite, or `x0` is
    ///   non-finite.
    /// - `NumericalDegeneracy` when `f(x0)` is non-finite or the expansion
    ///   overflows.
    pub fn bracket<F>(&self, f: F, x0: T, step: T) -> Result<Bracket<T>>
    where
        F: Fn(T) -> T,
    {
        let _span = debug_span!("sven").entered();

        if !<T as Float>::is_finite(step) || step == T::zero() {
            return Err(OptimizerError::invalid_configuration(
                "probe step must be finite and non-zero",
                "step",
                step.to_string(),
            ));
        }
        if !<T as Float>::is_finite(x0) {
            return Err(OptimizerError::invalid_configuration(
                "start point must be finite",
                "x0",
                x0.to_string(),
            ));
        }

        let step = <T as Float>::abs(step);
        let f0 = f(x0);
        if !<T as Float>::is_finite(f0) {
            return Err(OptimizerError::numerical_degeneracy(format!(
                "f({}) is not finite",
                x0
            )));
        }
        let f_neg = f(x0 - step);
        let f_pos = f(x0 + step);
        let mut evaluations = 3;

        let delta = if f_neg >= f0 && f0 >= f_pos {
            step
        } else if f_neg <= f0 && f0 <= f_pos {
            -step
        } else {
            if f_neg < f0 && f_pos < f0 {
                warn!(x0 = %x0, "start point is a local peak, returning its neighbourhood");
            }
            let interval = Interval::new(x0 - step, x0 + step);
            debug!(interval = %interval, "start point already bracketed");
            return Ok(Bracket {
                interval,
                iterations: 0,
                evaluations,
                status: SearchStatus::Converged,
            });
        };

        let mut x = x0;
        let mut fx = f0;
        let mut delta = delta;
        let mut k = 0;
        let mut status = SearchStatus::Converged;

        loop {
            let x_next = x + delta;
            let f_next = f(x_next);
            evaluations += 1;
            trace!(k, x = %x, delta = %delta, x_next = %x_next, fx = %fx, f_next = %f_next);

            if !<T as Float>::is_finite(f_next) {
                warn!(x_next = %x_next, "non-finite value during expansion, stopping");
                break;
            }
            if fx < f_next {
                break;
            }
            if k >= self.max_iterations {
                warn!(max_iterations = self.max_iterations, "bracketing reached its iteration ceiling");
                status = SearchStatus::MaxIterations;
                break;
            }

            x = x_next;
            fx = f_next;
            delta = delta + delta;
            k += 1;
        }

        let half = delta * <T as Scalar>::from_f64(0.5);
        let interval = Interval::new(x - half, x + half);
        if !<T as Float>::is_finite(interval.low) || !<T as Float>::is_finite(interval.high) {
            return Err(OptimizerError::numerical_degeneracy(format!(
                "bracket expansion overflowed after {} steps",
                k + 1
            )));
        }

        debug!(interval = %interval, iterations = k + 1, "bracket found");
        Ok(Bracket {
            interval,
            iterations: k + 1,
            evaluations,
            status,
        })
    }
}
