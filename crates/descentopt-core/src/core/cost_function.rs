//! Cost function interface for descent methods.
//!
//! This module provides the trait optimizers use to evaluate the objective
//! and its gradient, an adapter for plain closures, and a counting wrapper
//! for tests and experiments.
//!
//! # Design Philosophy
//!
//! - The objective is a pure map from a point to a scalar.
//! - The gradient is optional: when an implementation does not provide one,
//!   forward finite differences are used with a per-objective increment.

use crate::{
    numerical::forward_gradient,
    types::{DMatrix, DVector, Scalar},
};
use std::cell::Cell;
use std::fmt::{self, Debug};

/// Trait for objective functions.
///
/// This is the main trait that optimization algorithms use to evaluate
/// the objective function and its gradient.
pub trait CostFunction<T>: Debug
where
    T: Scalar,
{
    /// Evaluates the cost function at a point.
    fn cost(&self, point: &DVector<T>) -> T;

    /// Computes the gradient at a point.
    ///
    /// # Default Implementation
    ///
    /// Forward finite differences with increment
    /// [`finite_difference_step`](Self::finite_difference_step).
    fn gradient(&self, point: &DVector<T>) -> DVector<T> {
        forward_gradient(|p| self.cost(p), point, self.finite_difference_step())
    }

    /// Evaluates the cost and the gradient at a point.
    fn cost_and_gradient(&self, point: &DVector<T>) -> (T, DVector<T>) {
        (self.cost(point), self.gradient(point))
    }

    /// Increment `h` used by the default finite-difference gradient.
    fn finite_difference_step(&self) -> T {
        T::DEFAULT_FD_STEP
    }
}

impl<T, C> CostFunction<T> for &C
where
    T: Scalar,
    C: CostFunction<T> + ?Sized,
{
    fn cost(&self, point: &DVector<T>) -> T {
        (**self).cost(point)
    }

    fn gradient(&self, point: &DVector<T>) -> DVector<T> {
        (**self).gradient(point)
    }

    fn cost_and_gradient(&self, point: &DVector<T>) -> (T, DVector<T>) {
        (**self).cost_and_gradient(point)
    }

    fn finite_difference_step(&self) -> T {
        (**self).finite_difference_step()
    }
}

/// Boxed analytic gradient supplied by the caller.
pub type GradientFn<T> = Box<dyn Fn(&DVector<T>) -> DVector<T>>;

/// Objective built from closures.
///
/// The gradient is numeric unless one is attached with
/// [`with_gradient`](Self::with_gradient).
///
/// # Example
///
/// ```
/// use descentopt_core::prelude::*;
///
/// let f = FnCost::new(|x: &DVector<f64>| 3.0 * x[0] * x[0] + x[0] * x[1] + 2.0 * x[1] * x[1])
///     .with_gradient(|x: &DVector<f64>| {
///         DVector::from_vec(vec![6.0 * x[0] + x[1], x[0] + 4.0 * x[1]])
///     });
///
/// let x = DVector::from_vec(vec![6.0, 4.0]);
/// assert_eq!(f.cost(&x), 164.0);
/// assert_eq!(f.gradient(&x), DVector::from_vec(vec![40.0, 22.0]));
/// ```
pub struct FnCost<T, F>
where
    T: Scalar,
{
    cost: F,
    gradient: Option<GradientFn<T>>,
    fd_step: T,
}

impl<T, F> FnCost<T, F>
where
    T: Scalar,
    F: Fn(&DVector<T>) -> T,
{
    /// Wraps a cost closure; the gradient is computed numerically.
    pub fn new(cost: F) -> Self {
        Self {
            cost,
            gradient: None,
            fd_step: T::DEFAULT_FD_STEP,
        }
    }

    /// Attaches an analytic gradient.
    pub fn with_gradient<G>(mut self, gradient: G) -> Self
    where
        G: Fn(&DVector<T>) -> DVector<T> + 'static,
    {
        self.gradient = Some(Box::new(gradient));
        self
    }

    /// Sets the finite-difference increment used when no gradient is attached.
    pub fn with_finite_difference_step(mut self, h: T) -> Self {
        self.fd_step = h;
        self
    }

    /// Whether an analytic gradient was supplied.
    pub fn has_analytic_gradient(&self) -> bool {
        self.gradient.is_some()
    }
}

impl<T, F> Debug for FnCost<T, F>
where
    T: Scalar,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCost")
            .field("analytic_gradient", &self.gradient.is_some())
            .field("fd_step", &self.fd_step)
            .finish()
    }
}

impl<T, F> CostFunction<T> for FnCost<T, F>
where
    T: Scalar,
    F: Fn(&DVector<T>) -> T,
{
    fn cost(&self, point: &DVector<T>) -> T {
        (self.cost)(point)
    }

    fn gradient(&self, point: &DVector<T>) -> DVector<T> {
        match &self.gradient {
            Some(gradient) => gradient(point),
            None => forward_gradient(&self.cost, point, self.fd_step),
        }
    }

    fn finite_difference_step(&self) -> T {
        self.fd_step
    }
}

/// A quadratic cost function.
///
/// Computes f(x) = 0.5 * x^T * A * x + b^T * x + c
#[derive(Debug, Clone)]
pub struct QuadraticCost<T>
where
    T: Scalar,
{
    /// The quadratic form matrix (should be symmetric)
    pub a: DMatrix<T>,
    /// The linear term
    pub b: DVector<T>,
    /// The constant term
    pub c: T,
}

impl<T> QuadraticCost<T>
where
    T: Scalar,
{
    /// Creates a new quadratic cost function.
    pub fn new(a: DMatrix<T>, b: DVector<T>, c: T) -> Self {
        Self { a, b, c }
    }

    /// `f(x1, x2) = 3x1² + x1x2 + 2x2²`, minimum 0 at the origin.
    ///
    /// The usual first exercise for steepest descent: strictly convex with
    /// a condition number of about 2.2.
    pub fn textbook() -> Self {
        Self {
            a: DMatrix::from_row_slice(
                2,
                2,
                &[
                    <T as Scalar>::from_f64(6.0),
                    T::one(),
                    T::one(),
                    <T as Scalar>::from_f64(4.0),
                ],
            ),
            b: DVector::zeros(2),
            c: T::zero(),
        }
    }

    /// Creates a simple quadratic with identity matrix: f(x) = 0.5 * ||x||^2
    pub fn simple(dim: usize) -> Self {
        Self {
            a: DMatrix::identity(dim, dim),
            b: DVector::zeros(dim),
            c: T::zero(),
        }
    }
}

impl<T> CostFunction<T> for QuadraticCost<T>
where
    T: Scalar,
{
    fn cost(&self, point: &DVector<T>) -> T {
        let ax = &self.a * point;
        point.dot(&ax) * <T as Scalar>::from_f64(0.5) + self.b.dot(point) + self.c
    }

    fn gradient(&self, point: &DVector<T>) -> DVector<T> {
        &self.a * point + &self.b
    }
}

/// Wrapper to count function evaluations for testing and experiments.
#[derive(Debug)]
pub struct CountingCostFunction<C> {
    /// The underlying cost function
    pub inner: C,
    cost_count: Cell<usize>,
    gradient_count: Cell<usize>,
}

impl<C> CountingCostFunction<C> {
    /// Creates a new counting wrapper around a cost function.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            cost_count: Cell::new(0),
            gradient_count: Cell::new(0),
        }
    }

    /// Resets all counters to zero.
    pub fn reset_counts(&self) {
        self.cost_count.set(0);
        self.gradient_count.set(0);
    }

    /// Returns the current (cost, gradient) evaluation counts.
    pub fn counts(&self) -> (usize, usize) {
        (self.cost_count.get(), self.gradient_count.get())
    }
}

impl<T, C> CostFunction<T> for CountingCostFunction<C>
where
    T: Scalar,
    C: CostFunction<T>,
{
    fn cost(&self, point: &DVector<T>) -> T {
        self.cost_count.set(self.cost_count.get() + 1);
        self.inner.cost(point)
    }

    fn gradient(&self, point: &DVector<T>) -> DVector<T> {
        self.gradient_count.set(self.gradient_count.get() + 1);
        self.inner.gradient(point)
    }

    fn finite_difference_step(&self) -> T {
        self.inner.finite_difference_step()
    }
}
