//! Objectives shared by tests, benchmarks and demos.
//!
//! Every function here has a known minimizer so runs can be checked against
//! it.

use crate::{
    cost_function::{CostFunction, QuadraticCost},
    types::{DMatrix, DVector, Scalar},
};
use num_traits::Float;

/// `f(x1, x2) = 3x1² + x1x2 + 2x2²`, minimum 0 at the origin.
pub fn textbook_quadratic<T: Scalar>() -> QuadraticCost<T> {
    QuadraticCost::textbook()
}

/// `f(x1, x2) = 6(x1 - 9)² + x1x2 + 2x2²`.
///
/// Expanded as `½xᵀAx + bᵀx + c` with `A = [[12, 1], [1, 4]]`,
/// `b = (-108, 0)`, `c = 486`. The minimizer is `(432/47, -108/47)`.
pub fn shifted_quadratic<T: Scalar>() -> QuadraticCost<T> {
    let f = |v: f64| <T as Scalar>::from_f64(v);
    QuadraticCost::new(
        DMatrix::from_row_slice(2, 2, &[f(12.0), f(1.0), f(1.0), f(4.0)]),
        DVector::from_vec(vec![f(-108.0), T::zero()]),
        f(486.0),
    )
}

/// Minimizer of [`shifted_quadratic`].
pub fn shifted_quadratic_minimizer<T: Scalar>() -> DVector<T> {
    DVector::from_vec(vec![
        <T as Scalar>::from_f64(432.0 / 47.0),
        <T as Scalar>::from_f64(-108.0 / 47.0),
    ])
}

/// `f(x1, x2) = (10(x1 - x2)² + (x1 - 1)²)⁴`.
///
/// A narrow curved valley with a very flat bottom around the minimizer
/// `(1, 1)`. Gradient-norm stopping triggers long before the iterate gets
/// there, which makes it a good stress case for the stopping rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuarticValley;

impl QuarticValley {
    /// Conventional start point `(-1.2, 0)`.
    pub fn start_point<T: Scalar>() -> DVector<T> {
        DVector::from_vec(vec![<T as Scalar>::from_f64(-1.2), T::zero()])
    }

    /// Minimizer `(1, 1)`.
    pub fn minimizer<T: Scalar>() -> DVector<T> {
        DVector::from_element(2, T::one())
    }

    fn inner<T: Scalar>(x: &DVector<T>) -> T {
        let ten = <T as Scalar>::from_f64(10.0);
        let d = x[0] - x[1];
        let e = x[0] - T::one();
        ten * d * d + e * e
    }
}

/// Shorthand for [`QuarticValley`].
pub fn quartic_valley() -> QuarticValley {
    QuarticValley
}

impl<T: Scalar> CostFunction<T> for QuarticValley {
    fn cost(&self, point: &DVector<T>) -> T {
        <T as Float>::powi(Self::inner(point), 4)
    }

    fn gradient(&self, point: &DVector<T>) -> DVector<T> {
        let u = Self::inner(point);
        let outer = <T as Scalar>::from_f64(4.0) * <T as Float>::powi(u, 3);
        let twenty = <T as Scalar>::from_f64(20.0);
        let two = <T as Scalar>::from_f64(2.0);
        let d = point[0] - point[1];

        DVector::from_vec(vec![
            outer * (twenty * d + two * (point[0] - T::one())),
            outer * (-twenty * d),
        ])
    }
}
