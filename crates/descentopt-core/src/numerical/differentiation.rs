//! Finite-difference derivatives.
//!
//! The increment `h` is always explicit. Smaller values reduce truncation
//! error but amplify floating-point cancellation in `f(x + h) - f(x)`, so the
//! choice is left to the caller (see [`Scalar::DEFAULT_FD_STEP`]).

use crate::{
    error::{OptimizerError, Result},
    types::{DVector, Scalar},
};
use num_traits::Float;

/// Forward-difference gradient of a scalar field.
///
/// For each coordinate `i`:
///
/// ```text
/// ∂f/∂x_i ≈ (f(x + h·e_i) - f(x)) / h
/// ```
///
/// `f(x)` is evaluated once, then once more per coordinate.
///
/// # Example
///
/// ```
/// use descentopt_core::numerical::forward_gradient;
/// use descentopt_core::types::DVector;
///
/// let f = |x: &DVector<f64>| x[0] * x[0] + 3.0 * x[1];
/// let g = forward_gradient(f, &DVector::from_vec(vec![2.0, 1.0]), 1e-6);
///
/// assert!((g[0] - 4.0).abs() < 1e-4);
/// assert!((g[1] - 3.0).abs() < 1e-6);
/// ```
pub fn forward_gradient<T, F>(f: F, point: &DVector<T>, h: T) -> DVector<T>
where
    T: Scalar,
    F: Fn(&DVector<T>) -> T,
{
    let f0 = f(point);
    let mut gradient = DVector::zeros(point.len());
    let mut perturbed = point.clone();

    for i in 0..point.len() {
        let original = perturbed[i];
        perturbed[i] = original + h;
        gradient[i] = (f(&perturbed) - f0) / h;
        perturbed[i] = original;
    }

    gradient
}

/// Central-difference derivative of a function of one variable.
///
/// `(f(x + h) - f(x - h)) / 2h`, second-order accurate in `h`.
pub fn central_derivative<T, F>(f: F, x: T, h: T) -> T
where
    T: Scalar,
    F: Fn(T) -> T,
{
    (f(x + h) - f(x - h)) / (h + h)
}

/// Largest component-wise difference between two gradients.
///
/// Used to compare an analytic gradient against a finite-difference one.
pub fn max_gradient_error<T: Scalar>(lhs: &DVector<T>, rhs: &DVector<T>) -> Result<T> {
    if lhs.len() != rhs.len() {
        return Err(OptimizerError::dimension_mismatch(lhs.len(), rhs.len()));
    }

    Ok(lhs
        .iter()
        .zip(rhs.iter())
        .map(|(&a, &b)| <T as Float>::abs(a - b))
        .fold(T::zero(), |acc, e| <T as Float>::max(acc, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_forward_gradient_quadratic() {
        // f(x1, x2) = 3x1² + x1x2 + 2x2², ∇f = [6x1 + x2, x1 + 4x2]
        let f = |x: &DVector<f64>| 3.0 * x[0] * x[0] + x[0] * x[1] + 2.0 * x[1] * x[1];
        let point = DVector::from_vec(vec![6.0, 4.0]);

        let g = forward_gradient(f, &point, 1e-6);
        assert_relative_eq!(g[0], 40.0, epsilon = 1e-4);
        assert_relative_eq!(g[1], 22.0, epsilon = 1e-4);
    }

    #[test]
    fn test_forward_gradient_error_is_first_order() {
        // Forward differences on x² carry an O(h) bias equal to h.
        let f = |x: &DVector<f64>| x[0] * x[0];
        let point = DVector::from_vec(vec![1.0]);

        let g = forward_gradient(f, &point, 1e-2);
        assert_relative_eq!(g[0], 2.0 + 1e-2, epsilon = 1e-10);
    }

    #[test]
    fn test_forward_gradient_leaves_point_untouched() {
        let f = |x: &DVector<f64>| x.iter().sum::<f64>();
        let point = DVector::from_vec(vec![1.0, 2.0, 3.0]);

        let g = forward_gradient(f, &point, 1e-5);
        assert_eq!(point, DVector::from_vec(vec![1.0, 2.0, 3.0]));
        for gi in g.iter() {
            assert_relative_eq!(*gi, 1.0, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_central_derivative() {
        // Exact on quadratics up to rounding.
        let d = central_derivative(|x: f64| x * x - 4.0 * x, 3.0, 1e-3);
        assert_relative_eq!(d, 2.0, epsilon = 1e-9);

        let d = central_derivative(|x: f64| x.sin(), 0.0, 1e-4);
        assert_relative_eq!(d, 1.0, epsilon = 1e-8);
    }

    #[test]
    fn test_max_gradient_error() {
        let a = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let b = DVector::from_vec(vec![1.5, 2.0, 2.0]);
        assert_relative_eq!(max_gradient_error(&a, &b).unwrap(), 1.0);

        let c = DVector::from_vec(vec![1.0]);
        assert!(matches!(
            max_gradient_error(&a, &c),
            Err(OptimizerError::DimensionMismatch { .. })
        ));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn forward_gradient_is_exact_on_affine_functions(
                coefficients in prop::collection::vec(-10.0..10.0f64, 1..6),
                offset in -10.0..10.0f64,
                seed in prop::collection::vec(-10.0..10.0f64, 6),
            ) {
                let dim = coefficients.len();
                let a = DVector::from_vec(coefficients);
                let point = DVector::from_iterator(dim, seed.into_iter().take(dim));

                let g = forward_gradient(|x: &DVector<f64>| a.dot(x) + offset, &point, 1e-4);
                prop_assert!(max_gradient_error(&g, &a).unwrap() < 1e-6);
            }

            #[test]
            fn central_derivative_is_exact_on_parabolas(
                a in 0.1..10.0f64,
                b in -10.0..10.0f64,
                x in -10.0..10.0f64,
            ) {
                let d = central_derivative(|t: f64| a * t * t + b * t, x, 1e-3);
                prop_assert!((d - (2.0 * a * x + b)).abs() < 1e-6);
            }
        }
    }
}
