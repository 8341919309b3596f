//! Golden-section interval reduction.
//!
//! Two interior points split the bracket in the golden ratio. Comparing the
//! function at those points discards one end of the bracket, and the
//! surviving interior point lands exactly on a golden-ratio position of the
//! new bracket, so each iteration costs a single evaluation and shrinks the
//! width by `φ⁻¹ ≈ 0.618`.

use crate::{
    bracket::Interval,
    line_search::{IntervalReduction, OneDimResult, SearchStatus},
};
use descentopt_core::{error::Result, types::Scalar};
use tracing::{debug, debug_span, trace, warn};

/// The golden ratio: φ = (1 + √5) / 2
const PHI: f64 = 1.618_033_988_749_895;

/// The inverse golden ratio: 1/φ
///
/// This equals φ - 1 due to the golden ratio's unique property.
pub const INV_PHI: f64 = PHI - 1.0;

/// Bracket with its two golden-ratio interior points.
#[derive(Debug, Clone, Copy)]
struct GoldenBracket<T> {
    left: T,
    right: T,
    inner_left: T,
    inner_right: T,
}

impl<T: Scalar> GoldenBracket<T> {
    fn new(interval: Interval<T>) -> Self {
        let mut bracket = Self {
            left: interval.low,
            right: interval.high,
            inner_left: interval.low,
            inner_right: interval.high,
        };
        bracket.inner_left = bracket.left + Self::small() * bracket.width();
        bracket.inner_right = bracket.left + Self::large() * bracket.width();
        bracket
    }

    fn small() -> T {
        <T as Scalar>::from_f64(1.0 - INV_PHI)
    }

    fn large() -> T {
        <T as Scalar>::from_f64(INV_PHI)
    }

    fn width(&self) -> T {
        self.right - self.left
    }

    /// Keeps `[left, inner_right]`; the old `inner_left` becomes `inner_right`.
    fn shrink_right(&mut self) {
        self.right = self.inner_right;
        self.inner_right = self.inner_left;
        self.inner_left = self.left + Self::small() * self.width();
    }

    /// Keeps `[inner_left, right]`; the old `inner_right` becomes `inner_left`.
    fn shrink_left(&mut self) {
        self.left = self.inner_left;
        self.inner_left = self.inner_right;
        self.inner_right = self.left + Self::large() * self.width();
    }

    fn interval(&self) -> Interval<T> {
        Interval::new(self.left, self.right)
    }
}

/// Golden-section search.
///
/// # Example
///
/// ```
/// use descentopt_optim::{GoldenSection, Interval, IntervalReduction};
///
/// let search = GoldenSection::new(1e-6);
/// let result = search.reduce(|x: f64| (x - 2.0).powi(2), Interval::new(0.0, 5.0)).unwrap();
/// assert!((result.point - 2.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GoldenSection<T> {
    eps: T,
    max_iterations: usize,
}

impl<T> Default for GoldenSection<T>
where
    T: Scalar,
{
    fn default() -> Self {
        Self::new(T::DEFAULT_TOLERANCE)
    }
}

impl<T> GoldenSection<T>
where
    T: Scalar,
{
    /// Default ceiling on iterations.
    pub const DEFAULT_MAX_ITERATIONS: usize = 2000;

    /// Creates a search that stops once the bracket is no wider than `eps`.
    pub fn new(eps: T) -> Self {
        Self {
            eps,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
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
}

impl<T> IntervalReduction<T> for GoldenSection<T>
where
    T: Scalar,
{
    fn name(&self) -> &'static str {
        "Golden Section"
    }

    fn tolerance(&self) -> T {
        self.eps
    }

    fn reduce<F>(&self, f: F, interval: Interval<T>) -> Result<OneDimResult<T>>
    where
        F: Fn(T) -> T,
    {
        let _span = debug_span!("golden_section").entered();
        self.validate_inputs(&interval)?;

        let mut bracket = GoldenBracket::new(interval);
        let mut iterations = 0;
        let mut evaluations = 0;
        let mut status = SearchStatus::Converged;

        if bracket.width() > self.eps {
            let mut f_left = f(bracket.inner_left);
            let mut f_right = f(bracket.inner_right);
            evaluations += 2;

            while bracket.width() > self.eps {
                if iterations >= self.max_iterations {
                    warn!(
                        max_iterations = self.max_iterations,
                        width = %bracket.width(),
                        "golden section reached its iteration ceiling"
                    );
                    status = SearchStatus::MaxIterations;
                    break;
                }

                trace!(
                    iteration = iterations,
                    left = %bracket.left,
                    right = %bracket.right,
                    f_left = %f_left,
                    f_right = %f_right
                );

                if f_left <= f_right {
                    bracket.shrink_right();
                    f_right = f_left;
                    f_left = f(bracket.inner_left);
                } else {
                    bracket.shrink_left();
                    f_left = f_right;
                    f_right = f(bracket.inner_right);
                }
                evaluations += 1;
                iterations += 1;
            }
        }

        let interval = bracket.interval();
        let point = interval.midpoint();
        let value = f(point);
        evaluations += 1;

        debug!(point = %point, value = %value, iterations, "golden section finished");
        Ok(OneDimResult {
            point,
            value,
            interval,
            iterations,
            evaluations,
            status,
        })
    }
}
