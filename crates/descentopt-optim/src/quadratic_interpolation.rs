//! DSK-Powell quadratic interpolation.
//!
//! A parabola is fitted through three points of the bracket and its vertex
//! becomes the next trial point. The first fit uses the equally spaced nodes
//! `a`, `(a + b)/2`, `b` (Davies-Swann-Campey step); later fits use Powell's
//! divided differences on the best point and its neighbours.

use crate::{
    bracket::Interval,
    line_search::{IntervalReduction, OneDimResult, SearchStatus},
};
use descentopt_core::{
    error::{OptimizerError, Result},
    types::Scalar,
};
use num_traits::Float;
use std::cmp::Ordering;
use tracing::{debug, debug_span, trace, warn};

/// Rejects a parabola whose curvature is lost in the rounding of its values.
fn check_curvature<T: Scalar>(curvature: T, values: [T; 3]) -> Result<()> {
    let scale = values
        .iter()
        .fold(T::zero(), |acc, &v| <T as Float>::max(acc, <T as Float>::abs(v)));
    if !<T as Float>::is_finite(curvature) || <T as Float>::abs(curvature) <= T::EPSILON * scale {
        return Err(OptimizerError::numerical_degeneracy(format!(
            "flat parabola through values {:?}",
            values
        )));
    }
    Ok(())
}

fn check_vertex<T: Scalar>(vertex: T) -> Result<T> {
    if <T as Float>::is_finite(vertex) {
        Ok(vertex)
    } else {
        Err(OptimizerError::numerical_degeneracy(format!(
            "parabola vertex is not finite ({})",
            vertex
        )))
    }
}

/// Vertex of the parabola through three equally spaced nodes.
///
/// ```text
/// x* = x2 + Δx·(f1 - f3) / (2·(f1 - 2f2 + f3))
/// ```
///
/// # Errors
///
/// - `InvalidInterval` when the nodes are not equally spaced.
/// - `NumericalDegeneracy` when the parabola is flat or the vertex is not
///   finite.
pub fn dsk_vertex<T: Scalar>(nodes: [T; 3], values: [T; 3]) -> Result<T> {
    let [x1, x2, x3] = nodes;
    let [f1, f2, f3] = values;
    let left = x2 - x1;
    let right = x3 - x2;

    let scale = <T as Float>::max(<T as Float>::abs(x1), <T as Float>::abs(x3));
    let spacing_tol = <T as Scalar>::from_f64(4.0) * T::EPSILON * scale;
    if !approx::relative_eq!(
        left,
        right,
        epsilon = spacing_tol,
        max_relative = <T as Scalar>::from_f64(1e-9)
    ) {
        return Err(OptimizerError::invalid_interval(format!(
            "nodes {:?} are not equally spaced",
            nodes
        )));
    }
    if left <= T::zero() {
        return Err(OptimizerError::numerical_degeneracy(
            "interpolation nodes coincide",
        ));
    }

    let two = <T as Scalar>::from_f64(2.0);
    let curvature = f1 - two * f2 + f3;
    check_curvature(curvature, values)?;

    check_vertex(x2 + left * (f1 - f3) / (two * curvature))
}

/// Vertex of the parabola through three ordered nodes (Powell's form).
///
/// ```text
/// a1 = (f2 - f1)/(x2 - x1)
/// a2 = ((f3 - f1)/(x3 - x1) - a1)/(x3 - x2)
/// x* = (x1 + x2)/2 - a1/(2·a2)
/// ```
///
/// # Errors
///
/// `NumericalDegeneracy` when two nodes coincide, the parabola is flat or
/// the vertex is not finite.
pub fn powell_vertex<T: Scalar>(nodes: [T; 3], values: [T; 3]) -> Result<T> {
    let [x1, x2, x3] = nodes;
    let [f1, f2, f3] = values;
    if x1 == x2 || x2 == x3 || x1 == x3 {
        return Err(OptimizerError::numerical_degeneracy(format!(
            "interpolation nodes coincide: {:?}",
            nodes
        )));
    }

    let two = <T as Scalar>::from_f64(2.0);
    let a1 = (f2 - f1) / (x2 - x1);
    let a2 = ((f3 - f1) / (x3 - x1) - a1) / (x3 - x2);
    // a2·(x3 - x2)·(x3 - x1) reduces to f1 - 2f2 + f3 on equal spacing.
    check_curvature(a2 * (x3 - x2) * (x3 - x1), values)?;

    check_vertex((x1 + x2) / two - a1 / (two * a2))
}

/// DSK-Powell quadratic interpolation search.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuadraticInterpolation<T> {
    eps: T,
    max_iterations: usize,
}

impl<T> Default for QuadraticInterpolation<T>
where
    T: Scalar,
{
    fn default() -> Self {
        Self::new(T::DEFAULT_TOLERANCE)
    }
}

impl<T> QuadraticInterpolation<T>
where
    T: Scalar,
{
    /// Default ceiling on iterations.
    pub const DEFAULT_MAX_ITERATIONS: usize = 500;

    /// Creates a search with tolerance `eps` on both the abscissa and the
    /// value of successive vertices.
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

impl<T> IntervalReduction<T> for QuadraticInterpolation<T>
where
    T: Scalar,
{
    fn name(&self) -> &'static str {
        "DSK-Powell"
    }

    fn tolerance(&self) -> T {
        self.eps
    }

    /// A degenerate first fit is an error since only the bracket is known.
    /// A degenerate Powell refit ends the search at the best node with
    /// [`SearchStatus::Degenerate`].
    fn reduce<F>(&self, f: F, interval: Interval<T>) -> Result<OneDimResult<T>>
    where
        F: Fn(T) -> T,
    {
        let _span = debug_span!("dsk_powell").entered();
        self.validate_inputs(&interval)?;

        if interval.width() <= self.eps {
            let point = interval.midpoint();
            return Ok(OneDimResult {
                point,
                value: f(point),
                interval,
                iterations: 0,
                evaluations: 1,
                status: SearchStatus::Converged,
            });
        }

        let mut nodes = [interval.low, interval.midpoint(), interval.high];
        let mut values = [f(nodes[0]), f(nodes[1]), f(nodes[2])];
        if values.iter().any(|v| !<T as Float>::is_finite(*v)) {
            return Err(OptimizerError::numerical_degeneracy(format!(
                "non-finite value on the bracket {}",
                interval
            )));
        }

        let mut vertex = dsk_vertex(nodes, values)?;
        let mut f_vertex = f(vertex);
        let mut evaluations = 4;
        let mut iterations = 1;

        loop {
            trace!(
                iteration = iterations,
                x1 = %nodes[0],
                x2 = %nodes[1],
                x3 = %nodes[2],
                vertex = %vertex,
                f_vertex = %f_vertex
            );

            if <T as Float>::abs(values[1] - f_vertex) <= self.eps
                && <T as Float>::abs(nodes[1] - vertex) <= self.eps
            {
                debug!(point = %vertex, value = %f_vertex, iterations, "quadratic interpolation converged");
                return Ok(OneDimResult {
                    point: vertex,
                    value: f_vertex,
                    interval: Interval::new(nodes[0], nodes[2]),
                    iterations,
                    evaluations,
                    status: SearchStatus::Converged,
                });
            }

            if iterations >= self.max_iterations {
                warn!(
                    max_iterations = self.max_iterations,
                    "quadratic interpolation reached its iteration ceiling"
                );
                return Ok(OneDimResult {
                    point: vertex,
                    value: f_vertex,
                    interval: Interval::new(nodes[0], nodes[2]),
                    iterations,
                    evaluations,
                    status: SearchStatus::MaxIterations,
                });
            }

            let mut points = [
                (nodes[0], values[0]),
                (nodes[1], values[1]),
                (nodes[2], values[2]),
                (vertex, f_vertex),
            ];
            points.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

            let best = points
                .iter()
                .enumerate()
                .fold(0, |best, (i, p)| if p.1 < points[best].1 { i } else { best });

            if best == 0 || best == points.len() - 1 {
                let (point, value) = points[best];
                debug!(point = %point, value = %value, "least value at the edge of the nodes");
                return Ok(OneDimResult {
                    point,
                    value,
                    interval: Interval::new(points[0].0, points[3].0),
                    iterations,
                    evaluations,
                    status: SearchStatus::BoundaryOptimum,
                });
            }

            nodes = [points[best - 1].0, points[best].0, points[best + 1].0];
            values = [points[best - 1].1, points[best].1, points[best + 1].1];

            vertex = match powell_vertex(nodes, values) {
                Ok(vertex) => vertex,
                Err(error) => {
                    warn!(%error, point = %nodes[1], "keeping the best node of a degenerate fit");
                    return Ok(OneDimResult {
                        point: nodes[1],
                        value: values[1],
                        interval: Interval::new(nodes[0], nodes[2]),
                        iterations,
                        evaluations,
                        status: SearchStatus::Degenerate,
                    });
                }
            };
            f_vertex = f(vertex);
            evaluations += 1;
            iterations += 1;
        }
    }
}
