//! Tests driving the library through the re-exported prelude.

use approx::assert_relative_eq;
use descentopt::prelude::*;
use descentopt_core::test_functions::{shifted_quadratic, shifted_quadratic_minimizer};
use pretty_assertions::assert_eq;

#[test]
fn test_prelude_runs_a_descent() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let cost = shifted_quadratic::<f64>();
    let config = DescentConfig::new()
        .with_one_dim_method(OneDimMethod::QuadraticInterpolation)
        .with_one_dim_eps(1e-6)
        .with_criterion(ConvergenceCriterion::from_index(1).unwrap());

    let result = minimize(&cost, DVector::zeros(2), config).unwrap();

    assert_eq!(result.state, DescentState::Converged);
    assert_relative_eq!(result.point, shifted_quadratic_minimizer(), epsilon = 1e-3);
    assert_eq!(result.history.len(), result.iterations + 1);
}

#[test]
fn test_one_dimensional_pipeline() {
    let f = |x: f64| (x - 7.0).powi(2);

    let bracket = SvenBracketing::new().bracket(f, 0.0, 0.5).unwrap();
    assert!(bracket.interval.contains(7.0));

    let reducer = descentopt::optim::GoldenSection::new(1e-5);
    let result = reducer.reduce(f, bracket.interval).unwrap();
    assert_relative_eq!(result.point, 7.0, epsilon = 1e-5);
}

#[test]
fn test_errors_are_reported_through_the_facade() {
    let cost = QuadraticCost::<f64>::textbook();
    let config = DescentConfig::new().with_constant_step(0.5).with_momentum(0.5);

    let error = minimize(&cost, DVector::from_vec(vec![1.0, 1.0]), config).unwrap_err();
    assert!(matches!(error, OptimizerError::InvalidConfiguration { .. }));
}
