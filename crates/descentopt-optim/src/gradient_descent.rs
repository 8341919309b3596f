//! Steepest (gradient) descent.
//!
//! # Algorithm Overview
//!
//! Each iteration:
//! 1. Evaluate `f(x_k)` and `∇f(x_k)`
//! 2. Ask the step policy for the descent direction `d_k`
//! 3. Record `{k, x_k, f(x_k), d_k}` in the history
//! 4. Stop if the convergence criterion holds or the iteration ceiling is reached
//! 5. Otherwise let the policy choose the step and compute `x_{k+1}`
//!
//! The policy is either built from a [`DescentConfig`] (constant step,
//! optimal step and its modifications) or injected with
//! [`GradientDescent::with_policy`].
//!
//! # Example
//!
//! ```
//! use descentopt_core::prelude::*;
//! use descentopt_optim::{DescentConfig, DescentState, GradientDescent};
//!
//! let cost = QuadraticCost::<f64>::textbook();
//! let start = DVector::from_vec(vec![6.0, 4.0]);
//!
//! let result = GradientDescent::new(&cost, start, DescentConfig::new())
//!     .unwrap()
//!     .run()
//!     .unwrap();
//!
//! assert_eq!(result.state, DescentState::Converged);
//! assert!(result.gradient_norm <= 1e-3);
//! ```

use crate::{
    config::DescentConfig,
    step_policy::{StepPolicy, StepState, StepStrategy},
};
use descentopt_core::{
    cost_function::CostFunction,
    error::{OptimizerError, Result},
    history::{IterationHistory, IterationRecord},
    types::{DVector, Scalar},
};
use num_traits::Float;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, debug_span, trace, warn};

/// State of a descent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DescentState {
    /// More iterations are needed
    Running,
    /// The convergence criterion holds or the gradient vanished
    Converged,
    /// The iteration ceiling was reached first
    MaxIterationsReached,
}

/// Outcome of a descent run.
#[derive(Debug, Clone)]
pub struct DescentResult<T>
where
    T: Scalar,
{
    /// Last iterate `x_k`
    pub point: DVector<T>,

    /// `f(x_k)`
    pub value: T,

    /// `‖∇f(x_k)‖`
    pub gradient_norm: T,

    /// Value of the iteration counter when the run stopped
    pub iterations: usize,

    /// Final state, never `Running`
    pub state: DescentState,

    /// True if the run stopped on the convergence criterion
    pub converged: bool,

    /// Every recorded iterate
    pub history: IterationHistory<T>,

    /// Wall-clock time of the run
    pub duration: Duration,
}

/// Gradient-descent engine.
///
/// The engine borrows the objective and owns its position, history and
/// policy. It can be driven one iteration at a time with
/// [`step`](Self::step) or to completion with [`run`](Self::run).
#[derive(Debug)]
pub struct GradientDescent<'a, T, C, P = StepStrategy<T>>
where
    T: Scalar,
    C: CostFunction<T> + ?Sized,
{
    cost: &'a C,
    config: DescentConfig<T>,
    policy: P,
    position: DVector<T>,
    history: IterationHistory<T>,
    iteration: usize,
    state: DescentState,
    value: T,
    gradient_norm: T,
    previous_gradient: Option<DVector<T>>,
}

impl<'a, T, C> GradientDescent<'a, T, C, StepStrategy<T>>
where
    T: Scalar,
    C: CostFunction<T> + ?Sized,
{
    /// Creates an engine with the policy described by `config`.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` if the configuration is invalid, the start
    /// point is empty or non-finite, or the gradient at the start point does
    /// not have the dimension of the point.
    pub fn new(cost: &'a C, start: DVector<T>, config: DescentConfig<T>) -> Result<Self> {
        let policy = StepStrategy::from_config(&config)?;
        Self::assemble(cost, start, config, policy)
    }
}

impl<'a, T, C, P> GradientDescent<'a, T, C, P>
where
    T: Scalar,
    C: CostFunction<T> + ?Sized,
    P: StepPolicy<T>,
{
    fn assemble(
        cost: &'a C,
        start: DVector<T>,
        config: DescentConfig<T>,
        policy: P,
    ) -> Result<Self> {
        config.validate()?;

        if start.is_empty() {
            return Err(OptimizerError::invalid_configuration(
                "start point must have at least one coordinate",
                "start",
                "[]",
            ));
        }
        if start.iter().any(|x| !<T as Float>::is_finite(*x)) {
            return Err(OptimizerError::invalid_configuration(
                "start point must be finite",
                "start",
                format!("{:?}", start.as_slice()),
            ));
        }

        let gradient = cost.gradient(&start);
        if gradient.len() != start.len() {
            return Err(OptimizerError::invalid_configuration(
                format!(
                    "gradient has {} components for a point of dimension {}",
                    gradient.len(),
                    start.len()
                ),
                "gradient",
                gradient.len().to_string(),
            ));
        }

        Ok(Self {
            cost,
            config,
            policy,
            position: start,
            history: IterationHistory::new(),
            iteration: 0,
            state: DescentState::Running,
            value: <T as Float>::nan(),
            gradient_norm: <T as Float>::nan(),
            previous_gradient: None,
        })
    }

    /// Replaces the step policy.
    ///
    /// Only valid before the first iteration; the configuration keeps
    /// driving the convergence criterion and the iteration ceiling.
    pub fn with_policy<Q>(self, policy: Q) -> GradientDescent<'a, T, C, Q>
    where
        Q: StepPolicy<T>,
    {
        GradientDescent {
            cost: self.cost,
            config: self.config,
            policy,
            position: self.position,
            history: self.history,
            iteration: self.iteration,
            state: self.state,
            value: self.value,
            gradient_norm: self.gradient_norm,
            previous_gradient: self.previous_gradient,
        }
    }

    /// Performs one iteration and returns the resulting state.
    ///
    /// Once the state is no longer `Running` this is a no-op. When the policy
    /// fails, the iterate recorded by this call is removed again and the
    /// engine stays at the same position and iteration.
    pub fn step(&mut self) -> Result<DescentState> {
        if self.state != DescentState::Running {
            return Ok(self.state);
        }

        let (value, gradient) = self.cost.cost_and_gradient(&self.position);
        if gradient.len() != self.position.len() {
            return Err(OptimizerError::dimension_mismatch(
                self.position.len(),
                gradient.len(),
            ));
        }
        if !<T as Float>::is_finite(value) {
            return Err(OptimizerError::numerical_degeneracy(format!(
                "objective is not finite at iteration {}",
                self.iteration
            )));
        }

        let gradient_norm = gradient.norm();
        let direction = self.policy.direction(&gradient);
        self.value = value;
        self.gradient_norm = gradient_norm;

        trace!(
            iteration = self.iteration,
            x = ?self.position.as_slice(),
            value = %value,
            gradient_norm = %gradient_norm,
            direction = ?direction.as_slice()
        );
        self.history.push(IterationRecord::new(
            self.iteration,
            self.position.clone(),
            value,
            Some(direction),
        ));

        if gradient_norm == T::zero()
            || self
                .config
                .criterion
                .is_satisfied(&self.history, gradient_norm, self.config.criterion_eps)
        {
            self.state = DescentState::Converged;
            return Ok(self.state);
        }

        if self.iteration >= self.config.max_iterations {
            warn!(
                max_iterations = self.config.max_iterations,
                gradient_norm = %gradient_norm,
                "gradient descent reached its iteration ceiling"
            );
            self.state = DescentState::MaxIterationsReached;
            return Ok(self.state);
        }

        let state = StepState {
            gradient: &gradient,
            previous_gradient: self.previous_gradient.as_ref(),
            iteration: self.iteration,
        };
        let plan = match self.policy.update_step(self.cost, &mut self.history, &state) {
            Ok(plan) => plan,
            Err(error) => {
                // the iterate is evaluated again on the next call
                self.history.pop();
                return Err(error);
            }
        };
        let next = self.policy.next_position(&plan, &self.history);
        trace!(step = %plan.step, "step chosen");

        self.previous_gradient = Some(gradient);
        self.position = next;
        self.iteration += 1;

        Ok(self.state)
    }

    /// Iterates until the run converges or reaches the iteration ceiling.
    pub fn run(mut self) -> Result<DescentResult<T>> {
        let _span = debug_span!("gradient_descent", policy = self.policy.name()).entered();
        let start = Instant::now();

        while self.step()? == DescentState::Running {}

        let result = DescentResult {
            point: self.position,
            value: self.value,
            gradient_norm: self.gradient_norm,
            iterations: self.iteration,
            state: self.state,
            converged: self.state == DescentState::Converged,
            history: self.history,
            duration: start.elapsed(),
        };

        debug!(
            x = ?result.point.as_slice(),
            value = %result.value,
            iterations = result.iterations,
            state = ?result.state,
            "gradient descent finished"
        );
        Ok(result)
    }

    /// Current position.
    pub fn position(&self) -> &DVector<T> {
        &self.position
    }

    /// Recorded iterates.
    pub fn history(&self) -> &IterationHistory<T> {
        &self.history
    }

    /// Iteration counter.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Current state.
    pub fn state(&self) -> DescentState {
        self.state
    }

    /// Objective value at the last evaluated iterate (NaN before the first step).
    pub fn value(&self) -> T {
        self.value
    }

    /// Gradient norm at the last evaluated iterate (NaN before the first step).
    pub fn gradient_norm(&self) -> T {
        self.gradient_norm
    }

    /// Configuration of the run.
    pub fn config(&self) -> &DescentConfig<T> {
        &self.config
    }

    /// Step policy.
    pub fn policy(&self) -> &P {
        &self.policy
    }
}

/// Minimizes `cost` from `start` with the policy described by `config`.
pub fn minimize<T, C>(cost: &C, start: DVector<T>, config: DescentConfig<T>) -> Result<DescentResult<T>>
where
    T: Scalar,
    C: CostFunction<T> + ?Sized,
{
    GradientDescent::new(cost, start, config)?.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::OneDimMethod, convergence::ConvergenceCriterion, step_policy::ConstantStep};
    use approx::assert_relative_eq;
    use descentopt_core::{
        cost_function::{CountingCostFunction, FnCost, QuadraticCost},
        test_functions::{shifted_quadratic, shifted_quadratic_minimizer},
    };

    fn start() -> DVector<f64> {
        DVector::from_vec(vec![6.0, 4.0])
    }

    #[test]
    fn test_optimal_step_reaches_origin() {
        let cost = QuadraticCost::textbook();
        for method in [OneDimMethod::GoldenSection, OneDimMethod::QuadraticInterpolation] {
            let config = DescentConfig::new().with_one_dim_method(method).with_one_dim_eps(1e-6);
            let result = minimize(&cost, start(), config).unwrap();

            assert!(result.converged);
            assert_eq!(result.state, DescentState::Converged);
            assert!(result.gradient_norm <= 1e-3);
            assert_relative_eq!(result.point.norm(), 0.0, epsilon = 1e-3);
            assert_eq!(result.history.len(), result.iterations + 1);
        }
    }

    #[test]
    fn test_constant_step_reaches_origin() {
        let cost = QuadraticCost::textbook();
        let config = DescentConfig::new().with_constant_step(0.5);
        let result = minimize(&cost, start(), config).unwrap();

        assert!(result.converged);
        assert!(result.gradient_norm <= 1e-3);
        assert_relative_eq!(result.point.norm(), 0.0, epsilon = 1e-3);
    }

    #[test]
    fn test_values_decrease_with_optimal_step() {
        let cost = QuadraticCost::textbook();
        let result = minimize(&cost, start(), DescentConfig::new().with_one_dim_eps(1e-6)).unwrap();

        let values = result.history.values();
        for pair in values.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
    }

    #[test]
    fn test_stationary_start_converges_immediately() {
        let cost = QuadraticCost::<f64>::textbook();
        let result = minimize(&cost, DVector::zeros(2), DescentConfig::new()).unwrap();

        assert_eq!(result.state, DescentState::Converged);
        assert_eq!(result.iterations, 0);
        assert_eq!(result.history.len(), 1);
    }

    #[test]
    fn test_iteration_ceiling() {
        let cost = QuadraticCost::textbook();
        let config = DescentConfig::new()
            .with_constant_step(1e-3)
            .with_max_iterations(5);
        let result = minimize(&cost, start(), config).unwrap();

        assert_eq!(result.state, DescentState::MaxIterationsReached);
        assert!(!result.converged);
        assert_eq!(result.iterations, 5);
        assert_eq!(result.history.len(), 6);
    }

    #[test]
    fn test_step_by_step() {
        let cost = QuadraticCost::textbook();
        let mut engine = GradientDescent::new(&cost, start(), DescentConfig::new()).unwrap();

        assert_eq!(engine.state(), DescentState::Running);
        assert!(engine.value().is_nan());

        assert_eq!(engine.step().unwrap(), DescentState::Running);
        assert_eq!(engine.iteration(), 1);
        assert_eq!(engine.history().len(), 1);
        assert_relative_eq!(engine.value(), 164.0);
        assert!(engine.position()[0] < 6.0);
    }

    #[test]
    fn test_position_and_value_criterion() {
        let cost = shifted_quadratic::<f64>();
        let config = DescentConfig::new()
            .with_criterion(ConvergenceCriterion::PositionAndValue)
            .with_criterion_eps(1e-5)
            .with_one_dim_eps(1e-6);
        let result = minimize(&cost, DVector::zeros(2), config).unwrap();

        assert!(result.converged);
        assert!(result.history.len() >= 2);
        assert_relative_eq!(result.point, shifted_quadratic_minimizer(), epsilon = 1e-3);
    }

    /// Policy whose step selection always fails.
    #[derive(Debug)]
    struct Stalled;

    impl StepPolicy<f64> for Stalled {
        fn name(&self) -> &'static str {
            "stalled"
        }

        fn initial_step(&self) -> Option<f64> {
            None
        }

        fn direction(&self, gradient: &DVector<f64>) -> DVector<f64> {
            -gradient
        }

        fn update_step<C>(
            &mut self,
            _cost: &C,
            _history: &mut IterationHistory<f64>,
            _state: &StepState<'_, f64>,
        ) -> Result<crate::step_policy::StepPlan<f64>>
        where
            C: CostFunction<f64> + ?Sized,
        {
            Err(OptimizerError::numerical_degeneracy("no step available"))
        }
    }

    #[test]
    fn test_failed_step_leaves_no_record() {
        let cost = QuadraticCost::textbook();
        let mut engine = GradientDescent::new(&cost, start(), DescentConfig::new())
            .unwrap()
            .with_policy(Stalled);

        for _ in 0..2 {
            assert!(matches!(engine.step(), Err(OptimizerError::NumericalDegeneracy { .. })));
            assert_eq!(engine.history().len(), 0);
            assert_eq!(engine.iteration(), 0);
            assert_eq!(engine.state(), DescentState::Running);
            assert_eq!(engine.position(), &start());
        }
    }

    #[test]
    fn test_injected_policy() {
        let cost = QuadraticCost::textbook();
        let engine = GradientDescent::new(&cost, start(), DescentConfig::new())
            .unwrap()
            .with_policy(ConstantStep::new(0.25));

        assert_eq!(engine.policy().name(), "constant step");
        let result = engine.run().unwrap();
        assert!(result.converged);
    }

    #[test]
    fn test_numeric_gradient_matches_analytic() {
        let analytic = QuadraticCost::<f64>::textbook();
        let numeric = FnCost::new(|x: &DVector<f64>| 3.0 * x[0] * x[0] + x[0] * x[1] + 2.0 * x[1] * x[1]);

        let config = DescentConfig::new().with_one_dim_eps(1e-6);
        let a = minimize(&analytic, start(), config.clone()).unwrap();
        let b = minimize(&numeric, start(), config).unwrap();

        assert!(b.converged);
        assert_relative_eq!(a.point, b.point, epsilon = 1e-3);
    }

    #[test]
    fn test_construction_errors() {
        let cost = QuadraticCost::<f64>::textbook();

        let bad_gradient = FnCost::new(|x: &DVector<f64>| x.norm_squared())
            .with_gradient(|_: &DVector<f64>| DVector::zeros(3));
        assert!(matches!(
            GradientDescent::new(&bad_gradient, start(), DescentConfig::new()),
            Err(OptimizerError::InvalidConfiguration { .. })
        ));

        assert!(matches!(
            GradientDescent::new(&cost, DVector::zeros(0), DescentConfig::new()),
            Err(OptimizerError::InvalidConfiguration { .. })
        ));

        assert!(matches!(
            GradientDescent::new(&cost, start(), DescentConfig::new().with_criterion_eps(0.0)),
            Err(OptimizerError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_counts_evaluations() {
        let cost = CountingCostFunction::new(QuadraticCost::<f64>::textbook());
        let result = minimize(&cost, start(), DescentConfig::new().with_constant_step(0.5)).unwrap();

        let (_, gradients) = cost.counts();
        // one probe at construction, one per recorded iterate
        assert_eq!(gradients, result.iterations + 2);
    }
}
