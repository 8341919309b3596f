//! Step-length policies of the descent engine.
//!
//! A policy turns the gradient into a descent direction, chooses how far to
//! move along it and computes the next position. Two base policies exist:
//!
//! - [`ConstantStep`]: fixed length along the normalized anti-gradient,
//!   halved whenever a step makes the objective worse.
//! - [`OptimalStep`]: exact line search along the anti-gradient.
//!
//! [`Damped`], [`Momentum`] and [`AdaptiveRatio`] wrap another policy and
//! alter its step or its update rule.

use crate::{
    config::{DescentConfig, Modification},
    line_search::{IntervalReducer, LineSearch},
};
use descentopt_core::{
    cost_function::CostFunction,
    error::{OptimizerError, Result},
    history::IterationHistory,
    types::{DVector, Scalar},
};
use std::fmt::Debug;
use tracing::debug;

/// Gradient information available when a step is chosen.
#[derive(Debug, Clone, Copy)]
pub struct StepState<'a, T>
where
    T: Scalar,
{
    /// Gradient at the current position
    pub gradient: &'a DVector<T>,
    /// Gradient at the previous position, if any
    pub previous_gradient: Option<&'a DVector<T>>,
    /// Iteration counter
    pub iteration: usize,
}

/// Step chosen by a policy: move from `origin` by `step` along `direction`.
#[derive(Debug, Clone, PartialEq)]
pub struct StepPlan<T>
where
    T: Scalar,
{
    /// Step length
    pub step: T,
    /// Position the step starts from
    pub origin: DVector<T>,
    /// Direction of the step
    pub direction: DVector<T>,
}

impl<T> StepPlan<T>
where
    T: Scalar,
{
    /// Starts a plan from the most recent history record.
    pub fn from_current(history: &IterationHistory<T>, step: T) -> Result<Self> {
        let record = history.current().ok_or_else(|| {
            OptimizerError::numerical_degeneracy("no iterate recorded to step from")
        })?;
        let direction = record.direction.clone().ok_or_else(|| {
            OptimizerError::numerical_degeneracy(format!(
                "iterate {} has no descent direction",
                record.index
            ))
        })?;

        Ok(Self {
            step,
            origin: record.position.clone(),
            direction,
        })
    }

    /// `origin + step·direction`.
    pub fn target(&self) -> DVector<T> {
        &self.origin + &self.direction * self.step
    }
}

/// Trait for step-length policies.
pub trait StepPolicy<T>: Debug
where
    T: Scalar,
{
    /// Returns the name of the policy.
    fn name(&self) -> &'static str;

    /// Step length used before any update, if the policy has a fixed one.
    fn initial_step(&self) -> Option<T>;

    /// Descent direction for the given gradient.
    fn direction(&self, gradient: &DVector<T>) -> DVector<T>;

    /// Chooses the next step.
    ///
    /// Called after the current iterate has been recorded in `history`.
    /// Implementations may roll the history back.
    fn update_step<C>(
        &mut self,
        cost: &C,
        history: &mut IterationHistory<T>,
        state: &StepState<'_, T>,
    ) -> Result<StepPlan<T>>
    where
        C: CostFunction<T> + ?Sized;

    /// Computes the next position from a plan.
    fn next_position(&mut self, plan: &StepPlan<T>, _history: &IterationHistory<T>) -> DVector<T> {
        plan.target()
    }
}

/// Fixed step along the normalized anti-gradient.
#[derive(Debug, Clone)]
pub struct ConstantStep<T> {
    initial: T,
    step: T,
}

impl<T> ConstantStep<T>
where
    T: Scalar,
{
    /// Creates the policy with step length `step`.
    pub fn new(step: T) -> Self {
        Self {
            initial: step,
            step,
        }
    }

    /// Current step length.
    pub fn step(&self) -> T {
        self.step
    }
}

impl<T> StepPolicy<T> for ConstantStep<T>
where
    T: Scalar,
{
    fn name(&self) -> &'static str {
        "constant step"
    }

    fn initial_step(&self) -> Option<T> {
        Some(self.initial)
    }

    fn direction(&self, gradient: &DVector<T>) -> DVector<T> {
        let norm = gradient.norm();
        if norm == T::zero() {
            return DVector::zeros(gradient.len());
        }
        -gradient / norm
    }

    /// Halves the step and discards the newest iterate when it is worse than
    /// the one before; the step is then retried from the restored iterate.
    fn update_step<C>(
        &mut self,
        _cost: &C,
        history: &mut IterationHistory<T>,
        _state: &StepState<'_, T>,
    ) -> Result<StepPlan<T>>
    where
        C: CostFunction<T> + ?Sized,
    {
        let worse = match (history.current(), history.last()) {
            (Some(current), Some(last)) => current.value > last.value,
            _ => false,
        };

        if worse {
            if let Some(discarded) = history.pop() {
                debug!(
                    index = discarded.index,
                    value = %discarded.value,
                    "step increased the objective, rolling back"
                );
            }
            self.step = self.step * <T as Scalar>::from_f64(0.5);
        }

        StepPlan::from_current(history, self.step)
    }
}

/// Line search along the anti-gradient.
#[derive(Debug, Clone)]
pub struct OptimalStep<T> {
    search: LineSearch<T>,
}

impl<T> OptimalStep<T>
where
    T: Scalar,
{
    /// Creates the policy around a line search.
    pub fn new(search: LineSearch<T>) -> Self {
        Self { search }
    }

    /// Line search used by the policy.
    pub fn line_search(&self) -> &LineSearch<T> {
        &self.search
    }
}

impl<T> StepPolicy<T> for OptimalStep<T>
where
    T: Scalar,
{
    fn name(&self) -> &'static str {
        "optimal step"
    }

    fn initial_step(&self) -> Option<T> {
        None
    }

    fn direction(&self, gradient: &DVector<T>) -> DVector<T> {
        -gradient
    }

    fn update_step<C>(
        &mut self,
        cost: &C,
        history: &mut IterationHistory<T>,
        _state: &StepState<'_, T>,
    ) -> Result<StepPlan<T>>
    where
        C: CostFunction<T> + ?Sized,
    {
        let mut plan = StepPlan::from_current(history, T::zero())?;
        plan.step = self.search.search(cost, &plan.origin, &plan.direction)?.step;
        Ok(plan)
    }
}

/// Multiplies every step of the inner policy by a factor.
#[derive(Debug, Clone)]
pub struct Damped<P, T> {
    inner: P,
    factor: T,
}

impl<P, T> Damped<P, T> {
    /// Wraps `inner` with damping `factor`.
    pub fn new(inner: P, factor: T) -> Self {
        Self { inner, factor }
    }
}

impl<P, T> StepPolicy<T> for Damped<P, T>
where
    T: Scalar,
    P: StepPolicy<T>,
{
    fn name(&self) -> &'static str {
        "damped step"
    }

    fn initial_step(&self) -> Option<T> {
        self.inner.initial_step().map(|s| s * self.factor)
    }

    fn direction(&self, gradient: &DVector<T>) -> DVector<T> {
        self.inner.direction(gradient)
    }

    fn update_step<C>(
        &mut self,
        cost: &C,
        history: &mut IterationHistory<T>,
        state: &StepState<'_, T>,
    ) -> Result<StepPlan<T>>
    where
        C: CostFunction<T> + ?Sized,
    {
        let mut plan = self.inner.update_step(cost, history, state)?;
        plan.step = plan.step * self.factor;
        Ok(plan)
    }

    fn next_position(&mut self, plan: &StepPlan<T>, history: &IterationHistory<T>) -> DVector<T> {
        self.inner.next_position(plan, history)
    }
}

/// Adds the heavy-ball term `β·(x_k - x_{k-1})` to the inner update.
#[derive(Debug, Clone)]
pub struct Momentum<P, T> {
    inner: P,
    coefficient: T,
}

impl<P, T> Momentum<P, T> {
    /// Wraps `inner` with momentum `coefficient`.
    pub fn new(inner: P, coefficient: T) -> Self {
        Self { inner, coefficient }
    }
}

impl<P, T> StepPolicy<T> for Momentum<P, T>
where
    T: Scalar,
    P: StepPolicy<T>,
{
    fn name(&self) -> &'static str {
        "momentum"
    }

    fn initial_step(&self) -> Option<T> {
        self.inner.initial_step()
    }

    fn direction(&self, gradient: &DVector<T>) -> DVector<T> {
        self.inner.direction(gradient)
    }

    fn update_step<C>(
        &mut self,
        cost: &C,
        history: &mut IterationHistory<T>,
        state: &StepState<'_, T>,
    ) -> Result<StepPlan<T>>
    where
        C: CostFunction<T> + ?Sized,
    {
        self.inner.update_step(cost, history, state)
    }

    /// `x_k + α·d_k - β·(x_{k-1} - x_k)`; plain update on the first iteration.
    fn next_position(&mut self, plan: &StepPlan<T>, history: &IterationHistory<T>) -> DVector<T> {
        let next = self.inner.next_position(plan, history);
        match history.last() {
            Some(previous) => next - (&previous.position - &plan.origin) * self.coefficient,
            None => next,
        }
    }
}

/// Replaces the inner step by `β/(1-β)`, `β = ‖∇f(x_k)‖ / ‖∇f(x_{k-1})‖`.
///
/// The inner policy still chooses the step on the first iteration and
/// whenever `β >= 1`, where the ratio has no positive value.
#[derive(Debug, Clone)]
pub struct AdaptiveRatio<P> {
    inner: P,
}

impl<P> AdaptiveRatio<P> {
    /// Wraps `inner`.
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

impl<P, T> StepPolicy<T> for AdaptiveRatio<P>
where
    T: Scalar,
    P: StepPolicy<T>,
{
    fn name(&self) -> &'static str {
        "adaptive ratio"
    }

    fn initial_step(&self) -> Option<T> {
        self.inner.initial_step()
    }

    fn direction(&self, gradient: &DVector<T>) -> DVector<T> {
        self.inner.direction(gradient)
    }

    fn update_step<C>(
        &mut self,
        cost: &C,
        history: &mut IterationHistory<T>,
        state: &StepState<'_, T>,
    ) -> Result<StepPlan<T>>
    where
        C: CostFunction<T> + ?Sized,
    {
        if let Some(previous) = state.previous_gradient {
            let previous_norm = previous.norm();
            if previous_norm > T::zero() {
                let beta = state.gradient.norm() / previous_norm;
                if beta < T::one() {
                    return StepPlan::from_current(history, beta / (T::one() - beta));
                }
                debug!(beta = %beta, "gradient norm did not shrink, using the inner step");
            }
        }
        self.inner.update_step(cost, history, state)
    }

    fn next_position(&mut self, plan: &StepPlan<T>, history: &IterationHistory<T>) -> DVector<T> {
        self.inner.next_position(plan, history)
    }
}

/// Policy built from a [`DescentConfig`].
#[derive(Debug, Clone)]
pub enum StepStrategy<T> {
    /// Fixed step with halving
    Constant(ConstantStep<T>),
    /// Line search
    Optimal(OptimalStep<T>),
    /// Damped line search
    Damped(Damped<OptimalStep<T>, T>),
    /// Line search with heavy-ball term
    Momentum(Momentum<OptimalStep<T>, T>),
    /// Gradient-ratio step after the first iteration
    AdaptiveRatio(AdaptiveRatio<OptimalStep<T>>),
}

impl<T> StepStrategy<T>
where
    T: Scalar,
{
    /// Builds the policy described by `config`.
    pub fn from_config(config: &DescentConfig<T>) -> Result<Self> {
        config.validate()?;

        if let Some(step) = config.step {
            return Ok(Self::Constant(ConstantStep::new(step)));
        }

        let mut search = LineSearch::new(IntervalReducer::from_method(
            config.one_dim_method,
            config.one_dim_eps,
        ));
        if let Some(probe) = config.sven_step {
            search = search.with_probe(probe);
        }
        let optimal = OptimalStep::new(search);

        Ok(match config.modification {
            Modification::None => Self::Optimal(optimal),
            Modification::Damped { factor } => Self::Damped(Damped::new(optimal, factor)),
            Modification::Momentum { coefficient } => {
                Self::Momentum(Momentum::new(optimal, coefficient))
            }
            Modification::AdaptiveRatio => Self::AdaptiveRatio(AdaptiveRatio::new(optimal)),
        })
    }
}

impl<T> StepPolicy<T> for StepStrategy<T>
where
    T: Scalar,
{
    fn name(&self) -> &'static str {
        match self {
            Self::Constant(p) => p.name(),
            Self::Optimal(p) => p.name(),
            Self::Damped(p) => p.name(),
            Self::Momentum(p) => p.name(),
            Self::AdaptiveRatio(p) => p.name(),
        }
    }

    fn initial_step(&self) -> Option<T> {
        match self {
            Self::Constant(p) => p.initial_step(),
            Self::Optimal(p) => p.initial_step(),
            Self::Damped(p) => p.initial_step(),
            Self::Momentum(p) => p.initial_step(),
            Self::AdaptiveRatio(p) => p.initial_step(),
        }
    }

    fn direction(&self, gradient: &DVector<T>) -> DVector<T> {
        match self {
            Self::Constant(p) => p.direction(gradient),
            Self::Optimal(p) => p.direction(gradient),
            Self::Damped(p) => p.direction(gradient),
            Self::Momentum(p) => p.direction(gradient),
            Self::AdaptiveRatio(p) => p.direction(gradient),
        }
    }

    fn update_step<C>(
        &mut self,
        cost: &C,
        history: &mut IterationHistory<T>,
        state: &StepState<'_, T>,
    ) -> Result<StepPlan<T>>
    where
        C: CostFunction<T> + ?Sized,
    {
        match self {
            Self::Constant(p) => p.update_step(cost, history, state),
            Self::Optimal(p) => p.update_step(cost, history, state),
            Self::Damped(p) => p.update_step(cost, history, state),
            Self::Momentum(p) => p.update_step(cost, history, state),
            Self::AdaptiveRatio(p) => p.update_step(cost, history, state),
        }
    }

    fn next_position(&mut self, plan: &StepPlan<T>, history: &IterationHistory<T>) -> DVector<T> {
        match self {
            Self::Constant(p) => p.next_position(plan, history),
            Self::Optimal(p) => p.next_position(plan, history),
            Self::Damped(p) => p.next_position(plan, history),
            Self::Momentum(p) => p.next_position(plan, history),
            Self::AdaptiveRatio(p) => p.next_position(plan, history),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::golden_section::GoldenSection;
    use approx::assert_relative_eq;
    use descentopt_core::{cost_function::QuadraticCost, history::IterationRecord};

    fn record(index: usize, x: [f64; 2], value: f64, direction: [f64; 2]) -> IterationRecord<f64> {
        IterationRecord::new(
            index,
            DVector::from_vec(x.to_vec()),
            value,
            Some(DVector::from_vec(direction.to_vec())),
        )
    }

    fn optimal() -> OptimalStep<f64> {
        OptimalStep::new(LineSearch::new(IntervalReducer::GoldenSection(
            GoldenSection::new(1e-8),
        )))
    }

    #[test]
    fn test_constant_direction_is_normalized() {
        let policy = ConstantStep::new(0.5);
        let d = policy.direction(&DVector::from_vec(vec![3.0, -4.0]));
        assert_relative_eq!(d, DVector::from_vec(vec![-0.6, 0.8]));
        assert_eq!(policy.direction(&DVector::zeros(2)), DVector::zeros(2));
    }

    #[test]
    fn test_constant_step_keeps_length_on_progress() {
        let cost = QuadraticCost::<f64>::simple(2);
        let mut history = IterationHistory::new();
        history.push(record(0, [1.0, 0.0], 0.5, [-1.0, 0.0]));
        history.push(record(1, [0.5, 0.0], 0.125, [-1.0, 0.0]));

        let gradient = DVector::from_vec(vec![0.5, 0.0]);
        let state = StepState { gradient: &gradient, previous_gradient: None, iteration: 1 };

        let mut policy = ConstantStep::new(0.5);
        let plan = policy.update_step(&cost, &mut history, &state).unwrap();
        assert_eq!(plan.step, 0.5);
        assert_eq!(history.len(), 2);
        assert_relative_eq!(policy.next_position(&plan, &history)[0], 0.0);
    }

    #[test]
    fn test_constant_step_rolls_back_and_halves() {
        let cost = QuadraticCost::<f64>::simple(2);
        let mut history = IterationHistory::new();
        history.push(record(0, [0.2, 0.0], 0.02, [-1.0, 0.0]));
        history.push(record(1, [-0.8, 0.0], 0.32, [1.0, 0.0]));

        let gradient = DVector::from_vec(vec![-0.8, 0.0]);
        let state = StepState { gradient: &gradient, previous_gradient: None, iteration: 1 };

        let mut policy = ConstantStep::new(1.0);
        let plan = policy.update_step(&cost, &mut history, &state).unwrap();

        assert_eq!(policy.step(), 0.5);
        assert_eq!(policy.initial_step(), Some(1.0));
        assert_eq!(history.len(), 1);
        // retried from the restored iterate along its own direction
        assert_relative_eq!(plan.target(), DVector::from_vec(vec![-0.3, 0.0]));
    }

    #[test]
    fn test_optimal_step_is_exact_on_quadratic() {
        let cost = QuadraticCost::<f64>::simple(2);
        let mut history = IterationHistory::new();
        // -∇f at (2, -1) is (-2, 1); the exact step is 1
        history.push(record(0, [2.0, -1.0], 2.5, [-2.0, 1.0]));

        let gradient = DVector::from_vec(vec![2.0, -1.0]);
        let state = StepState { gradient: &gradient, previous_gradient: None, iteration: 0 };

        let mut policy = optimal();
        let plan = policy.update_step(&cost, &mut history, &state).unwrap();
        assert_relative_eq!(plan.step, 1.0, epsilon = 1e-7);
        assert_relative_eq!(policy.next_position(&plan, &history).norm(), 0.0, epsilon = 1e-7);
    }

    #[test]
    fn test_damped_scales_step() {
        let cost = QuadraticCost::<f64>::simple(2);
        let mut history = IterationHistory::new();
        history.push(record(0, [2.0, -1.0], 2.5, [-2.0, 1.0]));

        let gradient = DVector::from_vec(vec![2.0, -1.0]);
        let state = StepState { gradient: &gradient, previous_gradient: None, iteration: 0 };

        let mut policy = Damped::new(optimal(), 0.5);
        let plan = policy.update_step(&cost, &mut history, &state).unwrap();
        assert_relative_eq!(plan.step, 0.5, epsilon = 1e-7);
        assert_eq!(policy.name(), "damped step");
    }

    #[test]
    fn test_momentum_adds_previous_displacement() {
        let mut history = IterationHistory::new();
        history.push(record(0, [0.0, 0.0], 1.0, [1.0, 0.0]));
        history.push(record(1, [1.0, 0.0], 0.5, [1.0, 0.0]));

        let plan = StepPlan {
            step: 1.0,
            origin: DVector::from_vec(vec![1.0, 0.0]),
            direction: DVector::from_vec(vec![1.0, 0.0]),
        };

        let mut policy = Momentum::new(ConstantStep::new(1.0), 0.5);
        // 1 + 1 - 0.5·(0 - 1) = 2.5
        assert_relative_eq!(policy.next_position(&plan, &history)[0], 2.5);

        history.pop();
        let plan = StepPlan { origin: DVector::zeros(2), ..plan };
        assert_relative_eq!(policy.next_position(&plan, &history)[0], 1.0);
    }

    #[test]
    fn test_adaptive_ratio() {
        let cost = QuadraticCost::<f64>::simple(2);
        let mut history = IterationHistory::new();
        history.push(record(0, [2.0, -1.0], 2.5, [-2.0, 1.0]));

        let gradient = DVector::from_vec(vec![2.0, -1.0]);
        let mut policy = AdaptiveRatio::new(optimal());

        // no previous gradient: line search
        let state = StepState { gradient: &gradient, previous_gradient: None, iteration: 0 };
        let plan = policy.update_step(&cost, &mut history, &state).unwrap();
        assert_relative_eq!(plan.step, 1.0, epsilon = 1e-7);

        // β = 0.25 -> step 1/3
        let previous = &gradient * 4.0;
        let state = StepState { gradient: &gradient, previous_gradient: Some(&previous), iteration: 1 };
        let plan = policy.update_step(&cost, &mut history, &state).unwrap();
        assert_relative_eq!(plan.step, 1.0 / 3.0, epsilon = 1e-12);

        // β = 2: back to the line search
        let previous = &gradient * 0.5;
        let state = StepState { gradient: &gradient, previous_gradient: Some(&previous), iteration: 1 };
        let plan = policy.update_step(&cost, &mut history, &state).unwrap();
        assert_relative_eq!(plan.step, 1.0, epsilon = 1e-7);
    }

    #[test]
    fn test_strategy_from_config() {
        let constant = StepStrategy::from_config(&DescentConfig::new().with_constant_step(0.1)).unwrap();
        assert!(matches!(constant, StepStrategy::Constant(_)));
        assert_eq!(constant.initial_step(), Some(0.1));

        let damped = StepStrategy::<f64>::from_config(&DescentConfig::new().with_damping(0.5)).unwrap();
        assert_eq!(damped.name(), "damped step");

        let adaptive = StepStrategy::<f64>::from_config(&DescentConfig::new().with_adaptive_ratio()).unwrap();
        assert!(matches!(adaptive, StepStrategy::AdaptiveRatio(_)));

        assert!(StepStrategy::<f64>::from_config(&DescentConfig::new().with_momentum(2.0)).is_err());
    }

    #[test]
    fn test_missing_record_is_an_error() {
        let cost = QuadraticCost::<f64>::simple(2);
        let mut history = IterationHistory::new();
        let gradient = DVector::from_vec(vec![1.0, 0.0]);
        let state = StepState { gradient: &gradient, previous_gradient: None, iteration: 0 };

        let result = ConstantStep::new(0.1).update_step(&cost, &mut history, &state);
        assert!(matches!(result, Err(OptimizerError::NumericalDegeneracy { .. })));
    }
}
