//! Configuration of the gradient-descent engine.

use crate::convergence::ConvergenceCriterion;
use descentopt_core::{
    error::{OptimizerError, Result},
    types::Scalar,
};
use num_traits::Float;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Interval-reduction method used by the optimal-step policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OneDimMethod {
    /// Golden-section search
    #[default]
    GoldenSection,
    /// DSK-Powell quadratic interpolation
    QuadraticInterpolation,
}

/// Modification layered on top of the optimal-step policy.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Modification<T> {
    /// Plain steepest descent
    #[default]
    None,

    /// Step multiplied by a damping factor in `(0, 1)`
    Damped {
        factor: T,
    },

    /// Heavy-ball term `β·(x_k - x_{k-1})` added to each update
    Momentum {
        coefficient: T,
    },

    /// Step `β/(1-β)` with `β = ‖∇f(x_k)‖ / ‖∇f(x_{k-1})‖`
    AdaptiveRatio,
}

/// Configuration for [`GradientDescent`](crate::GradientDescent).
///
/// # Example
///
/// ```
/// use descentopt_optim::{ConvergenceCriterion, DescentConfig, OneDimMethod};
///
/// let config = DescentConfig::<f64>::new()
///     .with_one_dim_method(OneDimMethod::QuadraticInterpolation)
///     .with_one_dim_eps(1e-6)
///     .with_criterion(ConvergenceCriterion::PositionAndValue)
///     .with_criterion_eps(1e-5);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DescentConfig<T> {
    /// Fixed step length; `None` selects the optimal (line search) step
    pub step: Option<T>,

    /// Interval-reduction method of the line search
    pub one_dim_method: OneDimMethod,

    /// Tolerance of the interval reduction
    pub one_dim_eps: T,

    /// Fixed bracketing probe; `None` scales it with the point and direction
    pub sven_step: Option<T>,

    /// Stopping rule
    pub criterion: ConvergenceCriterion,

    /// Tolerance of the stopping rule
    pub criterion_eps: T,

    /// Variant layered on the optimal step
    pub modification: Modification<T>,

    /// Ceiling on descent iterations
    pub max_iterations: usize,
}

impl<T> Default for DescentConfig<T>
where
    T: Scalar,
{
    fn default() -> Self {
        Self {
            step: None,
            one_dim_method: OneDimMethod::default(),
            one_dim_eps: T::DEFAULT_TOLERANCE,
            sven_step: None,
            criterion: ConvergenceCriterion::default(),
            criterion_eps: T::DEFAULT_TOLERANCE,
            modification: Modification::None,
            max_iterations: 200,
        }
    }
}

fn positive_finite<T: Scalar>(value: T, parameter: &str) -> Result<()> {
    if <T as Float>::is_finite(value) && value > T::zero() {
        Ok(())
    } else {
        Err(OptimizerError::invalid_configuration(
            format!("{} must be positive and finite", parameter),
            parameter,
            value.to_string(),
        ))
    }
}

impl<T> DescentConfig<T>
where
    T: Scalar,
{
    /// Creates a new configuration with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a constant step of length `step`.
    pub fn with_constant_step(mut self, step: T) -> Self {
        self.step = Some(step);
        self
    }

    /// Uses the optimal (line search) step.
    pub fn with_optimal_step(mut self) -> Self {
        self.step = None;
        self
    }

    /// Sets the interval-reduction method.
    pub fn with_one_dim_method(mut self, method: OneDimMethod) -> Self {
        self.one_dim_method = method;
        self
    }

    /// Sets the interval-reduction tolerance.
    pub fn with_one_dim_eps(mut self, eps: T) -> Self {
        self.one_dim_eps = eps;
        self
    }

    /// Fixes the bracketing probe step.
    pub fn with_sven_step(mut self, step: T) -> Self {
        self.sven_step = Some(step);
        self
    }

    /// Sets the stopping rule.
    pub fn with_criterion(mut self, criterion: ConvergenceCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Sets the stopping tolerance.
    pub fn with_criterion_eps(mut self, eps: T) -> Self {
        self.criterion_eps = eps;
        self
    }

    /// Sets the modification.
    pub fn with_modification(mut self, modification: Modification<T>) -> Self {
        self.modification = modification;
        self
    }

    /// Multiplies each optimal step by `factor`.
    pub fn with_damping(self, factor: T) -> Self {
        self.with_modification(Modification::Damped { factor })
    }

    /// Adds a heavy-ball term with coefficient `coefficient`.
    pub fn with_momentum(self, coefficient: T) -> Self {
        self.with_modification(Modification::Momentum { coefficient })
    }

    /// Replaces the line search by the gradient-ratio step after the first iteration.
    pub fn with_adaptive_ratio(self) -> Self {
        self.with_modification(Modification::AdaptiveRatio)
    }

    /// Sets the iteration ceiling.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Whether the constant step is selected.
    pub fn is_constant_step(&self) -> bool {
        self.step.is_some()
    }

    /// Checks every parameter.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` naming the first offending parameter.
    pub fn validate(&self) -> Result<()> {
        if let Some(step) = self.step {
            positive_finite(step, "step")?;
        }
        if let Some(sven_step) = self.sven_step {
            positive_finite(sven_step, "sven_step")?;
        }
        positive_finite(self.one_dim_eps, "one_dim_eps")?;
        positive_finite(self.criterion_eps, "criterion_eps")?;

        if self.max_iterations == 0 {
            return Err(OptimizerError::invalid_configuration(
                "max_iterations must be at least 1",
                "max_iterations",
                "0",
            ));
        }

        match self.modification {
            Modification::None => {}
            Modification::Damped { factor } => {
                if !(factor > T::zero() && factor < T::one()) {
                    return Err(OptimizerError::invalid_configuration(
                        "damping factor must lie in (0, 1)",
                        "factor",
                        factor.to_string(),
                    ));
                }
            }
            Modification::Momentum { coefficient } => {
                if !(coefficient >= T::zero() && coefficient < T::one()) {
                    return Err(OptimizerError::invalid_configuration(
                        "momentum coefficient must lie in [0, 1)",
                        "coefficient",
                        coefficient.to_string(),
                    ));
                }
            }
            Modification::AdaptiveRatio => {}
        }

        if self.step.is_some() && self.modification != Modification::None {
            return Err(OptimizerError::invalid_configuration(
                "modifications apply to the optimal step only",
                "modification",
                format!("{:?}", self.modification),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = DescentConfig::<f64>::default();
        assert_eq!(config.step, None);
        assert_eq!(config.one_dim_method, OneDimMethod::GoldenSection);
        assert_eq!(config.one_dim_eps, 1e-3);
        assert_eq!(config.criterion, ConvergenceCriterion::GradientNorm);
        assert_eq!(config.criterion_eps, 1e-3);
        assert_eq!(config.modification, Modification::None);
        assert_eq!(config.max_iterations, 200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = DescentConfig::new()
            .with_constant_step(0.1)
            .with_sven_step(0.01)
            .with_max_iterations(50);
        assert!(config.is_constant_step());
        assert_eq!(config.sven_step, Some(0.01));
        assert_eq!(config.max_iterations, 50);

        let config = config.with_optimal_step().with_momentum(0.3);
        assert!(!config.is_constant_step());
        assert_eq!(config.modification, Modification::Momentum { coefficient: 0.3 });
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let cases = vec![
            (DescentConfig::<f64>::new().with_constant_step(-1.0), "step"),
            (DescentConfig::new().with_constant_step(f64::NAN), "step"),
            (DescentConfig::new().with_one_dim_eps(0.0), "one_dim_eps"),
            (DescentConfig::new().with_criterion_eps(-1e-3), "criterion_eps"),
            (DescentConfig::new().with_sven_step(0.0), "sven_step"),
            (DescentConfig::new().with_max_iterations(0), "max_iterations"),
            (DescentConfig::new().with_damping(1.0), "factor"),
            (DescentConfig::new().with_momentum(1.0), "coefficient"),
            (
                DescentConfig::new().with_constant_step(0.1).with_adaptive_ratio(),
                "modification",
            ),
        ];

        for (config, expected) in cases {
            match config.validate() {
                Err(OptimizerError::InvalidConfiguration { parameter, .. }) => {
                    assert_eq!(parameter, expected)
                }
                other => panic!("expected failure on {}, got {:?}", expected, other),
            }
        }
    }
}
