//! Stopping rules of the descent engine.

use descentopt_core::{
    error::{OptimizerError, Result},
    history::IterationHistory,
    types::Scalar,
};
use num_traits::Float;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Rule deciding that a descent run has converged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ConvergenceCriterion {
    /// Relative position change and absolute value change between the two
    /// latest iterates are both within tolerance (selector `0`).
    PositionAndValue,

    /// Gradient norm within tolerance (selector `1`).
    #[default]
    GradientNorm,
}

impl ConvergenceCriterion {
    /// Maps the numeric selector `0` or `1`.
    pub fn from_index(index: usize) -> Result<Self> {
        match index {
            0 => Ok(Self::PositionAndValue),
            1 => Ok(Self::GradientNorm),
            other => Err(OptimizerError::invalid_configuration(
                "convergence criterion selector must be 0 or 1",
                "criterion",
                other.to_string(),
            )),
        }
    }

    /// Numeric selector of this criterion.
    pub fn index(&self) -> usize {
        match self {
            Self::PositionAndValue => 0,
            Self::GradientNorm => 1,
        }
    }

    /// Checks the criterion against the history and the current gradient norm.
    ///
    /// `PositionAndValue` needs two records and is never satisfied before
    /// that. The position change is taken relative to `‖x_k‖`, or absolute
    /// when `x_k` is the origin.
    pub fn is_satisfied<T: Scalar>(
        &self,
        history: &IterationHistory<T>,
        gradient_norm: T,
        eps: T,
    ) -> bool {
        match self {
            Self::GradientNorm => gradient_norm <= eps,
            Self::PositionAndValue => {
                let (Some(current), Some(last)) = (history.current(), history.last()) else {
                    return false;
                };

                let step = (&current.position - &last.position).norm();
                let scale = current.position.norm();
                let position_change = if scale == T::zero() { step } else { step / scale };
                let value_change = <T as Float>::abs(current.value - last.value);

                position_change <= eps && value_change <= eps
            }
        }
    }
}
