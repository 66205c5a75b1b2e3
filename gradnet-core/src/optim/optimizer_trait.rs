use super::sgd::{MomentumOptimizer, SgdOptimizer};
use crate::error::GradNetError;
use crate::tensor::Tensor;
use std::fmt;
use std::str::FromStr;

/// Which tensor of a layer a parameter update targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Weights,
    Biases,
}

/// Stable identity of a parameter tensor: its layer position and role.
///
/// State-carrying optimizers key their per-parameter buffers by `ParamId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamId {
    pub layer: usize,
    pub kind: ParamKind,
}

impl ParamId {
    pub fn new(layer: usize, kind: ParamKind) -> Self {
        ParamId { layer, kind }
    }
}

/// Trait defining the common interface for all optimizers.
///
/// An optimizer maps `(parameter, gradient)` to the updated parameter. Layers
/// call it once per parameter tensor during their backward pass and replace
/// their parameter with the returned tensor.
pub trait Optimizer: fmt::Debug {
    /// Computes the updated value of `param` given its gradient.
    ///
    /// # Errors
    /// Returns `GradNetError::ShapeMismatch` if `grad` does not match `param`.
    fn update(
        &mut self,
        id: ParamId,
        param: &Tensor,
        grad: &Tensor,
        lr: f64,
    ) -> Result<Tensor, GradNetError>;

    /// Drops any per-parameter state (e.g. velocity buffers).
    fn reset(&mut self) {}
}

/// Closed set of optimizers selectable at compile time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OptimizerKind {
    /// Plain gradient descent: `param - lr * grad`.
    Sgd,
    /// Gradient descent with a velocity term: `v = beta * v + grad; param - lr * v`.
    Momentum { beta: f64 },
}

impl OptimizerKind {
    /// Instantiates a fresh optimizer of this kind.
    pub fn build(&self) -> Result<Box<dyn Optimizer>, GradNetError> {
        match *self {
            OptimizerKind::Sgd => Ok(Box::new(SgdOptimizer::new())),
            OptimizerKind::Momentum { beta } => {
                if !(0.0..1.0).contains(&beta) {
                    return Err(GradNetError::InvalidHyperParameter {
                        name: "momentum beta".to_string(),
                        value: beta,
                    });
                }
                Ok(Box::new(MomentumOptimizer::new(beta)))
            }
        }
    }
}

impl FromStr for OptimizerKind {
    type Err = GradNetError;

    /// Parses `"sgd"` or `"momentum"` (the latter with `beta = 0.9`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sgd" => Ok(OptimizerKind::Sgd),
            "momentum" => Ok(OptimizerKind::Momentum { beta: 0.9 }),
            _ => Err(GradNetError::UnknownKind {
                category: "optimizer".to_string(),
                name: s.to_string(),
            }),
        }
    }
}
