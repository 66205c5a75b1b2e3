use super::optimizer_trait::{Optimizer, ParamId};
use crate::error::GradNetError;
use crate::tensor::Tensor;
use std::collections::HashMap;

/// Stateless gradient descent: `new_param = param - lr * grad`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SgdOptimizer;

impl SgdOptimizer {
    pub fn new() -> Self {
        SgdOptimizer
    }
}

impl Optimizer for SgdOptimizer {
    fn update(
        &mut self,
        _id: ParamId,
        param: &Tensor,
        grad: &Tensor,
        lr: f64,
    ) -> Result<Tensor, GradNetError> {
        param.zip_map(grad, "sgd update", |p, g| p - lr * g)
    }
}

/// Gradient descent with momentum.
///
/// Keeps one velocity buffer per parameter, created lazily on the first update.
#[derive(Debug, Clone)]
pub struct MomentumOptimizer {
    beta: f64,
    velocities: HashMap<ParamId, Tensor>,
}

impl MomentumOptimizer {
    pub fn new(beta: f64) -> Self {
        MomentumOptimizer {
            beta,
            velocities: HashMap::new(),
        }
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Current velocity for `id`, if any update has been applied to it.
    pub fn velocity(&self, id: ParamId) -> Option<&Tensor> {
        self.velocities.get(&id)
    }
}

impl Optimizer for MomentumOptimizer {
    fn update(
        &mut self,
        id: ParamId,
        param: &Tensor,
        grad: &Tensor,
        lr: f64,
    ) -> Result<Tensor, GradNetError> {
        param.expect_same_shape(grad, "momentum update")?;
        let beta = self.beta;
        let velocity = match self.velocities.remove(&id) {
            Some(v) if v.shape() == grad.shape() => v.zip_map(grad, "momentum velocity", |v, g| beta * v + g)?,
            Some(_) => {
                log::warn!("Velocity shape changed for {:?}; restarting momentum buffer.", id);
                grad.clone()
            }
            None => grad.clone(),
        };
        let updated = param.zip_map(&velocity, "momentum update", |p, v| p - lr * v)?;
        self.velocities.insert(id, velocity);
        Ok(updated)
    }

    fn reset(&mut self) {
        self.velocities.clear();
    }
}
