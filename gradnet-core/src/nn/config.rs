use crate::error::GradNetError;

/// Hyper-parameters fixed at compile time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HyperParams {
    /// Learning rate handed to the optimizer.
    pub lr: f64,
    /// L2 regularization coefficient.
    pub l2reg: f64,
}

impl Default for HyperParams {
    fn default() -> Self {
        HyperParams {
            lr: 0.001,
            l2reg: 0.0001,
        }
    }
}

impl HyperParams {
    /// Checks that `lr` is finite and positive and `l2reg` finite and non-negative.
    pub fn validate(&self) -> Result<(), GradNetError> {
        if !self.lr.is_finite() || self.lr <= 0.0 {
            return Err(GradNetError::InvalidHyperParameter {
                name: "lr".to_string(),
                value: self.lr,
            });
        }
        if !self.l2reg.is_finite() || self.l2reg < 0.0 {
            return Err(GradNetError::InvalidHyperParameter {
                name: "l2reg".to_string(),
                value: self.l2reg,
            });
        }
        Ok(())
    }
}

/// Training loop settings for [`Model::fit_with`](crate::Model::fit_with).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitConfig {
    pub epochs: usize,
    pub batch_size: usize,
}

impl Default for FitConfig {
    fn default() -> Self {
        FitConfig {
            epochs: 10,
            batch_size: 100,
        }
    }
}
