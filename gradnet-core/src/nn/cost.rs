// gradnet-core/src/nn/cost.rs

use crate::error::GradNetError;
use crate::tensor::Tensor;
use std::fmt;
use std::str::FromStr;

/// Added inside every logarithm and denominator of the cross-entropy cost.
pub const CROSS_ENTROPY_EPSILON: f64 = 1e-12;

/// Cost functions comparing predictions against targets.
///
/// Both methods take the prediction first and the target second, and require
/// identical shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cost {
    /// Mean squared error over every element.
    Mse,
    /// Negative log-likelihood of one-hot (or probability) targets, averaged over samples.
    CrossEntropy,
}

impl Cost {
    /// Scalar loss of `predicted` against `target`.
    pub fn loss(&self, predicted: &Tensor, target: &Tensor) -> Result<f64, GradNetError> {
        predicted.expect_same_shape(target, "cost")?;
        if predicted.numel() == 0 {
            return Err(GradNetError::EmptyInput("cost".to_string()));
        }
        match self {
            Cost::Mse => {
                let diff = predicted.sub(target)?;
                Ok(diff.data().iter().map(|d| d * d).sum::<f64>() / diff.numel() as f64)
            }
            Cost::CrossEntropy => {
                let nll: f64 = predicted
                    .data()
                    .iter()
                    .zip(target.data().iter())
                    .map(|(&p, &t)| -t * (p + CROSS_ENTROPY_EPSILON).ln())
                    .sum();
                Ok(nll / batch_len(predicted) as f64)
            }
        }
    }

    /// Gradient of [`Cost::loss`] with respect to `predicted`.
    pub fn gradient(&self, predicted: &Tensor, target: &Tensor) -> Result<Tensor, GradNetError> {
        predicted.expect_same_shape(target, "cost gradient")?;
        if predicted.numel() == 0 {
            return Err(GradNetError::EmptyInput("cost gradient".to_string()));
        }
        match self {
            Cost::Mse => {
                let scale = 2.0 / predicted.numel() as f64;
                predicted.zip_map(target, "mse gradient", |p, t| scale * (p - t))
            }
            Cost::CrossEntropy => {
                let batch = batch_len(predicted) as f64;
                predicted.zip_map(target, "cross-entropy gradient", |p, t| {
                    -t / ((p + CROSS_ENTROPY_EPSILON) * batch)
                })
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Cost::Mse => "mse",
            Cost::CrossEntropy => "cross_entropy",
        }
    }
}

/// Number of samples: the leading axis of a batch, 1 for a single vector.
fn batch_len(t: &Tensor) -> usize {
    if t.rank() >= 2 {
        t.shape()[0].max(1)
    } else {
        1
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Cost {
    type Err = GradNetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mse" => Ok(Cost::Mse),
            "cross_entropy" | "crossentropy" => Ok(Cost::CrossEntropy),
            _ => Err(GradNetError::UnknownKind {
                category: "cost".to_string(),
                name: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
#[path = "cost_test.rs"]
mod tests;
