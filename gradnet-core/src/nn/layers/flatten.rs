use super::{Layer, LayerKind, UpdateContext};
use crate::device::ComputeDevice;
use crate::error::GradNetError;
use crate::tensor::Tensor;

/// Collapses every non-batch dimension of its input into one.
///
/// Input `[batch, d1, .., dn]` must match the declared shape `[d1, .., dn]`;
/// output is `[batch, d1 * .. * dn]`. Owns no parameters and passes the
/// gradient through unchanged.
#[derive(Debug, Clone)]
pub struct Flatten {
    shape: Vec<usize>,
    size: usize,
    cached_batch: Option<usize>,
}

impl Flatten {
    pub fn new(shape: &[usize]) -> Result<Self, GradNetError> {
        if shape.is_empty() {
            return Err(GradNetError::InvalidHyperParameter {
                name: "flatten rank".to_string(),
                value: 0.0,
            });
        }
        if shape.contains(&0) {
            return Err(GradNetError::InvalidHyperParameter {
                name: "flatten dimension".to_string(),
                value: 0.0,
            });
        }
        Ok(Flatten {
            shape: shape.to_vec(),
            size: shape.iter().product(),
            cached_batch: None,
        })
    }

    /// Declared per-sample shape.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn flatten(&self, input: &Tensor) -> Result<Tensor, GradNetError> {
        let sample_shape = input.shape().get(1..).unwrap_or(&[]);
        if input.rank() == 0 || sample_shape != self.shape.as_slice() {
            return Err(GradNetError::ShapeMismatch {
                expected: self.shape.clone(),
                actual: sample_shape.to_vec(),
                operation: "Flatten forward".to_string(),
            });
        }
        input.reshape(vec![input.shape()[0], self.size])
    }
}

impl Layer for Flatten {
    fn kind(&self) -> LayerKind {
        LayerKind::Flatten
    }

    fn size(&self) -> usize {
        self.size
    }

    fn input_width(&self) -> Option<usize> {
        None
    }

    fn input_shape(&self) -> Option<&[usize]> {
        Some(&self.shape)
    }

    fn run(&mut self, input: &Tensor, _device: &dyn ComputeDevice) -> Result<Tensor, GradNetError> {
        let output = self.flatten(input)?;
        self.cached_batch = Some(output.shape()[0]);
        Ok(output)
    }

    fn infer(&self, input: &Tensor, _device: &dyn ComputeDevice) -> Result<Tensor, GradNetError> {
        self.flatten(input)
    }

    fn update_parameters(
        &mut self,
        grad: &Tensor,
        _ctx: &mut UpdateContext<'_>,
    ) -> Result<Tensor, GradNetError> {
        let batch = self
            .cached_batch
            .take()
            .ok_or_else(|| GradNetError::BackwardBeforeForward {
                layer: "Flatten".to_string(),
            })?;
        if grad.shape() != [batch, self.size] {
            return Err(GradNetError::ShapeMismatch {
                expected: vec![batch, self.size],
                actual: grad.shape().to_vec(),
                operation: "Flatten backward".to_string(),
            });
        }
        Ok(grad.clone())
    }
}

#[cfg(test)]
#[path = "flatten_test.rs"]
mod tests;
