use super::{Layer, LayerKind, UpdateContext};
use crate::device::ComputeDevice;
use crate::error::GradNetError;
use crate::nn::activation::Activation;
use crate::optim::{ParamId, ParamKind};
use crate::tensor::Tensor;
use rand::Rng;

/// Bound applied to every element of the backward delta.
pub const DELTA_CLIP: f64 = 1.0;

/// Intermediates of the last training forward pass.
#[derive(Debug, Clone)]
struct DenseCache {
    input: Tensor,
    pre_activation: Tensor,
    output: Tensor,
}

/// Fully connected layer: `a = act(x · Wᵀ + b)`.
///
/// Weights have shape `[output_width, input_width]`, biases `[output_width]`.
/// Inputs are batched as `[batch, input_width]`.
#[derive(Debug, Clone)]
pub struct Dense {
    weights: Tensor,
    biases: Tensor,
    activation: Activation,
    cache: Option<DenseCache>,
}

impl Dense {
    /// Creates a layer of shape `(output_width, input_width)` with weights and
    /// biases drawn uniformly from `[-√(2/input_width), √(2/input_width)]`.
    pub fn new<R: Rng + ?Sized>(
        shape: (usize, usize),
        activation: Activation,
        rng: &mut R,
    ) -> Result<Self, GradNetError> {
        let (output_width, input_width) = shape;
        for (name, width) in [("output_width", output_width), ("input_width", input_width)] {
            if width == 0 {
                return Err(GradNetError::InvalidHyperParameter {
                    name: name.to_string(),
                    value: 0.0,
                });
            }
        }
        let limit = (2.0 / input_width as f64).sqrt();
        let weights = Tensor::rand_uniform(&[output_width, input_width], -limit, limit, rng)?;
        let biases = Tensor::rand_uniform(&[output_width], -limit, limit, rng)?;
        Ok(Dense {
            weights,
            biases,
            activation,
            cache: None,
        })
    }

    /// Creates a layer from fixed parameters.
    pub fn from_parameters(
        weights: Tensor,
        biases: Tensor,
        activation: Activation,
    ) -> Result<Self, GradNetError> {
        let (output_width, _) = weights.dims2("Dense weights")?;
        if biases.shape() != [output_width] {
            return Err(GradNetError::ShapeMismatch {
                expected: vec![output_width],
                actual: biases.shape().to_vec(),
                operation: "Dense biases".to_string(),
            });
        }
        Ok(Dense {
            weights,
            biases,
            activation,
            cache: None,
        })
    }

    fn input_dim(&self) -> usize {
        self.weights.shape()[1]
    }

    fn output_dim(&self) -> usize {
        self.weights.shape()[0]
    }

    /// Computes `(pre_activation, output)` for a batch.
    fn forward_parts(
        &self,
        input: &Tensor,
        device: &dyn ComputeDevice,
    ) -> Result<(Tensor, Tensor), GradNetError> {
        if input.rank() != 2 || input.shape()[1] != self.input_dim() {
            return Err(GradNetError::ShapeMismatch {
                expected: vec![input.shape().first().copied().unwrap_or(0), self.input_dim()],
                actual: input.shape().to_vec(),
                operation: "Dense forward".to_string(),
            });
        }
        let mut z = device.matmul(input, &self.weights.transpose()?)?;
        let width = self.output_dim();
        let bias = self.biases.data();
        for (i, v) in z.data.iter_mut().enumerate() {
            *v += bias[i % width];
        }
        let a = device.activate(self.activation, &z)?;
        Ok((z, a))
    }
}

impl Layer for Dense {
    fn kind(&self) -> LayerKind {
        LayerKind::Dense
    }

    fn size(&self) -> usize {
        self.output_dim()
    }

    fn input_width(&self) -> Option<usize> {
        Some(self.input_dim())
    }

    fn activation(&self) -> Option<Activation> {
        Some(self.activation)
    }

    fn run(&mut self, input: &Tensor, device: &dyn ComputeDevice) -> Result<Tensor, GradNetError> {
        let (pre_activation, output) = self.forward_parts(input, device)?;
        self.cache = Some(DenseCache {
            input: input.clone(),
            pre_activation,
            output: output.clone(),
        });
        Ok(output)
    }

    fn infer(&self, input: &Tensor, device: &dyn ComputeDevice) -> Result<Tensor, GradNetError> {
        self.forward_parts(input, device).map(|(_, a)| a)
    }

    fn update_parameters(
        &mut self,
        grad: &Tensor,
        ctx: &mut UpdateContext<'_>,
    ) -> Result<Tensor, GradNetError> {
        let cache = self
            .cache
            .take()
            .ok_or_else(|| GradNetError::BackwardBeforeForward {
                layer: format!("Dense #{}", ctx.layer_index),
            })?;
        cache.output.expect_same_shape(grad, "Dense backward")?;

        let raw_delta = self.activation.backward(&cache.pre_activation, grad)?;
        let peak = raw_delta.max_abs();
        if peak > DELTA_CLIP {
            log::warn!(
                "Dense #{}: delta peak {:.4} clipped to ±{}",
                ctx.layer_index,
                peak,
                DELTA_CLIP
            );
        }
        let delta = raw_delta.clip(-DELTA_CLIP, DELTA_CLIP);

        let mut weight_grad = delta.transpose()?.matmul(&cache.input)?;
        if ctx.l2reg > 0.0 {
            weight_grad.add_assign(&self.weights.scale(ctx.l2reg))?;
        }
        let bias_grad = delta.sum_rows()?;
        let downstream = delta.matmul(&self.weights)?;

        self.weights = ctx.optimizer.update(
            ParamId::new(ctx.layer_index, ParamKind::Weights),
            &self.weights,
            &weight_grad,
            ctx.lr,
        )?;
        self.biases = ctx.optimizer.update(
            ParamId::new(ctx.layer_index, ParamKind::Biases),
            &self.biases,
            &bias_grad,
            ctx.lr,
        )?;
        Ok(downstream)
    }

    fn weights(&self) -> Option<&Tensor> {
        Some(&self.weights)
    }

    fn biases(&self) -> Option<&Tensor> {
        Some(&self.biases)
    }
}

#[cfg(test)]
#[path = "dense_test.rs"]
mod tests;
