// src/nn/layers/mod.rs

use crate::device::ComputeDevice;
use crate::error::GradNetError;
use crate::nn::activation::Activation;
use crate::optim::Optimizer;
use crate::tensor::Tensor;
use std::fmt;
use std::str::FromStr;

pub mod dense;
pub mod flatten;

pub use dense::Dense;
pub use flatten::Flatten;

/// The kinds of layer a model can be assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// Shape-only layer collapsing each sample into one vector.
    Flatten,
    /// Fully connected layer with weights, biases and an activation.
    Dense,
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerKind::Flatten => f.write_str("Flatten"),
            LayerKind::Dense => f.write_str("Dense"),
        }
    }
}

impl FromStr for LayerKind {
    type Err = GradNetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "flatten" => Ok(LayerKind::Flatten),
            "dense" => Ok(LayerKind::Dense),
            _ => Err(GradNetError::UnknownKind {
                category: "layer".to_string(),
                name: s.to_string(),
            }),
        }
    }
}

/// Hyper-parameters and optimizer handed to a layer during its backward pass.
pub struct UpdateContext<'a> {
    pub optimizer: &'a mut dyn Optimizer,
    pub lr: f64,
    /// L2 coefficient; the weight gradient gains `l2reg * weights`.
    pub l2reg: f64,
    /// Position of the layer in its model, used to key optimizer state.
    pub layer_index: usize,
}

/// Copy of a layer's configuration and parameters, handed to persistence sinks.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSnapshot {
    pub kind: LayerKind,
    pub input_width: Option<usize>,
    pub size: usize,
    pub activation: Option<Activation>,
    pub weights: Option<Tensor>,
    pub biases: Option<Tensor>,
}

/// A unit of the layer stack.
///
/// `run` performs the training forward pass and caches what the backward pass
/// needs; `update_parameters` consumes that cache, updates any parameters
/// through the optimizer and returns the gradient for the previous layer.
/// `infer` is the read-only forward pass used for prediction.
pub trait Layer: fmt::Debug {
    fn kind(&self) -> LayerKind;

    fn name(&self) -> String {
        self.kind().to_string()
    }

    /// Output width per sample.
    fn size(&self) -> usize;

    /// Declared input width, `None` for layers without a predecessor requirement.
    fn input_width(&self) -> Option<usize>;

    /// Per-sample input shape, for layers that declare one.
    fn input_shape(&self) -> Option<&[usize]> {
        None
    }

    fn activation(&self) -> Option<Activation> {
        None
    }

    /// Training forward pass. Overwrites any previously cached intermediates.
    fn run(&mut self, input: &Tensor, device: &dyn ComputeDevice) -> Result<Tensor, GradNetError>;

    /// Forward pass without caching.
    fn infer(&self, input: &Tensor, device: &dyn ComputeDevice) -> Result<Tensor, GradNetError>;

    /// Backward pass for the most recent `run`.
    ///
    /// # Errors
    /// Returns `GradNetError::BackwardBeforeForward` if there is no cached
    /// forward pass to differentiate.
    fn update_parameters(
        &mut self,
        grad: &Tensor,
        ctx: &mut UpdateContext<'_>,
    ) -> Result<Tensor, GradNetError>;

    fn weights(&self) -> Option<&Tensor> {
        None
    }

    fn biases(&self) -> Option<&Tensor> {
        None
    }

    fn parameter_count(&self) -> usize {
        self.weights().map_or(0, Tensor::numel) + self.biases().map_or(0, Tensor::numel)
    }

    fn snapshot(&self) -> LayerSnapshot {
        LayerSnapshot {
            kind: self.kind(),
            input_width: self.input_width(),
            size: self.size(),
            activation: self.activation(),
            weights: self.weights().cloned(),
            biases: self.biases().cloned(),
        }
    }
}
