use super::activation::Activation;
use super::config::{FitConfig, HyperParams};
use super::cost::Cost;
use super::layers::{Dense, Flatten, Layer, LayerKind, LayerSnapshot, UpdateContext};
use crate::device::{ComputeDevice, CpuDevice, DeviceKind};
use crate::error::GradNetError;
use crate::optim::{Optimizer, OptimizerKind};
use crate::tensor::Tensor;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;

/// Everything a persistence sink needs to store a model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSnapshot {
    /// Per-sample input shape, known once the model is compiled.
    pub input_shape: Option<Vec<usize>>,
    pub cost: Option<Cost>,
    pub hyper_params: Option<HyperParams>,
    pub layers: Vec<LayerSnapshot>,
}

/// Storage backend for [`Model::save`]. The on-disk format is up to the sink.
pub trait ModelSink {
    fn write(&mut self, path: &Path, snapshot: &ModelSnapshot) -> Result<(), GradNetError>;
}

#[derive(Debug)]
struct Compiled {
    input_shape: Vec<usize>,
    cost: Cost,
    optimizer: Box<dyn Optimizer>,
    params: HyperParams,
}

/// An ordered stack of layers plus the cost, optimizer and hyper-parameters
/// used to train it.
///
/// The first layer is always a [`Flatten`]; each following layer's input
/// width equals its predecessor's output width.
#[derive(Debug)]
pub struct Model {
    layers: Vec<Box<dyn Layer>>,
    compiled: Option<Compiled>,
    device: Box<dyn ComputeDevice>,
    rng: StdRng,
}

impl Default for Model {
    fn default() -> Self {
        Model::new()
    }
}

impl Model {
    /// Empty model whose parameter initialization is seeded from system entropy.
    pub fn new() -> Self {
        Model::from_rng(StdRng::from_entropy())
    }

    /// Empty model with reproducible parameter initialization.
    pub fn with_seed(seed: u64) -> Self {
        Model::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Model {
            layers: Vec::new(),
            compiled: None,
            device: Box::new(CpuDevice),
            rng,
        }
    }

    /// Appends a layer built from its kind.
    ///
    /// For `Flatten`, `shape` is the per-sample input shape and `activation`
    /// must be `None`. For `Dense`, `shape` is `[output_width]` (input width
    /// taken from the previous layer) or `[output_width, input_width]`, and
    /// an activation is required.
    pub fn add(
        &mut self,
        kind: LayerKind,
        shape: &[usize],
        activation: Option<Activation>,
    ) -> Result<(), GradNetError> {
        let layer: Box<dyn Layer> = match kind {
            LayerKind::Flatten => {
                if activation.is_some() {
                    return Err(GradNetError::InvalidLayerOrder(
                        "Flatten takes no activation".to_string(),
                    ));
                }
                self.check_append(kind, None)?;
                Box::new(Flatten::new(shape)?)
            }
            LayerKind::Dense => {
                let previous = self.layers.last().map(|l| l.size()).ok_or_else(|| {
                    GradNetError::InvalidLayerOrder(
                        "a Flatten layer must be added before any Dense layer".to_string(),
                    )
                })?;
                let activation = activation.ok_or_else(|| {
                    GradNetError::InvalidLayerOrder("Dense requires an activation".to_string())
                })?;
                let dims = match *shape {
                    [output] => (output, previous),
                    [output, input] => (output, input),
                    _ => {
                        return Err(GradNetError::ShapeMismatch {
                            expected: vec![shape.first().copied().unwrap_or(0)],
                            actual: shape.to_vec(),
                            operation: "Dense layer shape".to_string(),
                        })
                    }
                };
                // Reject before drawing from the rng so a failed add leaves
                // later initializations unchanged.
                self.check_append(kind, Some(dims.1))?;
                Box::new(Dense::new(dims, activation, &mut self.rng)?)
            }
        };
        self.add_layer(layer)
    }

    /// Appends a pre-built layer, enforcing ordering and width chaining.
    pub fn add_layer(&mut self, layer: Box<dyn Layer>) -> Result<(), GradNetError> {
        self.check_append(layer.kind(), layer.input_width())?;
        debug!(
            "Added layer #{}: {} ({:?} -> {})",
            self.layers.len(),
            layer.name(),
            layer.input_width(),
            layer.size()
        );
        self.layers.push(layer);
        Ok(())
    }

    /// Checks that a layer of `kind` declaring `input_width` may be appended next.
    fn check_append(&self, kind: LayerKind, input_width: Option<usize>) -> Result<(), GradNetError> {
        if self.compiled.is_some() {
            return Err(GradNetError::InvalidLayerOrder(
                "layers cannot be added after compile".to_string(),
            ));
        }
        match (kind, self.layers.last()) {
            (LayerKind::Flatten, Some(_)) => Err(GradNetError::InvalidLayerOrder(
                "Flatten must be the first and only reshape layer".to_string(),
            )),
            (LayerKind::Dense, None) => Err(GradNetError::InvalidLayerOrder(
                "a Flatten layer must be added before any Dense layer".to_string(),
            )),
            (_, Some(previous)) => match input_width {
                Some(width) if width != previous.size() => Err(GradNetError::WidthMismatch {
                    layer: format!("{} #{}", kind, self.layers.len()),
                    expected: previous.size(),
                    actual: width,
                }),
                _ => Ok(()),
            },
            (LayerKind::Flatten, None) => Ok(()),
        }
    }

    /// Finalizes cost, optimizer and hyper-parameters.
    pub fn compile(
        &mut self,
        input_shape: &[usize],
        cost: Cost,
        optimizer: OptimizerKind,
        lr: f64,
        l2reg: f64,
    ) -> Result<(), GradNetError> {
        self.compile_with(input_shape, cost, optimizer, HyperParams { lr, l2reg })
    }

    pub fn compile_with(
        &mut self,
        input_shape: &[usize],
        cost: Cost,
        optimizer: OptimizerKind,
        params: HyperParams,
    ) -> Result<(), GradNetError> {
        let first = self.layers.first().ok_or_else(|| {
            GradNetError::InvalidLayerOrder("cannot compile a model without layers".to_string())
        })?;
        let declared = first.input_shape().unwrap_or(&[]);
        if input_shape != declared {
            return Err(GradNetError::ShapeMismatch {
                expected: declared.to_vec(),
                actual: input_shape.to_vec(),
                operation: "compile input shape".to_string(),
            });
        }
        params.validate()?;
        let optimizer_impl = optimizer.build()?;
        debug!(
            "Compiled model: input {:?}, cost {}, optimizer {:?}, lr {}, l2reg {}",
            input_shape, cost, optimizer, params.lr, params.l2reg
        );
        self.compiled = Some(Compiled {
            input_shape: input_shape.to_vec(),
            cost,
            optimizer: optimizer_impl,
            params,
        });
        Ok(())
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled.is_some()
    }

    pub fn layers(&self) -> &[Box<dyn Layer>] {
        &self.layers
    }

    /// Output width of the last layer.
    pub fn output_size(&self) -> Result<usize, GradNetError> {
        self.layers
            .last()
            .map(|l| l.size())
            .ok_or_else(|| GradNetError::InvalidLayerOrder("model has no layers".to_string()))
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(|l| l.parameter_count()).sum()
    }

    pub fn set_device(&mut self, device: Box<dyn ComputeDevice>) {
        debug!("Model device set to {:?}", device.kind());
        self.device = device;
    }

    pub fn device_kind(&self) -> DeviceKind {
        self.device.kind()
    }

    fn compiled(&self, operation: &str) -> Result<&Compiled, GradNetError> {
        self.compiled
            .as_ref()
            .ok_or_else(|| GradNetError::NotCompiled(operation.to_string()))
    }

    /// Encodes integer labels as rows of width [`Model::output_size`].
    pub fn one_hot(&self, labels: &[usize]) -> Result<Tensor, GradNetError> {
        let classes = self.output_size()?;
        let mut targets = Tensor::zeros(&[labels.len(), classes]);
        for (row, &label) in labels.iter().enumerate() {
            if label >= classes {
                return Err(GradNetError::LabelOutOfRange { label, classes });
            }
            targets.set(row, label, 1.0)?;
        }
        Ok(targets)
    }

    /// Checks a batch against the compiled input shape and the label count.
    fn check_batch(&self, x: &Tensor, labels: usize, operation: &str) -> Result<(), GradNetError> {
        let compiled = self.compiled(operation)?;
        let samples = x.shape().first().copied().unwrap_or(0);
        if samples == 0 {
            return Err(GradNetError::EmptyInput(operation.to_string()));
        }
        if x.shape()[1..] != compiled.input_shape[..] {
            return Err(GradNetError::ShapeMismatch {
                expected: compiled.input_shape.clone(),
                actual: x.shape()[1..].to_vec(),
                operation: format!("{} input", operation),
            });
        }
        if labels != samples {
            return Err(GradNetError::ShapeMismatch {
                expected: vec![samples],
                actual: vec![labels],
                operation: format!("{} labels", operation),
            });
        }
        Ok(())
    }

    /// Training forward pass through every layer, caching intermediates.
    pub fn forward(&mut self, x: &Tensor) -> Result<Tensor, GradNetError> {
        if self.layers.is_empty() {
            return Err(GradNetError::InvalidLayerOrder("model has no layers".to_string()));
        }
        let device = self.device.as_ref();
        self.layers
            .iter_mut()
            .try_fold(x.clone(), |signal, layer| layer.run(&signal, device))
    }

    /// Read-only forward pass.
    pub fn predict(&self, x: &Tensor) -> Result<Tensor, GradNetError> {
        if self.layers.is_empty() {
            return Err(GradNetError::InvalidLayerOrder("model has no layers".to_string()));
        }
        let device = self.device.as_ref();
        self.layers
            .iter()
            .try_fold(x.clone(), |signal, layer| layer.infer(&signal, device))
    }

    /// `0.5 · l2reg · Σ‖W‖²` over every parameter-bearing layer.
    fn l2_penalty(&self, l2reg: f64) -> f64 {
        if l2reg == 0.0 {
            return 0.0;
        }
        let squares: f64 = self
            .layers
            .iter()
            .filter_map(|l| l.weights())
            .map(|w| w.data().iter().map(|v| v * v).sum::<f64>())
            .sum();
        0.5 * l2reg * squares
    }

    /// One forward, backward and update over a batch of one-hot `targets`.
    ///
    /// Returns the loss (L2 penalty included) measured before the update.
    pub fn train_step(&mut self, x_batch: &Tensor, targets: &Tensor) -> Result<f64, GradNetError> {
        self.check_batch(x_batch, targets.shape().first().copied().unwrap_or(0), "train_step")?;
        let output = self.forward(x_batch)?;

        let penalty = {
            let compiled = self.compiled("train_step")?;
            self.l2_penalty(compiled.params.l2reg)
        };
        let compiled = self
            .compiled
            .as_mut()
            .ok_or_else(|| GradNetError::NotCompiled("train_step".to_string()))?;
        let loss = compiled.cost.loss(&output, targets)? + penalty;
        let mut grad = compiled.cost.gradient(&output, targets)?;

        let mut ctx = UpdateContext {
            optimizer: compiled.optimizer.as_mut(),
            lr: compiled.params.lr,
            l2reg: compiled.params.l2reg,
            layer_index: 0,
        };
        for (index, layer) in self.layers.iter_mut().enumerate().rev() {
            ctx.layer_index = index;
            grad = layer.update_parameters(&grad, &mut ctx)?;
        }
        Ok(loss)
    }

    /// Trains for `epochs` passes over `x`, in order, `batch_size` samples at
    /// a time. The last batch of an epoch may be smaller.
    ///
    /// Returns the sample-weighted mean loss of each epoch.
    pub fn fit(
        &mut self,
        x: &Tensor,
        labels: &[usize],
        epochs: usize,
        batch_size: usize,
    ) -> Result<Vec<f64>, GradNetError> {
        self.check_batch(x, labels.len(), "fit")?;
        if batch_size == 0 {
            return Err(GradNetError::InvalidHyperParameter {
                name: "batch_size".to_string(),
                value: 0.0,
            });
        }
        let targets = self.one_hot(labels)?;
        let samples = labels.len();

        let mut history = Vec::with_capacity(epochs);
        for epoch in 0..epochs {
            let mut total = 0.0;
            for start in (0..samples).step_by(batch_size) {
                let end = (start + batch_size).min(samples);
                let batch_loss = self.train_step(
                    &x.slice_rows(start, end)?,
                    &targets.slice_rows(start, end)?,
                )?;
                total += batch_loss * (end - start) as f64;
            }
            let mean = total / samples as f64;
            info!("Epoch {}/{}: loss {:.6}", epoch + 1, epochs, mean);
            history.push(mean);
        }
        Ok(history)
    }

    pub fn fit_with(
        &mut self,
        x: &Tensor,
        labels: &[usize],
        config: FitConfig,
    ) -> Result<Vec<f64>, GradNetError> {
        self.fit(x, labels, config.epochs, config.batch_size)
    }

    /// Loss of the current parameters on a labeled set, without updating anything.
    pub fn loss(&self, x: &Tensor, labels: &[usize]) -> Result<f64, GradNetError> {
        self.check_batch(x, labels.len(), "loss")?;
        let compiled = self.compiled("loss")?;
        let output = self.predict(x)?;
        let targets = self.one_hot(labels)?;
        Ok(compiled.cost.loss(&output, &targets)? + self.l2_penalty(compiled.params.l2reg))
    }

    /// Fraction of samples whose arg-max prediction equals the label.
    pub fn evaluate(&self, x: &Tensor, labels: &[usize]) -> Result<f64, GradNetError> {
        self.check_batch(x, labels.len(), "evaluate")?;
        let predicted = self.predict(x)?.argmax_rows()?;
        let correct = predicted
            .iter()
            .zip(labels)
            .filter(|(p, l)| p == l)
            .count();
        let accuracy = correct as f64 / labels.len() as f64;
        info!("Accuracy: {:.4} ({}/{})", accuracy, correct, labels.len());
        Ok(accuracy)
    }

    pub fn snapshot(&self) -> ModelSnapshot {
        ModelSnapshot {
            input_shape: self.compiled.as_ref().map(|c| c.input_shape.clone()),
            cost: self.compiled.as_ref().map(|c| c.cost),
            hyper_params: self.compiled.as_ref().map(|c| c.params),
            layers: self.layers.iter().map(|l| l.snapshot()).collect(),
        }
    }

    /// Hands a snapshot of the model to `sink` for storage at `path`.
    pub fn save(&self, path: impl AsRef<Path>, sink: &mut dyn ModelSink) -> Result<(), GradNetError> {
        let path = path.as_ref();
        debug!("Saving {} layers to {}", self.layers.len(), path.display());
        sink.write(path, &self.snapshot())
    }
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
