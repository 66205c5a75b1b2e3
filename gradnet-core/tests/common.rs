use gradnet_core::{Activation, Cost, LayerKind, Model, OptimizerKind, Tensor};

// Shared across test binaries; not every binary uses every helper.
#[allow(dead_code)]
pub(crate) fn tensor(data: Vec<f64>, shape: Vec<usize>) -> Tensor {
    Tensor::new(data, shape).expect("Test tensor creation failed")
}

/// Flatten(2) -> Dense(2, softmax), compiled with MSE and plain SGD.
#[allow(dead_code)]
pub(crate) fn tiny_softmax_model(seed: u64, lr: f64) -> Model {
    let mut model = Model::with_seed(seed);
    model
        .add(LayerKind::Flatten, &[2], None)
        .expect("flatten layer");
    model
        .add(LayerKind::Dense, &[2], Some(Activation::Softmax))
        .expect("dense layer");
    model
        .compile(&[2], Cost::Mse, OptimizerKind::Sgd, lr, 0.0)
        .expect("compile");
    model
}
