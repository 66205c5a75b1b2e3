use approx::assert_abs_diff_eq;
use gradnet_core::nn::{Dense, Flatten};
use gradnet_core::{Activation, Cost, GradNetError, LayerKind, Model, OptimizerKind};

mod common;
use common::{tensor, tiny_softmax_model};

/// Model whose single Dense layer has fixed parameters.
fn fixed_model(weights: Vec<f64>, activation: Activation) -> Result<Model, GradNetError> {
    let mut model = Model::with_seed(0);
    model.add_layer(Box::new(Flatten::new(&[2])?))?;
    model.add_layer(Box::new(Dense::from_parameters(
        tensor(weights, vec![2, 2]),
        tensor(vec![0.0, 0.0], vec![2]),
        activation,
    )?))?;
    model.compile(&[2], Cost::Mse, OptimizerKind::Sgd, 0.1, 0.0)?;
    Ok(model)
}

#[test]
fn identity_relu_layer_is_exact() -> Result<(), GradNetError> {
    let mut model = fixed_model(vec![1.0, 0.0, 0.0, 1.0], Activation::Relu)?;
    let input = tensor(vec![1.0, -1.0], vec![1, 2]);
    let trained_path = model.forward(&input)?;
    assert_eq!(trained_path.data(), &[1.0, 0.0]);
    assert_eq!(model.predict(&input)?, trained_path);
    Ok(())
}

#[test]
fn softmax_of_one_two_three() -> Result<(), GradNetError> {
    let out = Activation::Softmax.forward(&tensor(vec![1.0, 2.0, 3.0], vec![3]))?;
    for (got, want) in out.data().iter().zip([0.0900, 0.2447, 0.6652]) {
        assert_abs_diff_eq!(*got, want, epsilon = 1e-4);
    }
    Ok(())
}

#[test]
fn one_fit_step_decreases_mse() -> Result<(), GradNetError> {
    let mut model = tiny_softmax_model(2024, 0.1);
    let x = tensor(vec![1.0, 0.0, 0.0, 1.0], vec![2, 2]);
    let labels = [0, 1];

    let before = model.loss(&x, &labels)?;
    let history = model.fit(&x, &labels, 1, 2)?;
    let after = model.loss(&x, &labels)?;

    assert_abs_diff_eq!(history[0], before, epsilon = 1e-12);
    assert!(after < before, "loss went from {} to {}", before, after);
    Ok(())
}

#[test]
fn evaluate_reports_all_or_nothing_accuracy() -> Result<(), GradNetError> {
    // Identity weights: the larger input coordinate wins.
    let model = fixed_model(vec![1.0, 0.0, 0.0, 1.0], Activation::Softmax)?;
    let x = tensor(vec![0.9, 0.1, 0.2, 0.8, 0.7, 0.3], vec![3, 2]);
    assert_eq!(model.evaluate(&x, &[0, 1, 0])?, 1.0);
    assert_eq!(model.evaluate(&x, &[1, 0, 1])?, 0.0);
    Ok(())
}

#[test]
fn mismatched_width_fails_before_forward() -> Result<(), GradNetError> {
    let mut model = Model::with_seed(1);
    model.add(LayerKind::Flatten, &[3], None)?;
    model.add(LayerKind::Dense, &[4], Some(Activation::Relu))?;
    let stray = Dense::from_parameters(
        tensor(vec![0.0; 10], vec![2, 5]),
        tensor(vec![0.0; 2], vec![2]),
        Activation::Softmax,
    )?;
    assert!(matches!(
        model.add_layer(Box::new(stray)),
        Err(GradNetError::WidthMismatch {
            expected: 4,
            actual: 5,
            ..
        })
    ));
    Ok(())
}

#[test]
fn forward_is_deterministic() -> Result<(), GradNetError> {
    let mut model = tiny_softmax_model(77, 0.1);
    let x = tensor(vec![0.3, -0.4, 1.2, 0.5], vec![2, 2]);
    let first = model.forward(&x)?;
    let second = model.forward(&x)?;
    assert_eq!(first.data(), second.data());
    Ok(())
}

#[test]
fn momentum_training_converges_on_separable_data() -> Result<(), GradNetError> {
    let mut model = Model::with_seed(3);
    model.add(LayerKind::Flatten, &[2], None)?;
    model.add(LayerKind::Dense, &[8], Some(Activation::Relu))?;
    model.add(LayerKind::Dense, &[2], Some(Activation::Softmax))?;
    model.compile(
        &[2],
        Cost::CrossEntropy,
        OptimizerKind::Momentum { beta: 0.9 },
        0.05,
        0.0001,
    )?;

    let x = tensor(
        vec![
            1.0, 0.1, 0.9, 0.0, 0.8, 0.2, 1.0, 0.3, //
            0.1, 1.0, 0.0, 0.9, 0.2, 0.8, 0.3, 1.0,
        ],
        vec![8, 2],
    );
    let labels = [0, 0, 0, 0, 1, 1, 1, 1];
    let history = model.fit(&x, &labels, 200, 3)?;
    assert!(history[history.len() - 1] < history[0]);
    assert_eq!(model.evaluate(&x, &labels)?, 1.0);
    Ok(())
}
