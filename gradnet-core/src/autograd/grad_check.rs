use super::graph::{Graph, NodeId};
use crate::error::GradNetError;
use crate::tensor::Tensor;
use thiserror::Error;

/// Error type specifically for gradient checking failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GradCheckError {
    #[error("Gradient check failed for input {input_index}, element {element_index}: analytical {analytical_grad} != numerical {numerical_grad} (difference {difference})")]
    GradientMismatch {
        input_index: usize,
        element_index: usize,
        analytical_grad: f64,
        numerical_grad: f64,
        difference: f64,
    },

    #[error("Forward function execution failed during gradient check: {0}")]
    ForwardPassError(GradNetError),

    #[error("Backward pass execution failed during gradient check: {0}")]
    BackwardPassError(GradNetError),

    #[error("Numerical gradient is NaN or infinite for input {input_index}, element {element_index} (loss+ {loss_plus}, loss- {loss_minus})")]
    NumericalGradNaNOrInfinite {
        input_index: usize,
        element_index: usize,
        loss_plus: f64,
        loss_minus: f64,
    },

    #[error("Analytical gradient is NaN or infinite for input {input_index}, element {element_index}: {value}")]
    AnalyticalGradNaNOrInfinite {
        input_index: usize,
        element_index: usize,
        value: f64,
    },

    #[error("Tensor error during gradient check: {0}")]
    TensorError(GradNetError),
}

impl From<GradNetError> for GradCheckError {
    fn from(err: GradNetError) -> Self {
        GradCheckError::TensorError(err)
    }
}

/// Checks analytical gradients against central-difference estimates.
///
/// `func` builds an expression on the given graph from the leaf handles of
/// `inputs` and returns its output node. The implicit scalar loss is the sum
/// of the output's elements, which matches the all-ones seed used by
/// [`Graph::backward`]. Each perturbation is evaluated on a fresh graph.
///
/// A pair of gradients passes if it is within `tolerance` either absolutely
/// or relatively.
pub fn check_gradients<F>(
    func: F,
    inputs: &[Tensor],
    epsilon: f64,
    tolerance: f64,
) -> Result<(), GradCheckError>
where
    F: Fn(&mut Graph, &[NodeId]) -> Result<NodeId, GradNetError>,
{
    // --- Analytical gradients ---
    let mut graph = Graph::new();
    let leaves = inputs
        .iter()
        .map(|t| graph.leaf(t.clone()))
        .collect::<Result<Vec<_>, _>>()?;
    let output = func(&mut graph, &leaves).map_err(GradCheckError::ForwardPassError)?;
    graph
        .backward(output)
        .map_err(GradCheckError::BackwardPassError)?;
    let analytical: Vec<Tensor> = leaves
        .iter()
        .map(|&id| graph.grad(id).cloned())
        .collect::<Result<_, _>>()?;

    // --- Numerical gradients, one element at a time ---
    for (i, input) in inputs.iter().enumerate() {
        for elem_idx in 0..input.numel() {
            let loss_plus = perturbed_loss(&func, inputs, i, elem_idx, epsilon)?;
            let loss_minus = perturbed_loss(&func, inputs, i, elem_idx, -epsilon)?;
            let numerical_grad = (loss_plus - loss_minus) / (2.0 * epsilon);
            let analytical_grad = analytical[i].data()[elem_idx];

            if !numerical_grad.is_finite() {
                return Err(GradCheckError::NumericalGradNaNOrInfinite {
                    input_index: i,
                    element_index: elem_idx,
                    loss_plus,
                    loss_minus,
                });
            }
            if !analytical_grad.is_finite() {
                return Err(GradCheckError::AnalyticalGradNaNOrInfinite {
                    input_index: i,
                    element_index: elem_idx,
                    value: analytical_grad,
                });
            }
            if !approx::relative_eq!(
                analytical_grad,
                numerical_grad,
                epsilon = tolerance,
                max_relative = tolerance
            ) {
                return Err(GradCheckError::GradientMismatch {
                    input_index: i,
                    element_index: elem_idx,
                    analytical_grad,
                    numerical_grad,
                    difference: (analytical_grad - numerical_grad).abs(),
                });
            }
        }
    }
    Ok(())
}

/// Evaluates `sum(func(inputs))` with one element of one input shifted by `delta`.
fn perturbed_loss<F>(
    func: &F,
    inputs: &[Tensor],
    input_index: usize,
    elem_idx: usize,
    delta: f64,
) -> Result<f64, GradCheckError>
where
    F: Fn(&mut Graph, &[NodeId]) -> Result<NodeId, GradNetError>,
{
    let mut graph = Graph::new();
    let mut leaves = Vec::with_capacity(inputs.len());
    for (i, input) in inputs.iter().enumerate() {
        let mut value = input.clone();
        if i == input_index {
            value.data[elem_idx] += delta;
        }
        leaves.push(graph.leaf(value)?);
    }
    let output = func(&mut graph, &leaves).map_err(GradCheckError::ForwardPassError)?;
    Ok(graph.value(output)?.sum())
}

#[cfg(test)]
#[path = "grad_check_test.rs"]
mod tests;
