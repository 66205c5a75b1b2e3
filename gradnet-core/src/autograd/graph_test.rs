use super::*;
use approx::assert_relative_eq;
use std::collections::HashSet;

fn grad_item(graph: &Graph, id: NodeId) -> f64 {
    graph.grad(id).unwrap().item().unwrap()
}

#[test]
fn test_add_and_mul_scalars() -> Result<(), GradNetError> {
    let mut graph = Graph::new();
    let a = graph.scalar(2.0)?;
    let b = graph.scalar(-3.0)?;
    let c = graph.mul(a, b)?;
    let d = graph.add(c, a)?;
    graph.backward(d)?;

    assert_relative_eq!(graph.value(d)?.item()?, -4.0);
    // d = a*b + a
    assert_relative_eq!(grad_item(&graph, a), -3.0 + 1.0);
    assert_relative_eq!(grad_item(&graph, b), 2.0);
    assert_relative_eq!(grad_item(&graph, d), 1.0);
    Ok(())
}

#[test]
fn test_diamond_accumulates_contributions() -> Result<(), GradNetError> {
    // y = x*x + x*3, dy/dx = 2x + 3
    let mut graph = Graph::new();
    let x = graph.scalar(2.0)?;
    let sq = graph.mul(x, x)?;
    let lin = graph.mul(x, 3.0)?;
    let y = graph.add(sq, lin)?;
    graph.backward(y)?;

    assert_relative_eq!(graph.value(y)?.item()?, 10.0);
    assert_relative_eq!(grad_item(&graph, x), 7.0);
    Ok(())
}

#[test]
fn test_each_node_executes_once_on_diamond() -> Result<(), GradNetError> {
    let mut graph = Graph::new();
    let x = graph.scalar(0.5)?;
    let a = graph.mul(x, 2.0)?;
    let left = graph.exp(a)?;
    let right = graph.tanh(a)?;
    let y = graph.add(left, right)?;

    let order = graph.backward(y)?;
    let unique: HashSet<NodeId> = order.iter().cloned().collect();
    assert_eq!(unique.len(), order.len(), "a node was executed twice");
    assert_eq!(order.first(), Some(&y));
    // x, literal 2.0, a, left, right, y
    assert_eq!(order.len(), 6);

    // Every node runs before the operands it feeds gradients into.
    let position = |id: NodeId| order.iter().position(|&n| n == id).unwrap();
    assert!(position(left) < position(a));
    assert!(position(right) < position(a));
    assert!(position(a) < position(x));

    // dy/dx = 2 * (exp(2x) + 1 - tanh(2x)^2)
    let expected = 2.0 * (1.0f64.exp() + 1.0 - 1.0f64.tanh().powi(2));
    assert_relative_eq!(grad_item(&graph, x), expected, epsilon = 1e-12);
    Ok(())
}

#[test]
fn test_sub_neg_div_compositions() -> Result<(), GradNetError> {
    let mut graph = Graph::new();
    let x = graph.scalar(3.0)?;
    let y = graph.scalar(2.0)?;
    let q = graph.div(x, y)?;
    let d = graph.sub(q, y)?;
    let n = graph.neg(d)?;
    graph.backward(n)?;

    // n = -(x/y - y) = y - x/y
    assert_relative_eq!(graph.value(n)?.item()?, 2.0 - 1.5);
    assert_relative_eq!(grad_item(&graph, x), -1.0 / 2.0);
    assert_relative_eq!(grad_item(&graph, y), 1.0 + 3.0 / 4.0, epsilon = 1e-12);
    Ok(())
}

#[test]
fn test_pow_exp_tanh_local_derivatives() -> Result<(), GradNetError> {
    let mut graph = Graph::new();
    let x = graph.scalar(1.5)?;
    let p = graph.pow(x, 3.0)?;
    graph.backward(p)?;
    assert_relative_eq!(grad_item(&graph, x), 3.0 * 1.5 * 1.5, epsilon = 1e-12);

    let mut graph = Graph::new();
    let x = graph.scalar(0.7)?;
    let e = graph.exp(x)?;
    graph.backward(e)?;
    assert_relative_eq!(grad_item(&graph, x), 0.7f64.exp(), epsilon = 1e-12);

    let mut graph = Graph::new();
    let x = graph.scalar(0.7)?;
    let t = graph.tanh(x)?;
    graph.backward(t)?;
    assert_relative_eq!(grad_item(&graph, x), 1.0 - 0.7f64.tanh().powi(2), epsilon = 1e-12);
    Ok(())
}

#[test]
fn test_matmul_gradients() -> Result<(), GradNetError> {
    let mut graph = Graph::new();
    let a = graph.leaf(Tensor::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3])?)?;
    let b = graph.leaf(Tensor::new(vec![1.0, 0.0, -1.0, 2.0, 0.5, 1.0], vec![3, 2])?)?;
    let c = graph.matmul(a, b)?;
    graph.backward(c)?;

    // With G = ones(2, 2): dA = G Bᵀ (row sums of B), dB = Aᵀ G (column sums of A)
    assert_eq!(graph.grad(a)?.data(), &[1.0, 1.0, 1.5, 1.0, 1.0, 1.5]);
    assert_eq!(graph.grad(b)?.data(), &[5.0, 5.0, 7.0, 7.0, 9.0, 9.0]);
    Ok(())
}

#[test]
fn test_literal_broadcasts_against_array() -> Result<(), GradNetError> {
    let mut graph = Graph::new();
    let x = graph.leaf(Tensor::new(vec![1.0, 2.0, 3.0], vec![3])?)?;
    let y = graph.mul(x, 2.0)?;
    graph.backward(y)?;

    assert_eq!(graph.value(y)?.data(), &[2.0, 4.0, 6.0]);
    assert_eq!(graph.grad(x)?.data(), &[2.0, 2.0, 2.0]);
    // The coerced literal is a standalone leaf whose gradient sums over the array.
    let literal = graph.node(y)?.parents()[1];
    assert_eq!(graph.node(literal)?.op(), &Op::Leaf);
    assert_relative_eq!(grad_item(&graph, literal), 6.0);
    Ok(())
}

#[test]
fn test_disconnected_nodes_keep_zero_gradient() -> Result<(), GradNetError> {
    let mut graph = Graph::new();
    let x = graph.scalar(1.0)?;
    let unused = graph.scalar(5.0)?;
    let side = graph.exp(unused)?;
    let y = graph.mul(x, 4.0)?;
    graph.backward(y)?;

    assert_relative_eq!(grad_item(&graph, x), 4.0);
    assert_eq!(grad_item(&graph, unused), 0.0);
    assert_eq!(grad_item(&graph, side), 0.0);
    Ok(())
}

#[test]
fn test_gradients_accumulate_until_zero_grad() -> Result<(), GradNetError> {
    let mut graph = Graph::new();
    let x = graph.scalar(2.0)?;
    let y = graph.mul(x, 5.0)?;
    graph.backward(y)?;
    graph.backward(y)?;
    assert_relative_eq!(grad_item(&graph, x), 10.0);

    graph.zero_grad();
    assert_eq!(grad_item(&graph, x), 0.0);
    graph.backward(y)?;
    assert_relative_eq!(grad_item(&graph, x), 5.0);
    Ok(())
}

#[test]
fn test_repeated_backward_through_chain_adds_leaf_gradient() -> Result<(), GradNetError> {
    let mut graph = Graph::new();
    let x = graph.scalar(1.0)?;
    let y = graph.mul(x, 2.0)?;
    let z = graph.mul(y, 3.0)?;
    graph.backward(z)?;
    assert_relative_eq!(grad_item(&graph, x), 6.0);
    graph.backward(z)?;
    assert_relative_eq!(grad_item(&graph, x), 12.0);
    assert_relative_eq!(grad_item(&graph, y), 3.0);
    assert_relative_eq!(grad_item(&graph, z), 1.0);
    Ok(())
}

#[test]
fn test_parents_precede_children_in_arena() -> Result<(), GradNetError> {
    let mut graph = Graph::new();
    let x = graph.scalar(1.0)?;
    let a = graph.tanh(x)?;
    let b = graph.add(a, x)?;
    let c = graph.div(b, a)?;
    for index in 0..graph.len() {
        for parent in graph.node(NodeId(index))?.parents() {
            assert!(parent.index() < index);
        }
    }
    assert!(c.index() > b.index());
    Ok(())
}

#[test]
fn test_trace_and_labels() -> Result<(), GradNetError> {
    let mut graph = Graph::new();
    let x = graph.scalar(1.0)?;
    graph.set_label(x, "x")?;
    let y = graph.exp(x)?;
    let z = graph.add(y, x)?;
    let (nodes, edges) = graph.trace(z)?;

    assert_eq!(nodes, vec![x, y, z]);
    assert_eq!(edges, vec![(x, y), (x, z), (y, z)]);
    assert_eq!(graph.node(x)?.label(), Some("x"));
    assert_eq!(graph.node(z)?.op().symbol(), "+");
    assert_eq!(Op::Pow(x, 2.0).symbol(), "**2");
    Ok(())
}

#[test]
fn test_non_numeric_leaf_is_rejected() {
    let mut graph = Graph::new();
    let bad = Tensor::new(vec![1.0, f64::NAN], vec![2]).unwrap();
    assert!(matches!(graph.leaf(bad), Err(GradNetError::NonNumericValue(_))));
    assert!(graph.is_empty());
}

#[test]
fn test_foreign_handle_is_rejected() -> Result<(), GradNetError> {
    let mut big = Graph::new();
    big.scalar(1.0)?;
    let foreign = big.scalar(2.0)?;

    let mut small = Graph::new();
    small.scalar(1.0)?;
    assert_eq!(
        small.exp(foreign),
        Err(GradNetError::UnknownNode { index: 1, len: 1 })
    );
    assert!(small.backward(foreign).is_err());
    Ok(())
}

#[test]
fn test_elementwise_shape_mismatch() -> Result<(), GradNetError> {
    let mut graph = Graph::new();
    let a = graph.leaf(Tensor::zeros(&[2]))?;
    let b = graph.leaf(Tensor::zeros(&[3]))?;
    assert!(matches!(graph.add(a, b), Err(GradNetError::ShapeMismatch { .. })));
    Ok(())
}
