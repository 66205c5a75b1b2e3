use super::graph::{Node, NodeId};
use crate::error::GradNetError;
use crate::tensor::Tensor;
use std::fmt;

/// The operation that produced a graph node, together with its operand handles.
///
/// The tag replaces a per-node backward closure: [`local_gradients`] pattern
/// matches on it to compute each operand's gradient contribution.
/// Subtraction, negation and division are not tags of their own; the graph
/// builds them from `Add`, `Mul` and `Pow`.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// A value created directly (input, parameter or coerced literal).
    Leaf,
    Add(NodeId, NodeId),
    /// Element-wise product.
    Mul(NodeId, NodeId),
    /// 2-D matrix product.
    MatMul(NodeId, NodeId),
    /// `x^k` for a constant real exponent `k`.
    Pow(NodeId, f64),
    Exp(NodeId),
    Tanh(NodeId),
}

impl Op {
    /// Operand handles, in operand order. Empty for leaves.
    pub fn parents(&self) -> Vec<NodeId> {
        match *self {
            Op::Leaf => Vec::new(),
            Op::Add(a, b) | Op::Mul(a, b) | Op::MatMul(a, b) => vec![a, b],
            Op::Pow(a, _) | Op::Exp(a) | Op::Tanh(a) => vec![a],
        }
    }

    /// Short diagnostic symbol for the operation.
    pub fn symbol(&self) -> String {
        match self {
            Op::Leaf => String::new(),
            Op::Add(..) => "+".to_string(),
            Op::Mul(..) => "*".to_string(),
            Op::MatMul(..) => "@".to_string(),
            Op::Pow(_, k) => format!("**{}", k),
            Op::Exp(_) => "exp".to_string(),
            Op::Tanh(_) => "tanh".to_string(),
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Leaf => f.write_str("leaf"),
            other => f.write_str(&other.symbol()),
        }
    }
}

/// Computes the gradient contribution of a node to each of its operands.
///
/// Reads only the node's own output value and gradient plus its operands'
/// values. The caller adds each returned contribution into the matching
/// operand's accumulator; contributions are already reduced to the operand's
/// shape.
pub(crate) fn local_gradients(
    op: &Op,
    out_value: &Tensor,
    out_grad: &Tensor,
    nodes: &[Node],
) -> Result<Vec<(NodeId, Tensor)>, GradNetError> {
    let value_of = |id: NodeId| &nodes[id.index()].value;
    match *op {
        Op::Leaf => Ok(Vec::new()),
        Op::Add(a, b) => Ok(vec![
            (a, reduce_to(out_grad.clone(), value_of(a))?),
            (b, reduce_to(out_grad.clone(), value_of(b))?),
        ]),
        Op::Mul(a, b) => {
            let da = broadcast_zip(value_of(b), out_grad, "mul backward", |v, g| v * g)?;
            let db = broadcast_zip(value_of(a), out_grad, "mul backward", |v, g| v * g)?;
            Ok(vec![
                (a, reduce_to(da, value_of(a))?),
                (b, reduce_to(db, value_of(b))?),
            ])
        }
        Op::MatMul(a, b) => {
            // dA = G @ Bᵀ, dB = Aᵀ @ G
            let da = out_grad.matmul(&value_of(b).transpose()?)?;
            let db = value_of(a).transpose()?.matmul(out_grad)?;
            Ok(vec![(a, da), (b, db)])
        }
        Op::Pow(a, k) => {
            let da = value_of(a).zip_map(out_grad, "pow backward", |x, g| k * x.powf(k - 1.0) * g)?;
            Ok(vec![(a, da)])
        }
        Op::Exp(a) => {
            let da = out_value.zip_map(out_grad, "exp backward", |y, g| y * g)?;
            Ok(vec![(a, da)])
        }
        Op::Tanh(a) => {
            let da = out_value.zip_map(out_grad, "tanh backward", |t, g| (1.0 - t * t) * g)?;
            Ok(vec![(a, da)])
        }
    }
}

/// Element-wise combination with single-element broadcasting.
///
/// Shapes must match, unless one side holds exactly one element, in which case
/// that value is paired with every element of the other side.
pub(crate) fn broadcast_zip<F: Fn(f64, f64) -> f64>(
    a: &Tensor,
    b: &Tensor,
    operation: &str,
    f: F,
) -> Result<Tensor, GradNetError> {
    if a.shape() == b.shape() {
        a.zip_map(b, operation, f)
    } else if b.is_scalar() {
        let bv = b.data()[0];
        Ok(a.map(|x| f(x, bv)))
    } else if a.is_scalar() {
        let av = a.data()[0];
        Ok(b.map(|y| f(av, y)))
    } else {
        Err(GradNetError::ShapeMismatch {
            expected: a.shape().to_vec(),
            actual: b.shape().to_vec(),
            operation: operation.to_string(),
        })
    }
}

/// Sums a contribution down to the shape of the operand it flows into.
fn reduce_to(contribution: Tensor, operand: &Tensor) -> Result<Tensor, GradNetError> {
    if contribution.shape() == operand.shape() {
        Ok(contribution)
    } else if operand.is_scalar() {
        Ok(Tensor::full(operand.shape(), contribution.sum()))
    } else {
        Err(GradNetError::ShapeMismatch {
            expected: operand.shape().to_vec(),
            actual: contribution.shape().to_vec(),
            operation: "gradient reduction".to_string(),
        })
    }
}
