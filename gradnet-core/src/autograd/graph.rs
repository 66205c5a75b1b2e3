use super::backward_op::{broadcast_zip, local_gradients, Op};
use crate::error::GradNetError;
use crate::tensor::Tensor;
use std::collections::BTreeSet;

/// Handle to a node stored in a [`Graph`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in its arena (also its creation order).
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Either an existing node or a plain number to be coerced into a leaf.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    Node(NodeId),
    Literal(f64),
}

impl From<NodeId> for Operand {
    fn from(id: NodeId) -> Self {
        Operand::Node(id)
    }
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Operand::Literal(value)
    }
}

/// One value in the computation graph.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) value: Tensor,
    /// Accumulated gradient, zeros of the value's shape until backward runs.
    pub(crate) grad: Tensor,
    pub(crate) op: Op,
    pub(crate) label: Option<String>,
}

impl Node {
    pub fn value(&self) -> &Tensor {
        &self.value
    }

    pub fn grad(&self) -> &Tensor {
        &self.grad
    }

    pub fn op(&self) -> &Op {
        &self.op
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn parents(&self) -> Vec<NodeId> {
        self.op.parents()
    }
}

/// Arena-backed dynamic computation graph for reverse-mode differentiation.
///
/// Every operation appends a node whose operands are already in the arena, so
/// a node's parents always have strictly smaller indices and the graph is
/// acyclic by construction. Nodes are shared by every expression that refers
/// to their handle.
///
/// Leaf gradients accumulate across calls to [`Graph::backward`]; call
/// [`Graph::zero_grad`] (or build a fresh graph) before an independent pass.
/// Interior gradients hold only the most recent pass.
#[derive(Debug, Default, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
}

impl Graph {
    pub fn new() -> Self {
        Graph { nodes: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, GradNetError> {
        self.nodes.get(id.0).ok_or(GradNetError::UnknownNode {
            index: id.0,
            len: self.nodes.len(),
        })
    }

    pub fn value(&self, id: NodeId) -> Result<&Tensor, GradNetError> {
        self.node(id).map(|n| &n.value)
    }

    pub fn grad(&self, id: NodeId) -> Result<&Tensor, GradNetError> {
        self.node(id).map(|n| &n.grad)
    }

    /// Adds an input value to the graph.
    ///
    /// # Errors
    /// Returns `GradNetError::NonNumericValue` if the value contains NaN or infinity.
    pub fn leaf(&mut self, value: Tensor) -> Result<NodeId, GradNetError> {
        if !value.is_finite() {
            return Err(GradNetError::NonNumericValue(format!("{:?}", value)));
        }
        Ok(self.push(value, Op::Leaf))
    }

    /// Adds a rank-0 input value.
    pub fn scalar(&mut self, value: f64) -> Result<NodeId, GradNetError> {
        self.leaf(Tensor::scalar(value))
    }

    pub fn set_label(&mut self, id: NodeId, label: &str) -> Result<(), GradNetError> {
        self.check(id)?;
        self.nodes[id.0].label = Some(label.to_string());
        Ok(())
    }

    pub fn add(
        &mut self,
        a: impl Into<Operand>,
        b: impl Into<Operand>,
    ) -> Result<NodeId, GradNetError> {
        let (a, b) = (self.resolve(a)?, self.resolve(b)?);
        let value = broadcast_zip(&self.nodes[a.0].value, &self.nodes[b.0].value, "add", |x, y| x + y)?;
        Ok(self.push(value, Op::Add(a, b)))
    }

    /// Element-wise product.
    pub fn mul(
        &mut self,
        a: impl Into<Operand>,
        b: impl Into<Operand>,
    ) -> Result<NodeId, GradNetError> {
        let (a, b) = (self.resolve(a)?, self.resolve(b)?);
        let value = broadcast_zip(&self.nodes[a.0].value, &self.nodes[b.0].value, "mul", |x, y| x * y)?;
        Ok(self.push(value, Op::Mul(a, b)))
    }

    /// 2-D matrix product.
    pub fn matmul(&mut self, a: NodeId, b: NodeId) -> Result<NodeId, GradNetError> {
        self.check(a)?;
        self.check(b)?;
        let value = self.nodes[a.0].value.matmul(&self.nodes[b.0].value)?;
        Ok(self.push(value, Op::MatMul(a, b)))
    }

    /// `a^k` element-wise, for a constant exponent `k`.
    pub fn pow(&mut self, a: impl Into<Operand>, k: f64) -> Result<NodeId, GradNetError> {
        let a = self.resolve(a)?;
        let value = self.nodes[a.0].value.map(|x| x.powf(k));
        Ok(self.push(value, Op::Pow(a, k)))
    }

    pub fn exp(&mut self, a: impl Into<Operand>) -> Result<NodeId, GradNetError> {
        let a = self.resolve(a)?;
        let value = self.nodes[a.0].value.map(f64::exp);
        Ok(self.push(value, Op::Exp(a)))
    }

    pub fn tanh(&mut self, a: impl Into<Operand>) -> Result<NodeId, GradNetError> {
        let a = self.resolve(a)?;
        let value = self.nodes[a.0].value.map(f64::tanh);
        Ok(self.push(value, Op::Tanh(a)))
    }

    /// `-a`, recorded as `a * -1`.
    pub fn neg(&mut self, a: impl Into<Operand>) -> Result<NodeId, GradNetError> {
        self.mul(a, -1.0)
    }

    /// `a - b`, recorded as `a + (-b)`.
    pub fn sub(
        &mut self,
        a: impl Into<Operand>,
        b: impl Into<Operand>,
    ) -> Result<NodeId, GradNetError> {
        let a = self.resolve(a)?;
        let neg_b = self.neg(b)?;
        self.add(a, neg_b)
    }

    /// `a / b`, recorded as `a * b^-1`.
    pub fn div(
        &mut self,
        a: impl Into<Operand>,
        b: impl Into<Operand>,
    ) -> Result<NodeId, GradNetError> {
        let a = self.resolve(a)?;
        let inv_b = self.pow(b, -1.0)?;
        self.mul(a, inv_b)
    }

    /// Runs reverse-mode differentiation from `root`.
    ///
    /// Interior nodes reachable from `root` are reset, ones are added to the
    /// root's gradient, and every reachable node then adds its contribution
    /// into its operands' gradients, in reverse topological order, exactly
    /// once. Returns the nodes in the order their backward step was executed
    /// (root first).
    ///
    /// Nodes not reachable from `root` keep their current gradient.
    pub fn backward(&mut self, root: NodeId) -> Result<Vec<NodeId>, GradNetError> {
        self.check(root)?;
        let topo = self.build_topo(root);
        log::debug!(
            "backward from node {}: {} of {} nodes reachable",
            root.0,
            topo.len(),
            self.nodes.len()
        );

        for &id in &topo {
            let node = &mut self.nodes[id.0];
            if !matches!(node.op, Op::Leaf) {
                node.grad = Tensor::zeros(node.value.shape());
            }
        }
        let seed = Tensor::ones(self.nodes[root.0].value.shape());
        self.nodes[root.0].grad.add_assign(&seed)?;

        let mut executed = Vec::with_capacity(topo.len());
        for &id in topo.iter().rev() {
            let node = &self.nodes[id.0];
            log::trace!("backward step: node {} ({})", id.0, node.op);
            let contributions = local_gradients(&node.op, &node.value, &node.grad, &self.nodes)?;
            for (parent, contribution) in contributions {
                self.nodes[parent.0].grad.add_assign(&contribution)?;
            }
            executed.push(id);
        }
        Ok(executed)
    }

    /// Resets every gradient accumulator to zeros.
    pub fn zero_grad(&mut self) {
        for node in self.nodes.iter_mut() {
            node.grad = Tensor::zeros(node.value.shape());
        }
    }

    /// Collects the nodes reachable from `root` and the `(parent, child)` edges between them.
    pub fn trace(&self, root: NodeId) -> Result<(Vec<NodeId>, Vec<(NodeId, NodeId)>), GradNetError> {
        self.check(root)?;
        let nodes = self.build_topo(root);
        let edges: BTreeSet<(NodeId, NodeId)> = nodes
            .iter()
            .flat_map(|&child| {
                self.nodes[child.0]
                    .op
                    .parents()
                    .into_iter()
                    .map(move |parent| (parent, child))
            })
            .collect();
        Ok((nodes, edges.into_iter().collect()))
    }

    /// Post-order depth-first traversal over the parent relation.
    ///
    /// Each reachable node is recorded once, after all of its parents, so the
    /// result is a valid topological order ending with `root`.
    fn build_topo(&self, root: NodeId) -> Vec<NodeId> {
        let mut visited = vec![false; self.nodes.len()];
        let mut sorted = Vec::new();
        // (node, parents already expanded)
        let mut stack = vec![(root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                sorted.push(id);
                continue;
            }
            if visited[id.0] {
                continue;
            }
            visited[id.0] = true;
            stack.push((id, true));
            for parent in self.nodes[id.0].op.parents().into_iter().rev() {
                if !visited[parent.0] {
                    stack.push((parent, false));
                }
            }
        }
        sorted
    }

    fn resolve(&mut self, operand: impl Into<Operand>) -> Result<NodeId, GradNetError> {
        match operand.into() {
            Operand::Node(id) => {
                self.check(id)?;
                Ok(id)
            }
            Operand::Literal(value) => self.scalar(value),
        }
    }

    fn check(&self, id: NodeId) -> Result<(), GradNetError> {
        self.node(id).map(|_| ())
    }

    fn push(&mut self, value: Tensor, op: Op) -> NodeId {
        let index = self.nodes.len();
        debug_assert!(op.parents().iter().all(|p| p.0 < index));
        let grad = Tensor::zeros(value.shape());
        self.nodes.push(Node {
            value,
            grad,
            op,
            label: None,
        });
        NodeId(index)
    }
}

#[cfg(test)]
#[path = "graph_test.rs"]
mod tests;
