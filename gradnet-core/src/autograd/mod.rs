//! Reverse-mode automatic differentiation over an arena-backed graph.
//!
//! Expressions are recorded on a [`Graph`] as they are built; calling
//! [`Graph::backward`] on a terminal node sorts the reachable nodes
//! topologically and runs each node's backward step once, accumulating
//! gradients into operands.

pub mod backward_op;
pub mod grad_check;
pub mod graph;

pub use backward_op::Op;
pub use grad_check::{check_gradients, GradCheckError};
pub use graph::{Graph, Node, NodeId, Operand};
