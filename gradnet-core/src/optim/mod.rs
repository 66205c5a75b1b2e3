// gradnet-core/src/optim/mod.rs

//! Optimizers for training neural networks.
//!
//! This module provides the `Optimizer` trait, the `OptimizerKind` selector
//! used by `Model::compile`, and the gradient descent implementations.

pub mod optimizer_trait;
pub mod sgd;

pub use optimizer_trait::{Optimizer, OptimizerKind, ParamId, ParamKind};
pub use sgd::{MomentumOptimizer, SgdOptimizer};
