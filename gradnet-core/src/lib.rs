// Core modules
pub mod autograd;
pub mod device;
pub mod error;
pub mod nn;
pub mod optim;
pub mod tensor;

// Re-export the types most callers need at the crate root
pub use autograd::{check_gradients, GradCheckError, Graph, NodeId};
pub use device::{ComputeDevice, CpuDevice, DeviceKind};
pub use error::GradNetError;
pub use nn::{Activation, Cost, FitConfig, HyperParams, LayerKind, Model, ModelSink, ModelSnapshot};
pub use optim::OptimizerKind;
pub use tensor::Tensor;
