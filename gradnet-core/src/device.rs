use crate::error::GradNetError;
use crate::nn::activation::Activation;
use crate::tensor::Tensor;
use std::fmt::Debug;

/// Represents where dense-layer kernels are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceKind {
    /// In-process computation. This is the default and always available.
    #[default]
    Cpu,
    /// An external accelerated backend reached through [`ComputeDevice`].
    Accelerator,
}

/// Boundary to a compute backend offering batched matrix multiply and
/// activation kernels.
///
/// Implementations must honour the same numeric contract as [`CpuDevice`];
/// the model can always fall back to the in-process implementation.
pub trait ComputeDevice: Debug {
    fn kind(&self) -> DeviceKind;

    /// `[m, k] @ [k, n] -> [m, n]`.
    fn matmul(&self, a: &Tensor, b: &Tensor) -> Result<Tensor, GradNetError>;

    /// Forward value of `activation` applied to the pre-activation `z`.
    fn activate(&self, activation: Activation, z: &Tensor) -> Result<Tensor, GradNetError>;
}

/// Pure in-process implementation of [`ComputeDevice`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuDevice;

impl ComputeDevice for CpuDevice {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Cpu
    }

    fn matmul(&self, a: &Tensor, b: &Tensor) -> Result<Tensor, GradNetError> {
        a.matmul(b)
    }

    fn activate(&self, activation: Activation, z: &Tensor) -> Result<Tensor, GradNetError> {
        activation.forward(z)
    }
}
