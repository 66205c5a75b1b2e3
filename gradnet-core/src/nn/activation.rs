use crate::error::GradNetError;
use crate::tensor::Tensor;
use std::fmt;
use std::str::FromStr;

/// Activation functions applied by parameter-bearing layers.
///
/// Each variant provides its forward value and its local gradient. ReLU acts
/// element-wise; Softmax acts on the last axis of a 1-D vector or of every row
/// of a 2-D batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Activation {
    Relu,
    Softmax,
}

impl Activation {
    /// Computes the activation of the pre-activation `z`.
    pub fn forward(&self, z: &Tensor) -> Result<Tensor, GradNetError> {
        match self {
            Activation::Relu => Ok(z.map(|x| x.max(0.0))),
            Activation::Softmax => {
                let (rows, cols) = row_layout(z, "softmax")?;
                let mut out = Vec::with_capacity(z.numel());
                for r in 0..rows {
                    out.extend(softmax_row(&z.data()[r * cols..(r + 1) * cols]));
                }
                Tensor::new(out, z.shape().to_vec())
            }
        }
    }

    /// Local element-wise derivative, defined for ReLU only: 1 where `z > 0`, else 0.
    ///
    /// Softmax couples every output to every input, so its derivative is a
    /// Jacobian; use [`Activation::jacobian`] instead.
    pub fn derivative(&self, z: &Tensor) -> Result<Tensor, GradNetError> {
        match self {
            Activation::Relu => Ok(z.map(|x| if x > 0.0 { 1.0 } else { 0.0 })),
            Activation::Softmax => Err(GradNetError::UnsupportedOperation {
                operation: "Softmax derivative".to_string(),
                reason: format!("not element-wise; use the {0}x{0} jacobian", z.numel()),
            }),
        }
    }

    /// Full Jacobian `d activation / d z` for a single 1-D vector `z`.
    ///
    /// For Softmax this is `diag(s) - s sᵗ` with `s = softmax(z)`.
    pub fn jacobian(&self, z: &Tensor) -> Result<Tensor, GradNetError> {
        if z.rank() != 1 {
            return Err(GradNetError::ShapeMismatch {
                expected: vec![z.numel()],
                actual: z.shape().to_vec(),
                operation: "jacobian".to_string(),
            });
        }
        let n = z.numel();
        let mut jac = vec![0.0; n * n];
        match self {
            Activation::Relu => {
                for (i, &x) in z.data().iter().enumerate() {
                    jac[i * n + i] = if x > 0.0 { 1.0 } else { 0.0 };
                }
            }
            Activation::Softmax => {
                let s = softmax_row(z.data());
                for i in 0..n {
                    for j in 0..n {
                        let diag = if i == j { s[i] } else { 0.0 };
                        jac[i * n + j] = diag - s[i] * s[j];
                    }
                }
            }
        }
        Tensor::new(jac, vec![n, n])
    }

    /// Chains `upstream` (gradient w.r.t. the activation output) through the
    /// local gradient evaluated at the pre-activation `z`.
    ///
    /// ReLU multiplies element-wise by its derivative. Softmax applies the
    /// per-row Jacobian: `delta_i = s_i * (g_i - Σ_j s_j g_j)`.
    pub fn backward(&self, z: &Tensor, upstream: &Tensor) -> Result<Tensor, GradNetError> {
        z.expect_same_shape(upstream, "activation backward")?;
        match self {
            Activation::Relu => self.derivative(z)?.mul(upstream),
            Activation::Softmax => {
                let (rows, cols) = row_layout(z, "softmax backward")?;
                let mut out = Vec::with_capacity(z.numel());
                for r in 0..rows {
                    let s = softmax_row(&z.data()[r * cols..(r + 1) * cols]);
                    let g = &upstream.data()[r * cols..(r + 1) * cols];
                    let dot: f64 = s.iter().zip(g.iter()).map(|(a, b)| a * b).sum();
                    out.extend(s.iter().zip(g.iter()).map(|(si, gi)| si * (gi - dot)));
                }
                Tensor::new(out, z.shape().to_vec())
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Activation::Relu => "relu",
            Activation::Softmax => "softmax",
        }
    }
}

/// Numerically stable softmax: the row maximum is subtracted before exponentiating.
fn softmax_row(row: &[f64]) -> Vec<f64> {
    let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = row.iter().map(|&x| (x - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Interprets a 1-D tensor as one row and a 2-D tensor as a batch of rows.
fn row_layout(z: &Tensor, operation: &str) -> Result<(usize, usize), GradNetError> {
    match z.shape() {
        [n] => Ok((1, *n)),
        [rows, cols] => Ok((*rows, *cols)),
        other => Err(GradNetError::ShapeMismatch {
            expected: vec![0, 0],
            actual: other.to_vec(),
            operation: operation.to_string(),
        }),
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Activation {
    type Err = GradNetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "relu" => Ok(Activation::Relu),
            "softmax" => Ok(Activation::Softmax),
            _ => Err(GradNetError::UnknownKind {
                category: "activation".to_string(),
                name: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
#[path = "activation_test.rs"]
mod tests;
