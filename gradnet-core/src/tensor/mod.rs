// src/tensor/mod.rs

use crate::error::GradNetError;
use std::fmt;

pub mod create;
pub mod linalg;

/// Dense, owned, row-major array of `f64` values.
///
/// Stores a flat buffer and a shape, and offers the operations the training
/// engine needs. Element-wise operations require identical shapes.
///
/// A tensor with an empty shape (`[]`) is a scalar holding exactly one value.
#[derive(Clone, PartialEq)]
pub struct Tensor {
    pub(crate) data: Vec<f64>,
    pub(crate) shape: Vec<usize>,
}

impl Tensor {
    /// Creates a tensor from a flat data vector and a shape.
    ///
    /// # Errors
    /// Returns `GradNetError::TensorCreationError` if `data.len()` does not equal
    /// the product of `shape`.
    pub fn new(data: Vec<f64>, shape: Vec<usize>) -> Result<Self, GradNetError> {
        let numel: usize = shape.iter().product();
        if data.len() != numel {
            return Err(GradNetError::TensorCreationError {
                data_len: data.len(),
                shape,
            });
        }
        Ok(Tensor { data, shape })
    }

    /// Returns the shape of the tensor.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Returns the flat, row-major data.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Consumes the tensor and returns its flat data.
    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    /// Number of elements.
    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// True if the tensor holds exactly one element (rank-0 or all dims equal to 1).
    pub fn is_scalar(&self) -> bool {
        self.data.len() == 1
    }

    /// Returns the single value of a one-element tensor.
    pub fn item(&self) -> Result<f64, GradNetError> {
        if self.data.len() != 1 {
            return Err(GradNetError::ShapeMismatch {
                expected: vec![],
                actual: self.shape.clone(),
                operation: "item".to_string(),
            });
        }
        Ok(self.data[0])
    }

    /// Reads element `(row, col)` of a 2-D tensor.
    pub fn get(&self, row: usize, col: usize) -> Result<f64, GradNetError> {
        let (rows, cols) = self.dims2("get")?;
        if row >= rows || col >= cols {
            return Err(GradNetError::IndexOutOfBounds {
                index: vec![row, col],
                shape: self.shape.clone(),
            });
        }
        Ok(self.data[row * cols + col])
    }

    /// Writes element `(row, col)` of a 2-D tensor.
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<(), GradNetError> {
        let (rows, cols) = self.dims2("set")?;
        if row >= rows || col >= cols {
            return Err(GradNetError::IndexOutOfBounds {
                index: vec![row, col],
                shape: self.shape.clone(),
            });
        }
        self.data[row * cols + col] = value;
        Ok(())
    }

    /// Returns a tensor with the same data and a new shape.
    pub fn reshape(&self, shape: Vec<usize>) -> Result<Tensor, GradNetError> {
        let numel: usize = shape.iter().product();
        if numel != self.numel() {
            return Err(GradNetError::ShapeMismatch {
                expected: self.shape.clone(),
                actual: shape,
                operation: "reshape".to_string(),
            });
        }
        Ok(Tensor {
            data: self.data.clone(),
            shape,
        })
    }

    /// Returns sample `index` along the leading (batch) axis.
    pub fn row(&self, index: usize) -> Result<Tensor, GradNetError> {
        self.slice_rows(index, index + 1)
            .and_then(|t| t.reshape(self.shape[1..].to_vec()))
    }

    /// Returns samples `start..end` along the leading axis, keeping the rank.
    pub fn slice_rows(&self, start: usize, end: usize) -> Result<Tensor, GradNetError> {
        if self.shape.is_empty() || start > end || end > self.shape[0] {
            return Err(GradNetError::IndexOutOfBounds {
                index: vec![start, end],
                shape: self.shape.clone(),
            });
        }
        let stride: usize = self.shape[1..].iter().product();
        let mut shape = self.shape.clone();
        shape[0] = end - start;
        Ok(Tensor {
            data: self.data[start * stride..end * stride].to_vec(),
            shape,
        })
    }

    /// Stacks equally-shaped samples along a new leading axis.
    pub fn stack_rows(samples: &[Tensor]) -> Result<Tensor, GradNetError> {
        let first = samples
            .first()
            .ok_or_else(|| GradNetError::EmptyInput("stack_rows".to_string()))?;
        let mut data = Vec::with_capacity(first.numel() * samples.len());
        for sample in samples {
            if sample.shape != first.shape {
                return Err(GradNetError::ShapeMismatch {
                    expected: first.shape.clone(),
                    actual: sample.shape.clone(),
                    operation: "stack_rows".to_string(),
                });
            }
            data.extend_from_slice(&sample.data);
        }
        let mut shape = Vec::with_capacity(first.rank() + 1);
        shape.push(samples.len());
        shape.extend_from_slice(&first.shape);
        Ok(Tensor { data, shape })
    }

    /// Applies `f` to every element.
    pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> Tensor {
        Tensor {
            data: self.data.iter().map(|&x| f(x)).collect(),
            shape: self.shape.clone(),
        }
    }

    /// Combines two equally-shaped tensors element by element.
    pub fn zip_map<F: Fn(f64, f64) -> f64>(
        &self,
        other: &Tensor,
        operation: &str,
        f: F,
    ) -> Result<Tensor, GradNetError> {
        self.expect_same_shape(other, operation)?;
        Ok(Tensor {
            data: self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
            shape: self.shape.clone(),
        })
    }

    pub fn add(&self, other: &Tensor) -> Result<Tensor, GradNetError> {
        self.zip_map(other, "add", |a, b| a + b)
    }

    pub fn sub(&self, other: &Tensor) -> Result<Tensor, GradNetError> {
        self.zip_map(other, "sub", |a, b| a - b)
    }

    /// Element-wise (Hadamard) product.
    pub fn mul(&self, other: &Tensor) -> Result<Tensor, GradNetError> {
        self.zip_map(other, "mul", |a, b| a * b)
    }

    pub fn scale(&self, factor: f64) -> Tensor {
        self.map(|x| x * factor)
    }

    /// Adds `other` into `self` in place.
    pub fn add_assign(&mut self, other: &Tensor) -> Result<(), GradNetError> {
        self.expect_same_shape(other, "add_assign")?;
        for (a, b) in self.data.iter_mut().zip(other.data.iter()) {
            *a += *b;
        }
        Ok(())
    }

    /// Clamps every element into `[min, max]`.
    pub fn clip(&self, min: f64, max: f64) -> Tensor {
        self.map(|x| x.clamp(min, max))
    }

    /// Sum of all elements.
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Largest absolute value, 0 for an empty tensor.
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0f64, |acc, &x| acc.max(x.abs()))
    }

    /// True if every element is finite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }

    pub(crate) fn expect_same_shape(&self, other: &Tensor, operation: &str) -> Result<(), GradNetError> {
        if self.shape != other.shape {
            return Err(GradNetError::ShapeMismatch {
                expected: self.shape.clone(),
                actual: other.shape.clone(),
                operation: operation.to_string(),
            });
        }
        Ok(())
    }

    /// Returns `(rows, cols)` of a 2-D tensor.
    pub(crate) fn dims2(&self, operation: &str) -> Result<(usize, usize), GradNetError> {
        match self.shape.as_slice() {
            [rows, cols] => Ok((*rows, *cols)),
            _ => Err(GradNetError::ShapeMismatch {
                // Rank-2 expected; report the placeholder [rows, cols] as zeros.
                expected: vec![0, 0],
                actual: self.shape.clone(),
                operation: operation.to_string(),
            }),
        }
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor(shape={:?}, data={:?})", self.shape, self.data)
    }
}
