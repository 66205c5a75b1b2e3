use super::Tensor;
use crate::error::GradNetError;
use rand::Rng;
use rand_distr::{Distribution, Uniform};

impl Tensor {
    /// Rank-0 tensor holding a single value.
    pub fn scalar(value: f64) -> Tensor {
        Tensor {
            data: vec![value],
            shape: vec![],
        }
    }

    /// Tensor of the given shape filled with `value`.
    pub fn full(shape: &[usize], value: f64) -> Tensor {
        let numel: usize = shape.iter().product();
        Tensor {
            data: vec![value; numel],
            shape: shape.to_vec(),
        }
    }

    pub fn zeros(shape: &[usize]) -> Tensor {
        Tensor::full(shape, 0.0)
    }

    pub fn ones(shape: &[usize]) -> Tensor {
        Tensor::full(shape, 1.0)
    }

    /// Builds a 2-D tensor from equally long rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Tensor, GradNetError> {
        let cols = rows.first().map_or(0, |r| r.len());
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            if row.len() != cols {
                return Err(GradNetError::ShapeMismatch {
                    expected: vec![cols],
                    actual: vec![row.len()],
                    operation: "from_rows".to_string(),
                });
            }
            data.extend_from_slice(row);
        }
        Tensor::new(data, vec![rows.len(), cols])
    }

    /// Tensor of the given shape with values drawn uniformly from `[low, high]`.
    ///
    /// The generator is passed explicitly so that callers control seeding.
    pub fn rand_uniform<R: Rng + ?Sized>(
        shape: &[usize],
        low: f64,
        high: f64,
        rng: &mut R,
    ) -> Result<Tensor, GradNetError> {
        if !(low.is_finite() && high.is_finite()) || low > high {
            return Err(GradNetError::InvalidHyperParameter {
                name: "uniform bounds".to_string(),
                value: high - low,
            });
        }
        let numel: usize = shape.iter().product();
        let dist = Uniform::new_inclusive(low, high);
        let data = (0..numel).map(|_| dist.sample(rng)).collect();
        Tensor::new(data, shape.to_vec())
    }
}
