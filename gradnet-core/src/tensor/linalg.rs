use super::Tensor;
use crate::error::GradNetError;

impl Tensor {
    /// Matrix product of two 2-D tensors: `[m, k] @ [k, n] -> [m, n]`.
    pub fn matmul(&self, other: &Tensor) -> Result<Tensor, GradNetError> {
        let (m, k) = self.dims2("matmul")?;
        let (k2, n) = other.dims2("matmul")?;
        if k != k2 {
            return Err(GradNetError::ShapeMismatch {
                expected: vec![k, n],
                actual: other.shape.clone(),
                operation: "matmul".to_string(),
            });
        }
        let mut out = vec![0.0; m * n];
        for i in 0..m {
            for p in 0..k {
                let a = self.data[i * k + p];
                let b_row = &other.data[p * n..(p + 1) * n];
                let out_row = &mut out[i * n..(i + 1) * n];
                for (o, &b) in out_row.iter_mut().zip(b_row.iter()) {
                    *o += a * b;
                }
            }
        }
        Tensor::new(out, vec![m, n])
    }

    /// Transpose of a 2-D tensor.
    pub fn transpose(&self) -> Result<Tensor, GradNetError> {
        let (rows, cols) = self.dims2("transpose")?;
        let mut out = vec![0.0; rows * cols];
        for r in 0..rows {
            for c in 0..cols {
                out[c * rows + r] = self.data[r * cols + c];
            }
        }
        Tensor::new(out, vec![cols, rows])
    }

    /// Column-wise sum of a 2-D tensor: `[rows, cols] -> [cols]`.
    pub fn sum_rows(&self) -> Result<Tensor, GradNetError> {
        let (rows, cols) = self.dims2("sum_rows")?;
        let mut out = vec![0.0; cols];
        for r in 0..rows {
            for (o, &x) in out.iter_mut().zip(self.data[r * cols..(r + 1) * cols].iter()) {
                *o += x;
            }
        }
        Tensor::new(out, vec![cols])
    }

    /// Index of the largest value in each row of a 2-D tensor.
    ///
    /// Ties resolve to the first maximal index.
    pub fn argmax_rows(&self) -> Result<Vec<usize>, GradNetError> {
        let (rows, cols) = self.dims2("argmax_rows")?;
        if cols == 0 {
            return Err(GradNetError::EmptyInput("argmax_rows".to_string()));
        }
        Ok((0..rows)
            .map(|r| {
                let row = &self.data[r * cols..(r + 1) * cols];
                let mut best = 0;
                for (i, &x) in row.iter().enumerate() {
                    if x > row[best] {
                        best = i;
                    }
                }
                best
            })
            .collect())
    }
}
