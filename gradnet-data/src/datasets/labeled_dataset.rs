use super::traits::Dataset;
use gradnet_core::{GradNetError, Tensor};

/// Pre-loaded features `[n, d1, .., dk]` with one integer label per sample.
///
/// Features and labels are index-aligned: sample `i` is row `i` of the
/// features together with `labels[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledDataset {
    features: Tensor,
    labels: Vec<usize>,
}

impl LabeledDataset {
    /// # Errors
    ///
    /// Returns `GradNetError::ShapeMismatch` if the label count differs from
    /// the leading dimension of `features`.
    pub fn new(features: Tensor, labels: Vec<usize>) -> Result<Self, GradNetError> {
        let samples = features.shape().first().copied().unwrap_or(0);
        if features.rank() == 0 || samples != labels.len() {
            return Err(GradNetError::ShapeMismatch {
                expected: vec![samples],
                actual: vec![labels.len()],
                operation: "LabeledDataset labels".to_string(),
            });
        }
        Ok(Self { features, labels })
    }

    /// Per-sample shape (the feature shape without the leading axis).
    pub fn sample_shape(&self) -> &[usize] {
        &self.features.shape()[1..]
    }

    pub fn features(&self) -> &Tensor {
        &self.features
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Splits into `[0, at)` and `[at, len)`, e.g. for a train/test split.
    pub fn split_at(&self, at: usize) -> Result<(LabeledDataset, LabeledDataset), GradNetError> {
        let len = self.labels.len();
        let head = self.features.slice_rows(0, at)?;
        let tail = self.features.slice_rows(at, len)?;
        Ok((
            LabeledDataset {
                features: head,
                labels: self.labels[..at].to_vec(),
            },
            LabeledDataset {
                features: tail,
                labels: self.labels[at..].to_vec(),
            },
        ))
    }
}

impl Dataset for LabeledDataset {
    type Item = (Tensor, usize);

    fn get(&self, index: usize) -> Result<Self::Item, GradNetError> {
        let label = *self
            .labels
            .get(index)
            .ok_or_else(|| GradNetError::IndexOutOfBounds {
                index: vec![index],
                shape: vec![self.labels.len()],
            })?;
        Ok((self.features.row(index)?, label))
    }

    fn len(&self) -> usize {
        self.labels.len()
    }
}

#[cfg(test)]
#[path = "labeled_dataset_test.rs"]
mod tests;
