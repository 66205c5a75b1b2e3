//! # DataLoader
//!
//! Groups dataset items into batches, visiting indices in the order chosen by
//! a [`Sampler`].
//!
//! ```rust
//! use gradnet_data::{DataLoader, SequentialSampler, VecDataset};
//!
//! let dataset = VecDataset::new(vec![1, 2, 3, 4, 5]);
//! let loader = DataLoader::new(dataset, 2, SequentialSampler::new(), false).unwrap();
//! let batches: Vec<Vec<i32>> = loader.map(|b| b.unwrap()).collect();
//! assert_eq!(batches, vec![vec![1, 2], vec![3, 4], vec![5]]);
//! ```

use crate::datasets::Dataset;
use crate::samplers::Sampler;
use gradnet_core::{GradNetError, Tensor};

/// Batching iterator over a dataset.
///
/// One iteration pass covers one epoch; call [`DataLoader::reset`] to start
/// the next one with a freshly sampled order.
pub struct DataLoader<D: Dataset, S: Sampler> {
    dataset: D,
    batch_size: usize,
    sampler: S,
    /// If true, a trailing batch smaller than `batch_size` is skipped.
    drop_last: bool,
    indices_iter: Box<dyn Iterator<Item = usize>>,
}

impl<D: Dataset, S: Sampler> DataLoader<D, S> {
    /// # Errors
    ///
    /// Returns `GradNetError::InvalidHyperParameter` if `batch_size` is zero.
    pub fn new(
        dataset: D,
        batch_size: usize,
        mut sampler: S,
        drop_last: bool,
    ) -> Result<Self, GradNetError> {
        if batch_size == 0 {
            return Err(GradNetError::InvalidHyperParameter {
                name: "batch_size".to_string(),
                value: 0.0,
            });
        }
        let indices_iter = sampler.iter(dataset.len());
        Ok(Self {
            dataset,
            batch_size,
            sampler,
            drop_last,
            indices_iter,
        })
    }

    pub fn dataset(&self) -> &D {
        &self.dataset
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of batches one pass yields.
    pub fn num_batches(&self) -> usize {
        let samples = self.sampler.len(self.dataset.len());
        if self.drop_last {
            samples / self.batch_size
        } else {
            (samples + self.batch_size - 1) / self.batch_size
        }
    }

    /// Starts a new pass over the dataset.
    pub fn reset(&mut self) {
        self.indices_iter = self.sampler.iter(self.dataset.len());
    }
}

impl<D: Dataset, S: Sampler> Iterator for DataLoader<D, S> {
    type Item = Result<Vec<D::Item>, GradNetError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut batch = Vec::with_capacity(self.batch_size);
        for idx in self.indices_iter.by_ref().take(self.batch_size) {
            match self.dataset.get(idx) {
                Ok(item) => batch.push(item),
                Err(e) => return Some(Err(e)),
            }
        }
        if batch.is_empty() || (self.drop_last && batch.len() < self.batch_size) {
            return None;
        }
        Some(Ok(batch))
    }
}

/// Stacks a batch of `(features, label)` samples into a feature tensor with a
/// leading batch axis and the matching label vector.
pub fn collate_labeled(batch: Vec<(Tensor, usize)>) -> Result<(Tensor, Vec<usize>), GradNetError> {
    let (samples, labels): (Vec<Tensor>, Vec<usize>) = batch.into_iter().unzip();
    Ok((Tensor::stack_rows(&samples)?, labels))
}

#[cfg(test)]
#[path = "dataloader_test.rs"]
mod tests;
