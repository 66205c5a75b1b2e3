use super::traits::Dataset;
use gradnet_core::GradNetError;

/// A dataset backed by a `Vec`; each element is one sample.
#[derive(Debug, Clone)]
pub struct VecDataset<T: Clone> {
    data: Vec<T>,
}

impl<T: Clone> VecDataset<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self { data }
    }
}

impl<T: Clone> Dataset for VecDataset<T> {
    type Item = T;

    /// Clones the item at `index`.
    fn get(&self, index: usize) -> Result<Self::Item, GradNetError> {
        self.data
            .get(index)
            .cloned()
            .ok_or_else(|| GradNetError::IndexOutOfBounds {
                index: vec![index],
                shape: vec![self.data.len()],
            })
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
#[path = "vec_dataset_test.rs"]
mod tests;
