use std::fmt::Debug;

/// Decides the order in which a [`DataLoader`](crate::DataLoader) visits
/// dataset indices.
///
/// `iter` takes `&mut self` so that stateful samplers (a seeded generator)
/// produce a fresh order on every pass.
pub trait Sampler: Debug {
    /// Returns the indices of one pass over a dataset of `dataset_len` items.
    fn iter(&mut self, dataset_len: usize) -> Box<dyn Iterator<Item = usize>>;

    /// Number of indices one pass yields.
    fn len(&self, dataset_len: usize) -> usize;
}
