use gradnet_core::GradNetError;

/// Indexed collection of samples.
///
/// An item can be a single tensor, a `(features, label)` pair or any other
/// type the caller batches later.
pub trait Dataset {
    /// The type of a single item returned by the dataset.
    type Item;

    /// Returns the item at `index`.
    ///
    /// # Errors
    ///
    /// Returns `GradNetError::IndexOutOfBounds` if `index >= self.len()`.
    fn get(&self, index: usize) -> Result<Self::Item, GradNetError>;

    /// Returns the total number of items in the dataset.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
