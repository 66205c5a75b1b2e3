pub mod labeled_dataset;
pub mod traits;
pub mod vec_dataset;

pub use labeled_dataset::LabeledDataset;
pub use traits::Dataset;
pub use vec_dataset::VecDataset;
