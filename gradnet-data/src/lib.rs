//! Dataset providers feeding a GradNet model.
//!
//! A [`Dataset`] gives indexed access to samples, a [`Sampler`] decides the
//! order in which indices are visited, and a [`DataLoader`] groups the
//! resulting samples into batches.

pub mod dataloader;
pub mod datasets;
pub mod samplers;

pub use dataloader::{collate_labeled, DataLoader};
pub use datasets::{Dataset, LabeledDataset, VecDataset};
pub use samplers::{RandomSampler, Sampler, SequentialSampler};
