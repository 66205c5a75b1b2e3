use super::*;
use crate::datasets::{LabeledDataset, VecDataset};
use crate::samplers::{RandomSampler, SequentialSampler};
use std::collections::HashSet;

#[test]
fn test_dataloader_keeps_trailing_batch() {
    let loader = DataLoader::new(VecDataset::new(vec![1, 2, 3, 4, 5]), 2, SequentialSampler, false).unwrap();
    assert_eq!(loader.num_batches(), 3);
    let batches: Vec<Vec<i32>> = loader.map(Result::unwrap).collect();
    assert_eq!(batches, vec![vec![1, 2], vec![3, 4], vec![5]]);
}

#[test]
fn test_dataloader_drop_last() {
    let loader = DataLoader::new(VecDataset::new(vec![1, 2, 3, 4, 5]), 2, SequentialSampler, true).unwrap();
    assert_eq!(loader.num_batches(), 2);
    assert_eq!(loader.count(), 2);
}

#[test]
fn test_dataloader_rejects_zero_batch_size() {
    let result = DataLoader::new(VecDataset::new(vec![1]), 0, SequentialSampler, false);
    assert!(matches!(
        result,
        Err(GradNetError::InvalidHyperParameter { .. })
    ));
}

#[test]
fn test_dataloader_reset_starts_new_pass() {
    let mut loader = DataLoader::new(VecDataset::new((0..6).collect::<Vec<i32>>()), 4, RandomSampler::new(9), false).unwrap();
    let first: Vec<i32> = loader.by_ref().flat_map(Result::unwrap).collect();
    assert_eq!(loader.next(), None);
    loader.reset();
    let second: Vec<i32> = loader.by_ref().flat_map(Result::unwrap).collect();
    assert_eq!(first.iter().collect::<HashSet<_>>().len(), 6);
    assert_eq!(second.iter().collect::<HashSet<_>>().len(), 6);
}

#[test]
fn test_collate_labeled() {
    let features = Tensor::new((0..8).map(f64::from).collect(), vec![4, 2]).unwrap();
    let dataset = LabeledDataset::new(features, vec![3, 1, 0, 2]).unwrap();
    let mut loader = DataLoader::new(dataset, 3, SequentialSampler, false).unwrap();

    let (x, y) = collate_labeled(loader.next().unwrap().unwrap()).unwrap();
    assert_eq!(x.shape(), &[3, 2]);
    assert_eq!(x.data(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    assert_eq!(y, vec![3, 1, 0]);

    let (x, y) = collate_labeled(loader.next().unwrap().unwrap()).unwrap();
    assert_eq!(x.shape(), &[1, 2]);
    assert_eq!(y, vec![2]);
    assert!(collate_labeled(Vec::new()).is_err());
}
