use super::*;
use std::collections::HashSet;

#[test]
fn test_random_sampler_is_a_permutation() {
    let mut sampler = RandomSampler::new(3);
    let indices: Vec<usize> = sampler.iter(10).collect();
    assert_eq!(indices.len(), 10);
    let unique: HashSet<usize> = indices.into_iter().collect();
    assert_eq!(unique, (0..10).collect::<HashSet<_>>());
    assert_eq!(sampler.len(10), 10);
}

#[test]
fn test_random_sampler_is_reproducible() {
    let mut a = RandomSampler::new(42);
    let mut b = RandomSampler::new(42);
    let first: Vec<usize> = a.iter(20).collect();
    assert_eq!(first, b.iter(20).collect::<Vec<_>>());
    // The generator advances between passes.
    let second: Vec<usize> = a.iter(20).collect();
    assert_ne!(first, second);
    assert_eq!(second, b.iter(20).collect::<Vec<_>>());
}

#[test]
fn test_random_sampler_num_samples() {
    let mut sampler = RandomSampler::with_options(0, false, Some(4));
    let indices: Vec<usize> = sampler.iter(10).collect();
    assert_eq!(indices.len(), 4);
    assert_eq!(indices.iter().collect::<HashSet<_>>().len(), 4);

    let mut capped = RandomSampler::with_options(0, false, Some(15));
    assert_eq!(capped.iter(10).count(), 10);
    assert_eq!(capped.len(10), 10);
}

#[test]
fn test_random_sampler_with_replacement() {
    let mut sampler = RandomSampler::with_options(7, true, Some(50));
    let indices: Vec<usize> = sampler.iter(3).collect();
    assert_eq!(indices.len(), 50);
    assert!(indices.iter().all(|&i| i < 3));
    assert_eq!(sampler.len(3), 50);
}

#[test]
fn test_random_sampler_empty_dataset() {
    let mut sampler = RandomSampler::with_options(1, true, Some(5));
    assert_eq!(sampler.iter(0).next(), None);
    assert_eq!(sampler.len(0), 0);
}
