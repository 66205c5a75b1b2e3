use super::traits::Sampler;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Visits indices in a seeded random order.
///
/// Without replacement every pass is a permutation (truncated to
/// `num_samples` if given); with replacement indices are drawn independently.
/// The generator advances across passes, so consecutive passes differ while
/// the whole sequence is reproducible from the seed.
#[derive(Debug, Clone)]
pub struct RandomSampler {
    replacement: bool,
    num_samples: Option<usize>,
    rng: StdRng,
}

impl RandomSampler {
    pub fn new(seed: u64) -> Self {
        Self::with_options(seed, false, None)
    }

    /// # Arguments
    ///
    /// * `replacement`: If `true`, an index can be selected multiple times.
    /// * `num_samples`: Samples per pass. Defaults to the dataset size.
    pub fn with_options(seed: u64, replacement: bool, num_samples: Option<usize>) -> Self {
        RandomSampler {
            replacement,
            num_samples,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Sampler for RandomSampler {
    fn iter(&mut self, dataset_len: usize) -> Box<dyn Iterator<Item = usize>> {
        if dataset_len == 0 {
            return Box::new(std::iter::empty());
        }
        let count = self.num_samples.unwrap_or(dataset_len);

        if self.replacement {
            let indices: Vec<usize> = (0..count)
                .map(|_| self.rng.gen_range(0..dataset_len))
                .collect();
            return Box::new(indices.into_iter());
        }
        if count > dataset_len {
            log::warn!(
                "RandomSampler: num_samples ({}) > dataset_len ({}) without replacement, yielding {}",
                count,
                dataset_len,
                dataset_len
            );
        }
        let mut indices: Vec<usize> = (0..dataset_len).collect();
        indices.shuffle(&mut self.rng);
        indices.truncate(count);
        Box::new(indices.into_iter())
    }

    fn len(&self, dataset_len: usize) -> usize {
        match self.num_samples {
            _ if dataset_len == 0 => 0,
            Some(n) if !self.replacement => n.min(dataset_len),
            Some(n) => n,
            None => dataset_len,
        }
    }
}

#[cfg(test)]
#[path = "random_sampler_test.rs"]
mod tests;
