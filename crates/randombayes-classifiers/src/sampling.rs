//! Bootstrap resampling and seed derivation.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::dataset::Dataset;

/// Draws a resample of a dataset with replacement.
pub trait BootstrapSampler: Send + Sync {
    /// Row indices of a resample of `num_instances` rows at `size_fraction`.
    /// The same arguments must always produce the same rows.
    fn sample_rows(&self, num_instances: usize, size_fraction: f64, seed: u64) -> anyhow::Result<Vec<usize>>;

    fn resample(&self, data: &Dataset, size_fraction: f64, seed: u64) -> anyhow::Result<Dataset> {
        let rows = self.sample_rows(data.num_instances(), size_fraction, seed)?;
        Ok(data.select_rows(&rows))
    }
}

/// Uniform bootstrap with replacement. The sample holds `floor(n * fraction)` rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct Resample;

impl BootstrapSampler for Resample {
    fn sample_rows(&self, num_instances: usize, size_fraction: f64, seed: u64) -> anyhow::Result<Vec<usize>> {
        if !(size_fraction.is_finite() && size_fraction > 0.0) {
            anyhow::bail!("Sample size fraction must be positive, got {}", size_fraction);
        }
        if num_instances == 0 {
            return Ok(Vec::new());
        }
        let sample_size = (num_instances as f64 * size_fraction).floor() as usize;
        let mut rng = StdRng::seed_from_u64(seed);
        Ok((0..sample_size)
            .map(|_| rng.gen_range(0..num_instances))
            .collect())
    }
}

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// Seed of member `index`, a pure function of the global seed and the index.
///
/// SplitMix64 output for the `index + 1`-th step of a Weyl sequence started at
/// `global_seed`, so neighbouring members get unrelated streams.
pub fn derive_member_seed(global_seed: u64, index: usize) -> u64 {
    let mut z = global_seed.wrapping_add(GOLDEN_GAMMA.wrapping_mul(index as u64 + 1));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::toy_dataset;

    #[test]
    fn sample_size_follows_fraction() {
        let sampler = Resample;
        assert_eq!(sampler.sample_rows(100, 1.0, 7).unwrap().len(), 100);
        assert_eq!(sampler.sample_rows(100, 0.6, 7).unwrap().len(), 60);
        assert_eq!(sampler.sample_rows(10, 1.5, 7).unwrap().len(), 15);
        assert!(sampler.sample_rows(0, 1.0, 7).unwrap().is_empty());
        assert!(sampler.sample_rows(10, 0.0, 7).is_err());
    }

    #[test]
    fn same_seed_same_rows() {
        let sampler = Resample;
        let a = sampler.sample_rows(50, 1.0, 11).unwrap();
        let b = sampler.sample_rows(50, 1.0, 11).unwrap();
        let c = sampler.sample_rows(50, 1.0, 12).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.iter().all(|&r| r < 50));
    }

    #[test]
    fn resample_keeps_schema() {
        let data = toy_dataset();
        let sample = Resample.resample(&data, 2.0, 3).unwrap();
        assert_eq!(sample.num_instances(), 6);
        assert_eq!(sample.schema(), data.schema());
    }

    #[test]
    fn member_seeds_are_stable_and_distinct() {
        assert_eq!(derive_member_seed(42, 3), derive_member_seed(42, 3));
        assert_ne!(derive_member_seed(42, 3), derive_member_seed(42, 4));
        assert_ne!(derive_member_seed(42, 0), derive_member_seed(43, 0));
    }
}
