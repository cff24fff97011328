use anyhow::bail;
use log::{info, warn};
use rand::seq::index;
use rand::Rng;

use crate::{ConfigurationError, Result};

/// Unordered pair of sequence indices, first index always smaller than the second.
pub type SequencePair = (usize, usize);

/// The pairs selected for counting, with the sample size that was asked for and the one used.
#[derive(Clone, Debug, PartialEq)]
pub struct PairSample {
    pub pairs: Vec<SequencePair>,
    /// Requested sample size, 0 meaning all pairs.
    pub requested: usize,
    pub actual: usize,
}

impl PairSample {
    pub fn is_exhaustive(&self) -> bool {
        self.requested == 0
    }
}

/// Number of unordered pairs among `seq_count` sequences.
pub fn total_pairs(seq_count: usize) -> usize {
    seq_count * seq_count.saturating_sub(1) / 2
}

/// Maps a rank in `0..total_pairs(seq_count)` to its pair, enumerating
/// (0,1), (0,2), .., (0,n-1), (1,2), ..
pub fn pair_from_index(seq_count: usize, mut k: usize) -> SequencePair {
    debug_assert!(k < total_pairs(seq_count));
    let mut i = 0;
    let mut row = seq_count - 1;
    while k >= row {
        k -= row;
        i += 1;
        row -= 1;
    }
    (i, i + 1 + k)
}

/// Validates a user-supplied sample size. Negative values are a configuration error.
pub fn sample_size_from(value: i64) -> Result<usize> {
    if value < 0 {
        bail!(ConfigurationError::new(format!(
            "Sample size must be non-negative, got {}",
            value
        )));
    }
    Ok(value as usize)
}

/// Chooses which sequence pairs contribute to the count matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PairSampler {
    seq_count: usize,
    sample_size: usize,
}

impl PairSampler {
    /// Sampler over `seq_count` sequences. A `sample_size` of 0 selects all pairs.
    pub fn new(seq_count: usize, sample_size: usize) -> PairSampler {
        PairSampler {
            seq_count,
            sample_size,
        }
    }

    pub fn exhaustive(seq_count: usize) -> PairSampler {
        PairSampler::new(seq_count, 0)
    }

    /// Selects the pairs to examine. Sampling draws uniformly without replacement from the
    /// index range of all pairs, so the pair universe itself is never built. Sample sizes
    /// above the number of available pairs are clamped.
    ///
    /// # Example
    /// ```
    /// use rand::{rngs::StdRng, SeedableRng};
    /// use modelmatcher::sampling::PairSampler;
    /// let mut rng = StdRng::seed_from_u64(7);
    /// let sample = PairSampler::new(4, 100).sample(&mut rng);
    /// assert_eq!(sample.actual, 6);
    /// assert_eq!(sample.requested, 100);
    /// ```
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PairSample {
        let total = total_pairs(self.seq_count);
        if self.sample_size == 0 {
            info!("Using all {} sequence pairs", total);
            return PairSample {
                pairs: self.all_pairs(),
                requested: 0,
                actual: total,
            };
        }
        let actual = if self.sample_size > total {
            warn!(
                "Requested sample of {} pairs, but only {} pairs exist; using all of them",
                self.sample_size, total
            );
            total
        } else {
            self.sample_size
        };
        let mut ranks = index::sample(rng, total, actual).into_vec();
        ranks.sort_unstable();
        info!("Sampled {} of {} sequence pairs", actual, total);
        PairSample {
            pairs: ranks
                .into_iter()
                .map(|k| pair_from_index(self.seq_count, k))
                .collect(),
            requested: self.sample_size,
            actual,
        }
    }

    fn all_pairs(&self) -> Vec<SequencePair> {
        (0..self.seq_count)
            .flat_map(|i| ((i + 1)..self.seq_count).map(move |j| (i, j)))
            .collect()
    }
}
