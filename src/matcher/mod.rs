use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::alignment::Alignment;
use crate::counts::{CountMatrixBuilder, SubstitutionCounts};
use crate::ranking::Ranking;
use crate::sampling::{PairSample, PairSampler};
use crate::scoring::ModelScorer;
use crate::substitution_models::{ModelRegistry, RateMatrix};
use crate::Result;

/// Everything one matching run produces.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchReport {
    pub ranking: Ranking,
    pub counts: SubstitutionCounts,
    pub seq_count: usize,
    /// Requested number of sequence pairs, 0 meaning all of them.
    pub requested_sample_size: usize,
    pub actual_sample_size: usize,
}

impl MatchReport {
    pub fn observations(&self) -> usize {
        self.counts.observations()
    }
}

pub struct ModelMatcher<'a> {
    msa: &'a Alignment,
    registry: &'a ModelRegistry,
    extra_model: Option<&'a RateMatrix>,
    sample_size: usize,
    seed: Option<u64>,
    empirical_freqs: bool,
}

impl<'a> ModelMatcher<'a> {
    /// Creates a matcher for the alignment against the given models, examining all sequence
    /// pairs and testing frequency-adapted variants.
    ///
    /// # Example
    /// ```
    /// use bio::io::fasta::Record;
    /// use modelmatcher::alignment::Alignment;
    /// use modelmatcher::matcher::ModelMatcher;
    /// use modelmatcher::substitution_models::ModelRegistry;
    /// let msa = Alignment::from_records(vec![
    ///     Record::with_attrs("a", None, b"ARNDCQEGHILKMFPSTWYV"),
    ///     Record::with_attrs("b", None, b"ARNDCQEGHILKMFPSTWYA"),
    ///     Record::with_attrs("c", None, b"ARNDCQEGHILKMFPSTWVV"),
    /// ])
    /// .unwrap();
    /// let registry = ModelRegistry::builtin().unwrap();
    /// let report = ModelMatcher::new(&msa, &registry).run().unwrap();
    /// assert_eq!(report.actual_sample_size, 3);
    /// assert_eq!(report.ranking.full().len(), 2 * registry.len());
    /// ```
    pub fn new(msa: &'a Alignment, registry: &'a ModelRegistry) -> ModelMatcher<'a> {
        ModelMatcher {
            msa,
            registry,
            extra_model: None,
            sample_size: 0,
            seed: None,
            empirical_freqs: true,
        }
    }

    /// Number of sequence pairs to sample, 0 for all pairs.
    pub fn sample_size(mut self, sample_size: usize) -> ModelMatcher<'a> {
        self.sample_size = sample_size;
        self
    }

    /// Seed for pair sampling. Without one the generator is seeded from system entropy.
    pub fn seed(mut self, seed: Option<u64>) -> ModelMatcher<'a> {
        self.seed = seed;
        self
    }

    /// User-supplied model, scored after the registry models.
    pub fn extra_model(mut self, model: Option<&'a RateMatrix>) -> ModelMatcher<'a> {
        self.extra_model = model;
        self
    }

    pub fn empirical_freqs(mut self, enabled: bool) -> ModelMatcher<'a> {
        self.empirical_freqs = enabled;
        self
    }

    /// Samples sequence pairs, counts substitutions and ranks every candidate model.
    /// Bails if nothing can be counted. Candidates that fail to score are left out of the
    /// ranking rather than failing the run.
    pub fn run(self) -> Result<MatchReport> {
        let sample = self.sample_pairs();
        let counts = CountMatrixBuilder::new(self.msa, &sample.pairs)
            .empirical_freqs(self.empirical_freqs)
            .build()?;
        let results = ModelScorer::new(self.registry)
            .extra_model(self.extra_model)
            .empirical_freqs(self.empirical_freqs)
            .score(&counts);
        let ranking = Ranking::from_results(results);
        Ok(MatchReport {
            ranking,
            counts,
            seq_count: self.msa.seq_count(),
            requested_sample_size: sample.requested,
            actual_sample_size: sample.actual,
        })
    }

    fn sample_pairs(&self) -> PairSample {
        let mut rng = match self.seed {
            Some(seed) => {
                info!("Sampling sequence pairs with seed {}", seed);
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        };
        PairSampler::new(self.msa.seq_count(), self.sample_size).sample(&mut rng)
    }
}

#[cfg(test)]
#[cfg_attr(coverage, coverage(off))]
mod tests;
