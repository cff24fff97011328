use anyhow::bail;
use itertools::Itertools;
use log::{debug, info, warn};

use crate::alignment::Alignment;
use crate::alphabets::{aminoacid, EncodedSequence, N};
use crate::sampling::SequencePair;
use crate::substitution_models::{FreqVector, SubstMatrix};
use crate::{InputError, Result};

/// Pairwise substitution counts and residue frequencies of one alignment.
#[derive(Clone, Debug, PartialEq)]
pub struct SubstitutionCounts {
    counts: SubstMatrix,
    freqs: FreqVector,
    observations: usize,
}

impl SubstitutionCounts {
    /// Symmetrised count matrix, `raw + rawᵗ`.
    pub fn counts(&self) -> &SubstMatrix {
        &self.counts
    }

    /// Residue frequencies over the whole alignment, regardless of pair sampling.
    pub fn freqs(&self) -> &FreqVector {
        &self.freqs
    }

    /// Number of aligned positions where both residues of a sampled pair were defined.
    pub fn observations(&self) -> usize {
        self.observations
    }

    /// Joint probability matrix, the symmetrised counts scaled to sum to one.
    pub fn probability_matrix(&self) -> SubstMatrix {
        &self.counts / self.counts.sum()
    }

    /// Amino acids that never occur in the alignment.
    pub fn missing_residues(&self) -> Vec<char> {
        self.freqs
            .iter()
            .enumerate()
            .filter(|(_, &f)| f == 0.0)
            .map(|(i, _)| aminoacid(i))
            .collect()
    }

    /// Whether the observed frequencies can stand in for model frequencies, which needs every
    /// amino acid to be observed at least once.
    pub fn empirical_freqs_usable(&self) -> bool {
        self.freqs.iter().all(|&f| f > 0.0)
    }
}

pub struct CountMatrixBuilder<'a> {
    msa: &'a Alignment,
    pairs: &'a [SequencePair],
    empirical_freqs: bool,
}

impl<'a> CountMatrixBuilder<'a> {
    pub fn new(msa: &'a Alignment, pairs: &'a [SequencePair]) -> CountMatrixBuilder<'a> {
        CountMatrixBuilder {
            msa,
            pairs,
            empirical_freqs: true,
        }
    }

    /// Whether "+F" variants will be tested. When they are not, missing amino acids are not
    /// worth a warning. Enabled by default.
    pub fn empirical_freqs(mut self, enabled: bool) -> CountMatrixBuilder<'a> {
        self.empirical_freqs = enabled;
        self
    }

    /// Counts residue pairings over the selected sequence pairs and residue frequencies over
    /// all sequences. Warns once if "+F" variants are enabled but some amino acid is never
    /// observed, since they are then unusable for the whole run.
    /// Bails if the alignment has no amino acid residues or if no selected pair shares a
    /// position where both residues are defined.
    ///
    /// # Example
    /// ```
    /// use bio::io::fasta::Record;
    /// use modelmatcher::alignment::Alignment;
    /// use modelmatcher::counts::CountMatrixBuilder;
    /// let msa = Alignment::from_records(vec![
    ///     Record::with_attrs("a", None, b"ARN"),
    ///     Record::with_attrs("b", None, b"ARD"),
    /// ])
    /// .unwrap();
    /// let counts = CountMatrixBuilder::new(&msa, &[(0, 1)]).build().unwrap();
    /// assert_eq!(counts.observations(), 3);
    /// assert_eq!(counts.counts()[(2, 3)], 1.0);
    /// assert_eq!(counts.counts()[(3, 2)], 1.0);
    /// ```
    pub fn build(self) -> Result<SubstitutionCounts> {
        let freqs = residue_frequencies(self.msa)?;
        info!(
            "Counting substitutions over {} sequence pairs",
            self.pairs.len()
        );
        let (raw, observations) = raw_counts(self.msa, self.pairs);
        if observations == 0 {
            bail!(InputError::new(
                "No aligned position has defined residues in both sequences of any sampled pair"
            ));
        }
        debug!("Counted {} residue pairings", observations);
        let counts = symmetrise(&raw);
        let counts = SubstitutionCounts {
            counts,
            freqs,
            observations,
        };
        if self.empirical_freqs && !counts.empirical_freqs_usable() {
            warn!(
                "Amino acids {} do not occur in the alignment, skipping models with observed frequencies (+F)",
                counts.missing_residues().iter().join(", ")
            );
        }
        Ok(counts)
    }
}

/// Observed amino acid frequencies over every sequence of the alignment.
/// Bails if the alignment holds no amino acid residue at all.
pub fn residue_frequencies(msa: &Alignment) -> Result<FreqVector> {
    let mut freqs = FreqVector::zeros(N);
    for code in msa.sequences().iter().flatten().flatten() {
        freqs[*code] += 1.0;
    }
    let total = freqs.sum();
    if total == 0.0 {
        bail!(InputError::new("The alignment contains no amino acid residues"));
    }
    Ok(freqs / total)
}

/// Adds the pairings of two aligned sequences to `counts`, returning how many positions had
/// both residues defined.
pub fn count_pair(x: &EncodedSequence, y: &EncodedSequence, counts: &mut SubstMatrix) -> usize {
    debug_assert_eq!(x.len(), y.len());
    let mut observed = 0;
    for (a, b) in x.iter().zip(y.iter()) {
        if let (Some(a), Some(b)) = (a, b) {
            counts[(*a, *b)] += 1.0;
            observed += 1;
        }
    }
    observed
}

pub fn symmetrise(raw: &SubstMatrix) -> SubstMatrix {
    raw + raw.transpose()
}

cfg_if::cfg_if! {
if #[cfg(feature = "parallel")] {
/// Pre-symmetrisation counts. Each rayon worker folds its pairs into a partial matrix, the
/// partial matrices are then summed.
pub fn raw_counts(msa: &Alignment, pairs: &[SequencePair]) -> (SubstMatrix, usize) {
    use rayon::prelude::*;
    let sequences = msa.sequences();
    pairs
        .par_iter()
        .fold(
            || (SubstMatrix::zeros(N, N), 0),
            |(mut counts, observed), &(x, y)| {
                let added = count_pair(&sequences[x], &sequences[y], &mut counts);
                (counts, observed + added)
            },
        )
        .reduce(
            || (SubstMatrix::zeros(N, N), 0),
            |(a, a_observed), (b, b_observed)| (a + b, a_observed + b_observed),
        )
}
} else {
/// Pre-symmetrisation counts.
pub fn raw_counts(msa: &Alignment, pairs: &[SequencePair]) -> (SubstMatrix, usize) {
    let sequences = msa.sequences();
    let mut counts = SubstMatrix::zeros(N, N);
    let observed: usize = pairs
        .iter()
        .map(|&(x, y)| count_pair(&sequences[x], &sequences[y], &mut counts))
        .sum();
    (counts, observed)
}
}
}
