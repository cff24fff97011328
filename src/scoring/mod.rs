use std::fmt::Display;

use itertools::Itertools;
use log::{debug, info};
use serde::Serialize;

use crate::alphabets::aminoacid;
use crate::counts::SubstitutionCounts;
use crate::substitution_models::{FreqVector, ModelRegistry, RateMatrix, SubstMatrix};
use crate::NumericalFailure;

/// Which equilibrium frequencies a candidate is scored with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyAdaptation {
    /// The model's own equilibrium frequencies.
    Model,
    /// Frequencies observed in the alignment, the "+F" variant.
    Empirical,
}

impl FrequencyAdaptation {
    pub fn label(&self) -> &'static str {
        match self {
            FrequencyAdaptation::Model => "",
            FrequencyAdaptation::Empirical => "+F",
        }
    }
}

/// A model variant with its deviation from the data; lower is better.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredCandidate {
    pub model: String,
    pub adaptation: FrequencyAdaptation,
    pub score: f64,
}

impl Display for ScoredCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.model, self.adaptation.label())
    }
}

/// A model variant that could not be scored.
#[derive(Clone, Debug, PartialEq)]
pub struct CandidateFailure {
    pub model: String,
    pub adaptation: FrequencyAdaptation,
    pub reason: NumericalFailure,
}

impl Display for CandidateFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}: {}",
            self.model,
            self.adaptation.label(),
            self.reason
        )
    }
}

pub type CandidateResult = std::result::Result<ScoredCandidate, CandidateFailure>;

/// Diagonalisation test of a joint probability matrix against a model.
///
/// Computes `L·diag(1/f)·(F·R)` with the model's left and right eigenvectors and returns the
/// summed magnitude of its off-diagonal entries. Data evolved under the model with frequencies
/// `f` gives a diagonal matrix, so the score is zero only for a perfect fit.
pub fn diagonality_score(
    joint: &SubstMatrix,
    model: &RateMatrix,
    freqs: &FreqVector,
) -> std::result::Result<f64, NumericalFailure> {
    if let Some((i, &f)) = freqs
        .iter()
        .enumerate()
        .find(|(_, &f)| !f.is_finite() || f <= 0.0)
    {
        return Err(NumericalFailure::new(format!(
            "frequency of {} is {}, cannot divide by it",
            aminoacid(i),
            f
        )));
    }
    let inverse_freqs = SubstMatrix::from_diagonal(&freqs.map(|f| 1.0 / f));
    let transformed =
        model.left_eigenvectors() * inverse_freqs * (joint * model.right_eigenvectors());
    if transformed.iter().any(|x| !x.is_finite()) {
        return Err(NumericalFailure::new(
            "diagonalisation produced non-finite values",
        ));
    }
    let off_diagonal = (0..transformed.nrows())
        .cartesian_product(0..transformed.ncols())
        .filter(|(i, j)| i != j)
        .map(|(i, j)| transformed[(i, j)].abs())
        .sum::<f64>();
    Ok(off_diagonal)
}

/// Scores every model of a registry, plus an optional extra model, against observed counts.
pub struct ModelScorer<'a> {
    registry: &'a ModelRegistry,
    extra_model: Option<&'a RateMatrix>,
    empirical_freqs: bool,
}

impl<'a> ModelScorer<'a> {
    pub fn new(registry: &'a ModelRegistry) -> ModelScorer<'a> {
        ModelScorer {
            registry,
            extra_model: None,
            empirical_freqs: true,
        }
    }

    /// Appends a user-supplied model after the registry models.
    pub fn extra_model(mut self, model: Option<&'a RateMatrix>) -> ModelScorer<'a> {
        self.extra_model = model;
        self
    }

    /// Enables or disables the "+F" variants. Enabled by default.
    pub fn empirical_freqs(mut self, enabled: bool) -> ModelScorer<'a> {
        self.empirical_freqs = enabled;
        self
    }

    /// Models in scoring order.
    pub fn models(&self) -> impl Iterator<Item = &'a RateMatrix> {
        self.registry.models().iter().chain(self.extra_model)
    }

    /// Scores one model variant.
    pub fn score_candidate(
        &self,
        joint: &SubstMatrix,
        model: &RateMatrix,
        adaptation: FrequencyAdaptation,
        counts: &SubstitutionCounts,
    ) -> CandidateResult {
        let freqs = match adaptation {
            FrequencyAdaptation::Model => model.freqs(),
            FrequencyAdaptation::Empirical => counts.freqs(),
        };
        match diagonality_score(joint, model, freqs) {
            Ok(score) => {
                debug!("{}{} scored {}", model, adaptation.label(), score);
                Ok(ScoredCandidate {
                    model: model.name().to_string(),
                    adaptation,
                    score,
                })
            }
            Err(reason) => Err(CandidateFailure {
                model: model.name().to_string(),
                adaptation,
                reason,
            }),
        }
    }

    /// Scores the base variant of every model and, when enabled and the alignment contains
    /// every amino acid, the "+F" variant right after it. One result per attempted variant.
    pub fn score(&self, counts: &SubstitutionCounts) -> Vec<CandidateResult> {
        let joint = counts.probability_matrix();
        let use_empirical = self.empirical_freqs && counts.empirical_freqs_usable();
        let adaptations: &[FrequencyAdaptation] = if use_empirical {
            &[FrequencyAdaptation::Model, FrequencyAdaptation::Empirical]
        } else {
            &[FrequencyAdaptation::Model]
        };
        let results = self
            .models()
            .flat_map(|model| {
                adaptations
                    .iter()
                    .map(|&adaptation| self.score_candidate(&joint, model, adaptation, counts))
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        info!("Scored {} model variants", results.len());
        results
    }
}

#[cfg(test)]
#[cfg_attr(coverage, coverage(off))]
mod tests;
