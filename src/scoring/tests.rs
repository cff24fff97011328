use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rstest::*;

use crate::alphabets::{AMINOACIDS, N};
use crate::counts::{symmetrise, CountMatrixBuilder, SubstitutionCounts};
use crate::scoring::{diagonality_score, FrequencyAdaptation, ModelScorer, ScoredCandidate};
use crate::substitution_models::{
    FreqVector, ModelRegistry, ProteinModelType, RateMatrix, SubstMatrix, N_EXCHANGEABILITIES,
};

fn complete_counts() -> SubstitutionCounts {
    let shifted = [&AMINOACIDS[1..], &AMINOACIDS[..1]].concat();
    let msa = alignment!(
        ("a", AMINOACIDS),
        ("b", AMINOACIDS),
        ("c", &shifted),
        ("d", b"AAAAARRRRRNNNNNDDDDD")
    );
    let pairs = [(0, 1), (0, 2), (1, 2), (0, 3), (1, 3), (2, 3)];
    CountMatrixBuilder::new(&msa, &pairs).build().unwrap()
}

fn uniform_counts() -> SubstitutionCounts {
    let msa = alignment!(
        ("a", b"AAAAAAAAAA"),
        ("b", b"AAAAAAAAAA"),
        ("c", b"AAAAAAAAAA")
    );
    CountMatrixBuilder::new(&msa, &[(0, 1), (0, 2), (1, 2)])
        .build()
        .unwrap()
}

#[rstest]
fn expected_data_is_diagonal(
    #[values(
        ProteinModelType::LG,
        ProteinModelType::WAG,
        ProteinModelType::JTT,
        ProteinModelType::Dayhoff,
        ProteinModelType::Poisson
    )]
    model_type: ProteinModelType,
    #[values(0.05, 0.5, 2.0)] time: f64,
) {
    let model = model_type.rate_matrix().unwrap();
    let joint = model.joint_probabilities(time);
    let score = diagonality_score(&joint, &model, model.freqs()).unwrap();
    assert!(score < 1e-9, "{} at {} scored {}", model, time, score);
}

#[test]
fn mismatched_model_scores_worse() {
    let wag = ProteinModelType::WAG.rate_matrix().unwrap();
    let poisson = ProteinModelType::Poisson.rate_matrix().unwrap();
    let joint = wag.joint_probabilities(0.5);
    let wag_score = diagonality_score(&joint, &wag, wag.freqs()).unwrap();
    let poisson_score = diagonality_score(&joint, &poisson, poisson.freqs()).unwrap();
    assert!(poisson_score > wag_score);
    assert!(poisson_score > 1e-3);
}

#[test]
#[cfg_attr(feature = "ci_coverage", ignore)]
fn simulated_data_prefers_generating_model() {
    let wag = ProteinModelType::WAG.rate_matrix().unwrap();
    let poisson = ProteinModelType::Poisson.rate_matrix().unwrap();
    let mut rng = StdRng::seed_from_u64(13);
    let counts = symmetrise(&wag.sample_count_matrix(200_000, &[0.5], &mut rng).unwrap());
    let joint = &counts / counts.sum();
    let wag_score = diagonality_score(&joint, &wag, wag.freqs()).unwrap();
    let poisson_score = diagonality_score(&joint, &poisson, poisson.freqs()).unwrap();
    assert!(wag_score < poisson_score);
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(3)]
fn scores_are_non_negative(#[case] seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let lg = ProteinModelType::LG.rate_matrix().unwrap();
    let counts = symmetrise(&lg.sample_count_matrix(500, &[0.1, 1.0, 3.0], &mut rng).unwrap());
    let joint = &counts / counts.sum();
    for model_type in ProteinModelType::ALL {
        let model = model_type.rate_matrix().unwrap();
        let score = diagonality_score(&joint, &model, model.freqs()).unwrap();
        assert!(score >= 0.0);
        assert_eq!(
            score,
            diagonality_score(&joint, &model, model.freqs()).unwrap()
        );
    }
}

#[test]
fn zero_frequency_is_a_numerical_failure() {
    let model = ProteinModelType::JTT.rate_matrix().unwrap();
    let mut freqs = FreqVector::from_element(N, 1.0 / 19.0);
    freqs[4] = 0.0;
    let joint = model.joint_probabilities(1.0);
    let failure = diagonality_score(&joint, &model, &freqs).unwrap_err();
    assert!(failure.message.contains('C'));
}

#[test]
fn base_and_empirical_variants() {
    let registry = ModelRegistry::builtin().unwrap();
    let results = ModelScorer::new(&registry).score(&complete_counts());
    assert_eq!(results.len(), 2 * registry.len());
    let candidates = results
        .into_iter()
        .collect::<Result<Vec<ScoredCandidate>, _>>()
        .unwrap();
    let names = candidates.iter().map(|c| c.to_string()).collect::<Vec<_>>();
    assert_eq!(
        names,
        vec![
            "LG",
            "LG+F",
            "WAG",
            "WAG+F",
            "JTT",
            "JTT+F",
            "Dayhoff",
            "Dayhoff+F",
            "Poisson",
            "Poisson+F"
        ]
    );
    assert!(candidates.iter().all(|c| c.score >= 0.0));
}

#[test]
fn empirical_variants_can_be_disabled() {
    let registry = ModelRegistry::builtin().unwrap();
    let results = ModelScorer::new(&registry)
        .empirical_freqs(false)
        .score(&complete_counts());
    assert_eq!(results.len(), registry.len());
    assert!(results
        .iter()
        .all(|r| r.as_ref().unwrap().adaptation == FrequencyAdaptation::Model));
}

#[test]
fn missing_residues_skip_empirical_variants() {
    let registry = ModelRegistry::builtin().unwrap();
    let results = ModelScorer::new(&registry).score(&uniform_counts());
    assert_eq!(results.len(), registry.len());
    for (result, model) in results.iter().zip(registry.models()) {
        let candidate = result.as_ref().unwrap();
        assert_eq!(candidate.model, model.name());
        assert_eq!(candidate.adaptation, FrequencyAdaptation::Model);
    }
}

#[test]
fn failing_variant_is_reported_not_raised() {
    let registry = ModelRegistry::builtin().unwrap();
    let scorer = ModelScorer::new(&registry);
    let counts = uniform_counts();
    let joint = counts.probability_matrix();
    let model = registry.get("LG").unwrap();
    let failure = scorer
        .score_candidate(&joint, model, FrequencyAdaptation::Empirical, &counts)
        .unwrap_err();
    assert_eq!(failure.model, "LG");
    assert_eq!(failure.adaptation, FrequencyAdaptation::Empirical);
    assert!(failure.to_string().starts_with("LG+F: "));
    assert!(scorer
        .score_candidate(&joint, model, FrequencyAdaptation::Model, &counts)
        .is_ok());
}

#[test]
fn extra_model_is_scored_last() {
    let registry = ModelRegistry::builtin().unwrap();
    let custom = RateMatrix::new("custom", &[2.0; N_EXCHANGEABILITIES], &[0.05; N]).unwrap();
    let scorer = ModelScorer::new(&registry).extra_model(Some(&custom));
    assert_eq!(scorer.models().count(), registry.len() + 1);
    let results = scorer.score(&complete_counts());
    assert_eq!(results.len(), 2 * (registry.len() + 1));
    let last = results.last().unwrap().as_ref().unwrap();
    assert_eq!(last.model, "custom");
    assert_eq!(last.adaptation, FrequencyAdaptation::Empirical);
}

#[test]
fn rescoring_is_deterministic() {
    let registry = ModelRegistry::builtin().unwrap();
    let counts = complete_counts();
    let scorer = ModelScorer::new(&registry);
    assert_eq!(scorer.score(&counts), scorer.score(&counts));
}

#[test]
fn identity_joint_scores_zero_for_poisson() {
    // no substitutions under uniform frequencies is distance zero for Poisson
    let poisson = ProteinModelType::Poisson.rate_matrix().unwrap();
    let joint = SubstMatrix::identity(N, N) / N as f64;
    let score = diagonality_score(&joint, &poisson, poisson.freqs()).unwrap();
    assert!(score < 1e-9);
}

#[test]
fn small_deviations_keep_their_precision() {
    let wag = ProteinModelType::WAG.rate_matrix().unwrap();
    let mut joint = wag.joint_probabilities(0.01);
    joint[(0, 1)] += 1e-9;
    joint[(1, 0)] += 1e-9;
    let score = diagonality_score(&joint, &wag, wag.freqs()).unwrap();

    let inverse_freqs = SubstMatrix::from_diagonal(&wag.freqs().map(|f| 1.0 / f));
    let transformed =
        wag.left_eigenvectors() * inverse_freqs * (&joint * wag.right_eigenvectors());
    let mut expected = 0.0;
    for i in 0..N {
        for j in 0..N {
            if i != j {
                expected += transformed[(i, j)].abs();
            }
        }
    }
    assert!(score > 0.0);
    assert_relative_eq!(score, expected, max_relative = 1e-12);
}
