use log::Level;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstest::*;

use crate::alignment::Alignment;
use crate::alphabets::{aminoacid, AMINOACIDS, N};
use crate::matcher::ModelMatcher;
use crate::scoring::FrequencyAdaptation;
use crate::substitution_models::{ModelRegistry, ProteinModelType, RateMatrix, N_EXCHANGEABILITIES};
use crate::InputError;

fn weighted(weights: impl Iterator<Item = f64>) -> WeightedIndex<f64> {
    WeightedIndex::new(weights.map(|w| w.max(0.0))).unwrap()
}

/// Star tree: every sequence evolves independently from a shared root for `time`.
fn simulate_star(
    model: &RateMatrix,
    seq_count: usize,
    len: usize,
    time: f64,
    seed: u64,
) -> Alignment {
    let mut rng = StdRng::seed_from_u64(seed);
    let root_dist = weighted(model.freqs().iter().copied());
    let root = (0..len)
        .map(|_| root_dist.sample(&mut rng))
        .collect::<Vec<_>>();
    let p = model.p(time);
    let branch = (0..N)
        .map(|i| weighted(p.row(i).iter().copied()))
        .collect::<Vec<_>>();
    let records = (0..seq_count)
        .map(|s| {
            let seq = root
                .iter()
                .map(|&r| aminoacid(branch[r].sample(&mut rng)) as u8)
                .collect::<Vec<_>>();
            record!(format!("leaf{}", s).as_str(), &seq)
        })
        .collect();
    Alignment::from_records(records).unwrap()
}

fn random_alignment(seq_count: usize, len: usize, seed: u64) -> Alignment {
    let mut rng = StdRng::seed_from_u64(seed);
    let records = (0..seq_count)
        .map(|i| {
            let seq = (0..len)
                .map(|_| AMINOACIDS[rng.gen_range(0..N)])
                .collect::<Vec<_>>();
            record!(format!("seq{}", i).as_str(), &seq)
        })
        .collect();
    Alignment::from_records(records).unwrap()
}

#[test]
#[cfg_attr(feature = "ci_coverage", ignore)]
fn simulated_alignment_prefers_generating_model() {
    let registry = ModelRegistry::builtin().unwrap();
    let wag = ProteinModelType::WAG.rate_matrix().unwrap();
    let msa = simulate_star(&wag, 12, 3000, 0.2, 21);
    let report = ModelMatcher::new(&msa, &registry).seed(Some(1)).run().unwrap();
    assert_eq!(report.actual_sample_size, 66);
    assert_eq!(report.observations(), 66 * 3000);
    let best_of = |name: &str| {
        report
            .ranking
            .full()
            .iter()
            .find(|c| c.model == name)
            .unwrap()
            .score
    };
    assert!(best_of("WAG") < best_of("LG"));
    assert!(best_of("WAG") < best_of("Poisson"));
}

#[test]
fn oversized_sample_is_clamped() {
    let registry = ModelRegistry::builtin().unwrap();
    let msa = random_alignment(4, 40, 2);
    let sampled = ModelMatcher::new(&msa, &registry)
        .sample_size(100)
        .seed(Some(5))
        .run()
        .unwrap();
    assert_eq!(sampled.requested_sample_size, 100);
    assert_eq!(sampled.actual_sample_size, 6);
    assert_eq!(sampled.seq_count, 4);

    let exhaustive = ModelMatcher::new(&msa, &registry).run().unwrap();
    assert_eq!(exhaustive.requested_sample_size, 0);
    assert_eq!(exhaustive.actual_sample_size, 6);
    assert_eq!(sampled.counts, exhaustive.counts);
    assert_eq!(sampled.ranking, exhaustive.ranking);
}

#[test]
fn seeded_runs_are_reproducible() {
    let registry = ModelRegistry::builtin().unwrap();
    let msa = random_alignment(30, 60, 3);
    let run = |seed| {
        ModelMatcher::new(&msa, &registry)
            .sample_size(50)
            .seed(Some(seed))
            .run()
            .unwrap()
    };
    let first = run(11);
    assert_eq!(first.actual_sample_size, 50);
    assert_eq!(first, run(11));
}

#[test]
fn uniform_alignment_ranks_base_models_only() {
    let registry = ModelRegistry::builtin().unwrap();
    let msa = alignment!(
        ("a", b"AAAAAAAAAA"),
        ("b", b"AAAAAAAAAA"),
        ("c", b"AAAAAAAAAA")
    );
    let report = ModelMatcher::new(&msa, &registry).run().unwrap();
    assert_eq!(report.ranking.full().len(), registry.len());
    assert!(report
        .ranking
        .full()
        .iter()
        .all(|c| c.adaptation == FrequencyAdaptation::Model));
    assert!(report.ranking.failures().is_empty());
    assert_eq!(report.observations(), 30);
}

#[rstest]
#[case::frequencies_tested(true, 1)]
#[case::frequencies_switched_off(false, 0)]
fn missing_residues_are_reported_once(#[case] empirical_freqs: bool, #[case] warnings: usize) {
    testing_logger::setup();
    let registry = ModelRegistry::builtin().unwrap();
    let msa = alignment!(
        ("a", b"AAAAAAAAAA"),
        ("b", b"AAAAAAAAAA"),
        ("c", b"AAAAAAAAAA")
    );
    let report = ModelMatcher::new(&msa, &registry)
        .empirical_freqs(empirical_freqs)
        .run()
        .unwrap();
    assert_eq!(report.ranking.full().len(), registry.len());
    testing_logger::validate(|captured_logs| {
        let warned = captured_logs
            .iter()
            .filter(|log| log.level == Level::Warn)
            .collect::<Vec<_>>();
        assert_eq!(warned.len(), warnings);
        for log in warned {
            assert!(log.body.starts_with("Amino acids R, N, D"));
            assert!(log.body.contains("do not occur in the alignment"));
        }
    });
}

#[test]
fn frequency_variants_can_be_switched_off() {
    let registry = ModelRegistry::builtin().unwrap();
    let msa = random_alignment(6, 200, 4);
    let report = ModelMatcher::new(&msa, &registry)
        .empirical_freqs(false)
        .run()
        .unwrap();
    assert_eq!(report.ranking.full().len(), registry.len());
    assert_eq!(report.ranking.simple().len(), registry.len());
}

#[test]
fn extra_model_is_ranked() {
    let registry = ModelRegistry::builtin().unwrap();
    let custom = RateMatrix::new("custom", &[1.5; N_EXCHANGEABILITIES], &[0.05; N]).unwrap();
    let msa = random_alignment(6, 200, 6);
    let report = ModelMatcher::new(&msa, &registry)
        .extra_model(Some(&custom))
        .run()
        .unwrap();
    assert_eq!(report.ranking.full().len(), 2 * (registry.len() + 1));
    assert_eq!(
        report
            .ranking
            .full()
            .iter()
            .filter(|c| c.model == "custom")
            .count(),
        2
    );
}

#[test]
fn nothing_to_count_fails_the_run() {
    let registry = ModelRegistry::builtin().unwrap();
    let msa = alignment!(("a", b"AR--"), ("b", b"--ND"));
    let err = ModelMatcher::new(&msa, &registry).run().unwrap_err();
    assert!(err.downcast_ref::<InputError>().is_some());
}
