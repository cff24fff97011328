use approx::assert_relative_eq;
use rstest::*;
use serde_json::Value;

use crate::alphabets::AMINOACIDS;
use crate::matcher::{MatchReport, ModelMatcher};
use crate::output::{
    listed_candidates, render, render_json, render_text, render_tool, OutputFormat,
};
use crate::ranking::DownstreamTool;
use crate::scoring::{FrequencyAdaptation, ScoredCandidate};
use crate::substitution_models::ModelRegistry;
use crate::ConfigurationError;

fn report(sample_size: usize) -> MatchReport {
    let shifted = [&AMINOACIDS[1..], &AMINOACIDS[..1]].concat();
    let msa = alignment!(
        ("a", AMINOACIDS),
        ("b", AMINOACIDS),
        ("c", &shifted),
        ("d", b"AAAAARRRRRNNNNNDDDDD")
    );
    let registry = ModelRegistry::builtin().unwrap();
    ModelMatcher::new(&msa, &registry)
        .sample_size(sample_size)
        .seed(Some(2))
        .run()
        .unwrap()
}

fn candidate(model: &str, adaptation: FrequencyAdaptation, score: f64) -> ScoredCandidate {
    ScoredCandidate {
        model: model.to_string(),
        adaptation,
        score,
    }
}

#[test]
fn text_is_padded_to_longest_name() {
    let wag = candidate("WAG", FrequencyAdaptation::Model, 0.5);
    let dayhoff = candidate("Dayhoff", FrequencyAdaptation::Empirical, 12.0);
    assert_eq!(
        render_text(&[&wag, &dayhoff]),
        "WAG        0.5000\nDayhoff+F  12.0000\n"
    );
    assert_eq!(render_text(&[]), "");
}

#[rstest]
#[case::full(false, 10)]
#[case::simple(true, 5)]
fn text_lists_ranking(#[case] simple: bool, #[case] expected_lines: usize) {
    let report = report(0);
    let text = render(&report, OutputFormat::Text, simple).unwrap();
    let lines = text.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), expected_lines);
    let best = report.ranking.best().unwrap().to_string();
    if !simple {
        assert!(lines[0].starts_with(&best));
    }
    let scores = lines
        .iter()
        .map(|l| l.split_whitespace().last().unwrap().parse::<f64>().unwrap())
        .collect::<Vec<_>>();
    assert!(scores.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn json_carries_run_metadata() {
    let report = report(4);
    let candidates = listed_candidates(&report, false);
    let json: Value = serde_json::from_str(&render_json(&report, &candidates).unwrap()).unwrap();
    assert_eq!(json["sequences"], 4);
    assert_eq!(json["requested_sample_size"], 4);
    assert_eq!(json["actual_sample_size"], 4);
    assert_eq!(json["observations"], report.observations());
    let freqs = json["frequencies"].as_array().unwrap();
    assert_eq!(freqs.len(), 20);
    let total = freqs.iter().map(|f| f.as_f64().unwrap()).sum::<f64>();
    assert_relative_eq!(total, 1.0, epsilon = 1e-12);

    let models = json["models"].as_array().unwrap();
    assert_eq!(models.len(), 10);
    for (entry, candidate) in models.iter().zip(report.ranking.full()) {
        assert_eq!(entry["model"], candidate.model.as_str());
        assert_relative_eq!(entry["score"].as_f64().unwrap(), candidate.score, epsilon = 1e-12);
        let expected = match candidate.adaptation {
            FrequencyAdaptation::Model => "model",
            FrequencyAdaptation::Empirical => "empirical",
        };
        assert_eq!(entry["frequencies"], expected);
    }
}

#[test]
fn simple_json_omits_empirical_variants() {
    let report = report(0);
    let json: Value =
        serde_json::from_str(&render(&report, OutputFormat::Json, true).unwrap()).unwrap();
    let models = json["models"].as_array().unwrap();
    assert_eq!(models.len(), 5);
    assert!(models.iter().all(|m| m["frequencies"] == "model"));
    assert_eq!(json["requested_sample_size"], 0);
    assert_eq!(json["actual_sample_size"], 6);
}

#[rstest]
fn tool_output_is_a_supported_name(
    #[values(
        DownstreamTool::PhyML,
        DownstreamTool::IQTree,
        DownstreamTool::RAxML,
        DownstreamTool::MrBayes
    )]
    tool: DownstreamTool,
) {
    let report = report(0);
    let name = render_tool(&report, tool).unwrap();
    let base = name.trim_end_matches("+F");
    assert!(tool.allowed_models().contains(&base));
    assert_eq!(name, report.ranking.best_for_tool(tool).unwrap().to_string());
}

#[test]
fn tool_output_fails_without_supported_model() {
    let msa = alignment!(("a", AMINOACIDS), ("b", AMINOACIDS));
    let registry = ModelRegistry::builtin().unwrap();
    let lg_only = ModelRegistry::from_models(vec![registry.get("LG").unwrap().clone()]);
    let report = ModelMatcher::new(&msa, &lg_only).run().unwrap();
    let err = render_tool(&report, DownstreamTool::MrBayes).unwrap_err();
    assert!(err.downcast_ref::<ConfigurationError>().is_some());
    assert_eq!(render_tool(&report, DownstreamTool::PhyML).unwrap(), "LG+F");
}
