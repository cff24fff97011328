use serde::Serialize;

use crate::matcher::MatchReport;
use crate::ranking::DownstreamTool;
use crate::scoring::{FrequencyAdaptation, ScoredCandidate};
use crate::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Serialize)]
struct JsonCandidate<'a> {
    model: &'a str,
    frequencies: FrequencyAdaptation,
    score: f64,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    observations: usize,
    sequences: usize,
    requested_sample_size: usize,
    actual_sample_size: usize,
    frequencies: Vec<f64>,
    models: Vec<JsonCandidate<'a>>,
}

/// Candidates shown for a report, either all of them or only those using model frequencies.
pub fn listed_candidates(report: &MatchReport, simple: bool) -> Vec<&ScoredCandidate> {
    if simple {
        report.ranking.simple()
    } else {
        report.ranking.full().iter().collect()
    }
}

/// One line per candidate, best first: the padded variant name, then the score.
///
/// # Example
/// ```
/// use modelmatcher::output::render_text;
/// use modelmatcher::scoring::{FrequencyAdaptation, ScoredCandidate};
/// let lg = ScoredCandidate {
///     model: "LG".to_string(),
///     adaptation: FrequencyAdaptation::Empirical,
///     score: 0.123456,
/// };
/// assert_eq!(render_text(&[&lg]), "LG+F  0.1235\n");
/// ```
pub fn render_text(candidates: &[&ScoredCandidate]) -> String {
    let labels = candidates
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>();
    let width = labels.iter().map(|l| l.len()).max().unwrap_or(0);
    labels
        .iter()
        .zip(candidates)
        .map(|(label, c)| format!("{:<width$}  {:.4}\n", label, c.score, width = width))
        .collect()
}

/// Pretty JSON with the run metadata and the listed candidates.
pub fn render_json(report: &MatchReport, candidates: &[&ScoredCandidate]) -> Result<String> {
    let json = JsonReport {
        observations: report.observations(),
        sequences: report.seq_count,
        requested_sample_size: report.requested_sample_size,
        actual_sample_size: report.actual_sample_size,
        frequencies: report.counts.freqs().iter().copied().collect(),
        models: candidates
            .iter()
            .map(|c| JsonCandidate {
                model: &c.model,
                frequencies: c.adaptation,
                score: c.score,
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&json)?)
}

/// Name of the best candidate the tool accepts, e.g. "WAG+F".
pub fn render_tool(report: &MatchReport, tool: DownstreamTool) -> Result<String> {
    Ok(report.ranking.best_for_tool(tool)?.to_string())
}

pub fn render(report: &MatchReport, format: OutputFormat, simple: bool) -> Result<String> {
    let candidates = listed_candidates(report, simple);
    match format {
        OutputFormat::Text => Ok(render_text(&candidates)),
        OutputFormat::Json => render_json(report, &candidates),
    }
}

#[cfg(test)]
#[cfg_attr(coverage, coverage(off))]
mod tests;
