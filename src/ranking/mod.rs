use std::fmt::Display;

use anyhow::bail;
use log::{info, warn};

use crate::scoring::{CandidateFailure, CandidateResult, FrequencyAdaptation, ScoredCandidate};
use crate::{f64_h, ConfigurationError, Result};

/// Phylogenetic inference programs whose supported models restrict the best-model query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DownstreamTool {
    PhyML,
    IQTree,
    RAxML,
    MrBayes,
}

impl DownstreamTool {
    pub const ALL: [DownstreamTool; 4] = [
        DownstreamTool::PhyML,
        DownstreamTool::IQTree,
        DownstreamTool::RAxML,
        DownstreamTool::MrBayes,
    ];

    /// Parses a tool name, ignoring case and a dash in "iq-tree".
    pub fn from_name(name: &str) -> Result<DownstreamTool> {
        match name.to_ascii_lowercase().replace('-', "").as_str() {
            "phyml" => Ok(DownstreamTool::PhyML),
            "iqtree" => Ok(DownstreamTool::IQTree),
            "raxml" => Ok(DownstreamTool::RAxML),
            "mrbayes" => Ok(DownstreamTool::MrBayes),
            _ => bail!(ConfigurationError::new(format!(
                "Unknown downstream tool: {}",
                name
            ))),
        }
    }

    /// Names of the models the tool accepts. Models loaded from files match when named like
    /// the tool names them, e.g. `mtREV.dat`.
    pub fn allowed_models(&self) -> &'static [&'static str] {
        match self {
            DownstreamTool::PhyML => &[
                "LG", "WAG", "JTT", "Dayhoff", "DCMut", "mtREV", "rtREV", "cpREV", "VT",
                "Blosum62", "mtMam", "mtArt", "HIVw", "HIVb",
            ],
            DownstreamTool::IQTree => &[
                "LG", "WAG", "JTT", "Dayhoff", "Poisson", "DCMut", "JTTDCMut", "mtREV", "rtREV",
                "cpREV", "VT", "Blosum62", "PMB", "mtMam", "mtArt", "mtZOA", "HIVw", "HIVb", "FLU",
            ],
            DownstreamTool::RAxML => &[
                "LG", "WAG", "JTT", "Dayhoff", "DCMut", "JTTDCMut", "mtREV", "rtREV", "cpREV",
                "VT", "Blosum62", "PMB", "mtMam", "mtArt", "mtZOA", "HIVw", "HIVb", "FLU",
            ],
            DownstreamTool::MrBayes => &[
                "Poisson", "JTT", "Dayhoff", "WAG", "mtREV", "mtMam", "rtREV", "cpREV", "VT",
                "Blosum62",
            ],
        }
    }
}

impl Display for DownstreamTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DownstreamTool::PhyML => "PhyML",
            DownstreamTool::IQTree => "IQ-TREE",
            DownstreamTool::RAxML => "RAxML",
            DownstreamTool::MrBayes => "MrBayes",
        };
        write!(f, "{}", name)
    }
}

/// Scored candidates ordered from best to worst fit, plus the candidates that failed.
#[derive(Clone, Debug, PartialEq)]
pub struct Ranking {
    candidates: Vec<ScoredCandidate>,
    failures: Vec<CandidateFailure>,
}

impl Ranking {
    /// Splits scoring results into ranked candidates and failures. Every failure is logged as
    /// a warning. Candidates are sorted by ascending score; ties keep their scoring order.
    ///
    /// # Example
    /// ```
    /// use modelmatcher::ranking::Ranking;
    /// use modelmatcher::scoring::{FrequencyAdaptation, ScoredCandidate};
    /// let candidate = |model: &str, score| {
    ///     Ok(ScoredCandidate { model: model.to_string(), adaptation: FrequencyAdaptation::Model, score })
    /// };
    /// let ranking = Ranking::from_results(vec![candidate("LG", 2.0), candidate("WAG", 1.0)]);
    /// assert_eq!(ranking.best().unwrap().model, "WAG");
    /// ```
    pub fn from_results(results: Vec<CandidateResult>) -> Ranking {
        let mut candidates = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(candidate) => candidates.push(candidate),
                Err(failure) => {
                    warn!("Could not score {}, skipping it", failure);
                    failures.push(failure);
                }
            }
        }
        candidates.sort_by_key(|c| f64_h::from(c.score));
        info!(
            "Ranked {} candidates, {} failed",
            candidates.len(),
            failures.len()
        );
        Ranking {
            candidates,
            failures,
        }
    }

    /// All candidates, frequency-adapted variants included.
    pub fn full(&self) -> &[ScoredCandidate] {
        &self.candidates
    }

    /// Candidates using their model's own frequencies only.
    pub fn simple(&self) -> Vec<&ScoredCandidate> {
        self.candidates
            .iter()
            .filter(|c| c.adaptation == FrequencyAdaptation::Model)
            .collect()
    }

    pub fn failures(&self) -> &[CandidateFailure] {
        &self.failures
    }

    pub fn best(&self) -> Option<&ScoredCandidate> {
        self.candidates.first()
    }

    /// Best candidate whose model name, compared without case, is in `allowed`.
    /// Bails with a ConfigurationError if no ranked candidate qualifies.
    pub fn best_supported(&self, allowed: &[&str]) -> Result<&ScoredCandidate> {
        match self
            .candidates
            .iter()
            .find(|c| allowed.iter().any(|name| name.eq_ignore_ascii_case(&c.model)))
        {
            Some(candidate) => Ok(candidate),
            None => bail!(ConfigurationError::new(format!(
                "None of the ranked models is supported, expected one of: {}",
                allowed.join(", ")
            ))),
        }
    }

    pub fn best_for_tool(&self, tool: DownstreamTool) -> Result<&ScoredCandidate> {
        self.best_supported(tool.allowed_models()).map_err(|_| {
            ConfigurationError::new(format!(
                "No ranked model is supported by {}, which accepts {}",
                tool,
                tool.allowed_models().join(", ")
            ))
            .into()
        })
    }
}
