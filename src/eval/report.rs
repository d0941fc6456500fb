//! Evaluation outcome and report types.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use tracing::warn;

use super::{average, Averaging, Scores, Stats};

/// Per-tag statistics together with the warnings raised while computing them.
#[derive(Clone, Debug, Default, Serialize)]
pub struct EvalOutcome {
    pub stats: BTreeMap<String, Stats>,
    pub report: EvalReport,
}

impl EvalOutcome {
    /// Mutable stats for a tag, created empty on first use.
    pub fn tag_mut(&mut self, tag: &str) -> &mut Stats {
        self.stats.entry(tag.to_string()).or_default()
    }

    /// Averages the per-tag statistics.
    pub fn average(&self, strategy: Averaging) -> Scores {
        average(&self.stats, strategy)
    }
}

impl fmt::Display for EvalOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .stats
            .keys()
            .map(|tag| tag.chars().count())
            .chain(["micro".len()])
            .max()
            .unwrap_or_default();

        writeln!(
            f,
            "{:<width$}  {:>8} {:>8} {:>8}  {:>6} {:>6} {:>6}",
            "tag", "pred", "gold", "ok", "P", "R", "F1"
        )?;
        for (tag, stats) in &self.stats {
            writeln!(
                f,
                "{:<width$}  {:>8.2} {:>8.2} {:>8.2}  {:>6.3} {:>6.3} {:>6.3}",
                tag,
                stats.num_pred,
                stats.num_gold,
                stats.num_ok,
                stats.precision(),
                stats.recall(),
                stats.f1()
            )?;
        }
        writeln!(f)?;
        for (label, strategy) in [("micro", Averaging::Micro), ("macro", Averaging::Macro)] {
            let scores = self.average(strategy);
            writeln!(
                f,
                "{:<width$}  {:>8} {:>8} {:>8}  {:>6.3} {:>6.3} {:>6.3}",
                label, "", "", "", scores.precision, scores.recall, scores.f1
            )?;
        }

        if !self.report.issues.is_empty() {
            writeln!(f)?;
            write!(f, "{}", self.report)?;
        }
        Ok(())
    }
}

/// Warnings raised during evaluation.
#[derive(Clone, Debug, Default, Serialize)]
pub struct EvalReport {
    pub issues: Vec<EvalIssue>,
}

impl EvalReport {
    /// Adds an issue to the report and logs it.
    pub fn add(&mut self, issue: EvalIssue) {
        warn!(
            document = %issue.document_id,
            code = ?issue.code,
            "{}",
            issue.message
        );
        self.issues.push(issue);
    }

    /// Number of issues with the given code.
    pub fn count(&self, code: EvalIssueCode) -> usize {
        self.issues.iter().filter(|i| i.code == code).count()
    }
}

impl fmt::Display for EvalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Warnings ({}):", self.issues.len())?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}

/// One evaluation warning.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EvalIssue {
    pub code: EvalIssueCode,
    pub document_id: String,
    pub message: String,
}

impl EvalIssue {
    pub fn new(code: EvalIssueCode, document_id: &str, message: impl Into<String>) -> Self {
        Self {
            code,
            document_id: document_id.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for EvalIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[WARN ] {:?} in document '{}': {}",
            self.code, self.document_id, self.message
        )
    }
}

/// A stable code identifying the type of evaluation warning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum EvalIssueCode {
    /// An entity groups mentions of different types; its first mention's
    /// type was used as the tag.
    MixedEntityTypes,
    /// A predicted constraint found no gold constraint to pair with.
    UnmatchedPrediction,
}
