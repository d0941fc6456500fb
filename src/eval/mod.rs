//! Evaluation of predicted documents against gold documents.
//!
//! Every scorer returns per-tag [`Stats`] in a `BTreeMap`, so tags always
//! iterate in the same order. [`average`] turns such a mapping into one
//! [`Scores`] value, either by summing counts first (micro) or by averaging
//! per-tag scores (macro).
//!
//! - [`mention_stats`], [`relation_stats`], [`entity_stats`]: exact match on
//!   canonical, order-independent annotation keys.
//! - [`constraint_stats`]: greedy partial-credit matching of free-text
//!   constraints, slot by slot.

pub mod action;
mod constraints;
mod exact;
mod report;

pub use action::{action_matches, HeuristicTagger, PosTag, PosTagger, TaggedWord};
pub use constraints::{constraint_stats, correct_slots, NEGATION_TAG};
pub use exact::{entity_stats, mention_stats, relation_stats};
pub use report::{EvalIssue, EvalIssueCode, EvalOutcome, EvalReport};

use std::collections::BTreeMap;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use serde::Serialize;

use crate::error::SpanscoreError;
use crate::ir::Document;

/// Prediction, gold and correct counts for one tag.
///
/// Counts are reals because constraint scoring gives partial credit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Stats {
    pub num_pred: f64,
    pub num_gold: f64,
    pub num_ok: f64,
}

impl Stats {
    pub fn new(num_pred: f64, num_gold: f64, num_ok: f64) -> Self {
        Self {
            num_pred,
            num_gold,
            num_ok,
        }
    }

    /// Correct over predicted; 1.0 when nothing was predicted or expected.
    pub fn precision(&self) -> f64 {
        if self.num_pred == 0.0 {
            return if self.num_gold == 0.0 { 1.0 } else { 0.0 };
        }
        self.num_ok / self.num_pred
    }

    /// Correct over gold; 1.0 when nothing was predicted or expected.
    pub fn recall(&self) -> f64 {
        if self.num_gold == 0.0 {
            return if self.num_pred == 0.0 { 1.0 } else { 0.0 };
        }
        self.num_ok / self.num_gold
    }

    /// Harmonic mean of precision and recall.
    pub fn f1(&self) -> f64 {
        harmonic_mean(self.precision(), self.recall())
    }

    pub fn scores(&self) -> Scores {
        Scores {
            precision: self.precision(),
            recall: self.recall(),
            f1: self.f1(),
        }
    }
}

impl AddAssign for Stats {
    fn add_assign(&mut self, rhs: Self) {
        self.num_pred += rhs.num_pred;
        self.num_gold += rhs.num_gold;
        self.num_ok += rhs.num_ok;
    }
}

impl Add for Stats {
    type Output = Stats;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl Sum for Stats {
    fn sum<I: Iterator<Item = Stats>>(iter: I) -> Self {
        iter.fold(Stats::default(), Add::add)
    }
}

impl<'a> Sum<&'a Stats> for Stats {
    fn sum<I: Iterator<Item = &'a Stats>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Precision, recall and F1.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Scores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl fmt::Display for Scores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "P={:.3} R={:.3} F1={:.3}",
            self.precision, self.recall, self.f1
        )
    }
}

/// How per-tag statistics are combined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Averaging {
    /// Sum counts over all tags, then score once.
    Micro,
    /// Score every tag, then take the unweighted mean.
    Macro,
}

impl FromStr for Averaging {
    type Err = SpanscoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "micro" => Ok(Averaging::Micro),
            "macro" => Ok(Averaging::Macro),
            other => Err(SpanscoreError::UnsupportedOption(format!(
                "averaging '{}' (supported: micro, macro)",
                other
            ))),
        }
    }
}

/// Combines per-tag statistics into one score.
///
/// An empty mapping scores like empty [`Stats`]: 1.0 everywhere.
pub fn average(stats: &BTreeMap<String, Stats>, strategy: Averaging) -> Scores {
    match strategy {
        Averaging::Micro => stats.values().sum::<Stats>().scores(),
        Averaging::Macro => {
            if stats.is_empty() {
                return Stats::default().scores();
            }
            let n = stats.len() as f64;
            let (precision, recall, f1) =
                stats
                    .values()
                    .map(Stats::scores)
                    .fold((0.0, 0.0, 0.0), |(p, r, f), s| {
                        (p + s.precision, r + s.recall, f + s.f1)
                    });
            Scores {
                precision: precision / n,
                recall: recall / n,
                f1: f1 / n,
            }
        }
    }
}

fn harmonic_mean(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        return 0.0;
    }
    2.0 * precision * recall / (precision + recall)
}

/// Pairs predicted and gold documents by position, checking their ids.
fn paired<'a>(
    predicted: &'a [Document],
    gold: &'a [Document],
) -> Result<impl Iterator<Item = (&'a Document, &'a Document)>, SpanscoreError> {
    if predicted.len() != gold.len() {
        return Err(SpanscoreError::DocumentMismatch {
            left: format!("{} predicted document(s)", predicted.len()),
            right: format!("{} gold document(s)", gold.len()),
            reason: "document counts differ".to_string(),
        });
    }
    if let Some((p, g)) = predicted.iter().zip(gold).find(|(p, g)| p.id != g.id) {
        return Err(SpanscoreError::DocumentMismatch {
            left: p.id.clone(),
            right: g.id.clone(),
            reason: "predicted and gold documents are not in the same order".to_string(),
        });
    }
    Ok(predicted.iter().zip(gold))
}
