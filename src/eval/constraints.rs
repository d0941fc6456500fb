//! Greedy partial-credit scoring of declarative constraints.
//!
//! Constraint heads and tails are free text, so predicted and gold
//! constraints are paired greedily by how many of their slots agree
//! ([`correct_slots`]) and every pair earns credit slot by slot.
//!
//! Statistics are stratified by constraint type. Negative constraints are
//! all counted under the synthetic [`NEGATION_TAG`] instead of their type.

use tracing::debug;

use super::action::{action_matches, PosTagger};
use super::paired;
use super::report::{EvalIssue, EvalIssueCode, EvalOutcome};
use crate::error::SpanscoreError;
use crate::ir::{normalize_type, Constraint, Document};

/// Tag collecting the statistics of negative constraints.
pub const NEGATION_TAG: &str = "negation";

/// Scores at which pairs are assigned, highest first.
///
/// Two negative constraints agreeing on head and tail score 5; such pairs
/// are never assigned to each other.
const SCORE_BUCKETS: [usize; 5] = [4, 3, 2, 1, 0];

/// Number of slots on which `pred` agrees with `gold`.
///
/// One point each for a case-insensitive type match, a head action match
/// and, when gold has a tail, a tail action match. Two negative constraints
/// earn two more points, and one more on top if their types differ.
pub fn correct_slots(pred: &Constraint, gold: &Constraint, tagger: &dyn PosTagger) -> usize {
    let same_type = normalize_type(&pred.constraint_type) == normalize_type(&gold.constraint_type);

    let mut slots = 0;
    if same_type {
        slots += 1;
    }
    if action_matches(Some(&pred.head), Some(&gold.head), tagger) {
        slots += 1;
    }
    if gold.tail.is_some() && action_matches(pred.tail.as_deref(), gold.tail.as_deref(), tagger) {
        slots += 1;
    }
    if pred.negative && gold.negative {
        slots += 2;
        if !same_type {
            slots += 1;
        }
    }
    slots
}

fn tag_of(constraint: &Constraint) -> String {
    if constraint.negative {
        NEGATION_TAG.to_string()
    } else {
        normalize_type(&constraint.constraint_type)
    }
}

/// Greedy slot-filling statistics for constraints.
///
/// Per document, pairs are assigned by score, from 4 down to 0. Within one
/// score, predictions are visited in list order and each takes the first
/// free gold constraint with exactly that score. A matched pair adds the
/// prediction's slots to `num_pred` under its tag, the gold slots to
/// `num_gold` under the gold tag, and its [`correct_slots`] to `num_ok`
/// under the prediction's tag. Leftover predictions only add to `num_pred`
/// and are reported as [`EvalIssueCode::UnmatchedPrediction`]; leftover gold
/// constraints only add to `num_gold`.
///
/// # Errors
/// Fails if the document lists are not aligned.
pub fn constraint_stats(
    predicted: &[Document],
    gold: &[Document],
    tagger: &dyn PosTagger,
) -> Result<EvalOutcome, SpanscoreError> {
    let mut outcome = EvalOutcome::default();

    for (pred_doc, gold_doc) in paired(predicted, gold)? {
        let preds = &pred_doc.constraints;
        let golds = &gold_doc.constraints;

        let scores: Vec<Vec<usize>> = preds
            .iter()
            .map(|p| golds.iter().map(|g| correct_slots(p, g, tagger)).collect())
            .collect();

        let mut pred_match: Vec<Option<usize>> = vec![None; preds.len()];
        let mut gold_taken = vec![false; golds.len()];

        // Gold is only ever taken, so one pass per score finds every pair.
        for bucket in SCORE_BUCKETS {
            for (p, row) in scores.iter().enumerate() {
                if pred_match[p].is_some() {
                    continue;
                }
                let found = row
                    .iter()
                    .enumerate()
                    .find(|&(g, &score)| !gold_taken[g] && score == bucket)
                    .map(|(g, _)| g);
                if let Some(g) = found {
                    pred_match[p] = Some(g);
                    gold_taken[g] = true;
                }
            }
        }

        for (p, pred) in preds.iter().enumerate() {
            let tag = tag_of(pred);
            outcome.tag_mut(&tag).num_pred += pred.num_slots() as f64;
            match pred_match[p] {
                Some(g) => outcome.tag_mut(&tag).num_ok += scores[p][g] as f64,
                None => outcome.report.add(EvalIssue::new(
                    EvalIssueCode::UnmatchedPrediction,
                    &pred_doc.id,
                    format!(
                        "no gold constraint left for '{}' constraint '{}'",
                        pred.constraint_type, pred.head
                    ),
                )),
            }
        }
        for gold in golds {
            outcome.tag_mut(&tag_of(gold)).num_gold += gold.num_slots() as f64;
        }

        debug!(
            document = %gold_doc.id,
            predicted = preds.len(),
            gold = golds.len(),
            matched = pred_match.iter().flatten().count(),
            "matched constraints"
        );
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{HeuristicTagger, Stats};

    fn doc(constraints: Vec<Constraint>) -> Document {
        Document::from_whitespace("doc", "a b").with_constraints(constraints)
    }

    fn score(pred: Vec<Constraint>, gold: Vec<Constraint>) -> EvalOutcome {
        constraint_stats(&[doc(pred)], &[doc(gold)], &HeuristicTagger).unwrap()
    }

    #[test]
    fn identical_constraint_earns_every_slot() {
        let c = Constraint::new("test", "a").with_tail("b");
        let outcome = score(vec![c.clone()], vec![c]);
        assert_eq!(outcome.stats["test"], Stats::new(3.0, 3.0, 3.0));
        assert_eq!(outcome.stats.len(), 1);
    }

    #[test]
    fn negative_gold_is_counted_under_negation() {
        let gold = Constraint::new("test", "a").with_tail("b").negated();
        let pred = Constraint::new("test", "a").with_tail("b");
        let outcome = score(vec![pred], vec![gold]);

        assert_eq!(outcome.stats["test"], Stats::new(3.0, 0.0, 3.0));
        assert_eq!(outcome.stats[NEGATION_TAG], Stats::new(0.0, 4.0, 0.0));
    }

    #[test]
    fn slot_counting() {
        let tagger = HeuristicTagger;
        let gold = Constraint::new("Precedence", "check invoice").with_tail("pay invoice");

        let same = Constraint::new("precedence", "check invoice").with_tail("pay invoice");
        assert_eq!(correct_slots(&same, &gold, &tagger), 3);

        let wrong_tail = Constraint::new("precedence", "check invoice").with_tail("archive file");
        assert_eq!(correct_slots(&wrong_tail, &gold, &tagger), 2);

        let no_tail = Constraint::new("precedence", "check invoice");
        assert_eq!(correct_slots(&no_tail, &gold, &tagger), 2);

        // Gold without tail never scores the tail slot.
        let gold_unary = Constraint::new("init", "check invoice");
        assert_eq!(correct_slots(&same, &gold_unary, &tagger), 1);
    }

    #[test]
    fn negative_pairs_earn_negation_credit() {
        let tagger = HeuristicTagger;
        let gold = Constraint::new("precedence", "a").with_tail("b").negated();

        let same_type = Constraint::new("precedence", "a").with_tail("b").negated();
        assert_eq!(correct_slots(&same_type, &gold, &tagger), 5);

        let other_type = Constraint::new("succession", "a").with_tail("b").negated();
        assert_eq!(correct_slots(&other_type, &gold, &tagger), 5);

        let unrelated = Constraint::new("succession", "x").with_tail("y").negated();
        assert_eq!(correct_slots(&unrelated, &gold, &tagger), 3);
    }

    #[test]
    fn higher_score_beats_list_order() {
        let pred = Constraint::new("succession", "a").with_tail("b");
        let weak = Constraint::new("succession", "x").with_tail("y");
        let strong = Constraint::new("succession", "a").with_tail("b");

        let outcome = score(vec![pred], vec![weak, strong]);
        assert_eq!(outcome.stats["succession"], Stats::new(3.0, 6.0, 3.0));
        assert!(outcome.report.issues.is_empty());
    }

    #[test]
    fn negative_pairs_above_top_bucket_stay_unmatched() {
        let c = Constraint::new("precedence", "a").with_tail("b").negated();
        let outcome = score(vec![c.clone()], vec![c]);

        assert_eq!(outcome.stats[NEGATION_TAG], Stats::new(4.0, 4.0, 0.0));
        assert_eq!(outcome.report.count(EvalIssueCode::UnmatchedPrediction), 1);
    }

    #[test]
    fn negative_prediction_falls_back_to_lower_bucket() {
        let pred = Constraint::new("succession", "a").with_tail("b").negated();
        let positive = Constraint::new("succession", "a").with_tail("b");
        let negative = Constraint::new("precedence", "a").with_tail("b").negated();

        // The negative gold scores 5 and is skipped; the positive one scores 3.
        let outcome = score(vec![pred], vec![negative, positive]);
        assert_eq!(outcome.stats[NEGATION_TAG], Stats::new(4.0, 4.0, 3.0));
        assert_eq!(outcome.stats["succession"], Stats::new(0.0, 3.0, 0.0));
        assert!(outcome.report.issues.is_empty());
    }

    #[test]
    fn better_prediction_is_matched_first() {
        let weak = Constraint::new("test", "x").with_tail("y");
        let strong = Constraint::new("test", "a").with_tail("b");
        let gold = Constraint::new("test", "a").with_tail("b");

        let outcome = score(vec![weak, strong], vec![gold]);
        assert_eq!(outcome.stats["test"], Stats::new(6.0, 3.0, 3.0));
        assert_eq!(outcome.report.count(EvalIssueCode::UnmatchedPrediction), 1);
        assert!(outcome.report.issues[0].message.contains("'x'"));
    }

    #[test]
    fn ties_go_to_the_earlier_prediction() {
        let c = Constraint::new("test", "a").with_tail("b");
        let outcome = score(vec![c.clone(), c.clone()], vec![c]);

        assert_eq!(outcome.stats["test"], Stats::new(6.0, 3.0, 3.0));
        assert_eq!(outcome.report.count(EvalIssueCode::UnmatchedPrediction), 1);
    }

    #[test]
    fn zero_score_pairs_are_still_paired() {
        let pred = Constraint::new("init", "x");
        let gold = Constraint::new("end", "y");
        let outcome = score(vec![pred], vec![gold]);

        assert_eq!(outcome.stats["init"], Stats::new(2.0, 0.0, 0.0));
        assert_eq!(outcome.stats["end"], Stats::new(0.0, 2.0, 0.0));
        assert!(outcome.report.issues.is_empty());
    }

    #[test]
    fn unmatched_gold_only_counts_towards_recall() {
        let gold = vec![
            Constraint::new("test", "a").with_tail("b"),
            Constraint::new("init", "a"),
        ];
        let outcome = score(vec![], gold);
        assert_eq!(outcome.stats["test"], Stats::new(0.0, 3.0, 0.0));
        assert_eq!(outcome.stats["init"], Stats::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn misaligned_documents_are_rejected() {
        let err = constraint_stats(&[], &[doc(vec![])], &HeuristicTagger).unwrap_err();
        assert!(matches!(err, SpanscoreError::DocumentMismatch { .. }));
    }
}
