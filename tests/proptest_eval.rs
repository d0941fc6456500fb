use spanscore::eval::{
    constraint_stats, entity_stats, mention_stats, relation_stats, Averaging, HeuristicTagger,
    Stats,
};
use spanscore::ir::io_jsonl::{from_jsonl_str, to_jsonl_string};
use spanscore::ir::Document;

use proptest::prelude::*;

mod proptest_helpers;

fn constraint_doc(id: usize, constraints: Vec<spanscore::ir::Constraint>) -> Document {
    Document::from_whitespace(format!("doc-{}", id), "a b c").with_constraints(constraints)
}

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn gold_against_itself_scores_perfectly(doc in proptest_helpers::arb_document(24)) {
        let gold = vec![doc];
        for outcome in [
            mention_stats(&gold, &gold).expect("mention stats"),
            relation_stats(&gold, &gold).expect("relation stats"),
            entity_stats(&gold, &gold).expect("entity stats"),
        ] {
            prop_assert_eq!(outcome.average(Averaging::Micro).f1, 1.0);
            prop_assert_eq!(outcome.average(Averaging::Macro).f1, 1.0);
        }
    }

    #[test]
    fn positive_constraints_against_themselves_are_all_paired(
        constraints in proptest::collection::vec(proptest_helpers::arb_constraint(), 0..8)
    ) {
        let constraints = constraints
            .into_iter()
            .map(|c| spanscore::ir::Constraint { negative: false, ..c })
            .collect();
        let docs = vec![constraint_doc(0, constraints)];
        let outcome = constraint_stats(&docs, &docs, &HeuristicTagger).expect("constraint stats");

        let total: Stats = outcome.stats.values().sum();
        prop_assert_eq!(total.num_pred, total.num_gold);
        prop_assert!(outcome.report.issues.is_empty());
    }

    #[test]
    fn constraint_scoring_is_deterministic(
        pred in proptest::collection::vec(proptest_helpers::arb_constraint(), 0..6),
        gold in proptest::collection::vec(proptest_helpers::arb_constraint(), 0..6),
    ) {
        let pred = vec![constraint_doc(0, pred)];
        let gold = vec![constraint_doc(0, gold)];

        let first = constraint_stats(&pred, &gold, &HeuristicTagger).expect("first run");
        let second = constraint_stats(&pred, &gold, &HeuristicTagger).expect("second run");
        prop_assert_eq!(first.stats, second.stats);
    }

    #[test]
    fn jsonl_roundtrip_is_lossless(
        doc in proptest_helpers::arb_document(16),
        constraints in proptest::collection::vec(proptest_helpers::arb_constraint(), 0..4),
    ) {
        let docs = vec![doc.with_constraints(constraints)];
        let jsonl = to_jsonl_string(&docs).expect("serialize jsonl");
        let restored = from_jsonl_str(&jsonl).expect("parse jsonl");

        prop_assert_eq!(docs, restored);
    }
}
