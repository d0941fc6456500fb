#![allow(dead_code)]

use std::collections::BTreeSet;

use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use spanscore::ir::{Constraint, Document, Entity, Mention, Relation};

pub const MENTION_TYPES: [&str; 4] = ["actor", "activity", "activity data", "gateway"];

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

pub fn mention_set(document: &Document) -> BTreeSet<Mention> {
    document.mentions.iter().cloned().collect()
}

/// Relations as (type, head mention, tail mention), independent of positions.
pub fn relation_set(document: &Document) -> BTreeSet<(String, Mention, Mention)> {
    document
        .relations
        .iter()
        .map(|r| {
            (
                r.relation_type.clone(),
                document.mentions[r.head_mention_index].clone(),
                document.mentions[r.tail_mention_index].clone(),
            )
        })
        .collect()
}

fn word_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,8}|[A-Z][a-z]{0,6}|[0-9]{1,3}|[.,;<>]"
}

/// Per-token seed: whether a span starts here, its length and type.
fn span_seed_strategy() -> impl Strategy<Value = (bool, usize, usize)> {
    (any::<bool>(), 1usize..=3, 0usize..MENTION_TYPES.len())
}

/// Non-overlapping contiguous mentions over `token_count` tokens.
fn build_mentions(token_count: usize, seeds: &[(bool, usize, usize)]) -> Vec<Mention> {
    let mut mentions = Vec::new();
    let mut next_free = 0;
    for (start, &(starts_here, len, type_idx)) in seeds.iter().enumerate().take(token_count) {
        if !starts_here || start < next_free {
            continue;
        }
        let end = (start + len).min(token_count);
        mentions.push(Mention::new(MENTION_TYPES[type_idx], (start..end).collect()));
        next_free = end;
    }
    mentions
}

/// Documents with whitespace tokens, non-nested mentions, distinct
/// relations and single-mention entities.
pub fn arb_document(max_tokens: usize) -> BoxedStrategy<Document> {
    assert!(max_tokens > 0, "max_tokens must be > 0");

    (1usize..=max_tokens)
        .prop_flat_map(|token_count| {
            (
                proptest::collection::vec(word_strategy(), token_count..=token_count),
                proptest::collection::vec(span_seed_strategy(), token_count..=token_count),
                proptest::collection::btree_set((0usize..8, 0usize..8, 0usize..2), 0..6),
            )
        })
        .prop_map(|(words, seeds, relation_seeds)| {
            let text = words.join(" ");
            let document = Document::from_whitespace("doc", &text);
            let mentions = build_mentions(words.len(), &seeds);

            let relations: Vec<Relation> = if mentions.is_empty() {
                Vec::new()
            } else {
                let n = mentions.len();
                relation_seeds
                    .into_iter()
                    .map(|(head, tail, kind)| {
                        let kind = ["flow", "uses"][kind];
                        (head % n, tail % n, kind)
                    })
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .map(|(head, tail, kind)| Relation::new(kind, head, tail))
                    .collect()
            };
            let entities = (0..mentions.len()).map(|i| Entity::new(vec![i])).collect();

            document
                .with_mentions(mentions)
                .with_entities(entities)
                .with_relations(relations)
        })
        .boxed()
}

pub fn arb_constraint() -> BoxedStrategy<Constraint> {
    (
        prop::sample::select(vec!["precedence", "response", "succession", "init", "end"]),
        "[a-z]{1,6}( [a-z]{1,6}){0,2}",
        proptest::option::of("[a-z]{1,6}( [a-z]{1,6}){0,2}"),
        any::<bool>(),
    )
        .prop_map(|(kind, head, tail, negative)| {
            let mut constraint = Constraint::new(kind, head);
            if let Some(tail) = tail {
                constraint = constraint.with_tail(tail);
            }
            if negative {
                constraint = constraint.negated();
            }
            constraint
        })
        .boxed()
}
