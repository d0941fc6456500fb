//! Exact-match scoring of mentions, relations and entities.
//!
//! Every annotation is reduced to a canonical key that no longer depends on
//! list positions: a mention becomes its type plus sorted token indices, a
//! relation its type plus head and tail mention keys, an entity the set of
//! its member mention keys. Per document, predicted and gold keys are
//! collected into sets and true positives are the set intersection, so a
//! prediction repeated within one document is counted once.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

use super::report::{EvalIssue, EvalIssueCode, EvalOutcome, EvalReport};
use super::paired;
use crate::error::SpanscoreError;
use crate::ir::{normalize_type, Document, Mention};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct MentionKey {
    mention_type: String,
    tokens: Vec<usize>,
}

impl MentionKey {
    fn of(mention: &Mention) -> Self {
        let mut tokens = mention.token_document_indices.clone();
        tokens.sort_unstable();
        tokens.dedup();
        Self {
            mention_type: normalize_type(&mention.mention_type),
            tokens,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct RelationKey {
    relation_type: String,
    head: MentionKey,
    tail: MentionKey,
}

/// Exact-match statistics for mentions, stratified by mention type.
///
/// # Errors
/// Fails if the document lists are not aligned, or a gold document holds
/// two mentions with the same type and tokens.
pub fn mention_stats(
    predicted: &[Document],
    gold: &[Document],
) -> Result<EvalOutcome, SpanscoreError> {
    exact_stats(predicted, gold, |doc, _| {
        Ok(doc
            .mentions
            .iter()
            .map(|m| {
                let key = MentionKey::of(m);
                let tag = key.mention_type.clone();
                (key, tag)
            })
            .collect())
    })
}

/// Exact-match statistics for relations, stratified by relation type.
///
/// A relation matches only if its type and both endpoint mentions match.
///
/// # Errors
/// Fails if the document lists are not aligned, a relation refers to a
/// missing mention, or a gold document holds duplicate relations.
pub fn relation_stats(
    predicted: &[Document],
    gold: &[Document],
) -> Result<EvalOutcome, SpanscoreError> {
    exact_stats(predicted, gold, |doc, _| {
        doc.relations
            .iter()
            .map(|r| -> Result<(RelationKey, String), SpanscoreError> {
                let key = RelationKey {
                    relation_type: normalize_type(&r.relation_type),
                    head: MentionKey::of(doc.mention(r.head_mention_index)?),
                    tail: MentionKey::of(doc.mention(r.tail_mention_index)?),
                };
                let tag = key.relation_type.clone();
                Ok((key, tag))
            })
            .collect()
    })
}

/// Exact-match statistics for coreference entities.
///
/// An entity's tag is the type of its first mention. Entities mixing
/// mention types are scored under that tag and reported as
/// [`EvalIssueCode::MixedEntityTypes`]. Entities without mentions are
/// ignored.
///
/// # Errors
/// Fails if the document lists are not aligned, an entity refers to a
/// missing mention, or a gold document holds duplicate entities.
pub fn entity_stats(
    predicted: &[Document],
    gold: &[Document],
) -> Result<EvalOutcome, SpanscoreError> {
    exact_stats(predicted, gold, |doc, report| {
        let mut keys = Vec::with_capacity(doc.entities.len());
        for entity in &doc.entities {
            if entity.mention_indices.is_empty() {
                continue;
            }
            let (tag, conflict) = doc.entity_tag(entity)?;
            if let Some(types) = conflict {
                report.add(EvalIssue::new(
                    EvalIssueCode::MixedEntityTypes,
                    &doc.id,
                    format!(
                        "entity {:?} mixes types [{}]; scoring it as '{}'",
                        entity.mention_indices,
                        types.join(", "),
                        tag
                    ),
                ));
            }
            let members: BTreeSet<MentionKey> = entity
                .mention_indices
                .iter()
                .map(|&idx| doc.mention(idx).map(MentionKey::of))
                .collect::<Result<_, _>>()?;
            keys.push((members, tag));
        }
        Ok(keys)
    })
}

/// Shared set-based scoring loop.
///
/// `keys` turns one document into (canonical key, tag) pairs. True positives
/// are counted under the gold tag.
fn exact_stats<K, F>(
    predicted: &[Document],
    gold: &[Document],
    keys: F,
) -> Result<EvalOutcome, SpanscoreError>
where
    K: Ord + Debug,
    F: Fn(&Document, &mut EvalReport) -> Result<Vec<(K, String)>, SpanscoreError>,
{
    let mut outcome = EvalOutcome::default();

    for (pred_doc, gold_doc) in paired(predicted, gold)? {
        let mut gold_set: BTreeMap<K, String> = BTreeMap::new();
        for (key, tag) in keys(gold_doc, &mut outcome.report)? {
            if gold_set.contains_key(&key) {
                return Err(SpanscoreError::DuplicateGoldAnnotation {
                    document_id: gold_doc.id.clone(),
                    annotation: format!("{:?}", key),
                });
            }
            gold_set.insert(key, tag);
        }

        let mut pred_set: BTreeMap<K, String> = BTreeMap::new();
        for (key, tag) in keys(pred_doc, &mut outcome.report)? {
            pred_set.entry(key).or_insert(tag);
        }

        for tag in gold_set.values() {
            outcome.tag_mut(tag).num_gold += 1.0;
        }
        for tag in pred_set.values() {
            outcome.tag_mut(tag).num_pred += 1.0;
        }
        for (key, tag) in &gold_set {
            if pred_set.contains_key(key) {
                outcome.tag_mut(tag).num_ok += 1.0;
            }
        }
    }

    Ok(outcome)
}
