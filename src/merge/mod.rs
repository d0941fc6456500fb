//! Merging partial documents.
//!
//! Pipeline steps each predict one kind of annotation on a copy of the same
//! document. [`merge_documents`] folds two such results into one, keeping
//! every distinct mention, entity, relation and constraint exactly once and
//! re-pointing index references at the merged mention list.

use tracing::debug;

use crate::error::SpanscoreError;
use crate::ir::{Document, Entity, Mention, Relation};

/// Merges `right` into `left`, returning a new document.
///
/// Mentions of `left` keep their positions. Mentions of `right` are appended
/// unless an equal mention already exists; entities and relations of `right`
/// are remapped onto the merged mention list and appended unless an equal
/// one already exists. Constraints are deduplicated by value and sentence
/// lists are concatenated.
///
/// # Errors
/// Returns [`SpanscoreError::DocumentMismatch`] if the documents differ in
/// id or tokens, and [`SpanscoreError::InvalidMentionIndex`] if `right`
/// refers to a mention it does not have.
pub fn merge_documents(left: &Document, right: &Document) -> Result<Document, SpanscoreError> {
    if left.id != right.id {
        return Err(SpanscoreError::DocumentMismatch {
            left: left.id.clone(),
            right: right.id.clone(),
            reason: "document ids differ".to_string(),
        });
    }
    if !left.same_tokens(right) {
        return Err(SpanscoreError::DocumentMismatch {
            left: left.id.clone(),
            right: right.id.clone(),
            reason: format!(
                "token sequences differ ({} vs {} tokens)",
                left.tokens.len(),
                right.tokens.len()
            ),
        });
    }

    let mut mentions: Vec<Mention> = left.mentions.clone();
    let mut index_map: Vec<usize> = Vec::with_capacity(right.mentions.len());
    for mention in &right.mentions {
        let new_index = match mentions.iter().position(|existing| existing == mention) {
            Some(existing) => existing,
            None => {
                mentions.push(mention.clone());
                mentions.len() - 1
            }
        };
        index_map.push(new_index);
    }

    let remap = |index: usize| -> Result<usize, SpanscoreError> {
        index_map
            .get(index)
            .copied()
            .ok_or_else(|| SpanscoreError::InvalidMentionIndex {
                document_id: right.id.clone(),
                index,
                mention_count: right.mentions.len(),
            })
    };

    let mut entities: Vec<Entity> = left.entities.clone();
    for entity in &right.entities {
        let remapped = Entity::new(
            entity
                .mention_indices
                .iter()
                .map(|&index| remap(index))
                .collect::<Result<_, _>>()?,
        );
        if !entities.contains(&remapped) {
            entities.push(remapped);
        }
    }

    let mut relations: Vec<Relation> = left.relations.clone();
    for relation in &right.relations {
        let remapped = Relation {
            head_mention_index: remap(relation.head_mention_index)?,
            tail_mention_index: remap(relation.tail_mention_index)?,
            relation_type: relation.relation_type.clone(),
        };
        if !relations.contains(&remapped) {
            relations.push(remapped);
        }
    }

    let mut constraints = left.constraints.clone();
    for constraint in &right.constraints {
        if !constraints.contains(constraint) {
            constraints.push(constraint.clone());
        }
    }

    let mut sentences = left.sentences.clone();
    sentences.extend(right.sentences.iter().cloned());

    debug!(
        document = %left.id,
        mentions = mentions.len(),
        entities = entities.len(),
        relations = relations.len(),
        constraints = constraints.len(),
        "merged document"
    );

    Ok(Document {
        id: left.id.clone(),
        name: left.name.clone(),
        text: left.text.clone(),
        category: left.category.clone(),
        tokens: left.tokens.clone(),
        mentions,
        entities,
        relations,
        constraints,
        sentences,
    })
}

/// Folds a sequence of partial documents into one, left to right.
///
/// # Errors
/// Returns [`SpanscoreError::EmptyMerge`] for an empty sequence, or the
/// first error from [`merge_documents`].
pub fn merge_all<'a, I>(documents: I) -> Result<Document, SpanscoreError>
where
    I: IntoIterator<Item = &'a Document>,
{
    let mut iter = documents.into_iter();
    let first = iter.next().ok_or(SpanscoreError::EmptyMerge)?;

    iter.try_fold(first.clone(), |acc, next| merge_documents(&acc, next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Constraint, DocumentField, Token};

    fn base() -> Document {
        Document::from_whitespace("doc", "a b c d e f g h")
    }

    fn m(t: &str, indices: &[usize]) -> Mention {
        Mention::new(t, indices.to_vec())
    }

    #[test]
    fn merge_union_remaps_relations() {
        let a = m("actor", &[0]);
        let b = m("activity", &[1]);
        let c = m("actor", &[2, 3]);
        let d = m("activity data", &[5]);

        let doc1 = base()
            .with_mentions(vec![a.clone(), b.clone()])
            .with_relations(vec![Relation::new("uses", 1, 0)]);
        let doc2 = base()
            .with_mentions(vec![b.clone(), c.clone(), a.clone(), d.clone()])
            .with_relations(vec![Relation::new("flow", 1, 2)]);

        let merged = merge_documents(&doc1, &doc2).unwrap();

        assert_eq!(merged.mentions, vec![a, b, c.clone(), d]);
        assert_eq!(merged.relations.len(), 2);
        assert_eq!(merged.relations[0], Relation::new("uses", 1, 0));

        let flow = &merged.relations[1];
        assert_eq!(merged.mentions[flow.head_mention_index], c);
        assert_eq!(merged.mentions[flow.tail_mention_index], m("actor", &[0]));
        assert_eq!(flow.head_mention_index, 2);
        assert_eq!(flow.tail_mention_index, 0);
    }

    #[test]
    fn merge_with_self_is_idempotent() {
        let doc = base()
            .with_mentions(vec![m("actor", &[0]), m("activity", &[1])])
            .with_entities(vec![Entity::new(vec![0])])
            .with_relations(vec![Relation::new("uses", 1, 0)]);

        let merged = merge_documents(&doc, &doc).unwrap();
        assert_eq!(merged, doc);
    }

    #[test]
    fn merge_deduplicates_remapped_entities() {
        let doc1 = base()
            .with_mentions(vec![m("actor", &[0]), m("actor", &[4])])
            .with_entities(vec![Entity::new(vec![0, 1])]);
        let doc2 = base()
            .with_mentions(vec![m("actor", &[4]), m("actor", &[0])])
            .with_entities(vec![Entity::new(vec![1, 0]), Entity::new(vec![0])]);

        let merged = merge_documents(&doc1, &doc2).unwrap();
        assert_eq!(merged.mentions.len(), 2);
        assert_eq!(
            merged.entities,
            vec![Entity::new(vec![0, 1]), Entity::new(vec![1])]
        );
    }

    #[test]
    fn merge_rejects_different_ids() {
        let other = Document::from_whitespace("other", "a b c d e f g h");
        let err = merge_documents(&base(), &other).unwrap_err();
        assert!(matches!(err, SpanscoreError::DocumentMismatch { .. }));
    }

    #[test]
    fn merge_rejects_different_tokens() {
        let mut other = base();
        other.tokens[3] = Token::new("x", 3, 0);
        let err = merge_documents(&base(), &other).unwrap_err();
        assert!(matches!(err, SpanscoreError::DocumentMismatch { .. }));
    }

    #[test]
    fn merge_rejects_dangling_reference() {
        let right = base()
            .with_mentions(vec![m("actor", &[0])])
            .with_relations(vec![Relation::new("uses", 0, 3)]);
        let err = merge_documents(&base(), &right).unwrap_err();
        assert!(matches!(
            err,
            SpanscoreError::InvalidMentionIndex { index: 3, .. }
        ));
    }

    #[test]
    fn merge_constraints_and_sentences() {
        let mut left = base().with_constraints(vec![Constraint::new("init", "a")]);
        left.sentences = vec!["a b c d".into()];
        let mut right = base().with_constraints(vec![
            Constraint::new("init", "a"),
            Constraint::new("end", "h"),
        ]);
        right.sentences = vec!["e f g h".into()];

        let merged = merge_documents(&left, &right).unwrap();
        assert_eq!(
            merged.constraints,
            vec![Constraint::new("init", "a"), Constraint::new("end", "h")]
        );
        assert_eq!(merged.sentences, vec!["a b c d", "e f g h"]);
    }

    #[test]
    fn merge_all_folds_pipeline_steps() {
        let gold = base()
            .with_mentions(vec![m("actor", &[0]), m("activity", &[1]), m("actor", &[6])])
            .with_entities(vec![Entity::new(vec![0, 2])])
            .with_relations(vec![Relation::new("uses", 1, 0)]);

        let mention_step = gold.copy(&[DocumentField::Entities, DocumentField::Relations]);
        let entity_step = gold.copy(&[DocumentField::Relations]);
        let relation_step = gold.copy(&[DocumentField::Entities]);

        let merged = merge_all([&mention_step, &entity_step, &relation_step]).unwrap();
        assert_eq!(merged, gold);
    }

    #[test]
    fn merge_all_rejects_empty_input() {
        let err = merge_all(std::iter::empty::<&Document>()).unwrap_err();
        assert!(matches!(err, SpanscoreError::EmptyMerge));
    }
}
