//! Core document model for spanscore.
//!
//! This module defines the canonical annotation model shared by every other
//! part of the crate. Importers produce [`Document`] values, codecs decode
//! generator answers into partial documents, the merge operator folds them
//! back together and the evaluation engine compares the result to gold.
//!
//! Entities and relations never hold mentions directly. They refer to
//! mentions by their position in [`Document::mentions`], which keeps a
//! document a plain tree of owned values.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::SpanscoreError;

/// A single token of a document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    /// Exact surface form.
    pub text: String,

    /// Zero-based position of this token in the whole document.
    pub index_in_document: usize,

    /// Index of the sentence this token belongs to.
    pub sentence_index: usize,

    /// Optional part-of-speech tag from the importer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos_tag: Option<String>,
}

impl Token {
    /// Creates a new token without a part-of-speech tag.
    pub fn new(text: impl Into<String>, index_in_document: usize, sentence_index: usize) -> Self {
        Self {
            text: text.into(),
            index_in_document,
            sentence_index,
            pos_tag: None,
        }
    }

    /// Sets the part-of-speech tag for this token.
    pub fn with_pos_tag(mut self, pos_tag: impl Into<String>) -> Self {
        self.pos_tag = Some(pos_tag.into());
        self
    }
}

/// A typed span of tokens.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mention {
    /// Normalized mention type (trimmed, lower-cased).
    #[serde(rename = "type", deserialize_with = "deserialize_type")]
    pub mention_type: String,

    /// Document indices of the tokens this mention spans, in order.
    pub token_document_indices: Vec<usize>,
}

impl Mention {
    /// Creates a new mention, normalizing its type.
    pub fn new(mention_type: &str, token_document_indices: Vec<usize>) -> Self {
        Self {
            mention_type: normalize_type(mention_type),
            token_document_indices,
        }
    }
}

/// A coreference cluster: positions of mentions in the owning document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub mention_indices: Vec<usize>,
}

impl Entity {
    pub fn new(mention_indices: Vec<usize>) -> Self {
        Self { mention_indices }
    }
}

/// A typed, directed edge between two mentions of the owning document.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    pub head_mention_index: usize,
    pub tail_mention_index: usize,
    #[serde(rename = "type", deserialize_with = "deserialize_type")]
    pub relation_type: String,
}

impl Relation {
    /// Creates a new relation, normalizing its type.
    pub fn new(relation_type: &str, head_mention_index: usize, tail_mention_index: usize) -> Self {
        Self {
            head_mention_index,
            tail_mention_index,
            relation_type: normalize_type(relation_type),
        }
    }
}

/// A declarative rule between two free-text actions.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constraint {
    #[serde(rename = "type")]
    pub constraint_type: String,

    /// The constrained action.
    pub head: String,

    /// The second action, for binary constraints.
    #[serde(default)]
    pub tail: Option<String>,

    #[serde(default)]
    pub negative: bool,
}

impl Constraint {
    /// Creates a unary, non-negative constraint.
    pub fn new(constraint_type: impl Into<String>, head: impl Into<String>) -> Self {
        Self {
            constraint_type: constraint_type.into(),
            head: head.into(),
            tail: None,
            negative: false,
        }
    }

    /// Sets the tail action.
    pub fn with_tail(mut self, tail: impl Into<String>) -> Self {
        self.tail = Some(tail.into());
        self
    }

    /// Marks the constraint as negated.
    pub fn negated(mut self) -> Self {
        self.negative = true;
        self
    }

    /// Number of scoring slots: type, head, optional tail, optional negation.
    pub fn num_slots(&self) -> usize {
        2 + usize::from(self.tail.is_some()) + usize::from(self.negative)
    }
}

/// Names of the annotation collections that [`Document::copy`] can clear.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DocumentField {
    Mentions,
    Entities,
    Relations,
    Constraints,
    Sentences,
}

/// A document with its tokens and annotations.
///
/// Mention-schema documents use `mentions`, `entities` and `relations`;
/// constraint-schema documents use `constraints` and `sentences`. Unused
/// collections stay empty and are omitted when serialized.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub tokens: Vec<Token>,

    #[serde(default)]
    pub mentions: Vec<Mention>,

    #[serde(default)]
    pub entities: Vec<Entity>,

    #[serde(default)]
    pub relations: Vec<Relation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sentences: Vec<String>,
}

impl Document {
    /// Creates a document from raw text and its tokens.
    pub fn new(id: impl Into<String>, text: impl Into<String>, tokens: Vec<Token>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            tokens,
            ..Default::default()
        }
    }

    /// Creates a document by splitting `text` on whitespace into one sentence.
    ///
    /// Mostly useful for tests and tools; real importers supply their own
    /// tokenization.
    pub fn from_whitespace(id: impl Into<String>, text: &str) -> Self {
        let tokens = text
            .split_whitespace()
            .enumerate()
            .map(|(i, word)| Token::new(word, i, 0))
            .collect();
        Self::new(id, text, tokens)
    }

    /// Sets the mentions of this document.
    pub fn with_mentions(mut self, mentions: Vec<Mention>) -> Self {
        self.mentions = mentions;
        self
    }

    /// Sets the entities of this document.
    pub fn with_entities(mut self, entities: Vec<Entity>) -> Self {
        self.entities = entities;
        self
    }

    /// Sets the relations of this document.
    pub fn with_relations(mut self, relations: Vec<Relation>) -> Self {
        self.relations = relations;
        self
    }

    /// Sets the constraints of this document.
    pub fn with_constraints(mut self, constraints: Vec<Constraint>) -> Self {
        self.constraints = constraints;
        self
    }

    /// Returns a copy of this document with the named collections emptied.
    ///
    /// Used before handing a document to a pipeline step, so the step
    /// cannot see predictions made by earlier steps.
    pub fn copy(&self, clear: &[DocumentField]) -> Document {
        let keep = |field: DocumentField| !clear.contains(&field);

        Document {
            id: self.id.clone(),
            name: self.name.clone(),
            text: self.text.clone(),
            category: self.category.clone(),
            tokens: self.tokens.clone(),
            mentions: if keep(DocumentField::Mentions) {
                self.mentions.clone()
            } else {
                Vec::new()
            },
            entities: if keep(DocumentField::Entities) {
                self.entities.clone()
            } else {
                Vec::new()
            },
            relations: if keep(DocumentField::Relations) {
                self.relations.clone()
            } else {
                Vec::new()
            },
            constraints: if keep(DocumentField::Constraints) {
                self.constraints.clone()
            } else {
                Vec::new()
            },
            sentences: if keep(DocumentField::Sentences) {
                self.sentences.clone()
            } else {
                Vec::new()
            },
        }
    }

    /// Returns true if both documents have the same token sequence.
    pub fn same_tokens(&self, other: &Document) -> bool {
        self.tokens == other.tokens
    }

    /// Looks up a mention by position.
    pub fn mention(&self, index: usize) -> Result<&Mention, SpanscoreError> {
        self.mentions
            .get(index)
            .ok_or_else(|| SpanscoreError::InvalidMentionIndex {
                document_id: self.id.clone(),
                index,
                mention_count: self.mentions.len(),
            })
    }

    /// Surface text of a mention, joined by single spaces.
    ///
    /// Token indices without a matching token are skipped.
    pub fn mention_text(&self, mention: &Mention) -> String {
        mention
            .token_document_indices
            .iter()
            .filter_map(|idx| self.token_at(*idx))
            .map(|token| token.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Finds the token with the given document index.
    pub fn token_at(&self, index_in_document: usize) -> Option<&Token> {
        match self.tokens.get(index_in_document) {
            Some(token) if token.index_in_document == index_in_document => Some(token),
            _ => self
                .tokens
                .iter()
                .find(|token| token.index_in_document == index_in_document),
        }
    }

    /// Decides the tag of an entity.
    ///
    /// The tag is the type of the entity's first mention. If members disagree
    /// the second element lists every distinct member type, in first-seen
    /// order, so callers can report the conflict.
    pub fn entity_tag(&self, entity: &Entity) -> Result<(String, Option<Vec<String>>), SpanscoreError> {
        let mut types: Vec<&str> = Vec::new();
        for &index in &entity.mention_indices {
            let mention_type = self.mention(index)?.mention_type.as_str();
            if !types.contains(&mention_type) {
                types.push(mention_type);
            }
        }

        let tag = types.first().map(|t| t.to_string()).unwrap_or_default();
        let conflict = if types.len() > 1 {
            Some(types.iter().map(|t| t.to_string()).collect())
        } else {
            None
        };
        Ok((tag, conflict))
    }

    /// Checks that every entity and relation refers to an existing mention.
    pub fn validate_references(&self) -> Result<(), SpanscoreError> {
        for entity in &self.entities {
            for &index in &entity.mention_indices {
                self.mention(index)?;
            }
        }
        for relation in &self.relations {
            self.mention(relation.head_mention_index)?;
            self.mention(relation.tail_mention_index)?;
        }
        Ok(())
    }
}

/// Normalizes an annotation type: trimmed and lower-cased.
pub fn normalize_type(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Reads a mention or relation type and normalizes it like the constructors.
fn deserialize_type<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(normalize_type(&raw))
}
