//! Document model for spanscore.
//!
//! This module defines the canonical representation of annotated text that
//! every other component works on: tokens, mentions, coreference entities,
//! relations and declarative constraints, all owned by a [`Document`].
//!
//! # Design Principles
//!
//! 1. **Index references**: Entities and relations point at mentions by
//!    their position in the document's mention list, never by reference.
//!
//! 2. **Value semantics**: Equality is structural. Two mentions with the
//!    same type and token indices are the same mention.
//!
//! 3. **New values, not mutation**: Copying, merging and decoding all
//!    return fresh documents.
//!
//! # Example
//!
//! ```
//! use spanscore::ir::{Document, DocumentField, Mention, Relation};
//!
//! let doc = Document::from_whitespace("doc-1", "The clerk checks the invoice")
//!     .with_mentions(vec![
//!         Mention::new("Actor", vec![0, 1]),
//!         Mention::new("Activity", vec![2]),
//!     ])
//!     .with_relations(vec![Relation::new("actor performer", 1, 0)]);
//!
//! let blank = doc.copy(&[DocumentField::Mentions, DocumentField::Relations]);
//! assert!(blank.mentions.is_empty());
//! assert_eq!(blank.tokens, doc.tokens);
//! ```

pub mod io_jsonl;
mod model;

// Re-export core types for convenient access
pub use model::{
    normalize_type, Constraint, Document, DocumentField, Entity, Mention, Relation, Token,
};
