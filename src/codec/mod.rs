//! Text codecs for exchanging annotations with a text generator.
//!
//! Each annotation kind has one textual format:
//!
//! | Format        | Annotations | Module      |
//! |---------------|-------------|-------------|
//! | `tagged`      | mentions    | [`tagging`] |
//! | `relations`   | relations   | [`lines`]   |
//! | `entities`    | entities    | [`lines`]   |
//! | `constraints` | constraints | [`lines`]   |
//!
//! [`Format`] maps a format name to its encoder and decoder. Decoding always
//! produces a new partial [`Document`] plus a [`DecodeReport`] of recovered
//! problems, ready to be folded into a prediction with
//! [`crate::merge::merge_documents`].

pub mod lines;
mod report;
pub mod tagging;

pub use report::{DecodeIssue, DecodeIssueCode, DecodeReport};
pub use tagging::EncodeOptions;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SpanscoreError;
use crate::ir::{Document, DocumentField};

/// A decoded partial document and the problems recovered while decoding it.
#[derive(Clone, Debug)]
pub struct Decoded {
    pub document: Document,
    pub report: DecodeReport,
}

/// Text exchanged with the generator for one document.
///
/// Encoders produce these and the decoder consumes them, one JSON object
/// per line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub id: String,
    pub answer: String,
}

/// The textual formats understood by spanscore.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    /// Inline span markers around mention tokens.
    Tagged,
    /// One `type; head; tail` relation per line.
    Relations,
    /// One comma-separated mention id cluster per line.
    Entities,
    /// One `[not] type; head[; tail]` constraint per line.
    Constraints,
}

impl Format {
    /// All formats, in documentation order.
    pub const ALL: [Format; 4] = [
        Format::Tagged,
        Format::Relations,
        Format::Entities,
        Format::Constraints,
    ];

    /// The canonical name of this format.
    pub fn name(&self) -> &'static str {
        match self {
            Format::Tagged => "tagged",
            Format::Relations => "relations",
            Format::Entities => "entities",
            Format::Constraints => "constraints",
        }
    }

    /// The document collection this format carries.
    pub fn field(&self) -> DocumentField {
        match self {
            Format::Tagged => DocumentField::Mentions,
            Format::Relations => DocumentField::Relations,
            Format::Entities => DocumentField::Entities,
            Format::Constraints => DocumentField::Constraints,
        }
    }

    /// Encodes the annotations of `document` carried by this format.
    ///
    /// `opts` only affects the tagged format.
    pub fn encode(&self, document: &Document, opts: &EncodeOptions) -> String {
        match self {
            Format::Tagged => tagging::encode_mentions(document, opts),
            Format::Relations => lines::encode_relations(document),
            Format::Entities => lines::encode_entities(document),
            Format::Constraints => lines::encode_constraints(document),
        }
    }

    /// Decodes a generator answer against `reference`.
    ///
    /// The returned document is a copy of `reference` whose collection for
    /// this format holds the decoded annotations. For the tagged format,
    /// entities and relations are cleared as well, because they index the
    /// reference's mentions.
    ///
    /// # Errors
    /// Only the tagged format fails; line formats recover from malformed
    /// lines and report them instead.
    pub fn decode(&self, reference: &Document, answer: &str) -> Result<Decoded, SpanscoreError> {
        let blank = reference.copy(&[self.field()]);
        let decoded = match self {
            Format::Tagged => return tagging::decode_document(reference, answer),
            Format::Relations => {
                let (relations, report) = lines::decode_relations(reference, answer);
                Decoded {
                    document: blank.with_relations(relations),
                    report,
                }
            }
            Format::Entities => {
                let (entities, report) = lines::decode_entities(reference, answer);
                Decoded {
                    document: blank.with_entities(entities),
                    report,
                }
            }
            Format::Constraints => {
                let (constraints, report) = lines::decode_constraints(reference, answer);
                Decoded {
                    document: blank.with_constraints(constraints),
                    report,
                }
            }
        };
        Ok(decoded)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = SpanscoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tagged" | "mentions" => Ok(Format::Tagged),
            "relations" => Ok(Format::Relations),
            "entities" | "coref" => Ok(Format::Entities),
            "constraints" => Ok(Format::Constraints),
            other => Err(SpanscoreError::UnsupportedFormat(format!(
                "'{}' (supported: tagged, relations, entities, constraints)",
                other
            ))),
        }
    }
}
