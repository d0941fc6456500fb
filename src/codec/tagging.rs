//! Inline span tagging.
//!
//! Mentions are written into the space-joined token text as XML-like
//! markers:
//!
//! ```text
//! <actor id=0> The clerk </actor> <activity id=1> checks </activity> the invoice
//! ```
//!
//! Decoding walks the generator's answer, checks every word against the
//! reference tokens and turns tag pairs back into mentions. A reworded
//! answer is rejected instead of being aligned heuristically.
//!
//! # Format Limitations
//!
//! - Spans cannot nest or overlap. Nested input produces markup the decoder
//!   rejects.
//! - A non-contiguous mention is written as the range from its first to its
//!   last token, so it decodes as a contiguous mention.
//! - Types are written with spaces replaced by underscores and read back with
//!   underscores replaced by spaces.

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::report::{DecodeIssue, DecodeIssueCode, DecodeReport};
use super::Decoded;
use crate::error::SpanscoreError;
use crate::ir::{normalize_type, Document, DocumentField, Mention};

/// Matches one opening or closing marker, with optional `key=value`
/// attributes. A bare `<` or `>` word never starts or ends a marker.
static TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(/?)([^\s<>/=]+)((?:\s+[A-Za-z_]+=[^\s<>]*)*)\s*>")
        .expect("tag pattern is valid")
});

/// Number of pieces shown on each side of an offending piece in errors.
const FRAGMENT_CONTEXT: usize = 3;

/// Options for [`encode_mentions`].
#[derive(Clone, Debug, Default)]
pub struct EncodeOptions {
    /// Only mentions with one of these (normalized) types are tagged.
    /// `None` tags every mention.
    pub tag_filter: Option<BTreeSet<String>>,
    /// Emit an `id=<position>` attribute on opening markers.
    pub with_ids: bool,
}

impl EncodeOptions {
    /// Restricts tagging to the given mention types.
    pub fn with_filter<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tag_filter = Some(tags.into_iter().map(|t| normalize_type(t.as_ref())).collect());
        self
    }

    /// Enables `id=<position>` attributes.
    pub fn with_ids(mut self) -> Self {
        self.with_ids = true;
        self
    }

    fn accepts(&self, mention: &Mention) -> bool {
        self.tag_filter
            .as_ref()
            .map_or(true, |filter| filter.contains(&mention.mention_type))
    }
}

/// Writes the document's mentions as inline markers into its token text.
pub fn encode_mentions(document: &Document, opts: &EncodeOptions) -> String {
    let mut parts: Vec<String> = document.tokens.iter().map(|t| t.text.clone()).collect();
    let positions: BTreeMap<usize, usize> = document
        .tokens
        .iter()
        .enumerate()
        .map(|(pos, token)| (token.index_in_document, pos))
        .collect();

    // (first position, last position, mention index)
    let mut spans: Vec<(usize, usize, usize)> = Vec::new();
    for (mention_index, mention) in document.mentions.iter().enumerate() {
        if !opts.accepts(mention) {
            continue;
        }
        let resolved: Option<Vec<usize>> = mention
            .token_document_indices
            .iter()
            .map(|idx| positions.get(idx).copied())
            .collect();
        let span = resolved.and_then(|positions| {
            let first = positions.iter().copied().min()?;
            let last = positions.iter().copied().max()?;
            Some((first, last))
        });
        match span {
            Some((first, last)) => spans.push((first, last, mention_index)),
            None => warn!(
                document = %document.id,
                mention = mention_index,
                "mention has no resolvable tokens; not tagged"
            ),
        }
    }

    // Insert from the end of the text towards the start so that earlier
    // positions stay valid.
    spans.sort_by(|a, b| b.0.cmp(&a.0).then(b.2.cmp(&a.2)));
    for (first, last, mention_index) in spans {
        let tag = tag_name(&document.mentions[mention_index].mention_type);
        parts.insert(last + 1, format!("</{}>", tag));
        let opening = if opts.with_ids {
            format!("<{} id={}>", tag, mention_index)
        } else {
            format!("<{}>", tag)
        };
        parts.insert(first, opening);
    }

    parts.join(" ")
}

/// Parses tagged text into mentions, checking it against `reference`.
///
/// # Errors
/// - [`SpanscoreError::TextMismatch`] if a word differs from the reference
///   token at the same position, or the text is longer or shorter than the
///   reference.
/// - [`SpanscoreError::UnclosedSpan`] if a span is opened while another is
///   open, or the text ends inside a span.
/// - [`SpanscoreError::ImbalancedTag`] if a closing tag has no open span.
pub fn decode_mentions(
    reference: &Document,
    text: &str,
) -> Result<(Vec<Mention>, DecodeReport), SpanscoreError> {
    let pieces = split_pieces(text);
    let mut report = DecodeReport::new(&reference.id);
    let mut mentions = Vec::new();

    let mut next_token = 0usize;
    let mut open: Option<(String, Vec<usize>)> = None;

    for (piece_idx, piece) in pieces.iter().enumerate() {
        match &piece.kind {
            PieceKind::Open(tag_type) => {
                if open.is_some() {
                    return Err(SpanscoreError::UnclosedSpan {
                        document_id: reference.id.clone(),
                        fragment: fragment(&pieces, piece_idx),
                    });
                }
                open = Some((tag_type.clone(), Vec::new()));
            }
            PieceKind::Close(tag_type) => {
                let Some((open_type, indices)) = open.take() else {
                    return Err(SpanscoreError::ImbalancedTag {
                        document_id: reference.id.clone(),
                        fragment: fragment(&pieces, piece_idx),
                    });
                };
                if *tag_type != open_type {
                    report.add(DecodeIssue::in_text(
                        DecodeIssueCode::TagTypeMismatch,
                        &fragment(&pieces, piece_idx),
                        format!(
                            "span opened as '{}' but closed as '{}'; keeping '{}'",
                            open_type, tag_type, open_type
                        ),
                    ));
                }
                if indices.is_empty() {
                    report.add(DecodeIssue::in_text(
                        DecodeIssueCode::EmptySpan,
                        &fragment(&pieces, piece_idx),
                        format!("'{}' span encloses no tokens", open_type),
                    ));
                    continue;
                }
                mentions.push(Mention::new(&open_type, indices));
            }
            PieceKind::Word => {
                let Some(token) = reference.tokens.get(next_token) else {
                    return Err(SpanscoreError::TextMismatch {
                        document_id: reference.id.clone(),
                        position: next_token,
                        expected: "<end of document>".to_string(),
                        found: piece.raw.to_string(),
                        fragment: fragment(&pieces, piece_idx),
                    });
                };
                if token.text != piece.raw {
                    return Err(SpanscoreError::TextMismatch {
                        document_id: reference.id.clone(),
                        position: next_token,
                        expected: token.text.clone(),
                        found: piece.raw.to_string(),
                        fragment: fragment(&pieces, piece_idx),
                    });
                }
                if let Some((_, indices)) = open.as_mut() {
                    indices.push(token.index_in_document);
                }
                next_token += 1;
            }
        }
    }

    if open.is_some() {
        return Err(SpanscoreError::UnclosedSpan {
            document_id: reference.id.clone(),
            fragment: fragment(&pieces, pieces.len().saturating_sub(1)),
        });
    }
    if let Some(token) = reference.tokens.get(next_token) {
        return Err(SpanscoreError::TextMismatch {
            document_id: reference.id.clone(),
            position: next_token,
            expected: token.text.clone(),
            found: "<end of text>".to_string(),
            fragment: fragment(&pieces, pieces.len().saturating_sub(1)),
        });
    }

    debug!(document = %reference.id, mentions = mentions.len(), "decoded tagged text");
    Ok((mentions, report))
}

/// Decodes tagged text into a new document carrying only the decoded
/// mentions.
///
/// Entities and relations of `reference` are dropped, since their indices
/// refer to the reference's mention list.
pub fn decode_document(reference: &Document, text: &str) -> Result<Decoded, SpanscoreError> {
    let (mentions, report) = decode_mentions(reference, text)?;
    let document = reference
        .copy(&[
            DocumentField::Mentions,
            DocumentField::Entities,
            DocumentField::Relations,
        ])
        .with_mentions(mentions);
    Ok(Decoded { document, report })
}

fn tag_name(mention_type: &str) -> String {
    mention_type.replace(' ', "_")
}

#[derive(Debug, PartialEq)]
enum PieceKind {
    Open(String),
    Close(String),
    Word,
}

#[derive(Debug)]
struct Piece<'a> {
    kind: PieceKind,
    raw: &'a str,
}

/// Splits text into markers and whitespace-delimited words.
///
/// Markers glued to a word on either side become pieces of their own.
fn split_pieces(text: &str) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();
    let mut cursor = 0;

    for caps in TAG.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        push_words(&text[cursor..whole.start()], &mut pieces);

        let tag_type = normalize_type(&caps[2].replace('_', " "));
        let kind = if caps[1].is_empty() {
            PieceKind::Open(tag_type)
        } else {
            PieceKind::Close(tag_type)
        };
        pieces.push(Piece {
            kind,
            raw: whole.as_str(),
        });
        cursor = whole.end();
    }
    push_words(&text[cursor..], &mut pieces);

    pieces
}

fn push_words<'a>(segment: &'a str, pieces: &mut Vec<Piece<'a>>) {
    pieces.extend(segment.split_whitespace().map(|raw| Piece {
        kind: PieceKind::Word,
        raw,
    }));
}

fn fragment(pieces: &[Piece<'_>], center: usize) -> String {
    let start = center.saturating_sub(FRAGMENT_CONTEXT);
    let end = (center + FRAGMENT_CONTEXT + 1).min(pieces.len());
    pieces[start..end]
        .iter()
        .map(|p| p.raw)
        .collect::<Vec<_>>()
        .join(" ")
}
