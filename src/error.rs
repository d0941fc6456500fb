use std::path::PathBuf;
use thiserror::Error;

/// The main error type for spanscore operations.
#[derive(Debug, Error)]
pub enum SpanscoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse document JSONL from {path} (line {line}): {source}")]
    JsonlParse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write document JSONL to {path}: {source}")]
    JsonlWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot combine document '{left}' with document '{right}': {reason}")]
    DocumentMismatch {
        left: String,
        right: String,
        reason: String,
    },

    #[error(
        "Text mismatch in document '{document_id}' at token {position}: expected '{expected}', found '{found}' (near \"{fragment}\")"
    )]
    TextMismatch {
        document_id: String,
        position: usize,
        expected: String,
        found: String,
        fragment: String,
    },

    #[error("Unclosed span in document '{document_id}' (near \"{fragment}\")")]
    UnclosedSpan {
        document_id: String,
        fragment: String,
    },

    #[error("Closing tag without an open span in document '{document_id}' (near \"{fragment}\")")]
    ImbalancedTag {
        document_id: String,
        fragment: String,
    },

    #[error(
        "Document '{document_id}' references mention {index}, but only {mention_count} mention(s) exist"
    )]
    InvalidMentionIndex {
        document_id: String,
        index: usize,
        mention_count: usize,
    },

    #[error("Gold document '{document_id}' contains a duplicate annotation: {annotation}")]
    DuplicateGoldAnnotation {
        document_id: String,
        annotation: String,
    },

    #[error("Nothing to merge: no documents given")]
    EmptyMerge,

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Unsupported option: {0}")]
    UnsupportedOption(String),
}
