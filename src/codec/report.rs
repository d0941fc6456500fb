//! Decode report types for recovered problems.
//!
//! Fatal decode problems are errors. Everything the decoders can recover
//! from locally (a malformed answer line, a closing tag with the wrong type)
//! is collected here so callers can inspect it after the fact.

use serde::Serialize;
use std::fmt;

use tracing::warn;

/// Issues recovered while decoding one generator answer.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DecodeReport {
    /// Id of the reference document the answer was decoded against.
    pub document_id: String,
    /// Issues found, in the order they were encountered.
    pub issues: Vec<DecodeIssue>,
}

impl DecodeReport {
    /// Creates an empty report for a document.
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            issues: Vec::new(),
        }
    }

    /// Adds an issue to the report and logs it.
    pub fn add(&mut self, issue: DecodeIssue) {
        warn!(
            document = %self.document_id,
            code = ?issue.code,
            line = issue.line,
            fragment = %issue.fragment,
            "{}",
            issue.message
        );
        self.issues.push(issue);
    }

    /// Number of answer lines that were skipped.
    pub fn skipped_lines(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.code == DecodeIssueCode::SkippedLine)
            .count()
    }

    /// Returns true if nothing had to be recovered.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

impl fmt::Display for DecodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return writeln!(f, "{}: decoded cleanly", self.document_id);
        }

        writeln!(
            f,
            "{}: decoded with {} issue(s):",
            self.document_id,
            self.issues.len()
        )?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}

/// A single recovered problem.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DecodeIssue {
    /// A stable code for the issue type.
    pub code: DecodeIssueCode,
    /// A human-readable description.
    pub message: String,
    /// 1-based answer line, for line-oriented formats.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// The offending text, verbatim.
    pub fragment: String,
}

impl DecodeIssue {
    /// An answer line that was skipped.
    pub fn skipped_line(line: usize, text: &str, message: impl Into<String>) -> Self {
        Self {
            code: DecodeIssueCode::SkippedLine,
            message: message.into(),
            line: Some(line),
            fragment: text.to_string(),
        }
    }

    /// A problem inside tagged text.
    pub fn in_text(code: DecodeIssueCode, fragment: &str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            line: None,
            fragment: fragment.to_string(),
        }
    }
}

impl fmt::Display for DecodeIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(
                f,
                "[WARN ] {:?} at line {}: {} ({:?})",
                self.code, line, self.message, self.fragment
            ),
            None => write!(
                f,
                "[WARN ] {:?}: {} ({:?})",
                self.code, self.message, self.fragment
            ),
        }
    }
}

/// A stable code identifying the type of decode issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DecodeIssueCode {
    /// A line of a line-oriented answer could not be parsed and was skipped.
    SkippedLine,
    /// A closing tag named a different type than the span it closed.
    TagTypeMismatch,
    /// A tag pair enclosed no tokens; no mention was produced.
    EmptySpan,
}
