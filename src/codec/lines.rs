//! Line-oriented answer formats.
//!
//! Relations, coreference clusters and constraints are exchanged with the
//! generator as one annotation per line:
//!
//! ```text
//! actor performer; 1; 0        relation: type; head id; tail id
//! 0, 4, 9                      entity: mention ids
//! not succession; pay; ship    constraint: [not] type; head[; tail]
//! ```
//!
//! Mention ids are mention positions, as written by the tagging codec's
//! `id=` attribute.
//!
//! Generator output is noisy, so a malformed line never fails the whole
//! answer: it is skipped and recorded in the [`DecodeReport`], and the
//! remaining lines are still used. Blank lines are ignored and a leading
//! `-` or `*` bullet is tolerated.

use super::report::{DecodeIssue, DecodeReport};
use crate::ir::{Constraint, Document, Entity, Relation};

const FIELD_SEPARATOR: char = ';';
const NEGATION_PREFIX: &str = "not ";

/// Writes the document's relations, one per line.
pub fn encode_relations(document: &Document) -> String {
    document
        .relations
        .iter()
        .map(|r| {
            format!(
                "{}; {}; {}",
                r.relation_type, r.head_mention_index, r.tail_mention_index
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parses relation lines against the mentions of `reference`.
pub fn decode_relations(reference: &Document, answer: &str) -> (Vec<Relation>, DecodeReport) {
    let mut report = DecodeReport::new(&reference.id);
    let mut relations = Vec::new();

    for (line_no, raw, content) in answer_lines(answer) {
        let fields: Vec<&str> = content.split(FIELD_SEPARATOR).map(str::trim).collect();
        let [relation_type, head, tail] = fields.as_slice() else {
            report.add(DecodeIssue::skipped_line(
                line_no,
                raw,
                format!("expected 3 fields, found {}", fields.len()),
            ));
            continue;
        };
        if relation_type.is_empty() {
            report.add(DecodeIssue::skipped_line(line_no, raw, "empty relation type"));
            continue;
        }

        let head = match parse_mention_id(head, reference) {
            Ok(id) => id,
            Err(message) => {
                report.add(DecodeIssue::skipped_line(line_no, raw, message));
                continue;
            }
        };
        let tail = match parse_mention_id(tail, reference) {
            Ok(id) => id,
            Err(message) => {
                report.add(DecodeIssue::skipped_line(line_no, raw, message));
                continue;
            }
        };

        relations.push(Relation::new(relation_type, head, tail));
    }

    (relations, report)
}

/// Writes the document's entities, one cluster per line.
pub fn encode_entities(document: &Document) -> String {
    document
        .entities
        .iter()
        .map(|e| {
            e.mention_indices
                .iter()
                .map(|i| i.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parses entity lines against the mentions of `reference`.
///
/// Repeated ids within one line are kept once.
pub fn decode_entities(reference: &Document, answer: &str) -> (Vec<Entity>, DecodeReport) {
    let mut report = DecodeReport::new(&reference.id);
    let mut entities = Vec::new();

    'lines: for (line_no, raw, content) in answer_lines(answer) {
        let mut indices: Vec<usize> = Vec::new();
        for field in content
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|f| !f.is_empty())
        {
            match parse_mention_id(field, reference) {
                Ok(id) if !indices.contains(&id) => indices.push(id),
                Ok(_) => {}
                Err(message) => {
                    report.add(DecodeIssue::skipped_line(line_no, raw, message));
                    continue 'lines;
                }
            }
        }
        if indices.is_empty() {
            report.add(DecodeIssue::skipped_line(line_no, raw, "no mention ids"));
            continue;
        }
        entities.push(Entity::new(indices));
    }

    (entities, report)
}

/// Writes the document's constraints, one per line.
pub fn encode_constraints(document: &Document) -> String {
    document
        .constraints
        .iter()
        .map(|c| {
            let negation = if c.negative { NEGATION_PREFIX } else { "" };
            match &c.tail {
                Some(tail) => format!("{}{}; {}; {}", negation, c.constraint_type, c.head, tail),
                None => format!("{}{}; {}", negation, c.constraint_type, c.head),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parses constraint lines.
///
/// An empty third field is read as a unary constraint.
pub fn decode_constraints(reference: &Document, answer: &str) -> (Vec<Constraint>, DecodeReport) {
    let mut report = DecodeReport::new(&reference.id);
    let mut constraints = Vec::new();

    for (line_no, raw, content) in answer_lines(answer) {
        let fields: Vec<&str> = content.split(FIELD_SEPARATOR).map(str::trim).collect();
        let (type_field, head, tail) = match fields.as_slice() {
            [type_field, head] => (*type_field, *head, None),
            [type_field, head, tail] => {
                (*type_field, *head, Some(*tail).filter(|t| !t.is_empty()))
            }
            _ => {
                report.add(DecodeIssue::skipped_line(
                    line_no,
                    raw,
                    format!("expected 2 or 3 fields, found {}", fields.len()),
                ));
                continue;
            }
        };

        let (negative, constraint_type) = split_negation(type_field);
        if constraint_type.is_empty() {
            report.add(DecodeIssue::skipped_line(line_no, raw, "empty constraint type"));
            continue;
        }
        if head.is_empty() {
            report.add(DecodeIssue::skipped_line(line_no, raw, "empty head action"));
            continue;
        }

        constraints.push(Constraint {
            constraint_type: constraint_type.to_string(),
            head: head.to_string(),
            tail: tail.map(str::to_string),
            negative,
        });
    }

    (constraints, report)
}

/// Non-blank answer lines as (1-based number, raw line, content without bullet).
fn answer_lines(answer: &str) -> impl Iterator<Item = (usize, &str, &str)> {
    answer.lines().enumerate().filter_map(|(idx, raw)| {
        let content = raw.trim();
        let content = match content.strip_prefix(|c: char| c == '-' || c == '*') {
            Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => rest.trim(),
            _ => content,
        };
        if content.is_empty() {
            None
        } else {
            Some((idx + 1, raw, content))
        }
    })
}

fn parse_mention_id(field: &str, reference: &Document) -> Result<usize, String> {
    let id: usize = field
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a mention id", field))?;
    if id >= reference.mentions.len() {
        return Err(format!(
            "mention id {} out of range ({} mention(s))",
            id,
            reference.mentions.len()
        ));
    }
    Ok(id)
}

fn split_negation(type_field: &str) -> (bool, &str) {
    let trimmed = type_field.trim();
    match trimmed.get(..NEGATION_PREFIX.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(NEGATION_PREFIX) => {
            (true, trimmed[NEGATION_PREFIX.len()..].trim())
        }
        _ => (false, trimmed),
    }
}
