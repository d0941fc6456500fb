//! Spanscore: span tagging, merging and scoring for text annotations.
//!
//! Spanscore compares machine-generated annotations of text (mentions,
//! coreference entities, relations and declarative constraints) against gold
//! annotations, and round-trips those annotations through plain-text formats
//! a text generator can read and write.
//!
//! # Modules
//!
//! - [`ir`]: Document model and JSONL persistence
//! - [`merge`]: Folding partial documents into one prediction
//! - [`codec`]: Text formats for exchanging annotations with a generator
//! - [`eval`]: Precision, recall and F1 over predicted and gold documents
//! - [`error`]: Error types for spanscore operations

pub mod codec;
pub mod error;
pub mod eval;
pub mod ir;
pub mod merge;

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use codec::{Answer, EncodeOptions, Format};
use eval::{Averaging, EvalIssue, EvalOutcome, HeuristicTagger, Scores, Stats};
use ir::Document;

pub use error::SpanscoreError;

/// The spanscore CLI application.
#[derive(Parser)]
#[command(name = "spanscore")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Log filter for diagnostics on stderr ('warn', 'debug', 'spanscore=trace').
    #[arg(long, global = true, env = "SPANSCORE_LOG", default_value = "warn")]
    log: String,

    /// Shorthand for '--log debug'.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Merge partial documents with the same id into one document each.
    Merge(MergeArgs),
    /// Encode document annotations as generator text.
    Encode(EncodeArgs),
    /// Decode generator answers into partial documents.
    Decode(DecodeArgs),
    /// Score predicted documents against gold documents.
    Evaluate(EvaluateArgs),
}

/// Arguments for the merge subcommand.
#[derive(clap::Args)]
struct MergeArgs {
    /// Document JSONL files, merged in the order given.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output JSONL file.
    #[arg(short, long)]
    output: PathBuf,
}

/// Arguments for the encode subcommand.
#[derive(clap::Args)]
struct EncodeArgs {
    /// Document JSONL file.
    input: PathBuf,

    /// Text format ('tagged', 'relations', 'entities', or 'constraints').
    #[arg(long, default_value = "tagged")]
    format: String,

    /// Only tag mentions of these types (tagged format, comma-separated).
    #[arg(long, value_delimiter = ',')]
    tags: Vec<String>,

    /// Add 'id=<position>' attributes to opening markers (tagged format).
    #[arg(long)]
    with_ids: bool,

    /// Write answer JSONL here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Arguments for the decode subcommand.
#[derive(clap::Args)]
struct DecodeArgs {
    /// Reference document JSONL file the answers refer to.
    #[arg(long)]
    reference: PathBuf,

    /// Answer JSONL file, one {"id", "answer"} object per line.
    #[arg(long)]
    answers: PathBuf,

    /// Text format of the answers.
    #[arg(long, default_value = "tagged")]
    format: String,

    /// Skip answers that cannot be decoded instead of failing.
    #[arg(long)]
    skip_invalid: bool,

    /// Output JSONL file for the decoded documents.
    #[arg(short, long)]
    output: PathBuf,
}

/// Arguments for the evaluate subcommand.
#[derive(clap::Args)]
struct EvaluateArgs {
    /// Predicted document JSONL file.
    #[arg(long)]
    predicted: PathBuf,

    /// Gold document JSONL file, in the same document order.
    #[arg(long)]
    gold: PathBuf,

    /// What to score ('mentions', 'relations', 'entities', or 'constraints').
    #[arg(long, default_value = "mentions")]
    kind: String,

    /// Output format for the scores ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Run the spanscore CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), SpanscoreError> {
    let cli = Cli::parse();
    init_logging(&cli);

    match cli.command {
        Some(Commands::Merge(args)) => run_merge(args),
        Some(Commands::Encode(args)) => run_encode(args),
        Some(Commands::Decode(args)) => run_decode(args),
        Some(Commands::Evaluate(args)) => run_evaluate(args),
        None => {
            println!("spanscore {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Span tagging, merging and scoring for text annotations.");
            println!();
            println!("Run 'spanscore --help' for usage information.");
            Ok(())
        }
    }
}

fn init_logging(cli: &Cli) {
    let directive = if cli.verbose { "debug" } else { cli.log.as_str() };
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    // A subscriber may already be installed when run() is called twice.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Execute the merge subcommand.
fn run_merge(args: MergeArgs) -> Result<(), SpanscoreError> {
    // Documents grouped by id, ids in first-seen order
    let mut order: Vec<String> = Vec::new();
    let mut groups: BTreeMap<String, Vec<Document>> = BTreeMap::new();

    for input in &args.inputs {
        for document in ir::io_jsonl::read_jsonl(input)? {
            let group = groups.entry(document.id.clone()).or_default();
            if group.is_empty() {
                order.push(document.id.clone());
            }
            group.push(document);
        }
    }

    let mut merged = Vec::with_capacity(order.len());
    for id in &order {
        let group = groups.get(id).map(Vec::as_slice).unwrap_or_default();
        debug!(document = %id, parts = group.len(), "merging document");
        merged.push(merge::merge_all(group)?);
    }

    ir::io_jsonl::write_jsonl(&args.output, &merged)?;
    println!(
        "Merged {} document(s) from {} file(s) into {}",
        merged.len(),
        args.inputs.len(),
        args.output.display()
    );
    Ok(())
}

/// Execute the encode subcommand.
fn run_encode(args: EncodeArgs) -> Result<(), SpanscoreError> {
    let format: Format = args.format.parse()?;
    let documents = ir::io_jsonl::read_jsonl(&args.input)?;

    let mut opts = EncodeOptions::default();
    if !args.tags.is_empty() {
        opts = opts.with_filter(&args.tags);
    }
    if args.with_ids {
        opts = opts.with_ids();
    }

    let answers: Vec<Answer> = documents
        .iter()
        .map(|doc| Answer {
            id: doc.id.clone(),
            answer: format.encode(doc, &opts),
        })
        .collect();

    match &args.output {
        Some(path) => ir::io_jsonl::write_records(path, &answers),
        None => {
            let jsonl = ir::io_jsonl::to_jsonl_string(&answers).map_err(|source| {
                SpanscoreError::JsonlWrite {
                    path: PathBuf::from("-"),
                    source,
                }
            })?;
            print!("{}", jsonl);
            Ok(())
        }
    }
}

/// Execute the decode subcommand.
fn run_decode(args: DecodeArgs) -> Result<(), SpanscoreError> {
    let format: Format = args.format.parse()?;
    let references = ir::io_jsonl::read_jsonl(&args.reference)?;
    let answers: Vec<Answer> = ir::io_jsonl::read_records(&args.answers)?;

    let by_id: BTreeMap<&str, &Document> =
        references.iter().map(|d| (d.id.as_str(), d)).collect();

    let mut decoded = Vec::with_capacity(answers.len());
    let mut with_issues = 0;
    let mut skipped = 0;

    for answer in &answers {
        let reference = by_id.get(answer.id.as_str()).ok_or_else(|| {
            SpanscoreError::DocumentMismatch {
                left: answer.id.clone(),
                right: args.reference.display().to_string(),
                reason: "no reference document with this id".to_string(),
            }
        })?;

        let result = match format.decode(reference, &answer.answer) {
            Ok(result) => result,
            Err(err) if args.skip_invalid => {
                warn!("skipping answer: {}", err);
                skipped += 1;
                continue;
            }
            Err(err) => return Err(err),
        };

        if !result.report.is_clean() {
            with_issues += 1;
            print!("{}", result.report);
        }
        decoded.push(result.document);
    }

    ir::io_jsonl::write_jsonl(&args.output, &decoded)?;
    println!(
        "Decoded {} document(s) ({} with recovered issues, {} skipped) into {}",
        decoded.len(),
        with_issues,
        skipped,
        args.output.display()
    );
    Ok(())
}

/// Scores and warnings in the JSON output of the evaluate subcommand.
#[derive(Serialize)]
struct EvaluationSummary<'a> {
    kind: &'a str,
    stats: &'a BTreeMap<String, Stats>,
    micro: Scores,
    #[serde(rename = "macro")]
    macro_avg: Scores,
    issues: &'a [EvalIssue],
}

/// Execute the evaluate subcommand.
fn run_evaluate(args: EvaluateArgs) -> Result<(), SpanscoreError> {
    let predicted = ir::io_jsonl::read_jsonl(&args.predicted)?;
    let gold = ir::io_jsonl::read_jsonl(&args.gold)?;

    let kind = args.kind.trim().to_lowercase();
    let outcome = evaluate(&kind, &predicted, &gold)?;

    match args.output.as_str() {
        "json" => {
            let summary = EvaluationSummary {
                kind: &kind,
                stats: &outcome.stats,
                micro: outcome.average(Averaging::Micro),
                macro_avg: outcome.average(Averaging::Macro),
                issues: &outcome.report.issues,
            };
            let json = serde_json::to_string_pretty(&summary).map_err(|source| {
                SpanscoreError::JsonlWrite {
                    path: PathBuf::from("-"),
                    source,
                }
            })?;
            println!("{}", json);
        }
        "text" => {
            println!("Scores for {} ({} document(s)):", kind, gold.len());
            println!();
            print!("{}", outcome);
        }
        other => {
            return Err(SpanscoreError::UnsupportedOption(format!(
                "output '{}' (supported: text, json)",
                other
            )));
        }
    }

    Ok(())
}

fn evaluate(
    kind: &str,
    predicted: &[Document],
    gold: &[Document],
) -> Result<EvalOutcome, SpanscoreError> {
    match kind {
        "mentions" => eval::mention_stats(predicted, gold),
        "relations" => eval::relation_stats(predicted, gold),
        "entities" => eval::entity_stats(predicted, gold),
        "constraints" => eval::constraint_stats(predicted, gold, &HeuristicTagger),
        other => Err(SpanscoreError::UnsupportedOption(format!(
            "kind '{}' (supported: mentions, relations, entities, constraints)",
            other
        ))),
    }
}
