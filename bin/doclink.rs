use anyhow::{Context, Result};
use clap::Parser;
use doclink::document::mangle::display_name;
use doclink::{
    AnalyzerResolver, FieldIterator, IndexMetrics, IndexWriter, LinkConfig, PrimaryKey,
    WriterConfig,
};
use serde_json::Value;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "doclink")]
#[command(about = "Flatten JSON documents into index fields", long_about = None)]
struct Args {
    /// Link configuration (catalog JSON)
    #[arg(long, env = "DOCLINK_CONFIG")]
    config: PathBuf,

    /// Documents, one JSON object per line
    #[arg(long, env = "DOCLINK_DOCUMENTS")]
    documents: PathBuf,

    /// Accept inline analyzer definitions in the configuration
    #[arg(long)]
    allow_definitions: bool,

    /// Document key holding the primary key (defaults to the line number)
    #[arg(long)]
    key_field: Option<String>,

    /// Index the documents and report counts instead of listing fields
    #[arg(long)]
    index: bool,

    /// Documents per segment when indexing (0 = one segment per commit)
    #[arg(long, default_value = "0")]
    max_segment_docs: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    info!("doclink v{}", doclink::VERSION);

    let raw = fs::read_to_string(&args.config)
        .with_context(|| format!("reading {}", args.config.display()))?;
    let raw: Value = serde_json::from_str(&raw).context("parsing link configuration")?;

    let resolver = AnalyzerResolver::default();
    let config = LinkConfig::init(&raw, &resolver, args.allow_definitions)?;

    let file = fs::File::open(&args.documents)
        .with_context(|| format!("opening {}", args.documents.display()))?;

    let writer = IndexWriter::new(WriterConfig::default().with_max_segment_docs(args.max_segment_docs))
        .with_metrics(IndexMetrics::new()?);

    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let document: Value = serde_json::from_str(&line)
            .with_context(|| format!("parsing document on line {}", line_no + 1))?;
        let key = primary_key(&document, args.key_field.as_deref(), line_no as u64);

        if args.index {
            writer.documents().replace_document(key, &document, &config);
            continue;
        }

        println!("document {}:", key);
        let mut fields = FieldIterator::new();
        fields.reset(&document, &config);
        while fields.valid() {
            if let Some(field) = fields.field_mut() {
                let name = display_name(field.name());
                let tokens = field.drain_tokens().len();
                println!("  {}  tokens={} boost={}", name, tokens, field.boost());
            }
            fields.advance();
        }
    }

    if args.index {
        match writer.commit()? {
            Some(stats) => println!(
                "generation {}: {} inserted, {} removed, {} segments created",
                stats.generation,
                stats.documents_inserted,
                stats.documents_removed,
                stats.segments_created
            ),
            None => println!("nothing to index"),
        }
        let snapshot = writer.snapshot();
        println!(
            "{} segments, {} live documents",
            snapshot.segment_count(),
            snapshot.live_doc_count()
        );
        let corrupt = snapshot
            .segments()
            .iter()
            .filter(|segment| !segment.verify_checksum())
            .count();
        if corrupt > 0 {
            warn!(corrupt, "Segments failed the key column checksum");
        }
    }

    Ok(())
}

fn primary_key(document: &Value, key_field: Option<&str>, fallback: u64) -> PrimaryKey {
    let Some(field) = key_field else {
        return PrimaryKey(fallback);
    };
    match document.get(field).and_then(Value::as_u64) {
        Some(id) => PrimaryKey(id),
        None => {
            warn!(field, line = fallback + 1, "Missing numeric key, using line number");
            PrimaryKey(fallback)
        }
    }
}
