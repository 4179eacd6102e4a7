use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tosa_lower::{lower_graph, Graph, LoweringOptions, Program, ProgramFormat, VisitorTable};
use tracing_subscriber::EnvFilter;

/// Lowers a traced graph (JSON) into a serialized program.
#[derive(Parser, Debug)]
#[command(name = "tosa-lower")]
struct Args {
    /// Path to the traced graph JSON.
    #[arg(long)]
    graph: PathBuf,

    /// Output path; stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Reject equal-rank views whose input and output dimension orders differ.
    /// Also enabled by `TOSA_LOWER_STRICT_LAYOUT=1`.
    #[arg(long)]
    strict_layout: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Bincode,
    Text,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let graph = Graph::load_json(&args.graph)
        .with_context(|| format!("failed to read graph {}", args.graph.display()))?;

    let mut options = LoweringOptions::from_env();
    if args.strict_layout {
        options = options.with_layout_consistency(true);
    }
    let table = VisitorTable::with_default_visitors(options);
    tracing::info!(nodes = graph.nodes.len(), targets = ?table.targets(), "lowering graph");
    let program = lower_graph(&graph, &table)
        .with_context(|| format!("failed to lower {}", args.graph.display()))?;

    let bytes = encode(&program, args.format)?;
    match &args.output {
        Some(path) => write_file(path, &bytes)?,
        None => io::stdout()
            .write_all(&bytes)
            .context("failed to write program to stdout")?,
    }
    Ok(())
}

fn encode(program: &Program, format: OutputFormat) -> Result<Vec<u8>> {
    let bytes = match format {
        OutputFormat::Json => program.encode(ProgramFormat::Json)?,
        OutputFormat::Bincode => program.encode(ProgramFormat::Bincode)?,
        OutputFormat::Text => program.to_text().into_bytes(),
    };
    Ok(bytes)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}
