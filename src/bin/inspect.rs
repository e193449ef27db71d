//! Inspection CLI
//!
//! Reports aliasing and cycles in a specification document before the
//! reference resolver rewrites them.

use std::path::PathBuf;

use clap::Parser;
use spec_pipeline::{analysis, loader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "spec-inspect")]
#[command(about = "Report sharing and cycles in a specification document")]
struct Cli {
    /// Input specification (JSON)
    input: PathBuf,

    /// Emit the full report as JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let spec = loader::from_path(&cli.input)?;
    let report = analysis::analyze(&spec);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("🔍 {} reachable nodes, {} references", report.reachable, report.references);
    println!("   {} shared nodes, {} cycle groups", report.shared.len(), report.cycles.len());
    if report.is_strict_tree() {
        println!("✅ Already a strict tree; reference resolution is a no-op");
    } else {
        println!("⚠️  Aliased; the reference resolver will split shared nodes into copies");
    }

    Ok(())
}
