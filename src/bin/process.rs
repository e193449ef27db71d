//! Pipeline CLI
//!
//! Loads a JSON specification document, runs the processor pipeline over it,
//! and writes the processed document back out.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use spec_pipeline::config::{OutputFormat, PipelineConfig};
use spec_pipeline::{loader, ReferenceResolver};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "spec-process")]
#[command(about = "Run the processor pipeline over a specification document")]
struct Cli {
    /// Input specification (JSON)
    input: PathBuf,

    /// Output file (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file (pipeline.toml in the working directory by default)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit compact JSON regardless of config
    #[arg(long)]
    compact: bool,
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
    let config = PipelineConfig::load_from(cli.config.as_deref())?;

    let mut spec = loader::from_path(&cli.input)?;
    spec.set_strict_types(config.validation.strict_types);

    if config.resolver.enabled {
        spec.processors.push(Box::new(ReferenceResolver::new()));
    }

    spec.run_pipeline()?;

    let doc = spec.to_json();
    let rendered = if cli.compact || config.output.format == OutputFormat::Compact {
        serde_json::to_string(&doc)?
    } else {
        serde_json::to_string_pretty(&doc)?
    };

    match cli.output {
        Some(path) => fs::write(path, rendered)?,
        None => println!("{}", rendered),
    }

    Ok(())
}
