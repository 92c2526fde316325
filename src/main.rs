//! Command-line replay tool for recorded engagement scenarios.
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use marksman::init_logging;
use marksman::scenario::Scenario;

/// Replays a recorded engagement scenario and prints one JSON line per frame
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scenario document to replay
    #[arg(short, long)]
    scenario: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let json = fs::read_to_string(&args.scenario)
        .with_context(|| format!("reading scenario {}", args.scenario.display()))?;
    let scenario = Scenario::from_json_str(&json)
        .with_context(|| format!("parsing scenario {}", args.scenario.display()))?;
    scenario
        .config
        .validate()
        .with_context(|| format!("checking settings in {}", args.scenario.display()))?;

    let reports = scenario.replay();
    let mut out = BufWriter::new(io::stdout().lock());
    for report in &reports {
        serde_json::to_writer(&mut out, report).context("encoding frame report")?;
        writeln!(out).context("writing frame report")?;
    }
    out.flush().context("flushing output")?;
    info!("replayed {} frames", reports.len());
    Ok(())
}
