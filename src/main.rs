//! CLI entry point for the chemresolve tool.

use std::io::{self, IsTerminal, Read, Write};
use std::sync::atomic::Ordering;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info, warn};

use chemresolve_core::{ResolutionEngine, StatsReport, join_rows};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Logs go to stderr; stdout carries only the name/SMILES rows
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");
    info!("Chemresolve starting");

    // Read input: from positional args or stdin
    let rows = if args.names.is_empty() {
        if io::stdin().is_terminal() {
            info!("No input provided. Pipe names via stdin or pass as arguments.");
            info!("Example: echo 'curcumin' | chemresolve");
            return Ok(());
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(ToString::to_string)
            .collect()
    } else {
        args.names.clone()
    };

    if rows.is_empty() {
        info!("No names found in input");
        return Ok(());
    }

    info!(rows = rows.len(), mode = %args.mode, "parsed input");

    let engine = ResolutionEngine::new(args.engine_config())?;

    // Ctrl-C stops admitting new names; in-flight cascades finish and
    // partial results are still written out below.
    let cancelled = engine.cancellation_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; finishing in-flight names");
            cancelled.store(true, Ordering::SeqCst);
        }
    });

    let outcomes = engine.resolve_all(&rows).await;

    let mut stdout = io::stdout().lock();
    for row in join_rows(&rows, &outcomes) {
        writeln!(stdout, "{}\t{}", row.name, row.smiles.unwrap_or_default())?;
    }
    stdout.flush()?;

    let report = StatsReport::new(rows.len(), engine.stats().snapshot());
    eprint!("{report}");

    Ok(())
}
