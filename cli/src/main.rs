use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use openapi_preprocessor_core::{process_file, Loc, TraceFn};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "openapi-preprocessor")]
#[command(about = "Bundle a multi-file OpenAPI spec into one self-contained JSON document")]
#[command(version)]
struct Cli {
    /// Emit JSON without indentation
    #[arg(short = 'c', long)]
    compact_output: bool,

    /// Enable a debug facility ("trace" logs every expansion step)
    #[arg(long, value_name = "FACILITY", value_parser = ["trace"])]
    debug: Option<String>,

    /// Root OpenAPI document (.json, .yaml or .yml)
    file: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let trace_enabled = cli.debug.as_deref() == Some("trace");

    // Logs go to stderr so stdout stays clean for the JSON output.
    let log_level = if trace_enabled {
        LevelFilter::TRACE
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .init();

    let mut trace_to_log = |loc: &Loc| tracing::trace!(target: "expand", location = %loc);
    let trace: Option<&mut TraceFn<'_>> = if trace_enabled {
        Some(&mut trace_to_log)
    } else {
        None
    };

    let doc = process_file(&cli.file, trace)?;

    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    if cli.compact_output {
        serde_json::to_writer(&mut writer, &doc).context("failed to write JSON")?;
    } else {
        serde_json::to_writer_pretty(&mut writer, &doc).context("failed to write JSON")?;
    }
    writeln!(writer).context("failed to write trailing newline")?;

    Ok(())
}
