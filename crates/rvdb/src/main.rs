//! rvdb CLI - RISC-V trace replay and inspection

mod cli;
mod commands;
mod terminal;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    // Initialize metrics recorder if enabled
    let metrics_handle = if cli.metrics {
        rvdb::metrics::CliRecorder::new().install()
    } else {
        None
    };

    // Initialize metric descriptions
    rvdb::metrics::init();

    // Initialize tracing with appropriate level based on flags and command
    let default_level = if cli.verbose {
        "rvdb=debug"
    } else if cli.silent {
        "error"
    } else {
        match &cli.command {
            Commands::Tests { .. } | Commands::Summary { .. } => "rvdb=warn",
            _ => "rvdb=info",
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    let exit_code = commands::run_command(&cli);

    // Print metrics summary if enabled
    if let Some(handle) = metrics_handle {
        handle.print_summary();
    }

    std::process::exit(exit_code);
}
