//! Command implementations.
//!
//! Each submodule handles a group of commands. Handlers print their result
//! to stdout and return an exit code; errors are reported by [`run_command`].

mod inspect;
mod state;
mod tests;

use rvdb::{ReplayError, TraceSession};
use serde::Serialize;
use thiserror::Error;

use crate::cli::{Cli, Commands, EXIT_FAILURE, replay_target};
use crate::terminal;

/// Errors surfaced by command handlers.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Rvdb(#[from] rvdb::Error),

    #[error(transparent)]
    Replay(#[from] ReplayError),

    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CommandResult = Result<i32, CommandError>;

/// Dispatch CLI command to the appropriate handler.
pub fn run_command(cli: &Cli) -> i32 {
    let session = match TraceSession::open(&cli.db, cli.replay_config()) {
        Ok(session) => session,
        Err(e) => {
            terminal::error(&format!("{}: {e}", cli.db.display()));
            return EXIT_FAILURE;
        }
    };

    let format = cli.format;
    let result = match &cli.command {
        Commands::Tests { .. } => tests::cmd_tests(&session, format, cli.silent),
        Commands::Summary { .. } => tests::cmd_summary(&session, format, cli.silent),
        Commands::Init { test, all } => inspect::cmd_init(&session, format, test, *all),
        Commands::List { test } => inspect::cmd_list(&session, format, test),
        Commands::Inst { test, pc } => inspect::cmd_inst(&session, format, test, *pc),
        Commands::Csrs { test, pc } => inspect::cmd_csrs(&session, format, test, *pc),
        Commands::Regs {
            test,
            pc,
            record,
            regs,
        } => match replay_target(*pc, *record) {
            Some(target) => state::cmd_regs(&session, format, test, target, regs),
            None => unreachable!("clap requires a PC or --record"),
        },
        Commands::Mask {
            test,
            reg,
            pc,
            record,
            write,
        } => {
            let target = replay_target(*pc, *record);
            state::cmd_mask(&session, format, test, reg, target, *write)
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            terminal::error(&e.to_string());
            EXIT_FAILURE
        }
    }
}

// ============================================================================
// Output formatting helpers
// ============================================================================

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), CommandError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
