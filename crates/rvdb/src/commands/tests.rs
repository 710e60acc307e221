//! Test outcome commands.

use console::style;
use rvdb::{InstStatus, TraceSession};

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS, OutputFormat};
use crate::commands::{CommandResult, print_json};
use crate::terminal::{self, Alignment, Spinner, Table};

/// Handle the `tests` command.
///
/// Exits with failure when at least one test fails.
pub fn cmd_tests(session: &TraceSession, format: OutputFormat, quiet: bool) -> CommandResult {
    let spinner = Spinner::new("Classifying tests...", quiet);
    let partition = session.partition()?;
    let message = format!(
        "{} passing, {} failing",
        partition.passing.len(),
        partition.failing.len()
    );
    if partition.failing.is_empty() {
        spinner.finish_with_success(&message);
    } else {
        spinner.finish_with_failure(&message);
    }

    match format {
        OutputFormat::Json => print_json(&partition)?,
        OutputFormat::Text => {
            terminal::header("Passing");
            for name in &partition.passing {
                println!("  {name}");
            }
            terminal::header("Failing");
            for name in &partition.failing {
                println!("  {}", style(name).red());
            }
        }
    }

    Ok(if partition.failing.is_empty() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    })
}

/// Handle the `summary` command.
pub fn cmd_summary(session: &TraceSession, format: OutputFormat, quiet: bool) -> CommandResult {
    let spinner = Spinner::new("Classifying instructions...", quiet);
    let summaries = session.summaries()?;
    spinner.finish_with_success(&format!("Classified {} tests", summaries.len()));

    if format == OutputFormat::Json {
        print_json(&summaries)?;
        return Ok(EXIT_SUCCESS);
    }

    let mut headers = vec!["test", "result", "insts"];
    headers.extend(InstStatus::ALL.map(InstStatus::label));
    let mut alignments = vec![Alignment::Left, Alignment::Left];
    alignments.resize(headers.len(), Alignment::Right);

    let mut table = Table::new(headers).with_alignments(alignments);
    for summary in &summaries {
        let mut row = vec![
            summary.test.name.clone(),
            if summary.failing { "FAIL" } else { "PASS" }.to_string(),
            summary.instructions.to_string(),
        ];
        row.extend(InstStatus::ALL.map(|s| summary.count(s).to_string()));
        table.add_row(row);
    }
    table.print();
    Ok(EXIT_SUCCESS)
}
