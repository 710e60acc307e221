//! Per-test inspection commands.

use rvdb::views::RowKind;
use rvdb::{TraceSession, hex64};

use crate::cli::{EXIT_SUCCESS, OutputFormat};
use crate::commands::{CommandResult, print_json};
use crate::terminal::{self, Table};

/// Handle the `init` command.
pub fn cmd_init(
    session: &TraceSession,
    format: OutputFormat,
    test: &str,
    all: bool,
) -> CommandResult {
    let test = session.load_test(test)?;

    if all {
        let values = test.initial_state();
        if format == OutputFormat::Json {
            print_json(&values)?;
            return Ok(EXIT_SUCCESS);
        }
        let mut table = Table::new(vec!["register", "group", "expected", "actual", ""]);
        for value in &values {
            table.add_row(vec![
                value.register.clone(),
                value.group.to_string(),
                hex64(value.expected),
                hex64(value.actual),
                if value.differs { "*" } else { "" }.to_string(),
            ]);
        }
        table.print();
        return Ok(EXIT_SUCCESS);
    }

    let diffs = test.initial_diffs();
    match format {
        OutputFormat::Json => print_json(&diffs)?,
        OutputFormat::Text if diffs.is_empty() => {
            terminal::success(&format!("{}: initial state matches", test.name()));
        }
        OutputFormat::Text => {
            let mut table = Table::new(vec!["register", "expected", "actual"]);
            for diff in &diffs {
                table.add_row(vec![
                    diff.register.clone(),
                    hex64(diff.expected),
                    hex64(diff.actual),
                ]);
            }
            table.print();
        }
    }
    Ok(EXIT_SUCCESS)
}

/// Handle the `list` command.
pub fn cmd_list(session: &TraceSession, format: OutputFormat, test: &str) -> CommandResult {
    let listing = session.load_test(test)?.listing()?;
    if format == OutputFormat::Json {
        print_json(&listing)?;
        return Ok(EXIT_SUCCESS);
    }

    for row in &listing.rows {
        match row.kind {
            RowKind::Instruction => println!(
                "{:#010x}  {}",
                row.pc,
                terminal::by_status(format!("{:<40} {}", row.text, row.status), row.status)
            ),
            RowKind::Cause => println!("{:10}  {}", "", terminal::by_status(&row.text, row.status)),
        }
    }
    Ok(EXIT_SUCCESS)
}

/// Handle the `inst` command.
pub fn cmd_inst(
    session: &TraceSession,
    format: OutputFormat,
    test: &str,
    pc: u64,
) -> CommandResult {
    let detail = session.load_test(test)?.instruction_detail(pc)?;
    if format == OutputFormat::Json {
        print_json(&detail)?;
        return Ok(EXIT_SUCCESS);
    }

    let disasm = detail.disasm.replace('\t', " ");
    terminal::header(&format!("{:#010x}  {disasm}", detail.pc));
    println!("opcode:    {:#010x}", detail.opcode);
    println!("privilege: {}", detail.privilege);
    println!("result:    {} ({})", detail.result_label, detail.result);
    println!();
    print!("{}", detail.operand_text());
    Ok(EXIT_SUCCESS)
}

/// Handle the `csrs` command.
pub fn cmd_csrs(
    session: &TraceSession,
    format: OutputFormat,
    test: &str,
    pc: u64,
) -> CommandResult {
    let view = session.load_test(test)?.csr_view(pc)?;
    match format {
        OutputFormat::Json => print_json(&view)?,
        OutputFormat::Text if view.rows.is_empty() => {
            terminal::info(&format!("no CSR comparisons recorded at {pc:#x}"));
        }
        OutputFormat::Text => {
            let mut table = Table::new(vec!["csr", "model", "reference"]);
            for row in &view.rows {
                let marker = if row.mismatch { " *" } else { "" };
                table.add_row(vec![
                    format!("{}{marker}", row.csr),
                    hex64(row.model),
                    hex64(row.reference),
                ]);
            }
            table.print();
            if view.has_mismatch() {
                terminal::warning("* differs from the reference");
            }
        }
    }
    Ok(EXIT_SUCCESS)
}
