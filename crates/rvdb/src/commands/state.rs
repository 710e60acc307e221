//! Register state commands.

use rvdb::{ReplayTarget, TraceSession, hex64};
use serde::Serialize;
use tracing::debug;

use crate::cli::{EXIT_SUCCESS, OutputFormat};
use crate::commands::{CommandResult, print_json};
use crate::terminal::{self, Table};

#[derive(Serialize)]
struct RegisterValue<'a> {
    register: &'a str,
    value: u64,
}

/// Handle the `regs` command.
pub fn cmd_regs(
    session: &TraceSession,
    format: OutputFormat,
    test: &str,
    target: ReplayTarget,
    filter: &[String],
) -> CommandResult {
    let test = session.load_test(test)?;
    let state = test.reconstruct(target)?;
    debug!(test = %test.name(), %target, registers = state.len(), "reconstructed state");

    let names: Vec<&str> = if filter.is_empty() {
        test.metadata().table().names().collect()
    } else {
        filter
            .iter()
            .map(|name| Ok(test.metadata().resolve(name)?.name.as_str()))
            .collect::<Result<_, rvdb::Error>>()?
    };
    let values: Vec<_> = names
        .into_iter()
        .filter_map(|register| {
            let value = state.get(register)?;
            Some(RegisterValue { register, value })
        })
        .collect();

    if format == OutputFormat::Json {
        print_json(&values)?;
        return Ok(EXIT_SUCCESS);
    }
    terminal::header(&format!("{} at {target}", test.name()));
    let mut table = Table::new(vec!["register", "value"]);
    for value in &values {
        table.add_row(vec![value.register.to_string(), hex64(value.value)]);
    }
    table.print();
    Ok(EXIT_SUCCESS)
}

/// Handle the `mask` command.
pub fn cmd_mask(
    session: &TraceSession,
    format: OutputFormat,
    test: &str,
    register: &str,
    target: Option<ReplayTarget>,
    write: Option<u64>,
) -> CommandResult {
    let view = session.load_test(test)?.mask_view(register, target, write)?;
    if format == OutputFormat::Json {
        print_json(&view)?;
        return Ok(EXIT_SUCCESS);
    }

    let at = target.map_or_else(|| "initial state".to_string(), |t| t.to_string());
    terminal::header(&format!("{} ({at})", view.register.name));
    println!("value: {}", hex64(view.value));
    println!("mask:  {}", hex64(view.mask));
    if let Some(written) = write.zip(view.written) {
        println!("write: {} -> {}", hex64(written.0), hex64(written.1));
    }

    if !view.fields.is_empty() {
        println!();
        let mut table = Table::new(vec!["field", "bits", "value", "access", "description"]);
        for field in &view.fields {
            let bits = if field.low_bit == field.high_bit {
                field.low_bit.to_string()
            } else {
                format!("{}:{}", field.high_bit, field.low_bit)
            };
            table.add_row(vec![
                field.name.clone(),
                bits,
                format!("{:#x}", field.value),
                if field.readonly { "ro" } else { "rw" }.to_string(),
                field.desc.clone(),
            ]);
        }
        table.print();
    }
    Ok(EXIT_SUCCESS)
}
