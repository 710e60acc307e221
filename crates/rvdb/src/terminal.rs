//! Terminal output: spinners, styled messages and tables.

use std::borrow::Cow;
use std::io::{self, Write};
use std::time::Duration;

use console::{StyledObject, style};
use indicatif::{ProgressBar, ProgressStyle};
use rvdb::{InstStatus, Severity};

/// Spinner shown on stderr while a long query runs.
pub struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    /// Create a new spinner with a message. Hidden when `hidden` is set.
    pub fn new(message: impl Into<Cow<'static, str>>, hidden: bool) -> Self {
        if hidden {
            return Self {
                bar: ProgressBar::hidden(),
            };
        }
        let bar = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.cyan} {msg}")
        {
            bar.set_style(spinner_style);
        }
        bar.set_message(message);
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }

    /// Finish the spinner with a success message.
    pub fn finish_with_success(&self, message: &str) {
        self.bar.finish_and_clear();
        if !self.bar.is_hidden() {
            success(message);
        }
    }

    /// Finish the spinner with a failure message.
    pub fn finish_with_failure(&self, message: &str) {
        self.bar.finish_and_clear();
        if !self.bar.is_hidden() {
            error(message);
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

// ============================================================================
// Styled output helpers
// ============================================================================

/// Print an info message to stderr.
pub fn info(message: &str) {
    eprintln!("{} {}", style("→").cyan(), message);
}

/// Print a success message to stderr.
pub fn success(message: &str) {
    eprintln!("{} {}", style("✓").green().bold(), message);
}

/// Print an error message to stderr.
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

/// Print a warning message to stderr.
pub fn warning(message: &str) {
    eprintln!("{} {}", style("!").yellow().bold(), message);
}

/// Print a header/section title.
pub fn header(message: &str) {
    println!("{}", style(message).bold());
}

/// Style text by the severity tier of an instruction status.
pub fn by_status<D>(text: D, status: InstStatus) -> StyledObject<D> {
    let styled = style(text);
    match status.severity() {
        Severity::Neutral => styled,
        Severity::Alert => styled.red(),
        Severity::Warning => styled.yellow(),
        Severity::Muted => styled.dim(),
    }
}

// ============================================================================
// Table output
// ============================================================================

/// A builder for markdown tables.
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    alignments: Vec<Alignment>,
}

/// Column alignment.
#[derive(Clone, Copy, Default)]
pub enum Alignment {
    #[default]
    Left,
    Right,
}

impl Table {
    /// Create a new table with headers.
    #[must_use]
    pub fn new(headers: Vec<&str>) -> Self {
        let count = headers.len();
        Self {
            headers: headers.into_iter().map(String::from).collect(),
            rows: Vec::new(),
            alignments: vec![Alignment::Left; count],
        }
    }

    /// Set column alignments.
    #[must_use]
    pub fn with_alignments(mut self, alignments: Vec<Alignment>) -> Self {
        self.alignments = alignments;
        self
    }

    /// Add a row to the table.
    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Render the table as a markdown table.
    #[must_use]
    pub fn render(&self) -> String {
        if self.headers.is_empty() {
            return String::new();
        }

        let mut widths: Vec<usize> = self.headers.iter().map(String::len).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.len());
                }
            }
        }

        let mut output = String::new();

        output.push('|');
        for (header, &w) in self.headers.iter().zip(&widths) {
            output.push_str(&format!(" {header:^w$} |"));
        }
        output.push('\n');

        output.push('|');
        for (i, &width) in widths.iter().enumerate() {
            let sep = match self.alignments.get(i).copied().unwrap_or_default() {
                Alignment::Left => format!(":{:-<w$}|", "", w = width + 1),
                Alignment::Right => format!("{:-<w$}:|", "", w = width + 1),
            };
            output.push_str(&sep);
        }
        output.push('\n');

        for row in &self.rows {
            output.push('|');
            for (i, cell) in row.iter().enumerate() {
                let w = widths.get(i).copied().unwrap_or(0);
                let formatted = match self.alignments.get(i).copied().unwrap_or_default() {
                    Alignment::Left => format!(" {cell:<w$} |"),
                    Alignment::Right => format!(" {cell:>w$} |"),
                };
                output.push_str(&formatted);
            }
            output.push('\n');
        }

        output
    }

    /// Print the table to stdout.
    pub fn print(&self) {
        print!("{}", self.render());
        let _ = io::stdout().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_render() {
        let mut table = Table::new(vec!["test", "insts"])
            .with_alignments(vec![Alignment::Left, Alignment::Right]);
        table.add_row(vec!["add".to_string(), "12".to_string()]);
        table.add_row(vec!["csr".to_string(), "7".to_string()]);

        let rendered = table.render();
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines[0], "| test | insts |");
        assert_eq!(lines[1], "|:-----|------:|");
        assert_eq!(lines[2], "| add  |    12 |");
        assert_eq!(lines[3], "| csr  |     7 |");
    }
}
