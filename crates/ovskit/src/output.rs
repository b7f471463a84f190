//! Output formatting: table, JSON, plain.
//!
//! Table uses `tabled`, JSON uses serde, plain emits one identifier per
//! line for shell pipelines.

use std::io::{self, Write};

use tabled::{Table, Tabled, settings::Style};

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Render rows in the chosen format. `id_fn` picks the plain-format value.
pub fn render_list<R>(
    format: OutputFormat,
    rows: &[R],
    id_fn: impl Fn(&R) -> String,
) -> Result<String, CliError>
where
    R: Tabled + serde::Serialize,
{
    Ok(match format {
        OutputFormat::Table => Table::new(rows).with(Style::rounded()).to_string(),
        OutputFormat::Json => serde_json::to_string_pretty(rows)?,
        OutputFormat::Plain => rows.iter().map(id_fn).collect::<Vec<_>>().join("\n"),
    })
}

/// Render a scalar answer (existence, tag, key).
pub fn render_value<T>(format: OutputFormat, value: &T) -> Result<String, CliError>
where
    T: serde::Serialize + std::fmt::Display,
{
    Ok(match format {
        OutputFormat::Json => serde_json::to_string(value)?,
        OutputFormat::Table | OutputFormat::Plain => value.to_string(),
    })
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Confirmation line for a completed mutation, on stderr.
pub fn done(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{message}");
    }
}
