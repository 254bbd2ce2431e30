//! CLI command implementations.

pub mod compile;
pub mod config;
pub mod preset;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use console::style;

use strobe_ir::{ChannelSet, CompiledSequence};

use crate::output::{self, OutputFormat};

/// Print or save a compiled sequence.
///
/// Tables always go to stdout with a summary line. JSON formats go raw to
/// stdout so they can be piped, or to `output` with a summary.
pub(crate) fn emit(
    sequence: &CompiledSequence,
    channels: &ChannelSet,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let rendered = output::render(sequence, channels, format)?;

    match output {
        Some(path) => {
            fs::write(path, &rendered)
                .with_context(|| format!("Failed to write file: {}", path.display()))?;
            print_summary(sequence);
            println!("  Output: {}", style(path.display()).green());
        }
        None if format == OutputFormat::Table => {
            print_summary(sequence);
            print!("{rendered}");
        }
        None => println!("{rendered}"),
    }

    Ok(())
}

fn print_summary(sequence: &CompiledSequence) {
    println!(
        "{} Compiled: {}",
        style("✓").green().bold(),
        output::summary(sequence)
    );
}
