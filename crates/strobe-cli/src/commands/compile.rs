//! Compile command implementation.

use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::config::Config;
use crate::input::load_params;
use crate::output::OutputFormat;

/// Execute the compile command.
pub fn execute(
    config: &Config,
    input: &Path,
    output: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let params = load_params(input)?;
    info!(
        "Loaded {} pulse overrides from {}",
        params.pulses.len(),
        input.display()
    );

    let compiler = config.compiler()?;
    let sequence = compiler.compile_params(&params, &config.defaults)?;

    super::emit(&sequence, compiler.channels(), format, output)
}
