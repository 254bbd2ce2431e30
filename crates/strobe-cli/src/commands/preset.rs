//! Preset command implementation.

use anyhow::{Context, Result};
use tracing::info;

use strobe_compile::RepetitionPlan;

use crate::cli::PresetCommand;
use crate::config::Config;

/// Execute the preset command.
pub fn execute(config: &Config, command: &PresetCommand) -> Result<()> {
    let (preset, args) = command.resolve();
    let protocol = preset.protocol();

    let plan = RepetitionPlan::new(
        args.repetitions.unwrap_or(config.defaults.repetitions),
        args.interval_ns
            .unwrap_or(config.defaults.sequence_interval_ns),
    );
    info!(
        "Preset {} with {} repetitions, {} ns interval",
        protocol.name(),
        plan.repetitions,
        plan.sequence_interval_ns
    );

    let compiler = config.compiler()?;
    let spec = protocol
        .timing_spec(compiler.channels(), plan)
        .with_context(|| format!("Invalid {} preset", protocol.name()))?;
    let sequence = compiler.compile(&spec)?;

    super::emit(&sequence, compiler.channels(), args.format, args.output.as_deref())
}
