//! Rendering compiled sequences.

use std::fmt::Write as _;

use anyhow::Result;
use clap::ValueEnum;
use console::style;
use serde::Serialize;

use strobe_ir::{ChannelSet, CompiledSequence};

/// Output format for a compiled sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable segment table.
    #[default]
    Table,
    /// The compiled sequence as JSON.
    Json,
    /// Per-channel run-length patterns as JSON.
    Patterns,
}

/// Per-channel pattern document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternDocument {
    /// Total sequence length.
    pub total_duration_ns: u64,
    /// Content hash as 16 hex digits.
    pub content_hash: String,
    /// One entry per declared channel, in output-line order.
    pub channels: Vec<ChannelPattern>,
}

/// Run-length pattern of one output line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelPattern {
    /// Channel name.
    pub channel: String,
    /// Output line of the pulse generator.
    pub line: u32,
    /// `(duration_ns, level)` pairs, level 0 or 1.
    pub pattern: Vec<(u64, u8)>,
}

impl PatternDocument {
    /// Build the pattern document for `sequence`.
    pub fn new(sequence: &CompiledSequence, channels: &ChannelSet) -> Self {
        let channels = channels
            .iter()
            .map(|(id, name)| ChannelPattern {
                channel: name.to_string(),
                line: id.0,
                pattern: sequence
                    .channel_pattern(id)
                    .into_iter()
                    .map(|(duration, on)| (duration, u8::from(on)))
                    .collect(),
            })
            .collect();

        Self {
            total_duration_ns: sequence.total_duration_ns(),
            content_hash: format_hash(sequence.content_hash()),
            channels,
        }
    }
}

/// Format a content hash the way it is printed everywhere.
pub fn format_hash(hash: u64) -> String {
    format!("{hash:016x}")
}

/// Render `sequence` in `format`.
pub fn render(
    sequence: &CompiledSequence,
    channels: &ChannelSet,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(sequence, channels)),
        OutputFormat::Json => serde_json::to_string_pretty(sequence)
            .map_err(|e| anyhow::anyhow!("JSON serialization failed: {e}")),
        OutputFormat::Patterns => {
            serde_json::to_string_pretty(&PatternDocument::new(sequence, channels))
                .map_err(|e| anyhow::anyhow!("JSON serialization failed: {e}"))
        }
    }
}

/// Segment table with one column per channel.
pub fn render_table(sequence: &CompiledSequence, channels: &ChannelSet) -> String {
    let mut out = String::new();

    let _ = write!(out, "{:>5}  {:>12}  {:>12}", "#", "start_ns", "duration_ns");
    for name in channels.names() {
        let _ = write!(out, "  {name:^10}");
    }
    out.push('\n');

    for (i, (start, segment)) in sequence.iter_with_offsets().enumerate() {
        let _ = write!(
            out,
            "{:>5}  {:>12}  {:>12}",
            i,
            start,
            segment.duration_ns
        );
        for (id, _) in channels.iter() {
            let cell = if segment.state.is_on(id) {
                style(format!("{:^10}", "ON")).green().bold().to_string()
            } else {
                style(format!("{:^10}", "-")).dim().to_string()
            };
            let _ = write!(out, "  {cell}");
        }
        out.push('\n');
    }

    out
}

/// One-line summary printed after compilation.
pub fn summary(sequence: &CompiledSequence) -> String {
    format!(
        "{} segments, {} ns total, hash {}",
        sequence.len(),
        sequence.total_duration_ns(),
        format_hash(sequence.content_hash())
    )
}
