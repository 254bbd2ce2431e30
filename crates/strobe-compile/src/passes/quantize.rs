//! Cumulative quantization of a timeline to the hardware grid.

use tracing::{debug, warn};

use strobe_ir::{Timeline, TimelineBuilder};

use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;

/// Spans removed because both of their ends rounded onto the same tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollapsedSpans {
    /// Number of spans removed.
    pub count: usize,
    /// How many of them had at least one channel on.
    pub with_active_channels: usize,
}

/// Aligns every breakpoint of the timeline to the hardware quantum.
///
/// Each ideal breakpoint `t` is moved to `ceil(t / Q) * Q` independently,
/// so the error at any breakpoint is below one tick and never accumulates
/// across spans or repetitions. Span durations are differences of aligned
/// breakpoints. A span whose two ends land on the same tick disappears; the
/// following state takes effect at that tick.
///
/// Writes the aligned unit length to [`PropertySet::unit_length_ns`] and a
/// [`CollapsedSpans`] record.
pub struct QuantizeTimeline;

impl Pass for QuantizeTimeline {
    fn name(&self) -> &'static str {
        "quantize_timeline"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, timeline: &mut Timeline, properties: &mut PropertySet) -> CompileResult<()> {
        let quantum = properties.require_quantum()?;
        let align = |t: u64| {
            quantum.align_up(t).ok_or_else(|| CompileError::Overflow {
                what: format!("{t} ns aligned to {quantum}"),
            })
        };

        let mut builder = TimelineBuilder::new();
        let mut collapsed = CollapsedSpans::default();

        for span in timeline.spans() {
            let start = align(span.start_ns)?;
            let end = align(span.end_ns)?;
            if end == start {
                collapsed.count += 1;
                if !span.state.is_off() {
                    collapsed.with_active_channels += 1;
                    warn!(
                        "Span [{}, {}) ns with channels {} is shorter than one {} tick after alignment and was dropped",
                        span.start_ns, span.end_ns, span.state, quantum
                    );
                }
                continue;
            }
            builder.extend_to(end, span.state);
        }

        let quantized = builder.finish();
        let unit_length = quantized.len_ns();
        if unit_length == 0 {
            return Err(CompileError::DegenerateSequence);
        }
        debug_assert_eq!(Some(unit_length), quantum.align_up(timeline.len_ns()));

        debug!(
            "Quantized {} spans to {} at {}: unit length {} -> {} ns",
            timeline.num_spans(),
            quantized.num_spans(),
            quantum,
            timeline.len_ns(),
            unit_length
        );

        *timeline = quantized;
        properties.unit_length_ns = Some(unit_length);
        properties.insert(collapsed);
        Ok(())
    }
}
