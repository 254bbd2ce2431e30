//! Repetition expansion.

use tracing::debug;

use strobe_ir::{ChannelState, Timeline, TimelineBuilder};

use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;

/// Unrolls the quantized unit `repetitions` times.
///
/// Repetitions are separated by an all-off gap of `ceil(interval / Q) * Q`.
/// No gap follows the last repetition, so the result has length
/// `R * L + (R - 1) * I` where `L` is the quantized unit length and `I` the
/// quantized gap. Every repetition is byte-identical to the first: the unit
/// is quantized once and copied, never re-rounded at a shifted offset.
///
/// Equal-state spans meeting at a boundary are merged, which happens when the
/// gap is zero and the unit begins and ends in the same state, or when the
/// unit ends all-off.
pub struct ExpandRepetitions;

impl ExpandRepetitions {
    fn checked_total(reps: u64, unit: u64, gap: u64) -> Option<u64> {
        reps.checked_mul(unit)?
            .checked_add((reps - 1).checked_mul(gap)?)
    }
}

impl Pass for ExpandRepetitions {
    fn name(&self) -> &'static str {
        "expand_repetitions"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, timeline: &mut Timeline, properties: &mut PropertySet) -> CompileResult<()> {
        let quantum = properties.require_quantum()?;
        let reps = properties.repetitions;
        if reps == 0 {
            return Err(CompileError::invalid("repetitions", "must be at least 1"));
        }

        let unit = timeline.len_ns();
        if unit == 0 {
            return Err(CompileError::DegenerateSequence);
        }
        let gap = quantum
            .align_up(properties.sequence_interval_ns)
            .ok_or_else(|| CompileError::Overflow {
                what: format!(
                    "sequence interval {} ns aligned to {quantum}",
                    properties.sequence_interval_ns
                ),
            })?;
        let expected = Self::checked_total(u64::from(reps), unit, gap).ok_or_else(|| {
            CompileError::Overflow {
                what: format!("total length of {reps} repetitions of {unit} ns with {gap} ns gaps"),
            }
        })?;

        let mut builder = TimelineBuilder::new();
        for r in 0..reps {
            if r > 0 {
                builder.push(gap, ChannelState::OFF)?;
            }
            for span in timeline.spans() {
                builder.push(span.duration_ns(), span.state)?;
            }
        }
        let expanded = builder.finish();
        debug_assert_eq!(expanded.len_ns(), expected);

        debug!(
            "Expanded {} x {} ns unit with {} ns gap: {} spans, {} ns total",
            reps,
            unit,
            gap,
            expanded.num_spans(),
            expected
        );

        *timeline = expanded;
        if properties.unit_length_ns.is_none() {
            properties.unit_length_ns = Some(unit);
        }
        properties.gap_ns = Some(gap);
        Ok(())
    }

    fn should_run(&self, _timeline: &Timeline, properties: &PropertySet) -> bool {
        properties.repetitions != 1
    }
}
