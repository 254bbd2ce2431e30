//! Verification of the compiled timeline.

use tracing::debug;

use strobe_ir::Timeline;

use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;

/// Result of sequence verification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationResult {
    /// Whether the verification passed.
    pub passed: bool,
    /// Number of spans checked.
    pub spans_checked: usize,
    /// Verified total length.
    pub total_ns: u64,
}

/// Analysis pass that checks the hardware-facing invariants of the result.
///
/// Every span must have a positive duration that is a multiple of the
/// quantum, neighbouring spans must differ in state, and the total must
/// equal `R * L + (R - 1) * I` from the quantization and repetition passes.
///
/// Add it last. On success a [`VerificationResult`] is stored in the
/// property set; on failure the pass returns `PassFailed`.
pub struct VerifySequence;

impl VerifySequence {
    fn check(timeline: &Timeline, properties: &PropertySet) -> Result<u64, String> {
        let quantum = properties
            .quantum
            .ok_or_else(|| "no quantum set".to_string())?;

        if timeline.is_empty() {
            return Err("timeline has no spans".into());
        }

        let mut cursor = 0u64;
        let mut previous = None;
        for (i, span) in timeline.spans().iter().enumerate() {
            if span.start_ns != cursor {
                return Err(format!(
                    "span {i} starts at {} ns, expected {cursor} ns",
                    span.start_ns
                ));
            }
            let duration = span.duration_ns();
            if duration == 0 {
                return Err(format!("span {i} has zero duration"));
            }
            if !quantum.is_aligned(duration) {
                return Err(format!(
                    "span {i} lasts {duration} ns, not a multiple of {quantum}"
                ));
            }
            if previous == Some(span.state) {
                return Err(format!(
                    "spans {} and {i} share state {}",
                    i - 1,
                    span.state
                ));
            }
            previous = Some(span.state);
            cursor = span.end_ns;
        }

        if let Some(unit) = properties.unit_length_ns {
            let reps = u64::from(properties.repetitions.max(1));
            let gap = properties.gap_ns.unwrap_or(0);
            let expected = reps
                .checked_mul(unit)
                .and_then(|t| t.checked_add((reps - 1).checked_mul(gap)?));
            if expected != Some(cursor) {
                return Err(format!(
                    "total is {cursor} ns, expected {reps} x {unit} ns + {} x {gap} ns",
                    reps - 1
                ));
            }
        }

        Ok(cursor)
    }
}

impl Pass for VerifySequence {
    fn name(&self) -> &'static str {
        "verify_sequence"
    }

    fn kind(&self) -> PassKind {
        PassKind::Analysis
    }

    fn run(&self, timeline: &mut Timeline, properties: &mut PropertySet) -> CompileResult<()> {
        let total_ns = Self::check(timeline, properties).map_err(|reason| {
            CompileError::PassFailed {
                name: self.name().to_string(),
                reason,
            }
        })?;

        debug!(
            "Verified {} spans, {} ns total",
            timeline.num_spans(),
            total_ns
        );

        properties.insert(VerificationResult {
            passed: true,
            spans_checked: timeline.num_spans(),
            total_ns,
        });
        Ok(())
    }
}
