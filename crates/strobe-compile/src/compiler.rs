//! Compilation entry point.

use tracing::{debug, instrument};

use strobe_ir::{ChannelSet, CompiledSequence, HardwareQuantum, Timeline, TimingSpec};

use crate::error::CompileResult;
use crate::manager::PassManagerBuilder;
use crate::normalize::{Normalizer, TimingDefaults, TimingParams};
use crate::passes::CollapsedSpans;
use crate::property::PropertySet;

/// A compiled sequence together with the facts the passes derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileReport {
    /// The hardware-ready sequence.
    pub sequence: CompiledSequence,
    /// Quantized length of one repetition.
    pub unit_length_ns: u64,
    /// Quantized gap between repetitions (0 for a single repetition).
    pub gap_ns: u64,
    /// Spans dropped by quantization in one unit.
    pub collapsed: CollapsedSpans,
}

/// Compiles timing specs for one channel set and hardware quantum.
///
/// A `Compiler` holds no mutable state and can be shared across threads.
#[derive(Debug, Clone)]
pub struct Compiler {
    channels: ChannelSet,
    quantum: HardwareQuantum,
    verify: bool,
}

impl Compiler {
    /// Create a compiler.
    pub fn new(channels: ChannelSet, quantum: HardwareQuantum) -> Self {
        Self {
            channels,
            quantum,
            verify: true,
        }
    }

    /// The laser, microwave and detection channels at 8 ns.
    pub fn odmr() -> Self {
        Self::new(ChannelSet::odmr(), HardwareQuantum::PULSE_STREAMER)
    }

    /// Enable or disable the verification pass.
    #[must_use]
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// The channel set.
    pub fn channels(&self) -> &ChannelSet {
        &self.channels
    }

    /// The hardware quantum.
    pub fn quantum(&self) -> HardwareQuantum {
        self.quantum
    }

    /// Compile `spec` into a hardware-ready sequence.
    ///
    /// # Errors
    ///
    /// - `UnknownChannel` if an event is outside the channel set
    /// - `EmptyTimingSpec` if no event has non-zero duration
    /// - `DegenerateSequence` if the unit quantizes to zero length
    /// - `Overflow` if the expanded sequence does not fit in `u64` ns
    pub fn compile(&self, spec: &TimingSpec) -> CompileResult<CompiledSequence> {
        self.compile_with_report(spec).map(|r| r.sequence)
    }

    /// Compile `spec` and report unit length, gap and dropped spans.
    #[instrument(skip(self, spec), fields(events = spec.events().len(), repetitions = spec.repetitions()))]
    pub fn compile_with_report(&self, spec: &TimingSpec) -> CompileResult<CompileReport> {
        let mut timeline = Timeline::from_spec(spec, &self.channels)?;

        let (pm, mut properties) = PassManagerBuilder::new()
            .with_quantum(self.quantum)
            .for_spec(spec)
            .with_verification(self.verify)
            .build();
        pm.run(&mut timeline, &mut properties)?;

        let sequence = CompiledSequence::from_timeline(&timeline);
        debug!(
            "Compiled {} segments, {} ns, hash {:016x}",
            sequence.len(),
            sequence.total_duration_ns(),
            sequence.content_hash()
        );

        Ok(Self::report(sequence, &mut properties))
    }

    /// Normalize `params` against `defaults`, then compile.
    pub fn compile_params(
        &self,
        params: &TimingParams,
        defaults: &TimingDefaults,
    ) -> CompileResult<CompiledSequence> {
        let spec = Normalizer::new(&self.channels, defaults).normalize(params)?;
        self.compile(&spec)
    }

    fn report(sequence: CompiledSequence, properties: &mut PropertySet) -> CompileReport {
        CompileReport {
            unit_length_ns: properties
                .unit_length_ns
                .unwrap_or(sequence.total_duration_ns()),
            gap_ns: properties.gap_ns.unwrap_or(0),
            collapsed: properties.remove::<CollapsedSpans>().unwrap_or_default(),
            sequence,
        }
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::odmr()
    }
}

/// Compile `spec` over `channels` at `quantum`.
pub fn compile(
    spec: &TimingSpec,
    channels: &ChannelSet,
    quantum: HardwareQuantum,
) -> CompileResult<CompiledSequence> {
    Compiler::new(channels.clone(), quantum).compile(spec)
}
