//! Pass manager for orchestrating compilation.

use tracing::{debug, info, instrument};

use strobe_ir::{HardwareQuantum, Timeline, TimingSpec};

use crate::error::CompileResult;
use crate::pass::Pass;
use crate::passes::{ExpandRepetitions, QuantizeTimeline, VerifySequence};
use crate::property::PropertySet;

/// Manages and executes a sequence of compilation passes.
pub struct PassManager {
    /// The passes to execute, in order.
    passes: Vec<Box<dyn Pass>>,
}

impl PassManager {
    /// Create a new empty pass manager.
    pub fn new() -> Self {
        Self { passes: vec![] }
    }

    /// Add a pass to the manager.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) {
        self.passes.push(Box::new(pass));
    }

    /// Run all passes on the given timeline.
    #[instrument(skip(self, timeline, properties))]
    pub fn run(&self, timeline: &mut Timeline, properties: &mut PropertySet) -> CompileResult<()> {
        info!(
            "Running pass manager with {} passes on timeline with {} spans ({} ns)",
            self.passes.len(),
            timeline.num_spans(),
            timeline.len_ns()
        );

        for pass in &self.passes {
            if pass.should_run(timeline, properties) {
                debug!("Running pass: {}", pass.name());
                pass.run(timeline, properties)?;
                debug!(
                    "Pass {} completed, spans: {}",
                    pass.name(),
                    timeline.num_spans()
                );
            } else {
                debug!("Skipping pass: {}", pass.name());
            }
        }

        info!(
            "Pass manager completed, spans: {}, length: {} ns",
            timeline.num_spans(),
            timeline.len_ns()
        );

        Ok(())
    }

    /// Get the number of passes.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Check if the manager has no passes.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Names of the passes, in execution order.
    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.name()).collect()
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for the standard quantize, expand, verify pipeline.
pub struct PassManagerBuilder {
    properties: PropertySet,
    verify: bool,
}

impl PassManagerBuilder {
    /// Create a builder targeting the 8 ns pulse streamer, one repetition.
    pub fn new() -> Self {
        Self {
            properties: PropertySet::new().with_quantum(HardwareQuantum::default()),
            verify: true,
        }
    }

    /// Take the repetition plan from `spec`.
    #[must_use]
    pub fn for_spec(mut self, spec: &TimingSpec) -> Self {
        self.properties = self
            .properties
            .with_repetitions(spec.repetitions(), spec.sequence_interval_ns());
        self
    }

    /// Set the hardware quantum.
    #[must_use]
    pub fn with_quantum(mut self, quantum: HardwareQuantum) -> Self {
        self.properties.quantum = Some(quantum);
        self
    }

    /// Set the repetition count and interval.
    #[must_use]
    pub fn with_repetitions(mut self, repetitions: u32, sequence_interval_ns: u64) -> Self {
        self.properties = self
            .properties
            .with_repetitions(repetitions, sequence_interval_ns);
        self
    }

    /// Enable or disable the final verification pass (on by default).
    #[must_use]
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Build the pass manager and return it with the properties.
    pub fn build(self) -> (PassManager, PropertySet) {
        let mut pm = PassManager::new();
        pm.add_pass(QuantizeTimeline);
        pm.add_pass(ExpandRepetitions);
        if self.verify {
            pm.add_pass(VerifySequence);
        }
        (pm, self.properties)
    }
}

impl Default for PassManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
