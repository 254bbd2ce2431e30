//! `PropertySet` for pass communication.
//!
//! Passes share the target quantum, the repetition plan and the facts they
//! derive (such as the quantized unit length) through a [`PropertySet`].
//! Arbitrary typed values can be stored alongside the standard fields.
//!
//! # Example
//!
//! ```
//! use strobe_compile::PropertySet;
//! use strobe_ir::HardwareQuantum;
//!
//! let props = PropertySet::new()
//!     .with_quantum(HardwareQuantum::PULSE_STREAMER)
//!     .with_repetitions(3, 200);
//!
//! assert_eq!(props.quantum.unwrap().ns(), 8);
//! assert_eq!(props.repetitions, 3);
//! assert!(props.unit_length_ns.is_none());
//! ```

use rustc_hash::FxHashMap;
use std::any::{Any, TypeId};

use strobe_ir::{HardwareQuantum, TimingSpec};

use crate::error::{CompileError, CompileResult};

/// Shared context passed through all compilation passes.
#[derive(Debug)]
pub struct PropertySet {
    /// Hardware time step.
    ///
    /// Must be set before the quantization pass runs.
    pub quantum: Option<HardwareQuantum>,

    /// How many times the unit is played.
    pub repetitions: u32,

    /// Requested all-off gap between repetitions, before quantization.
    pub sequence_interval_ns: u64,

    /// Quantized length of one repetition unit.
    ///
    /// Set by the quantization pass.
    pub unit_length_ns: Option<u64>,

    /// Quantized gap between repetitions.
    ///
    /// Set by the repetition pass.
    pub gap_ns: Option<u64>,

    /// Custom properties storage (type-erased).
    custom: FxHashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Default for PropertySet {
    fn default() -> Self {
        Self {
            quantum: None,
            repetitions: 1,
            sequence_interval_ns: 0,
            unit_length_ns: None,
            gap_ns: None,
            custom: FxHashMap::default(),
        }
    }
}

impl PropertySet {
    /// Create a new property set for a single repetition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a property set for compiling `spec` at `quantum`.
    pub fn for_spec(spec: &TimingSpec, quantum: HardwareQuantum) -> Self {
        Self::new()
            .with_quantum(quantum)
            .with_repetitions(spec.repetitions(), spec.sequence_interval_ns())
    }

    /// Set the hardware quantum.
    #[must_use]
    pub fn with_quantum(mut self, quantum: HardwareQuantum) -> Self {
        self.quantum = Some(quantum);
        self
    }

    /// Set the repetition count and inter-repetition interval.
    #[must_use]
    pub fn with_repetitions(mut self, repetitions: u32, sequence_interval_ns: u64) -> Self {
        self.repetitions = repetitions;
        self.sequence_interval_ns = sequence_interval_ns;
        self
    }

    /// The quantum, or `MissingProperty` if unset.
    pub fn require_quantum(&self) -> CompileResult<HardwareQuantum> {
        self.quantum.ok_or(CompileError::MissingProperty("quantum"))
    }

    /// Insert a custom property.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) {
        self.custom.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Get a custom property.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.custom
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Remove a custom property.
    pub fn remove<T: Any>(&mut self) -> Option<T> {
        self.custom
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|v| *v)
    }
}
