//! Strobe Pulse-Sequence Compiler
//!
//! This crate turns a [`TimingSpec`](strobe_ir::TimingSpec) into a
//! hardware-ready [`CompiledSequence`](strobe_ir::CompiledSequence): an
//! ordered list of channel states, each held for a whole number of hardware
//! ticks. It uses a pass-based architecture over the
//! [`Timeline`](strobe_ir::Timeline) IR.
//!
//! # Overview
//!
//! 1. **Normalize**: merge named overrides onto defaults ([`normalize`])
//! 2. **Merge**: sweep-line merge of all pulses into one timeline
//!    ([`Timeline::from_spec`](strobe_ir::Timeline::from_spec))
//! 3. **Quantize**: align every breakpoint up to the tick grid
//! 4. **Expand**: unroll the unit `R` times with quantized gaps between
//! 5. **Verify**: check durations, canonical form and total length
//!
//! # Architecture
//!
//! ```text
//! TimingParams ──► Normalizer ──► TimingSpec
//!                                     │
//!                                     ▼  Timeline::from_spec
//!                               ┌─────────────┐
//!                               │ PassManager │ ◄── PropertySet (quantum, repetitions)
//!                               └─────────────┘
//!                                     │
//!                                     ├── QuantizeTimeline
//!                                     ├── ExpandRepetitions
//!                                     └── VerifySequence
//!                                     │
//!                                     ▼
//!                             CompiledSequence
//! ```
//!
//! # Example: Basic Compilation
//!
//! ```rust
//! use strobe_compile::Compiler;
//! use strobe_ir::{ChannelSet, TimingSpec};
//!
//! let channels = ChannelSet::odmr();
//! let laser = channels.require("laser").unwrap();
//!
//! let spec = TimingSpec::builder()
//!     .pulse(laser, 0, 1000)
//!     .repetitions(3)
//!     .sequence_interval(200)
//!     .build()
//!     .unwrap();
//!
//! let seq = Compiler::odmr().compile(&spec).unwrap();
//! assert_eq!(seq.total_duration_ns(), 3 * 1000 + 2 * 200);
//! ```
//!
//! # Custom Passes
//!
//! Implement the [`Pass`] trait to add a pass to a [`PassManager`]:
//!
//! ```rust
//! use strobe_compile::{CompileResult, Pass, PassKind, PropertySet};
//! use strobe_ir::Timeline;
//!
//! struct CountSpans;
//!
//! impl Pass for CountSpans {
//!     fn name(&self) -> &str { "count_spans" }
//!     fn kind(&self) -> PassKind { PassKind::Analysis }
//!
//!     fn run(&self, timeline: &mut Timeline, props: &mut PropertySet) -> CompileResult<()> {
//!         props.insert(timeline.num_spans());
//!         Ok(())
//!     }
//! }
//! ```

pub mod compiler;
pub mod error;
pub mod manager;
pub mod normalize;
pub mod pass;
pub mod passes;
pub mod property;
pub mod protocols;

pub use compiler::{CompileReport, Compiler, compile};
pub use error::{CompileError, CompileResult};
pub use manager::{PassManager, PassManagerBuilder};
pub use normalize::{Normalizer, PulseOverride, PulseWindow, TimingDefaults, TimingParams};
pub use pass::{Pass, PassKind};
pub use property::PropertySet;
pub use protocols::{Odmr, Protocol, Rabi, Ramsey, RepetitionPlan, SpinEcho, T1};
