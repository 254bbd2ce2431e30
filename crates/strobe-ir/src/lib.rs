//! Strobe Pulse-Sequence Intermediate Representation
//!
//! This crate holds the data model shared by the Strobe compiler and its
//! callers: channels, pulse events, timing specs, the piecewise-constant
//! [`Timeline`] the compiler works on, and the [`CompiledSequence`] it
//! hands to a pulse generator.
//!
//! # Core Components
//!
//! - **Channels**: [`ChannelId`] and [`ChannelSet`] name the digital outputs;
//!   [`ChannelState`] is the on/off vector of one span
//! - **Events**: [`PulseEvent`] is one ON interval at an absolute offset;
//!   [`TimingSpec`] is one repetition unit plus repetition count and interval
//! - **Quantum**: [`HardwareQuantum`] is the generator's time step
//! - **Timeline**: [`Timeline`] is the ordered partition of a unit into spans;
//!   [`Timeline::from_spec`] is the sweep-line merger
//! - **Output**: [`CompiledSequence`] is the ordered `(state, duration)` list
//!
//! # Example: Merging a Pulse Unit
//!
//! ```rust
//! use strobe_ir::{ChannelSet, ChannelState, Timeline, TimingSpec};
//!
//! let channels = ChannelSet::odmr();
//! let laser = channels.require("laser").unwrap();
//! let mw = channels.require("microwave").unwrap();
//! let det = channels.require("detection").unwrap();
//!
//! let spec = TimingSpec::builder()
//!     .pulse(laser, 0, 1000)
//!     .pulse(mw, 1000, 100)
//!     .pulse(det, 1000, 500)
//!     .build()
//!     .unwrap();
//!
//! let timeline = Timeline::from_spec(&spec, &channels).unwrap();
//! assert_eq!(timeline.breakpoints(), vec![0, 1000, 1100, 1500]);
//! assert_eq!(timeline.spans()[1].state, ChannelState::with_on([mw, det]));
//! ```

pub mod channel;
pub mod error;
pub mod event;
pub mod quantum;
pub mod sequence;
pub mod timeline;

pub use channel::{ChannelId, ChannelSet, ChannelState};
pub use error::{IrError, IrResult};
pub use event::{PulseEvent, TimingSpec, TimingSpecBuilder};
pub use quantum::HardwareQuantum;
pub use sequence::{CompiledSequence, Segment};
pub use timeline::{Span, Timeline, TimelineBuilder};
