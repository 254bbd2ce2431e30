//! Built-in compilation passes.

mod expand;
mod quantize;
mod verify;

pub use expand::ExpandRepetitions;
pub use quantize::{CollapsedSpans, QuantizeTimeline};
pub use verify::{VerificationResult, VerifySequence};
