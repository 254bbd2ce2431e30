//! Pass trait and types for compilation passes.

use strobe_ir::Timeline;

use crate::error::CompileResult;
use crate::property::PropertySet;

/// The kind of compilation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// Analysis pass that reads but does not modify the timeline.
    Analysis,
    /// Transformation pass that rewrites the timeline.
    Transformation,
}

/// A compilation pass that operates on a timeline.
///
/// Each pass performs one rewrite or check. The timeline stays canonical
/// between passes: contiguous from zero, no empty spans, no two adjacent
/// spans with the same state.
pub trait Pass: Send + Sync {
    /// Get the name of this pass.
    fn name(&self) -> &str;

    /// Get the kind of this pass.
    fn kind(&self) -> PassKind;

    /// Run the pass on the given timeline.
    ///
    /// Analysis passes must leave the timeline untouched and may write to
    /// the `PropertySet`.
    fn run(&self, timeline: &mut Timeline, properties: &mut PropertySet) -> CompileResult<()>;

    /// Check if this pass should run based on current state.
    fn should_run(&self, _timeline: &Timeline, _properties: &PropertySet) -> bool {
        true
    }
}
