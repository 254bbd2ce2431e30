//! Error types for the IR crate.

use crate::channel::ChannelId;
use thiserror::Error;

/// Errors that can occur in IR operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IrError {
    /// A value violates its documented range.
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        parameter: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// An event references a channel index outside the declared set.
    #[error("Channel {channel} is not declared (channel set has {declared} channels)")]
    UnknownChannel {
        /// The undeclared channel.
        channel: ChannelId,
        /// Number of channels in the set.
        declared: usize,
    },

    /// A channel name was looked up but is not part of the set.
    #[error("Channel '{0}' is not declared")]
    UnknownChannelName(String),

    /// The same channel name was declared twice.
    #[error("Channel '{0}' is declared more than once")]
    DuplicateChannel(String),

    /// More channels than a [`ChannelState`](crate::ChannelState) can hold.
    #[error("Channel set holds at most {max} channels, got {got}")]
    TooManyChannels {
        /// Capacity of a channel state vector.
        max: usize,
        /// Number of channels requested.
        got: usize,
    },

    /// No events remain once zero-duration events are dropped.
    #[error("Timing spec contains no events with non-zero duration")]
    EmptyTimingSpec,

    /// The unit length computed to zero.
    #[error("Sequence has zero length")]
    DegenerateSequence,

    /// Spans passed to a timeline are not a gap-free partition from zero.
    #[error("Invalid timeline: {0}")]
    InvalidTimeline(String),

    /// A segment list breaks the compiled-sequence invariants.
    #[error("Invalid compiled sequence: {0}")]
    InvalidSequence(String),

    /// A nanosecond total does not fit in `u64`.
    #[error("Arithmetic overflow computing {0}")]
    Overflow(String),
}

impl IrError {
    /// Shorthand for [`IrError::InvalidParameter`].
    pub fn invalid(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        IrError::InvalidParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
