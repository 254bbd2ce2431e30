//! Error types for the compilation crate.

use strobe_ir::IrError;
use thiserror::Error;

/// Errors that can occur during compilation.
///
/// All of these are configuration errors: compilation is deterministic, so
/// retrying the same input fails the same way.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CompileError {
    /// A timing value, quantum or repetition count is out of range.
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        parameter: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// An event references a channel outside the declared set.
    #[error("Unknown channel '{channel}'")]
    UnknownChannel {
        /// Channel name or index as given by the caller.
        channel: String,
    },

    /// No events with non-zero duration.
    #[error("Timing spec is empty: nothing to compile")]
    EmptyTimingSpec,

    /// The repetition unit has zero length.
    #[error("Sequence has zero length")]
    DegenerateSequence,

    /// A nanosecond total does not fit in `u64`.
    #[error("Arithmetic overflow computing {what}")]
    Overflow {
        /// What was being computed.
        what: String,
    },

    /// Pass execution failed.
    #[error("Pass '{name}' failed: {reason}")]
    PassFailed { name: String, reason: String },

    /// A required property was not set before a pass ran.
    #[error("Missing property '{0}' for pass")]
    MissingProperty(&'static str),

    /// Any other IR-level error.
    #[error("IR error: {0}")]
    Ir(IrError),
}

impl CompileError {
    /// Shorthand for [`CompileError::InvalidParameter`].
    pub fn invalid(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        CompileError::InvalidParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }
}

impl From<IrError> for CompileError {
    fn from(e: IrError) -> Self {
        match e {
            IrError::InvalidParameter { parameter, reason } => {
                CompileError::InvalidParameter { parameter, reason }
            }
            IrError::UnknownChannel { channel, .. } => CompileError::UnknownChannel {
                channel: channel.to_string(),
            },
            IrError::UnknownChannelName(channel) => CompileError::UnknownChannel { channel },
            IrError::EmptyTimingSpec => CompileError::EmptyTimingSpec,
            IrError::DegenerateSequence => CompileError::DegenerateSequence,
            IrError::Overflow(what) => CompileError::Overflow { what },
            other => CompileError::Ir(other),
        }
    }
}

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;
