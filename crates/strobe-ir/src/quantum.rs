//! Hardware time quantum.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{IrError, IrResult};

/// The smallest time step the pulse generator can resolve, in nanoseconds.
///
/// Every segment duration of a compiled sequence is a positive multiple of
/// this value. It is passed explicitly into every compilation.
///
/// # Invariants
///
/// - `ns > 0`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct HardwareQuantum(u64);

impl HardwareQuantum {
    /// Swabian Pulse Streamer 8/2: 8 ns.
    pub const PULSE_STREAMER: HardwareQuantum = HardwareQuantum(8);

    /// Create a quantum of `ns` nanoseconds.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `ns == 0`.
    pub fn new(ns: u64) -> IrResult<Self> {
        if ns == 0 {
            return Err(IrError::invalid("quantum_ns", "must be positive, got 0"));
        }
        Ok(Self(ns))
    }

    /// The quantum in nanoseconds.
    pub fn ns(self) -> u64 {
        self.0
    }

    /// Round `t` up to the next multiple of the quantum.
    ///
    /// Returns `None` if the result does not fit in `u64`.
    pub fn align_up(self, t: u64) -> Option<u64> {
        t.div_ceil(self.0).checked_mul(self.0)
    }

    /// Round `t` to the nearest multiple of the quantum, ties rounding up.
    pub fn align_nearest(self, t: u64) -> Option<u64> {
        let lower = t - t % self.0;
        if t - lower >= self.0.div_ceil(2) {
            lower.checked_add(self.0)
        } else {
            Some(lower)
        }
    }

    /// Whether `t` is already a multiple of the quantum.
    pub fn is_aligned(self, t: u64) -> bool {
        t % self.0 == 0
    }
}

impl Default for HardwareQuantum {
    fn default() -> Self {
        Self::PULSE_STREAMER
    }
}

impl TryFrom<u64> for HardwareQuantum {
    type Error = IrError;

    fn try_from(ns: u64) -> IrResult<Self> {
        Self::new(ns)
    }
}

impl TryFrom<i64> for HardwareQuantum {
    type Error = IrError;

    fn try_from(ns: i64) -> IrResult<Self> {
        let ns = u64::try_from(ns)
            .map_err(|_| IrError::invalid("quantum_ns", format!("must be positive, got {ns}")))?;
        Self::new(ns)
    }
}

impl From<HardwareQuantum> for u64 {
    fn from(q: HardwareQuantum) -> Self {
        q.0
    }
}

impl fmt::Display for HardwareQuantum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ns", self.0)
    }
}
