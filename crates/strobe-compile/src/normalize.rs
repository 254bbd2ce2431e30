//! Timing spec normalization.
//!
//! Callers describe an experiment step as a handful of named pulse windows
//! (`laser`, `microwave`, `detection`, ...) plus the repetition plan. The
//! [`Normalizer`] merges those overrides onto [`TimingDefaults`], checks
//! signs and channel names, and produces a [`TimingSpec`] whose events all
//! sit at absolute offsets from the start of the unit.
//!
//! # Example
//!
//! ```
//! use strobe_compile::normalize::{Normalizer, PulseOverride, TimingDefaults, TimingParams};
//! use strobe_ir::ChannelSet;
//!
//! let channels = ChannelSet::odmr();
//! let defaults = TimingDefaults::odmr();
//! let params = TimingParams::new()
//!     .pulse("microwave", PulseOverride::duration(123))
//!     .repetitions(3);
//!
//! let spec = Normalizer::new(&channels, &defaults).normalize(&params).unwrap();
//! assert_eq!(spec.repetitions(), 3);
//! assert_eq!(spec.events()[1].start_ns, 104);
//! assert_eq!(spec.events()[1].duration_ns, 123);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use strobe_ir::{ChannelSet, PulseEvent, TimingSpec};

use crate::error::{CompileError, CompileResult};

/// A resolved pulse window on one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PulseWindow {
    /// Absolute start offset in nanoseconds.
    pub start_ns: u64,
    /// Length in nanoseconds. Zero disables the pulse.
    pub duration_ns: u64,
}

impl PulseWindow {
    /// Create a window.
    pub const fn new(start_ns: u64, duration_ns: u64) -> Self {
        Self {
            start_ns,
            duration_ns,
        }
    }
}

/// Caller override for one channel's pulse.
///
/// Values are signed so that negative input can be reported as an
/// `InvalidParameter` instead of failing to parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PulseOverride {
    /// Absolute start offset; falls back to the default, then to 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_ns: Option<i64>,
    /// Length; falls back to the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ns: Option<i64>,
}

impl PulseOverride {
    /// Override both start and duration.
    pub fn window(start_ns: i64, duration_ns: i64) -> Self {
        Self {
            start_ns: Some(start_ns),
            duration_ns: Some(duration_ns),
        }
    }

    /// Override only the duration.
    pub fn duration(duration_ns: i64) -> Self {
        Self {
            start_ns: None,
            duration_ns: Some(duration_ns),
        }
    }

    /// Override only the start.
    pub fn start(start_ns: i64) -> Self {
        Self {
            start_ns: Some(start_ns),
            duration_ns: None,
        }
    }
}

/// Named timing overrides for one experiment step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimingParams {
    /// Per-channel overrides keyed by channel name.
    #[serde(default)]
    pub pulses: BTreeMap<String, PulseOverride>,
    /// All-off gap between repetitions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_interval_ns: Option<i64>,
    /// Repetition count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repetitions: Option<i64>,
}

impl TimingParams {
    /// No overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the pulse on `channel`.
    #[must_use]
    pub fn pulse(mut self, channel: impl Into<String>, over: PulseOverride) -> Self {
        self.pulses.insert(channel.into(), over);
        self
    }

    /// Override the sequence interval.
    #[must_use]
    pub fn sequence_interval(mut self, ns: i64) -> Self {
        self.sequence_interval_ns = Some(ns);
        self
    }

    /// Override the repetition count.
    #[must_use]
    pub fn repetitions(mut self, n: i64) -> Self {
        self.repetitions = Some(n);
        self
    }
}

/// Default pulse windows and repetition plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingDefaults {
    /// Default window per channel name.
    pub pulses: BTreeMap<String, PulseWindow>,
    /// Default all-off gap between repetitions.
    pub sequence_interval_ns: u64,
    /// Default repetition count.
    pub repetitions: u32,
}

impl TimingDefaults {
    /// Laser 1 µs at 48 ns, microwave 104 ns at 104 ns, detection 504 ns at
    /// 200 ns, 10 µs interval, one repetition.
    pub fn odmr() -> Self {
        let pulses = [
            (ChannelSet::LASER, PulseWindow::new(48, 1000)),
            (ChannelSet::MICROWAVE, PulseWindow::new(104, 104)),
            (ChannelSet::DETECTION, PulseWindow::new(200, 504)),
        ]
        .into_iter()
        .map(|(name, window)| (name.to_string(), window))
        .collect();
        Self {
            pulses,
            sequence_interval_ns: 10_000,
            repetitions: 1,
        }
    }

    /// No default pulses, no interval, one repetition.
    pub fn empty() -> Self {
        Self {
            pulses: BTreeMap::new(),
            sequence_interval_ns: 0,
            repetitions: 1,
        }
    }
}

impl Default for TimingDefaults {
    fn default() -> Self {
        Self::odmr()
    }
}

/// Resolves [`TimingParams`] against defaults into a [`TimingSpec`].
pub struct Normalizer<'a> {
    channels: &'a ChannelSet,
    defaults: &'a TimingDefaults,
}

impl<'a> Normalizer<'a> {
    /// Create a normalizer for the given channel set and defaults.
    pub fn new(channels: &'a ChannelSet, defaults: &'a TimingDefaults) -> Self {
        Self { channels, defaults }
    }

    /// Merge `params` onto the defaults and validate the result.
    ///
    /// Events are emitted in channel index order. A pulse whose merged
    /// duration is zero is kept as a no-op event.
    ///
    /// # Errors
    ///
    /// - `InvalidParameter` for a negative start, duration or interval, a
    ///   repetition count outside `1..=u32::MAX`, or an override with no
    ///   duration and no default to fall back on
    /// - `UnknownChannel` for a pulse on a channel outside the set
    /// - `EmptyTimingSpec` if no pulse is left
    pub fn normalize(&self, params: &TimingParams) -> CompileResult<TimingSpec> {
        let mut windows: BTreeMap<&str, PulseWindow> = BTreeMap::new();
        for (name, window) in &self.defaults.pulses {
            windows.insert(name.as_str(), *window);
        }

        for (name, over) in &params.pulses {
            let base = self.defaults.pulses.get(name);
            let start_ns = match over.start_ns {
                Some(v) => non_negative(&format!("{name}.start_ns"), v)?,
                None => base.map_or(0, |w| w.start_ns),
            };
            let duration_ns = match (over.duration_ns, base) {
                (Some(v), _) => non_negative(&format!("{name}.duration_ns"), v)?,
                (None, Some(w)) => w.duration_ns,
                (None, None) => {
                    return Err(CompileError::invalid(
                        format!("{name}.duration_ns"),
                        "required for a channel without a default pulse",
                    ));
                }
            };
            windows.insert(name.as_str(), PulseWindow::new(start_ns, duration_ns));
        }

        let mut events = Vec::with_capacity(windows.len());
        for (name, window) in windows {
            let channel = self.channels.require(name)?;
            events.push(PulseEvent::new(channel, window.start_ns, window.duration_ns));
        }
        if events.is_empty() {
            return Err(CompileError::EmptyTimingSpec);
        }
        events.sort_by_key(|e| e.channel);

        let sequence_interval_ns = match params.sequence_interval_ns {
            Some(v) => non_negative("sequence_interval_ns", v)?,
            None => self.defaults.sequence_interval_ns,
        };
        let repetitions = match params.repetitions {
            Some(v) => u32::try_from(v)
                .ok()
                .filter(|&r| r >= 1)
                .ok_or_else(|| {
                    CompileError::invalid(
                        "repetitions",
                        format!("must be between 1 and {}, got {v}", u32::MAX),
                    )
                })?,
            None => self.defaults.repetitions,
        };

        let spec = TimingSpec::new(events, sequence_interval_ns, repetitions)?;
        debug!(
            "Normalized {} pulses, {} repetitions, {} ns interval",
            spec.events().len(),
            spec.repetitions(),
            spec.sequence_interval_ns()
        );
        Ok(spec)
    }
}

fn non_negative(parameter: &str, value: i64) -> CompileResult<u64> {
    u64::try_from(value).map_err(|_| {
        CompileError::invalid(parameter, format!("must be non-negative, got {value}"))
    })
}
