//! Pulse events and the timing spec they form.

use serde::{Deserialize, Serialize};

use crate::channel::ChannelId;
use crate::error::{IrError, IrResult};

/// One ON interval `[start_ns, start_ns + duration_ns)` on one channel.
///
/// Positions are absolute offsets from the start of the repetition unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PulseEvent {
    /// Channel driven high by this event.
    pub channel: ChannelId,
    /// Start offset in nanoseconds.
    pub start_ns: u64,
    /// Length in nanoseconds. Zero-length events are no-ops.
    pub duration_ns: u64,
}

impl PulseEvent {
    /// Create a new event.
    pub fn new(channel: ChannelId, start_ns: u64, duration_ns: u64) -> Self {
        Self {
            channel,
            start_ns,
            duration_ns,
        }
    }

    /// Exclusive end offset, or `None` on overflow.
    pub fn checked_end_ns(&self) -> Option<u64> {
        self.start_ns.checked_add(self.duration_ns)
    }

    /// Exclusive end offset.
    ///
    /// Events inside a [`TimingSpec`] never overflow; for free-standing
    /// events the value saturates.
    pub fn end_ns(&self) -> u64 {
        self.start_ns.saturating_add(self.duration_ns)
    }

    /// Whether the event has zero length.
    pub fn is_empty(&self) -> bool {
        self.duration_ns == 0
    }
}

/// A fully resolved, immutable description of one experiment step.
///
/// `events` describe a single repetition unit. The unit is repeated
/// `repetitions` times with `sequence_interval_ns` of all-off time between
/// consecutive repetitions.
///
/// # Invariants
///
/// - `repetitions >= 1`
/// - every event end fits in `u64`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimingSpec")]
pub struct TimingSpec {
    events: Vec<PulseEvent>,
    sequence_interval_ns: u64,
    repetitions: u32,
    min_unit_length_ns: u64,
}

impl TimingSpec {
    /// Create a timing spec.
    ///
    /// # Errors
    ///
    /// - `repetitions == 0`
    /// - an event's end offset overflows `u64`
    pub fn new(
        events: Vec<PulseEvent>,
        sequence_interval_ns: u64,
        repetitions: u32,
    ) -> IrResult<Self> {
        if repetitions == 0 {
            return Err(IrError::invalid("repetitions", "must be at least 1"));
        }
        for event in &events {
            if event.checked_end_ns().is_none() {
                return Err(IrError::Overflow(format!(
                    "end of event on {} starting at {} ns",
                    event.channel, event.start_ns
                )));
            }
        }
        Ok(Self {
            events,
            sequence_interval_ns,
            repetitions,
            min_unit_length_ns: 0,
        })
    }

    /// Start building a spec with one repetition and no interval.
    pub fn builder() -> TimingSpecBuilder {
        TimingSpecBuilder::default()
    }

    /// Pad every repetition unit with trailing all-off time up to `ns`.
    ///
    /// The unit length becomes `max(latest event end, ns)`.
    #[must_use]
    pub fn with_min_unit_length(mut self, ns: u64) -> Self {
        self.min_unit_length_ns = ns;
        self
    }

    /// Events of one repetition unit, in caller order.
    pub fn events(&self) -> &[PulseEvent] {
        &self.events
    }

    /// All-off gap between consecutive repetitions, before quantization.
    pub fn sequence_interval_ns(&self) -> u64 {
        self.sequence_interval_ns
    }

    /// Number of repetitions.
    pub fn repetitions(&self) -> u32 {
        self.repetitions
    }

    /// Minimum unit length requested by the caller (0 if none).
    pub fn min_unit_length_ns(&self) -> u64 {
        self.min_unit_length_ns
    }

    /// Events with non-zero duration.
    pub fn active_events(&self) -> impl Iterator<Item = &PulseEvent> {
        self.events.iter().filter(|e| !e.is_empty())
    }

    /// Unquantized unit length: latest event end, or the minimum unit length.
    pub fn unit_length_ns(&self) -> u64 {
        self.active_events()
            .map(PulseEvent::end_ns)
            .max()
            .unwrap_or(0)
            .max(self.min_unit_length_ns)
    }
}

#[derive(Deserialize)]
struct RawTimingSpec {
    events: Vec<PulseEvent>,
    #[serde(default)]
    sequence_interval_ns: u64,
    repetitions: u32,
    #[serde(default)]
    min_unit_length_ns: u64,
}

impl TryFrom<RawTimingSpec> for TimingSpec {
    type Error = IrError;

    fn try_from(raw: RawTimingSpec) -> IrResult<Self> {
        Ok(TimingSpec::new(raw.events, raw.sequence_interval_ns, raw.repetitions)?
            .with_min_unit_length(raw.min_unit_length_ns))
    }
}

/// Incremental builder for [`TimingSpec`].
#[derive(Debug, Clone)]
pub struct TimingSpecBuilder {
    events: Vec<PulseEvent>,
    sequence_interval_ns: u64,
    repetitions: u32,
    min_unit_length_ns: u64,
}

impl Default for TimingSpecBuilder {
    fn default() -> Self {
        Self {
            events: vec![],
            sequence_interval_ns: 0,
            repetitions: 1,
            min_unit_length_ns: 0,
        }
    }
}

impl TimingSpecBuilder {
    /// Add a pulse on `channel` over `[start_ns, start_ns + duration_ns)`.
    #[must_use]
    pub fn pulse(mut self, channel: ChannelId, start_ns: u64, duration_ns: u64) -> Self {
        self.events
            .push(PulseEvent::new(channel, start_ns, duration_ns));
        self
    }

    /// Add a prepared event.
    #[must_use]
    pub fn event(mut self, event: PulseEvent) -> Self {
        self.events.push(event);
        self
    }

    /// Set the gap between repetitions.
    #[must_use]
    pub fn sequence_interval(mut self, ns: u64) -> Self {
        self.sequence_interval_ns = ns;
        self
    }

    /// Set the repetition count.
    #[must_use]
    pub fn repetitions(mut self, n: u32) -> Self {
        self.repetitions = n;
        self
    }

    /// Set the minimum unit length.
    #[must_use]
    pub fn min_unit_length(mut self, ns: u64) -> Self {
        self.min_unit_length_ns = ns;
        self
    }

    /// Validate and build the spec.
    pub fn build(self) -> IrResult<TimingSpec> {
        Ok(
            TimingSpec::new(self.events, self.sequence_interval_ns, self.repetitions)?
                .with_min_unit_length(self.min_unit_length_ns),
        )
    }
}
