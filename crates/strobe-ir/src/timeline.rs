//! Piecewise-constant channel timeline and the sweep-line merger.
//!
//! A [`Timeline`] is an ordered, gap-free partition of `[0, len)` into
//! [`Span`]s, each carrying the [`ChannelState`] that holds during it.
//! Adjacent spans always differ in state (canonical form).
//!
//! [`Timeline::from_spec`] lowers one repetition unit of a [`TimingSpec`]
//! into its ideal, unquantized timeline. Compilation passes then rewrite
//! the timeline in place.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::channel::{ChannelSet, ChannelState};
use crate::error::{IrError, IrResult};
use crate::event::TimingSpec;

/// A half-open interval `[start_ns, end_ns)` with a constant channel state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Inclusive start in nanoseconds.
    pub start_ns: u64,
    /// Exclusive end in nanoseconds.
    pub end_ns: u64,
    /// Channel state during the span.
    pub state: ChannelState,
}

impl Span {
    /// Length of the span.
    pub fn duration_ns(&self) -> u64 {
        self.end_ns - self.start_ns
    }
}

/// Canonical piecewise-constant timeline starting at t = 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timeline {
    spans: Vec<Span>,
}

impl Timeline {
    /// Create an empty timeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lower one repetition unit of `spec` into its ideal timeline.
    ///
    /// Breakpoints are the de-duplicated set of event starts and ends plus
    /// t = 0. A channel is on during a span iff at least one of its events
    /// covers the span's start, so overlapping events on one channel are
    /// unioned rather than toggled. Zero-duration events are ignored.
    ///
    /// Repetitions and the sequence interval are not applied here.
    ///
    /// # Errors
    ///
    /// - `UnknownChannel` if an event is outside `channels`
    /// - `EmptyTimingSpec` if no event has non-zero duration
    pub fn from_spec(spec: &TimingSpec, channels: &ChannelSet) -> IrResult<Self> {
        for event in spec.events() {
            channels.check(event.channel)?;
        }

        // (time, channel index, +1 for start / -1 for end)
        let mut edges: Vec<(u64, usize, i8)> = Vec::with_capacity(spec.events().len() * 2);
        for event in spec.active_events() {
            edges.push((event.start_ns, event.channel.index(), 1));
            edges.push((event.end_ns(), event.channel.index(), -1));
        }
        if edges.is_empty() {
            return Err(IrError::EmptyTimingSpec);
        }
        edges.sort_unstable_by_key(|&(t, _, _)| t);

        let mut active = vec![0u32; channels.len()];
        let mut state = ChannelState::OFF;
        let mut builder = TimelineBuilder::new();
        let mut breakpoints = 1usize;

        let mut i = 0;
        while i < edges.len() {
            let t = edges[i].0;
            builder.extend_to(t, state);
            while i < edges.len() && edges[i].0 == t {
                let (_, ch, delta) = edges[i];
                if delta > 0 {
                    active[ch] += 1;
                } else {
                    active[ch] -= 1;
                }
                state = state.with((ch as u32).into(), active[ch] > 0);
                i += 1;
            }
            if t > 0 {
                breakpoints += 1;
            }
        }

        debug_assert!(state.is_off());
        builder.extend_to(spec.unit_length_ns(), ChannelState::OFF);

        let timeline = builder.finish();
        if timeline.len_ns() == 0 {
            return Err(IrError::DegenerateSequence);
        }
        debug!(
            "Merged {} events into {} spans ({} breakpoints), unit length {} ns",
            spec.active_events().count(),
            timeline.num_spans(),
            breakpoints,
            timeline.len_ns()
        );
        Ok(timeline)
    }

    /// Build a timeline from explicit spans.
    ///
    /// Spans must start at 0, be contiguous and non-empty. Adjacent spans
    /// with equal state are merged.
    pub fn from_spans(spans: impl IntoIterator<Item = Span>) -> IrResult<Self> {
        let mut builder = TimelineBuilder::new();
        for span in spans {
            if span.start_ns != builder.cursor_ns() {
                return Err(IrError::InvalidTimeline(format!(
                    "span starts at {} ns but previous span ends at {} ns",
                    span.start_ns,
                    builder.cursor_ns()
                )));
            }
            if span.end_ns <= span.start_ns {
                return Err(IrError::InvalidTimeline(format!(
                    "span [{}, {}) is empty",
                    span.start_ns, span.end_ns
                )));
            }
            builder.extend_to(span.end_ns, span.state);
        }
        Ok(builder.finish())
    }

    /// The spans in time order.
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Consume the timeline, returning its spans.
    pub fn into_spans(self) -> Vec<Span> {
        self.spans
    }

    /// Number of spans.
    pub fn num_spans(&self) -> usize {
        self.spans.len()
    }

    /// Whether the timeline has no spans.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Total length in nanoseconds.
    pub fn len_ns(&self) -> u64 {
        self.spans.last().map_or(0, |s| s.end_ns)
    }

    /// Strictly increasing breakpoints, `0` through the end.
    pub fn breakpoints(&self) -> Vec<u64> {
        if self.spans.is_empty() {
            return vec![];
        }
        std::iter::once(0)
            .chain(self.spans.iter().map(|s| s.end_ns))
            .collect()
    }

    /// The state in effect at `t`, or `None` past the end.
    pub fn state_at(&self, t: u64) -> Option<ChannelState> {
        let idx = self.spans.partition_point(|s| s.end_ns <= t);
        self.spans.get(idx).map(|s| s.state)
    }
}

/// Appends spans to a timeline while keeping it canonical.
///
/// Zero-length extensions are dropped and an extension with the same state
/// as the last span lengthens that span instead of adding a new one.
#[derive(Debug, Clone, Default)]
pub struct TimelineBuilder {
    spans: Vec<Span>,
}

impl TimelineBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current end of the timeline.
    pub fn cursor_ns(&self) -> u64 {
        self.spans.last().map_or(0, |s| s.end_ns)
    }

    /// Extend the timeline to absolute time `end_ns` with `state`.
    ///
    /// Does nothing if `end_ns` is not past the cursor.
    pub fn extend_to(&mut self, end_ns: u64, state: ChannelState) {
        let start_ns = self.cursor_ns();
        if end_ns <= start_ns {
            return;
        }
        match self.spans.last_mut() {
            Some(last) if last.state == state => last.end_ns = end_ns,
            _ => self.spans.push(Span {
                start_ns,
                end_ns,
                state,
            }),
        }
    }

    /// Append `duration_ns` of `state`.
    pub fn push(&mut self, duration_ns: u64, state: ChannelState) -> IrResult<()> {
        let end_ns = self
            .cursor_ns()
            .checked_add(duration_ns)
            .ok_or_else(|| IrError::Overflow("timeline length".into()))?;
        self.extend_to(end_ns, state);
        Ok(())
    }

    /// Finish building.
    pub fn finish(self) -> Timeline {
        Timeline { spans: self.spans }
    }
}
