//! The compiled, hardware-ready sequence.

use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

use crate::channel::{ChannelId, ChannelSet, ChannelState};
use crate::error::{IrError, IrResult};
use crate::event::{PulseEvent, TimingSpec};
use crate::timeline::Timeline;

/// A constant channel state held for `duration_ns`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment {
    /// Which channels are on.
    pub state: ChannelState,
    /// How long the state is held.
    pub duration_ns: u64,
}

/// Ordered `(state, duration)` segments ready for a pulse generator.
///
/// A pure value: it owns its segments and keeps no link to the
/// [`TimingSpec`] it was compiled from. Two sequences compare equal iff
/// their segment lists are equal, so they can be used as cache keys.
///
/// Deserialization checks that every duration is positive, that no two
/// adjacent segments share a state and that the durations sum to
/// `total_duration_ns` without overflow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawCompiledSequence")]
pub struct CompiledSequence {
    segments: Vec<Segment>,
    total_duration_ns: u64,
}

#[derive(Deserialize)]
struct RawCompiledSequence {
    segments: Vec<Segment>,
    total_duration_ns: u64,
}

impl TryFrom<RawCompiledSequence> for CompiledSequence {
    type Error = IrError;

    fn try_from(raw: RawCompiledSequence) -> IrResult<Self> {
        let mut sum = 0u64;
        for (i, seg) in raw.segments.iter().enumerate() {
            if seg.duration_ns == 0 {
                return Err(IrError::InvalidSequence(format!(
                    "segment {i} has zero duration"
                )));
            }
            if i > 0 && raw.segments[i - 1].state == seg.state {
                return Err(IrError::InvalidSequence(format!(
                    "segments {} and {i} share state {}",
                    i - 1,
                    seg.state
                )));
            }
            sum = sum
                .checked_add(seg.duration_ns)
                .ok_or_else(|| IrError::Overflow("compiled sequence length".into()))?;
        }
        if sum != raw.total_duration_ns {
            return Err(IrError::InvalidSequence(format!(
                "segments sum to {sum} ns but total_duration_ns is {}",
                raw.total_duration_ns
            )));
        }
        Ok(Self {
            segments: raw.segments,
            total_duration_ns: sum,
        })
    }
}

impl CompiledSequence {
    /// Freeze a timeline into a compiled sequence.
    pub fn from_timeline(timeline: &Timeline) -> Self {
        let segments = timeline
            .spans()
            .iter()
            .map(|s| Segment {
                state: s.state,
                duration_ns: s.duration_ns(),
            })
            .collect();
        Self {
            segments,
            total_duration_ns: timeline.len_ns(),
        }
    }

    /// The segments in playback order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Sum of all segment durations.
    pub fn total_duration_ns(&self) -> u64 {
        self.total_duration_ns
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the sequence has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Stable hash of the segment list.
    ///
    /// Equal sequences always hash equal, independent of process or run.
    /// Callers use it to skip re-uploading an unchanged waveform.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        (self.segments.len() as u64).hash(&mut hasher);
        for seg in &self.segments {
            seg.state.bits().hash(&mut hasher);
            seg.duration_ns.hash(&mut hasher);
        }
        hasher.finish()
    }

    /// Iterate `(start_ns, segment)` pairs.
    pub fn iter_with_offsets(&self) -> impl Iterator<Item = (u64, &Segment)> {
        self.segments.iter().scan(0u64, |t, seg| {
            let start = *t;
            *t += seg.duration_ns;
            Some((start, seg))
        })
    }

    /// Run-length `(duration_ns, on)` pattern of a single channel.
    ///
    /// Consecutive segments with the same level for `channel` are merged.
    /// This is the per-channel array format digital pattern generators take.
    pub fn channel_pattern(&self, channel: ChannelId) -> Vec<(u64, bool)> {
        let mut pattern: Vec<(u64, bool)> = Vec::new();
        for seg in &self.segments {
            let level = seg.state.is_on(channel);
            match pattern.last_mut() {
                Some((duration, last)) if *last == level => *duration += seg.duration_ns,
                _ => pattern.push((seg.duration_ns, level)),
            }
        }
        pattern
    }

    /// Total on-time of a channel.
    pub fn on_time_ns(&self, channel: ChannelId) -> u64 {
        self.segments
            .iter()
            .filter(|s| s.state.is_on(channel))
            .map(|s| s.duration_ns)
            .sum()
    }

    /// Re-express this sequence as a single-repetition timing spec.
    ///
    /// Every ON run of every channel becomes one event; the unit length is
    /// pinned to the total duration so trailing off time survives.
    pub fn to_timing_spec(&self, channels: &ChannelSet) -> IrResult<TimingSpec> {
        let mut events = Vec::new();
        for (id, _) in channels.iter() {
            let mut t = 0u64;
            for (duration, on) in self.channel_pattern(id) {
                if on {
                    events.push(PulseEvent::new(id, t, duration));
                }
                t = t
                    .checked_add(duration)
                    .ok_or_else(|| IrError::Overflow("channel pattern length".into()))?;
            }
        }
        Ok(TimingSpec::new(events, 0, 1)?.with_min_unit_length(self.total_duration_ns))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::TimelineBuilder;

    const LASER: ChannelId = ChannelId(0);
    const MW: ChannelId = ChannelId(1);
    const DET: ChannelId = ChannelId(2);

    fn sample() -> CompiledSequence {
        let mut b = TimelineBuilder::new();
        b.push(1000, ChannelState::with_on([LASER])).unwrap();
        b.push(104, ChannelState::with_on([MW, DET])).unwrap();
        b.push(400, ChannelState::with_on([DET])).unwrap();
        b.push(96, ChannelState::OFF).unwrap();
        CompiledSequence::from_timeline(&b.finish())
    }

    #[test]
    fn test_from_timeline() {
        let seq = sample();
        assert_eq!(seq.len(), 4);
        assert_eq!(seq.total_duration_ns(), 1600);
        let sum: u64 = seq.segments().iter().map(|s| s.duration_ns).sum();
        assert_eq!(sum, seq.total_duration_ns());
    }

    #[test]
    fn test_channel_pattern_merges_runs() {
        let seq = sample();
        assert_eq!(seq.channel_pattern(LASER), vec![(1000, true), (600, false)]);
        assert_eq!(
            seq.channel_pattern(MW),
            vec![(1000, false), (104, true), (496, false)]
        );
        assert_eq!(
            seq.channel_pattern(DET),
            vec![(1000, false), (504, true), (96, false)]
        );
    }

    #[test]
    fn test_on_time() {
        let seq = sample();
        assert_eq!(seq.on_time_ns(DET), 504);
        assert_eq!(seq.on_time_ns(ChannelId(5)), 0);
    }

    #[test]
    fn test_iter_with_offsets() {
        let offsets: Vec<u64> = sample().iter_with_offsets().map(|(t, _)| t).collect();
        assert_eq!(offsets, vec![0, 1000, 1104, 1504]);
    }

    #[test]
    fn test_content_hash_is_content_based() {
        let a = sample();
        let b = sample();
        assert_eq!(a, b);
        assert_eq!(a.content_hash(), b.content_hash());

        let mut other = TimelineBuilder::new();
        other.push(1008, ChannelState::with_on([LASER])).unwrap();
        let c = CompiledSequence::from_timeline(&other.finish());
        assert_ne!(a.content_hash(), c.content_hash());
    }

    #[test]
    fn test_to_timing_spec_keeps_trailing_off() {
        let spec = sample().to_timing_spec(&ChannelSet::odmr()).unwrap();
        assert_eq!(spec.repetitions(), 1);
        assert_eq!(spec.unit_length_ns(), 1600);
        assert_eq!(
            spec.events(),
            &[
                PulseEvent::new(LASER, 0, 1000),
                PulseEvent::new(MW, 1000, 104),
                PulseEvent::new(DET, 1000, 504),
            ]
        );
    }

    #[test]
    fn test_serde_round_trip() {
        let seq = sample();
        let json = serde_json::to_string(&seq).unwrap();
        let back: CompiledSequence = serde_json::from_str(&json).unwrap();
        assert_eq!(back, seq);
    }

    #[test]
    fn test_deserialize_rejects_broken_sequences() {
        let parse = |json: &str| serde_json::from_str::<CompiledSequence>(json);

        // total disagrees with the segment sum
        assert!(parse(r#"{"segments":[{"state":1,"duration_ns":8}],"total_duration_ns":999}"#).is_err());
        // zero-length segment
        assert!(parse(
            r#"{"segments":[{"state":1,"duration_ns":8},{"state":2,"duration_ns":0}],"total_duration_ns":8}"#
        )
        .is_err());
        // adjacent segments with equal state
        assert!(parse(
            r#"{"segments":[{"state":1,"duration_ns":5},{"state":1,"duration_ns":3}],"total_duration_ns":8}"#
        )
        .is_err());
        // durations overflow u64
        assert!(parse(
            r#"{"segments":[{"state":1,"duration_ns":18446744073709551615},{"state":0,"duration_ns":8}],"total_duration_ns":7}"#
        )
        .is_err());

        let ok = parse(
            r#"{"segments":[{"state":1,"duration_ns":8},{"state":0,"duration_ns":16}],"total_duration_ns":24}"#,
        )
        .unwrap();
        assert_eq!(ok.len(), 2);
        assert_eq!(ok.total_duration_ns(), 24);
    }

    #[test]
    fn test_raw_conversion_reports_reason() {
        let raw = RawCompiledSequence {
            segments: vec![Segment {
                state: ChannelState::with_on([LASER]),
                duration_ns: 0,
            }],
            total_duration_ns: 0,
        };
        let err = CompiledSequence::try_from(raw).unwrap_err();
        assert!(matches!(err, IrError::InvalidSequence(ref m) if m.contains("zero duration")));
    }
}
