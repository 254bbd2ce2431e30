//! Channel identifiers, channel sets and per-span channel states.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{IrError, IrResult};

/// Index of a digital output channel within a [`ChannelSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub u32);

impl ChannelId {
    /// The channel index as a `usize`.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{}", self.0)
    }
}

impl From<u32> for ChannelId {
    fn from(id: u32) -> Self {
        ChannelId(id)
    }
}

/// The caller-declared set of channels for one compilation.
///
/// Channel `i` in declaration order gets [`ChannelId`]`(i)`, which is also its
/// position in every [`ChannelState`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ChannelSet {
    names: Vec<String>,
    #[serde(skip)]
    by_name: FxHashMap<String, ChannelId>,
}

impl ChannelSet {
    /// Name of the laser (AOM gate) channel in the standard set.
    pub const LASER: &'static str = "laser";
    /// Name of the microwave switch channel in the standard set.
    pub const MICROWAVE: &'static str = "microwave";
    /// Name of the detector gate channel in the standard set.
    pub const DETECTION: &'static str = "detection";

    /// Create a channel set from names, in index order.
    ///
    /// # Errors
    ///
    /// Fails on duplicate names or more than [`ChannelState::CAPACITY`] channels.
    pub fn new<I, S>(names: I) -> IrResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::default();
        for name in names {
            set.declare(name)?;
        }
        Ok(set)
    }

    /// The standard ODMR set: laser on line 0, microwave on 1, detection on 2.
    pub fn odmr() -> Self {
        let names = [Self::LASER, Self::MICROWAVE, Self::DETECTION];
        let by_name = names
            .iter()
            .enumerate()
            .map(|(i, n)| ((*n).to_string(), ChannelId(i as u32)))
            .collect();
        Self {
            names: names.iter().map(|n| (*n).to_string()).collect(),
            by_name,
        }
    }

    /// Append a channel and return its id.
    pub fn declare(&mut self, name: impl Into<String>) -> IrResult<ChannelId> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(IrError::DuplicateChannel(name));
        }
        if self.names.len() >= ChannelState::CAPACITY {
            return Err(IrError::TooManyChannels {
                max: ChannelState::CAPACITY,
                got: self.names.len() + 1,
            });
        }
        let id = ChannelId(self.names.len() as u32);
        self.by_name.insert(name.clone(), id);
        self.names.push(name);
        Ok(id)
    }

    /// Look up a channel by name.
    pub fn id(&self, name: &str) -> Option<ChannelId> {
        self.by_name.get(name).copied()
    }

    /// Look up a channel by name, failing if it is not declared.
    pub fn require(&self, name: &str) -> IrResult<ChannelId> {
        self.id(name)
            .ok_or_else(|| IrError::UnknownChannelName(name.to_string()))
    }

    /// Name of a channel, if declared.
    pub fn name(&self, id: ChannelId) -> Option<&str> {
        self.names.get(id.index()).map(String::as_str)
    }

    /// Check that `id` belongs to this set.
    pub fn check(&self, id: ChannelId) -> IrResult<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(IrError::UnknownChannel {
                channel: id,
                declared: self.len(),
            })
        }
    }

    /// Whether `id` belongs to this set.
    pub fn contains(&self, id: ChannelId) -> bool {
        id.index() < self.names.len()
    }

    /// Iterate `(id, name)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (ChannelId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, n)| (ChannelId(i as u32), n.as_str()))
    }

    /// Channel names in index order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of channels.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no channels are declared.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl TryFrom<Vec<String>> for ChannelSet {
    type Error = IrError;

    fn try_from(names: Vec<String>) -> IrResult<Self> {
        Self::new(names)
    }
}

impl From<ChannelSet> for Vec<String> {
    fn from(set: ChannelSet) -> Self {
        set.names
    }
}

/// On/off state of every channel during one span, as a bit vector.
///
/// Bit `i` is channel `ChannelId(i)`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ChannelState(u64);

impl ChannelState {
    /// Maximum number of channels a state can describe.
    pub const CAPACITY: usize = u64::BITS as usize;

    /// All channels off.
    pub const OFF: ChannelState = ChannelState(0);

    /// Build a state from raw bits.
    pub fn from_bits(bits: u64) -> Self {
        ChannelState(bits)
    }

    /// Raw bit representation.
    pub fn bits(self) -> u64 {
        self.0
    }

    /// Build a state with exactly the given channels on.
    pub fn with_on(channels: impl IntoIterator<Item = ChannelId>) -> Self {
        channels
            .into_iter()
            .fold(Self::OFF, |state, ch| state.with(ch, true))
    }

    /// Whether `channel` is on.
    pub fn is_on(self, channel: ChannelId) -> bool {
        channel.index() < Self::CAPACITY && self.0 & (1 << channel.0) != 0
    }

    /// Copy of this state with `channel` set to `on`.
    #[must_use]
    pub fn with(self, channel: ChannelId, on: bool) -> Self {
        debug_assert!(channel.index() < Self::CAPACITY);
        let mask = 1u64 << channel.0;
        if on {
            ChannelState(self.0 | mask)
        } else {
            ChannelState(self.0 & !mask)
        }
    }

    /// Whether every channel is off.
    pub fn is_off(self) -> bool {
        self.0 == 0
    }

    /// Number of channels that are on.
    pub fn count_on(self) -> u32 {
        self.0.count_ones()
    }

    /// Iterate the channels that are on, lowest index first.
    pub fn on_channels(self) -> impl Iterator<Item = ChannelId> {
        let mut bits = self.0;
        std::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            let idx = bits.trailing_zeros();
            bits &= bits - 1;
            Some(ChannelId(idx))
        })
    }

    /// Expand into a boolean vector of length `num_channels`.
    pub fn to_bools(self, num_channels: usize) -> Vec<bool> {
        (0..num_channels)
            .map(|i| self.is_on(ChannelId(i as u32)))
            .collect()
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_off() {
            return write!(f, "[]");
        }
        write!(f, "[")?;
        for (i, ch) in self.on_channels().enumerate() {
            if i > 0 {
                write!(f, "+")?;
            }
            write!(f, "{ch}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // ChannelSet
    // =========================================================================

    #[test]
    fn test_channel_set_indices_follow_declaration_order() {
        let set = ChannelSet::new(["aom", "mw", "spd"]).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.id("aom"), Some(ChannelId(0)));
        assert_eq!(set.id("spd"), Some(ChannelId(2)));
        assert_eq!(set.name(ChannelId(1)), Some("mw"));
        assert_eq!(set.id("trigger"), None);
    }

    #[test]
    fn test_channel_set_rejects_duplicates() {
        let err = ChannelSet::new(["laser", "laser"]).unwrap_err();
        assert_eq!(err, IrError::DuplicateChannel("laser".into()));
    }

    #[test]
    fn test_channel_set_capacity() {
        let names: Vec<String> = (0..=ChannelState::CAPACITY).map(|i| format!("c{i}")).collect();
        let err = ChannelSet::new(names).unwrap_err();
        assert!(matches!(err, IrError::TooManyChannels { max: 64, got: 65 }));
    }

    #[test]
    fn test_odmr_set_matches_standard_names() {
        let set = ChannelSet::odmr();
        assert_eq!(set.require(ChannelSet::LASER).unwrap(), ChannelId(0));
        assert_eq!(set.require(ChannelSet::MICROWAVE).unwrap(), ChannelId(1));
        assert_eq!(set.require(ChannelSet::DETECTION).unwrap(), ChannelId(2));
        assert_eq!(set, ChannelSet::new(["laser", "microwave", "detection"]).unwrap());
    }

    #[test]
    fn test_check_unknown_channel() {
        let set = ChannelSet::odmr();
        assert!(set.check(ChannelId(2)).is_ok());
        assert_eq!(
            set.check(ChannelId(3)).unwrap_err(),
            IrError::UnknownChannel {
                channel: ChannelId(3),
                declared: 3
            }
        );
    }

    #[test]
    fn test_channel_set_serde_as_name_list() {
        let set = ChannelSet::odmr();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["laser","microwave","detection"]"#);
        let back: ChannelSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id("detection"), Some(ChannelId(2)));

        let dup: Result<ChannelSet, _> = serde_json::from_str(r#"["a","a"]"#);
        assert!(dup.is_err());
    }

    // =========================================================================
    // ChannelState
    // =========================================================================

    #[test]
    fn test_state_set_and_clear() {
        let state = ChannelState::OFF
            .with(ChannelId(0), true)
            .with(ChannelId(2), true);
        assert!(state.is_on(ChannelId(0)));
        assert!(!state.is_on(ChannelId(1)));
        assert_eq!(state.count_on(), 2);

        let cleared = state.with(ChannelId(0), false);
        assert!(!cleared.is_on(ChannelId(0)));
        assert!(cleared.is_on(ChannelId(2)));
    }

    #[test]
    fn test_state_on_channels_in_order() {
        let state = ChannelState::with_on([ChannelId(5), ChannelId(1), ChannelId(63)]);
        let on: Vec<_> = state.on_channels().collect();
        assert_eq!(on, vec![ChannelId(1), ChannelId(5), ChannelId(63)]);
    }

    #[test]
    fn test_state_to_bools() {
        let state = ChannelState::with_on([ChannelId(1)]);
        assert_eq!(state.to_bools(3), vec![false, true, false]);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ChannelState::OFF.to_string(), "[]");
        let state = ChannelState::with_on([ChannelId(1), ChannelId(2)]);
        assert_eq!(state.to_string(), "[ch1+ch2]");
    }
}
