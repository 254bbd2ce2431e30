//! Standard NV-centre pulse protocols.
//!
//! Each protocol lays its pulses out back to back on the `laser`,
//! `microwave` and `detection` channels and resolves the layout into
//! absolute offsets. Sweeping a parameter means building one protocol value
//! per point and compiling each.
//!
//! | Protocol | Unit layout |
//! |----------|-------------|
//! | [`Odmr`] | three independent windows at absolute offsets |
//! | [`Rabi`] | laser, wait, MW(t), detection |
//! | [`Ramsey`] | laser, relax, π/2, τ, π/2, delay, detection |
//! | [`SpinEcho`] | laser, relax, π/2, τ, π, τ, delay, detection |
//! | [`T1`] | init laser, delay, readout laser with detection |

use serde::{Deserialize, Serialize};

use strobe_ir::{ChannelSet, PulseEvent, TimingSpec};

use crate::error::{CompileError, CompileResult};
use crate::normalize::PulseWindow;

/// Wait after the initialization laser before the first MW pulse.
pub const RELAXATION_NS: u64 = 1_000;

/// Wait between the last MW pulse and the detection window.
pub const READOUT_DELAY_NS: u64 = 100;

/// Default π/2 pulse length.
pub const PI_HALF_NS: u64 = 25;

/// Default π pulse length.
pub const PI_NS: u64 = 50;

/// Default gap between repetitions.
pub const SEQUENCE_INTERVAL_NS: u64 = 10_000;

/// How a protocol's unit is repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepetitionPlan {
    /// Number of repetitions.
    pub repetitions: u32,
    /// All-off gap between repetitions.
    pub sequence_interval_ns: u64,
}

impl RepetitionPlan {
    /// Create a plan.
    pub fn new(repetitions: u32, sequence_interval_ns: u64) -> Self {
        Self {
            repetitions,
            sequence_interval_ns,
        }
    }
}

impl Default for RepetitionPlan {
    fn default() -> Self {
        Self::new(1, SEQUENCE_INTERVAL_NS)
    }
}

/// A named pulse on one of the standard channels.
pub type NamedPulse = (&'static str, PulseWindow);

/// A pulse protocol that can be turned into a [`TimingSpec`].
pub trait Protocol {
    /// Short identifier, e.g. `"spin-echo"`.
    fn name(&self) -> &'static str;

    /// The pulses of one unit at absolute offsets.
    ///
    /// # Errors
    ///
    /// `Overflow` if the layout does not fit in `u64` nanoseconds.
    fn pulses(&self) -> CompileResult<Vec<NamedPulse>>;

    /// Resolve the protocol against `channels`.
    fn timing_spec(&self, channels: &ChannelSet, plan: RepetitionPlan) -> CompileResult<TimingSpec> {
        let mut events = Vec::new();
        for (name, window) in self.pulses()? {
            let channel = channels.require(name)?;
            events.push(PulseEvent::new(channel, window.start_ns, window.duration_ns));
        }
        Ok(TimingSpec::new(
            events,
            plan.sequence_interval_ns,
            plan.repetitions,
        )?)
    }
}

/// Sequential layout cursor.
struct Layout {
    protocol: &'static str,
    cursor: u64,
    pulses: Vec<NamedPulse>,
}

impl Layout {
    fn new(protocol: &'static str) -> Self {
        Self {
            protocol,
            cursor: 0,
            pulses: Vec::new(),
        }
    }

    fn advance(&mut self, ns: u64) -> CompileResult<u64> {
        let start = self.cursor;
        self.cursor = self
            .cursor
            .checked_add(ns)
            .ok_or_else(|| CompileError::Overflow {
                what: format!("{} layout", self.protocol),
            })?;
        Ok(start)
    }

    fn wait(&mut self, ns: u64) -> CompileResult<()> {
        self.advance(ns).map(|_| ())
    }

    fn pulse(&mut self, channel: &'static str, ns: u64) -> CompileResult<u64> {
        let start = self.advance(ns)?;
        self.pulses.push((channel, PulseWindow::new(start, ns)));
        Ok(start)
    }

    fn finish(self) -> Vec<NamedPulse> {
        self.pulses
    }
}

// =============================================================================
// ODMR
// =============================================================================

/// Pulsed ODMR: independent laser, MW and detection windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Odmr {
    /// Laser window.
    pub laser: PulseWindow,
    /// Microwave window.
    pub microwave: PulseWindow,
    /// Detection window.
    pub detection: PulseWindow,
}

impl Default for Odmr {
    fn default() -> Self {
        Self {
            laser: PulseWindow::new(48, 1000),
            microwave: PulseWindow::new(104, 104),
            detection: PulseWindow::new(200, 504),
        }
    }
}

impl Protocol for Odmr {
    fn name(&self) -> &'static str {
        "odmr"
    }

    fn pulses(&self) -> CompileResult<Vec<NamedPulse>> {
        Ok(vec![
            (ChannelSet::LASER, self.laser),
            (ChannelSet::MICROWAVE, self.microwave),
            (ChannelSet::DETECTION, self.detection),
        ])
    }
}

// =============================================================================
// Rabi
// =============================================================================

/// Rabi oscillation: laser, wait, variable MW pulse, detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rabi {
    /// Initialization laser length.
    pub laser_ns: u64,
    /// Wait between laser and MW.
    pub wait_ns: u64,
    /// MW pulse length (the swept parameter).
    pub mw_ns: u64,
    /// Detection window length.
    pub detection_ns: u64,
}

impl Default for Rabi {
    fn default() -> Self {
        Self {
            laser_ns: 1000,
            wait_ns: RELAXATION_NS,
            mw_ns: 100,
            detection_ns: 500,
        }
    }
}

impl Protocol for Rabi {
    fn name(&self) -> &'static str {
        "rabi"
    }

    fn pulses(&self) -> CompileResult<Vec<NamedPulse>> {
        let mut layout = Layout::new(self.name());
        layout.pulse(ChannelSet::LASER, self.laser_ns)?;
        layout.wait(self.wait_ns)?;
        layout.pulse(ChannelSet::MICROWAVE, self.mw_ns)?;
        layout.pulse(ChannelSet::DETECTION, self.detection_ns)?;
        Ok(layout.finish())
    }
}

// =============================================================================
// Ramsey and spin echo
// =============================================================================

/// Ramsey interferometry: π/2, free evolution τ, π/2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ramsey {
    /// Initialization laser length.
    pub laser_ns: u64,
    /// π/2 pulse length.
    pub pi_half_ns: u64,
    /// Free evolution time.
    pub tau_ns: u64,
    /// Detection window length.
    pub detection_ns: u64,
}

impl Default for Ramsey {
    fn default() -> Self {
        Self {
            laser_ns: 1000,
            pi_half_ns: PI_HALF_NS,
            tau_ns: 1000,
            detection_ns: 500,
        }
    }
}

impl Protocol for Ramsey {
    fn name(&self) -> &'static str {
        "ramsey"
    }

    fn pulses(&self) -> CompileResult<Vec<NamedPulse>> {
        let mut layout = Layout::new(self.name());
        layout.pulse(ChannelSet::LASER, self.laser_ns)?;
        layout.wait(RELAXATION_NS)?;
        layout.pulse(ChannelSet::MICROWAVE, self.pi_half_ns)?;
        layout.wait(self.tau_ns)?;
        layout.pulse(ChannelSet::MICROWAVE, self.pi_half_ns)?;
        layout.wait(READOUT_DELAY_NS)?;
        layout.pulse(ChannelSet::DETECTION, self.detection_ns)?;
        Ok(layout.finish())
    }
}

/// Hahn echo: π/2, τ, refocusing π, τ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpinEcho {
    /// Initialization laser length.
    pub laser_ns: u64,
    /// π/2 pulse length.
    pub pi_half_ns: u64,
    /// π pulse length.
    pub pi_ns: u64,
    /// Evolution time on each side of the π pulse.
    pub tau_ns: u64,
    /// Detection window length.
    pub detection_ns: u64,
}

impl Default for SpinEcho {
    fn default() -> Self {
        Self {
            laser_ns: 1000,
            pi_half_ns: PI_HALF_NS,
            pi_ns: PI_NS,
            tau_ns: 1000,
            detection_ns: 500,
        }
    }
}

impl Protocol for SpinEcho {
    fn name(&self) -> &'static str {
        "spin-echo"
    }

    fn pulses(&self) -> CompileResult<Vec<NamedPulse>> {
        let mut layout = Layout::new(self.name());
        layout.pulse(ChannelSet::LASER, self.laser_ns)?;
        layout.wait(RELAXATION_NS)?;
        layout.pulse(ChannelSet::MICROWAVE, self.pi_half_ns)?;
        layout.wait(self.tau_ns)?;
        layout.pulse(ChannelSet::MICROWAVE, self.pi_ns)?;
        layout.wait(self.tau_ns)?;
        layout.wait(READOUT_DELAY_NS)?;
        layout.pulse(ChannelSet::DETECTION, self.detection_ns)?;
        Ok(layout.finish())
    }
}

// =============================================================================
// T1
// =============================================================================

/// T1 relaxation: init laser, dark delay, readout laser gated by detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct T1 {
    /// Offset of the initialization laser.
    pub init_delay_ns: u64,
    /// Initialization laser length.
    pub init_laser_ns: u64,
    /// Dark time between the two laser pulses (the swept parameter).
    pub delay_ns: u64,
    /// Readout laser length.
    pub readout_laser_ns: u64,
    /// Detection window length, starting with the readout laser.
    pub detection_ns: u64,
}

impl Default for T1 {
    fn default() -> Self {
        Self {
            init_delay_ns: 0,
            init_laser_ns: 1000,
            delay_ns: 10_000,
            readout_laser_ns: 1000,
            detection_ns: 500,
        }
    }
}

impl Protocol for T1 {
    fn name(&self) -> &'static str {
        "t1"
    }

    fn pulses(&self) -> CompileResult<Vec<NamedPulse>> {
        let mut layout = Layout::new(self.name());
        layout.wait(self.init_delay_ns)?;
        layout.pulse(ChannelSet::LASER, self.init_laser_ns)?;
        layout.wait(self.delay_ns)?;
        let readout = layout.pulse(ChannelSet::LASER, self.readout_laser_ns)?;
        let mut pulses = layout.finish();
        pulses.push((
            ChannelSet::DETECTION,
            PulseWindow::new(readout, self.detection_ns),
        ));
        Ok(pulses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strobe_ir::ChannelId;

    const LASER: ChannelId = ChannelId(0);
    const MW: ChannelId = ChannelId(1);
    const DET: ChannelId = ChannelId(2);

    fn events(p: &impl Protocol) -> Vec<PulseEvent> {
        p.timing_spec(&ChannelSet::odmr(), RepetitionPlan::default())
            .unwrap()
            .events()
            .to_vec()
    }

    #[test]
    fn test_odmr_defaults() {
        assert_eq!(
            events(&Odmr::default()),
            vec![
                PulseEvent::new(LASER, 48, 1000),
                PulseEvent::new(MW, 104, 104),
                PulseEvent::new(DET, 200, 504),
            ]
        );
    }

    #[test]
    fn test_rabi_layout() {
        let rabi = Rabi {
            mw_ns: 40,
            ..Rabi::default()
        };
        assert_eq!(
            events(&rabi),
            vec![
                PulseEvent::new(LASER, 0, 1000),
                PulseEvent::new(MW, 2000, 40),
                PulseEvent::new(DET, 2040, 500),
            ]
        );
    }

    #[test]
    fn test_ramsey_layout() {
        let ramsey = Ramsey {
            tau_ns: 200,
            ..Ramsey::default()
        };
        assert_eq!(
            events(&ramsey),
            vec![
                PulseEvent::new(LASER, 0, 1000),
                PulseEvent::new(MW, 2000, 25),
                PulseEvent::new(MW, 2225, 25),
                PulseEvent::new(DET, 2350, 500),
            ]
        );
    }

    #[test]
    fn test_spin_echo_layout() {
        let echo = SpinEcho {
            tau_ns: 300,
            ..SpinEcho::default()
        };
        assert_eq!(
            events(&echo),
            vec![
                PulseEvent::new(LASER, 0, 1000),
                PulseEvent::new(MW, 2000, 25),
                PulseEvent::new(MW, 2325, 50),
                PulseEvent::new(DET, 2775, 500),
            ]
        );
    }

    #[test]
    fn test_t1_detection_follows_readout() {
        let t1 = T1 {
            init_delay_ns: 48,
            delay_ns: 5000,
            ..T1::default()
        };
        assert_eq!(
            events(&t1),
            vec![
                PulseEvent::new(LASER, 48, 1000),
                PulseEvent::new(LASER, 6048, 1000),
                PulseEvent::new(DET, 6048, 500),
            ]
        );
    }

    #[test]
    fn test_plan_is_applied() {
        let spec = Rabi::default()
            .timing_spec(&ChannelSet::odmr(), RepetitionPlan::new(5, 2000))
            .unwrap();
        assert_eq!(spec.repetitions(), 5);
        assert_eq!(spec.sequence_interval_ns(), 2000);
    }

    #[test]
    fn test_missing_channel() {
        let channels = ChannelSet::new(["laser", "detection"]).unwrap();
        let err = Rabi::default()
            .timing_spec(&channels, RepetitionPlan::default())
            .unwrap_err();
        assert_eq!(
            err,
            CompileError::UnknownChannel {
                channel: "microwave".into()
            }
        );
    }

    #[test]
    fn test_layout_overflow() {
        let t1 = T1 {
            delay_ns: u64::MAX,
            ..T1::default()
        };
        assert!(matches!(t1.pulses(), Err(CompileError::Overflow { .. })));
    }
}
