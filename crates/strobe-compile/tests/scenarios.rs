//! End-to-end compilation scenarios at the 8 ns pulse-streamer quantum.
//!
//! Each test compiles a small unit through the full pipeline and checks the
//! hardware-facing result: segment durations, channel states and total
//! length.

use strobe_compile::passes::{CollapsedSpans, VerificationResult, VerifySequence};
use strobe_compile::{
    CompileError, Compiler, Pass, PassManagerBuilder, PropertySet, Protocol, PulseOverride, Rabi,
    RepetitionPlan, SpinEcho, TimingDefaults, TimingParams,
};
use strobe_ir::{
    ChannelId, ChannelSet, ChannelState, CompiledSequence, HardwareQuantum, Timeline, TimingSpec,
};

const LASER: ChannelId = ChannelId(0);
const MW: ChannelId = ChannelId(1);
const DET: ChannelId = ChannelId(2);

/// Helper: segment durations in order.
fn durations(seq: &CompiledSequence) -> Vec<u64> {
    seq.segments().iter().map(|s| s.duration_ns).collect()
}

/// Helper: segment states in order.
fn states(seq: &CompiledSequence) -> Vec<ChannelState> {
    seq.segments().iter().map(|s| s.state).collect()
}

// ============================================================================
// Single-channel alignment
// ============================================================================

#[test]
fn test_laser_1005_rounds_to_1008() {
    let spec = TimingSpec::builder().pulse(LASER, 0, 1005).build().unwrap();
    let seq = Compiler::odmr().compile(&spec).unwrap();

    assert_eq!(durations(&seq), vec![1008]);
    assert_eq!(states(&seq), vec![ChannelState::with_on([LASER])]);
    assert_eq!(seq.total_duration_ns(), 1008);
}

#[test]
fn test_mw_123_rounds_to_128() {
    let spec = TimingSpec::builder().pulse(MW, 0, 123).build().unwrap();
    let seq = Compiler::odmr().compile(&spec).unwrap();
    assert_eq!(durations(&seq), vec![128]);
}

#[test]
fn test_detection_456_stays_456() {
    let spec = TimingSpec::builder().pulse(DET, 0, 456).build().unwrap();
    let seq = Compiler::odmr().compile(&spec).unwrap();
    assert_eq!(durations(&seq), vec![456]);
}

// ============================================================================
// Multi-channel overlap
// ============================================================================

#[test]
fn test_shared_breakpoint_overlap() {
    let spec = TimingSpec::builder()
        .pulse(LASER, 0, 1000)
        .pulse(MW, 1000, 100)
        .pulse(DET, 1000, 500)
        .build()
        .unwrap();

    let timeline = Timeline::from_spec(&spec, &ChannelSet::odmr()).unwrap();
    assert_eq!(timeline.breakpoints(), vec![0, 1000, 1100, 1500]);

    let seq = Compiler::odmr().compile(&spec).unwrap();
    // 1100 aligns to 1104 and 1500 to 1504; 1000 is already aligned.
    assert_eq!(durations(&seq), vec![1000, 104, 400]);
    assert_eq!(
        states(&seq),
        vec![
            ChannelState::with_on([LASER]),
            ChannelState::with_on([MW, DET]),
            ChannelState::with_on([DET]),
        ]
    );
    assert_eq!(seq.total_duration_ns(), 1504);
}

#[test]
fn test_trailing_off_span_from_min_unit_length() {
    let spec = TimingSpec::builder()
        .pulse(LASER, 0, 1000)
        .pulse(MW, 1000, 100)
        .pulse(DET, 1000, 500)
        .min_unit_length(2000)
        .build()
        .unwrap();
    let seq = Compiler::odmr().compile(&spec).unwrap();
    assert_eq!(states(&seq).last(), Some(&ChannelState::OFF));
    assert_eq!(seq.total_duration_ns(), 2000);
}

#[test]
fn test_same_channel_overlap_single_on_run() {
    let spec = TimingSpec::builder()
        .pulse(MW, 0, 300)
        .pulse(MW, 200, 300)
        .build()
        .unwrap();
    let seq = Compiler::odmr().compile(&spec).unwrap();
    assert_eq!(seq.channel_pattern(MW), vec![(504, true)]);
}

// ============================================================================
// Repetitions
// ============================================================================

#[test]
fn test_three_repetitions_with_interval() {
    let spec = TimingSpec::builder()
        .pulse(LASER, 0, 1000)
        .repetitions(3)
        .sequence_interval(200)
        .build()
        .unwrap();
    let seq = Compiler::odmr().compile(&spec).unwrap();

    assert_eq!(seq.total_duration_ns(), 3 * 1000 + 2 * 200);
    assert_eq!(durations(&seq), vec![1000, 200, 1000, 200, 1000]);
    assert_eq!(seq.segments().last().unwrap().state, ChannelState::with_on([LASER]));
}

#[test]
fn test_no_drift_across_repetitions() {
    // 1005 ns per unit rounds to 1008 once; per-repetition offsets stay exact.
    let spec = TimingSpec::builder()
        .pulse(LASER, 0, 1005)
        .repetitions(100)
        .sequence_interval(10_000)
        .build()
        .unwrap();
    let report = Compiler::odmr().compile_with_report(&spec).unwrap();
    assert_eq!(report.unit_length_ns, 1008);
    assert_eq!(report.gap_ns, 10_000);
    assert_eq!(report.sequence.total_duration_ns(), 100 * 1008 + 99 * 10_000);

    let starts: Vec<u64> = report
        .sequence
        .iter_with_offsets()
        .filter(|(_, seg)| !seg.state.is_off())
        .map(|(t, _)| t)
        .collect();
    for (r, start) in starts.iter().enumerate() {
        assert_eq!(*start, r as u64 * (1008 + 10_000));
    }
}

#[test]
fn test_patterns_match_repetition_layout() {
    let spec = TimingSpec::builder()
        .pulse(LASER, 48, 1000)
        .pulse(DET, 200, 504)
        .repetitions(2)
        .sequence_interval(100)
        .build()
        .unwrap();
    let seq = Compiler::odmr().compile(&spec).unwrap();

    assert_eq!(
        seq.channel_pattern(LASER),
        vec![(48, false), (1000, true), (104 + 48, false), (1000, true)]
    );
    assert_eq!(seq.on_time_ns(DET), 2 * 504);
}

// ============================================================================
// Normalizer and protocols
// ============================================================================

#[test]
fn test_compile_from_overrides() {
    let params = TimingParams::new()
        .pulse("microwave", PulseOverride::window(1000, 123))
        .pulse("detection", PulseOverride::window(1000, 456))
        .repetitions(2)
        .sequence_interval(0);
    let seq = Compiler::odmr()
        .compile_params(&params, &TimingDefaults::odmr())
        .unwrap();
    assert_eq!(seq.total_duration_ns() % 8, 0);
    assert_eq!(seq.on_time_ns(DET), 2 * 456);
}

#[test]
fn test_rabi_sweep_changes_hash() {
    let compiler = Compiler::odmr();
    let channels = ChannelSet::odmr();
    let plan = RepetitionPlan::new(10, 10_000);

    let hashes: Vec<u64> = [16, 32, 48, 48]
        .into_iter()
        .map(|mw_ns| {
            let spec = Rabi { mw_ns, ..Rabi::default() }
                .timing_spec(&channels, plan)
                .unwrap();
            compiler.compile(&spec).unwrap().content_hash()
        })
        .collect();

    assert_ne!(hashes[0], hashes[1]);
    assert_ne!(hashes[1], hashes[2]);
    assert_eq!(hashes[2], hashes[3]);
}

#[test]
fn test_spin_echo_short_pulses_are_kept() {
    let spec = SpinEcho::default()
        .timing_spec(&ChannelSet::odmr(), RepetitionPlan::default())
        .unwrap();
    let seq = Compiler::odmr().compile(&spec).unwrap();
    // π/2 (25 ns) and π (50 ns) both survive alignment.
    let mw_runs = seq
        .channel_pattern(MW)
        .into_iter()
        .filter(|&(_, on)| on)
        .count();
    assert_eq!(mw_runs, 2);
}

#[test]
fn test_sub_tick_pulse_is_reported() {
    // MW [1001, 1004) sits inside one tick after the laser ends at 1000.
    let spec = TimingSpec::builder()
        .pulse(LASER, 0, 1000)
        .pulse(MW, 1001, 3)
        .pulse(DET, 1004, 500)
        .build()
        .unwrap();
    let report = Compiler::odmr().compile_with_report(&spec).unwrap();
    assert_eq!(report.sequence.on_time_ns(MW), 0);
    assert_eq!(report.collapsed.with_active_channels, 1);
    assert_ne!(report.collapsed, CollapsedSpans::default());
}

// ============================================================================
// Errors and pass plumbing
// ============================================================================

#[test]
fn test_error_taxonomy() {
    let compiler = Compiler::odmr();

    let empty = TimingSpec::builder().pulse(LASER, 100, 0).build().unwrap();
    assert_eq!(compiler.compile(&empty).unwrap_err(), CompileError::EmptyTimingSpec);

    let params = TimingParams::new().pulse("laser", PulseOverride::duration(-1));
    assert!(matches!(
        compiler.compile_params(&params, &TimingDefaults::odmr()),
        Err(CompileError::InvalidParameter { .. })
    ));

    let params = TimingParams::new().pulse("camera", PulseOverride::window(0, 8));
    assert!(matches!(
        compiler.compile_params(&params, &TimingDefaults::odmr()),
        Err(CompileError::UnknownChannel { .. })
    ));

    assert!(matches!(
        HardwareQuantum::new(0).map_err(CompileError::from),
        Err(CompileError::InvalidParameter { .. })
    ));
}

#[test]
fn test_manual_pipeline_records_verification() {
    let spec = TimingSpec::builder()
        .pulse(LASER, 0, 1005)
        .repetitions(2)
        .sequence_interval(3)
        .build()
        .unwrap();
    let (pm, mut props) = PassManagerBuilder::new().for_spec(&spec).build();
    let mut timeline = Timeline::from_spec(&spec, &ChannelSet::odmr()).unwrap();
    pm.run(&mut timeline, &mut props).unwrap();

    let result = props.get::<VerificationResult>().unwrap();
    assert!(result.passed);
    assert_eq!(result.total_ns, 2 * 1008 + 8);
}

#[test]
fn test_verification_rejects_unquantized_timeline() {
    let spec = TimingSpec::builder().pulse(LASER, 0, 1005).build().unwrap();
    let mut timeline = Timeline::from_spec(&spec, &ChannelSet::odmr()).unwrap();
    let mut props = PropertySet::new().with_quantum(HardwareQuantum::PULSE_STREAMER);
    assert!(matches!(
        VerifySequence.run(&mut timeline, &mut props),
        Err(CompileError::PassFailed { .. })
    ));
}

#[test]
fn test_custom_quantum() {
    let compiler = Compiler::new(ChannelSet::odmr(), HardwareQuantum::new(10).unwrap());
    let spec = TimingSpec::builder()
        .pulse(LASER, 0, 1005)
        .repetitions(2)
        .sequence_interval(1)
        .build()
        .unwrap();
    let seq = compiler.compile(&spec).unwrap();
    assert_eq!(durations(&seq), vec![1010, 10, 1010]);
}
