//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use strobe_compile::{Odmr, Protocol, PulseWindow, Rabi, Ramsey, SpinEcho, T1};

use crate::output::OutputFormat;

/// Strobe - pulse-sequence compiler for digital pulse generators
#[derive(Debug, Parser)]
#[command(name = "strobe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (defaults to ./strobe.yaml, then the user config dir)
    #[arg(short, long, global = true, env = "STROBE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compile an experiment parameter file
    Compile {
        /// Parameter file (JSON or YAML)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Compile a standard protocol
    Preset {
        #[command(subcommand)]
        protocol: PresetCommand,
    },

    /// Print the effective configuration as YAML
    Config,
}

/// Repetition and output flags shared by every preset.
#[derive(Debug, Clone, Args)]
pub struct PlanArgs {
    /// Number of repetitions (config default if omitted)
    #[arg(short, long)]
    pub repetitions: Option<u32>,

    /// Gap between repetitions in ns (config default if omitted)
    #[arg(long)]
    pub interval_ns: Option<u64>,

    /// Output file (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Debug, Subcommand)]
pub enum PresetCommand {
    /// Pulsed ODMR windows
    Odmr {
        /// Laser window start in ns
        #[arg(long)]
        laser_start_ns: Option<u64>,
        /// Laser pulse length in ns
        #[arg(long)]
        laser_ns: Option<u64>,
        /// MW window start in ns
        #[arg(long)]
        mw_start_ns: Option<u64>,
        /// MW pulse length in ns
        #[arg(long)]
        mw_ns: Option<u64>,
        /// Detection window start in ns
        #[arg(long)]
        detection_start_ns: Option<u64>,
        /// Detection window length in ns
        #[arg(long)]
        detection_ns: Option<u64>,
        #[command(flatten)]
        plan: PlanArgs,
    },

    /// Rabi oscillation: laser, wait, MW, detection
    Rabi {
        /// Laser pulse length in ns
        #[arg(long)]
        laser_ns: Option<u64>,
        /// Wait between laser and MW pulse in ns
        #[arg(long)]
        wait_ns: Option<u64>,
        /// MW pulse length (the swept parameter)
        #[arg(long)]
        mw_ns: Option<u64>,
        /// Detection window length in ns
        #[arg(long)]
        detection_ns: Option<u64>,
        #[command(flatten)]
        plan: PlanArgs,
    },

    /// Ramsey: two π/2 pulses separated by τ
    Ramsey {
        /// Laser pulse length in ns
        #[arg(long)]
        laser_ns: Option<u64>,
        /// π/2 pulse length in ns
        #[arg(long)]
        pi_half_ns: Option<u64>,
        /// Free evolution time τ in ns
        #[arg(long)]
        tau_ns: Option<u64>,
        /// Detection window length in ns
        #[arg(long)]
        detection_ns: Option<u64>,
        #[command(flatten)]
        plan: PlanArgs,
    },

    /// Hahn echo: π/2, τ, π, τ
    SpinEcho {
        /// Laser pulse length in ns
        #[arg(long)]
        laser_ns: Option<u64>,
        /// π/2 pulse length in ns
        #[arg(long)]
        pi_half_ns: Option<u64>,
        /// π pulse length in ns
        #[arg(long)]
        pi_ns: Option<u64>,
        /// Free evolution time τ in ns
        #[arg(long)]
        tau_ns: Option<u64>,
        /// Detection window length in ns
        #[arg(long)]
        detection_ns: Option<u64>,
        #[command(flatten)]
        plan: PlanArgs,
    },

    /// T1 relaxation: init laser, delay, readout laser
    T1 {
        /// Delay before the initialization laser in ns
        #[arg(long)]
        init_delay_ns: Option<u64>,
        /// Initialization laser length in ns
        #[arg(long)]
        init_laser_ns: Option<u64>,
        /// Dark time between the two laser pulses in ns
        #[arg(long)]
        delay_ns: Option<u64>,
        /// Readout laser length in ns
        #[arg(long)]
        readout_laser_ns: Option<u64>,
        /// Detection window length in ns
        #[arg(long)]
        detection_ns: Option<u64>,
        #[command(flatten)]
        plan: PlanArgs,
    },
}

/// A protocol resolved from preset flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Odmr(Odmr),
    Rabi(Rabi),
    Ramsey(Ramsey),
    SpinEcho(SpinEcho),
    T1(T1),
}

impl Preset {
    /// The protocol behind this preset.
    pub fn protocol(&self) -> &dyn Protocol {
        match self {
            Preset::Odmr(p) => p,
            Preset::Rabi(p) => p,
            Preset::Ramsey(p) => p,
            Preset::SpinEcho(p) => p,
            Preset::T1(p) => p,
        }
    }
}

impl PresetCommand {
    /// Split into the protocol (flags over protocol defaults) and plan flags.
    pub fn resolve(&self) -> (Preset, &PlanArgs) {
        match self {
            PresetCommand::Odmr {
                laser_start_ns,
                laser_ns,
                mw_start_ns,
                mw_ns,
                detection_start_ns,
                detection_ns,
                plan,
            } => {
                let d = Odmr::default();
                let window = |w: PulseWindow, start: &Option<u64>, duration: &Option<u64>| {
                    PulseWindow::new(
                        start.unwrap_or(w.start_ns),
                        duration.unwrap_or(w.duration_ns),
                    )
                };
                let odmr = Odmr {
                    laser: window(d.laser, laser_start_ns, laser_ns),
                    microwave: window(d.microwave, mw_start_ns, mw_ns),
                    detection: window(d.detection, detection_start_ns, detection_ns),
                };
                (Preset::Odmr(odmr), plan)
            }
            PresetCommand::Rabi {
                laser_ns,
                wait_ns,
                mw_ns,
                detection_ns,
                plan,
            } => {
                let d = Rabi::default();
                let rabi = Rabi {
                    laser_ns: laser_ns.unwrap_or(d.laser_ns),
                    wait_ns: wait_ns.unwrap_or(d.wait_ns),
                    mw_ns: mw_ns.unwrap_or(d.mw_ns),
                    detection_ns: detection_ns.unwrap_or(d.detection_ns),
                };
                (Preset::Rabi(rabi), plan)
            }
            PresetCommand::Ramsey {
                laser_ns,
                pi_half_ns,
                tau_ns,
                detection_ns,
                plan,
            } => {
                let d = Ramsey::default();
                let ramsey = Ramsey {
                    laser_ns: laser_ns.unwrap_or(d.laser_ns),
                    pi_half_ns: pi_half_ns.unwrap_or(d.pi_half_ns),
                    tau_ns: tau_ns.unwrap_or(d.tau_ns),
                    detection_ns: detection_ns.unwrap_or(d.detection_ns),
                };
                (Preset::Ramsey(ramsey), plan)
            }
            PresetCommand::SpinEcho {
                laser_ns,
                pi_half_ns,
                pi_ns,
                tau_ns,
                detection_ns,
                plan,
            } => {
                let d = SpinEcho::default();
                let echo = SpinEcho {
                    laser_ns: laser_ns.unwrap_or(d.laser_ns),
                    pi_half_ns: pi_half_ns.unwrap_or(d.pi_half_ns),
                    pi_ns: pi_ns.unwrap_or(d.pi_ns),
                    tau_ns: tau_ns.unwrap_or(d.tau_ns),
                    detection_ns: detection_ns.unwrap_or(d.detection_ns),
                };
                (Preset::SpinEcho(echo), plan)
            }
            PresetCommand::T1 {
                init_delay_ns,
                init_laser_ns,
                delay_ns,
                readout_laser_ns,
                detection_ns,
                plan,
            } => {
                let d = T1::default();
                let t1 = T1 {
                    init_delay_ns: init_delay_ns.unwrap_or(d.init_delay_ns),
                    init_laser_ns: init_laser_ns.unwrap_or(d.init_laser_ns),
                    delay_ns: delay_ns.unwrap_or(d.delay_ns),
                    readout_laser_ns: readout_laser_ns.unwrap_or(d.readout_laser_ns),
                    detection_ns: detection_ns.unwrap_or(d.detection_ns),
                };
                (Preset::T1(t1), plan)
            }
        }
    }
}
