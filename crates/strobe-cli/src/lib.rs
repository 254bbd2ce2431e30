//! Strobe command-line interface.
//!
//! The `strobe` binary compiles experiment parameter files and standard
//! protocols into hardware-ready pulse sequences. The pieces are exposed as
//! a library so they can be tested without spawning the binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod input;
pub mod output;

pub use cli::{Cli, Commands, Preset, PresetCommand};
pub use config::{Config, ConfigError};
pub use output::OutputFormat;
