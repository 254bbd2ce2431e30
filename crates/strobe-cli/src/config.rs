//! Configuration management for the Strobe CLI.
//!
//! Supports loading configuration from:
//! 1. Configuration files (YAML)
//! 2. Environment variables (with `STROBE_` prefix)
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file (`--config`, `./strobe.yaml`, then
//!    `<config dir>/strobe/config.yaml`)
//! 3. Default values

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use strobe_compile::{Compiler, TimingDefaults};
use strobe_ir::{ChannelSet, HardwareQuantum};

/// File name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "strobe.yaml";

/// Complete CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Pulse generator description.
    #[serde(default)]
    pub hardware: HardwareConfig,

    /// Default timing merged under every parameter file.
    #[serde(default)]
    pub defaults: TimingDefaults,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Pulse generator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HardwareConfig {
    /// Time step in nanoseconds.
    #[serde(default = "default_quantum_ns")]
    pub quantum_ns: u64,

    /// Channel names in output-line order.
    #[serde(default = "default_channels")]
    pub channels: Vec<String>,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_quantum_ns() -> u64 {
    HardwareQuantum::PULSE_STREAMER.ns()
}

fn default_channels() -> Vec<String> {
    ChannelSet::odmr().names().to_vec()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            quantum_ns: default_quantum_ns(),
            channels: default_channels(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {e}", path.display())))?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml_ng::from_str(contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with the following precedence:
    /// 1. Explicit file if provided, else the first existing default location
    /// 2. Apply environment variable overrides
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match config_file {
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_locations().into_iter().find(|p| p.is_file()),
        };

        let config = match &path {
            Some(path) => {
                debug!("Loading configuration from {}", path.display());
                Self::from_file(path)?
            }
            None => {
                debug!("No configuration file found, using defaults");
                Config::default()
            }
        };

        let config = config.merge_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Candidate configuration files, most specific first.
    pub fn default_locations() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("strobe").join("config.yaml"));
        }
        paths
    }

    /// Merge environment variables into this configuration.
    ///
    /// Only variables returned by `lookup` override the file-loaded (or
    /// default) values.
    pub fn merge_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("STROBE_QUANTUM_NS") {
            self.hardware.quantum_ns = v.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("STROBE_QUANTUM_NS is not a number: {v}"))
            })?;
        }
        if let Some(v) = lookup("STROBE_CHANNELS") {
            self.hardware.channels = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(v) = lookup("STROBE_LOG_LEVEL") {
            self.logging.level = v.trim().to_lowercase();
        }
        Ok(self)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let channels = self.channel_set()?;
        self.quantum()?;

        for name in self.defaults.pulses.keys() {
            if channels.id(name).is_none() {
                return Err(ConfigError::ValidationError(format!(
                    "Default pulse on undeclared channel: {name}"
                )));
            }
        }

        if self.defaults.repetitions == 0 {
            return Err(ConfigError::ValidationError(
                "defaults.repetitions must be greater than 0".to_string(),
            ));
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level: {other}"
                )));
            }
        }

        Ok(())
    }

    /// The declared channel set.
    pub fn channel_set(&self) -> Result<ChannelSet, ConfigError> {
        if self.hardware.channels.is_empty() {
            return Err(ConfigError::ValidationError(
                "hardware.channels must not be empty".to_string(),
            ));
        }
        ChannelSet::new(self.hardware.channels.iter().cloned())
            .map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    /// The hardware quantum.
    pub fn quantum(&self) -> Result<HardwareQuantum, ConfigError> {
        HardwareQuantum::new(self.hardware.quantum_ns)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    /// A compiler for the configured hardware.
    pub fn compiler(&self) -> Result<Compiler, ConfigError> {
        Ok(Compiler::new(self.channel_set()?, self.quantum()?))
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml_ng::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn fake_env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.hardware.quantum_ns, 8);
        assert_eq!(config.hardware.channels, vec!["laser", "microwave", "detection"]);
        assert_eq!(config.defaults, TimingDefaults::odmr());
        assert_eq!(config.logging.level, "warn");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = Config::from_yaml("hardware:\n  quantum_ns: 2\n").unwrap();
        assert_eq!(config.hardware.quantum_ns, 2);
        assert_eq!(config.hardware.channels.len(), 3);
        assert_eq!(config.defaults.sequence_interval_ns, 10_000);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = Config::default();
        let yaml = config.to_yaml().unwrap();
        assert_eq!(Config::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn test_validation_rejects_zero_quantum() {
        let err = Config::from_yaml("hardware:\n  quantum_ns: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validation_rejects_channel_lists() {
        let err = Config::from_yaml("hardware:\n  channels: []\ndefaults:\n  pulses: {}\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));

        let err = Config::from_yaml(
            "hardware:\n  channels: [laser, laser]\ndefaults:\n  pulses: {}\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validation_rejects_undeclared_default_pulse() {
        let err = Config::from_yaml("hardware:\n  channels: [laser, detection]\n").unwrap_err();
        assert!(err.to_string().contains("microwave"));
    }

    #[test]
    fn test_unknown_field_is_parse_error() {
        let err = Config::from_yaml("hardware:\n  quantum: 8\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_misspelled_default_key_is_parse_error() {
        let err = Config::from_yaml("defaults:\n  sequence_interval: 200\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));

        let err = Config::from_yaml(
            "defaults:\n  pulses:\n    laser: { start_ns: 0, duration: 1000 }\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::default()
            .merge_env(fake_env(&[
                ("STROBE_QUANTUM_NS", "4"),
                ("STROBE_CHANNELS", "laser, microwave ,detection,trigger"),
                ("STROBE_LOG_LEVEL", "DEBUG"),
            ]))
            .unwrap();
        assert_eq!(config.hardware.quantum_ns, 4);
        assert_eq!(config.hardware.channels.last().unwrap(), "trigger");
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_absent_leaves_values() {
        let config = Config::default().merge_env(fake_env(&[])).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_env_bad_quantum() {
        let err = Config::default()
            .merge_env(fake_env(&[("STROBE_QUANTUM_NS", "eight")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_compiler_from_config() {
        let config = Config::from_yaml("hardware:\n  quantum_ns: 10\n").unwrap();
        let compiler = config.compiler().unwrap();
        assert_eq!(compiler.quantum().ns(), 10);
        assert_eq!(compiler.channels().len(), 3);
    }
}
