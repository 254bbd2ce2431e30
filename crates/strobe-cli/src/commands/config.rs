//! Config command implementation.

use anyhow::Result;

use crate::config::Config;

/// Print the effective configuration.
pub fn execute(config: &Config) -> Result<()> {
    print!("{}", config.to_yaml()?);
    Ok(())
}
