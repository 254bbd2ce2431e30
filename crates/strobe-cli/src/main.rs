//! Strobe Command-Line Interface
//!
//! The main entry point for the `strobe` pulse-sequence compiler.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::Parser;
use console::style;
use tracing_subscriber::EnvFilter;

use strobe_cli::commands::{compile, config as config_cmd, preset};
use strobe_cli::{Cli, Commands, Config};

fn main() {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    // Setup logging
    let filter = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    let result = match &cli.command {
        Commands::Compile {
            input,
            output,
            format,
        } => compile::execute(&config, input, output.as_deref(), *format),

        Commands::Preset { protocol } => preset::execute(&config, protocol),

        Commands::Config => config_cmd::execute(&config),
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}
