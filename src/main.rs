//! qspiram - Paired quad-SPI RAM bridge simulator
//!
//! Drives the bridge from `qspiram-core` against two emulated serial RAMs and
//! reports what happens on the wire.
//!
//! # Architecture
//!
//! Every command builds a [`BridgeConfig`](qspiram_core::BridgeConfig) from
//! an optional TOML file plus `-o key=value` overrides, then runs the bridge
//! over a `qspiram-dummy` device pair:
//! - **format-cmd** - the lane-interleaved command word for an opcode
//! - **read / write** - word transactions with per-transaction cycle counts
//! - **timing** - cold and burst costs of the configuration
//! - **trace** - tick-by-tick pin activity of a burst read

mod cli;
mod commands;
mod error;

use clap::Parser;
use cli::{BridgeArgs, Cli, Commands};
use error::CliError;
use qspiram_core::config::split_options;
use qspiram_core::BridgeConfig;
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let config_file = cli.config.as_deref();

    match cli.command {
        Commands::FormatCmd { opcode, lanes } => {
            commands::format::run_format(opcode, lanes);
        }
        Commands::Read {
            addr,
            count,
            image,
            bridge,
        } => {
            let config = load_config(config_file, &bridge)?;
            commands::read::run_read(config, addr, count, image.as_deref())?;
        }
        Commands::Write {
            addr,
            words,
            bridge,
        } => {
            let config = load_config(config_file, &bridge)?;
            commands::write::run_write(config, addr, &words)?;
        }
        Commands::Timing { bridge } => {
            let config = load_config(config_file, &bridge)?;
            commands::timing::run_timing(&config);
        }
        Commands::Trace {
            addr,
            count,
            bridge,
        } => {
            let config = load_config(config_file, &bridge)?;
            commands::trace::run_trace(config, addr, count)?;
        }
    }

    Ok(())
}

/// Build the bridge configuration from the config file and `-o` overrides
fn load_config(path: Option<&Path>, args: &BridgeArgs) -> Result<BridgeConfig, CliError> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            let config = BridgeConfig::from_toml(&text)?;
            log::info!("Loaded bridge config from {}", path.display());
            config
        }
        None => BridgeConfig::default(),
    };

    if let Some(options) = &args.options {
        let pairs: Vec<(&str, &str)> = split_options(options).collect();
        config.apply_options(&pairs)?;
    }

    Ok(config)
}
