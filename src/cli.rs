//! CLI argument parsing

use clap::{Parser, Subcommand};
use qspiram_core::LaneCount;
use std::path::PathBuf;

/// Parse a string as a hex or decimal u64
fn parse_hex_u64(s: &str) -> Result<u64, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(&hex.replace('_', ""), 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u64>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    let value = parse_hex_u64(s)?;
    u32::try_from(value).map_err(|_| format!("Value out of range: {}", s))
}

/// Parse an opcode byte
fn parse_opcode(s: &str) -> Result<u8, String> {
    let value = parse_hex_u64(s)?;
    u8::try_from(value).map_err(|_| format!("Opcode must fit in one byte: {}", s))
}

/// Parse a lane count (1, 2 or 4)
fn parse_lanes(s: &str) -> Result<LaneCount, String> {
    let n: u8 = s.parse().map_err(|e| format!("Invalid lane count: {}", e))?;
    LaneCount::try_from(n).map_err(|e| e.to_string())
}

#[derive(Parser)]
#[command(name = "qspiram")]
#[command(author, version, about = "Paired quad-SPI RAM bridge simulator", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Bridge configuration file (TOML format)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Bridge options shared across commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BridgeArgs {
    /// Bridge options overriding the config file
    /// (e.g. lanes=2,dummy=6,endian=little,width=64,max-burst=16)
    #[arg(short = 'o', long = "options")]
    pub options: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the lane-interleaved command word for an opcode
    FormatCmd {
        /// Opcode (hex, e.g. 0xEB)
        #[arg(value_parser = parse_opcode)]
        opcode: u8,

        /// Data lanes per device (1, 2 or 4)
        #[arg(short, long, default_value = "4", value_parser = parse_lanes)]
        lanes: LaneCount,
    },

    /// Read words from the simulated RAM pair
    Read {
        /// First word address (hex or decimal)
        #[arg(short, long, value_parser = parse_hex_u32)]
        addr: u32,

        /// Number of consecutive words
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,

        /// Preload this image at the first word address before reading
        #[arg(short, long)]
        image: Option<PathBuf>,

        #[command(flatten)]
        bridge: BridgeArgs,
    },

    /// Write words to the simulated RAM pair and read them back
    Write {
        /// First word address (hex or decimal)
        #[arg(short, long, value_parser = parse_hex_u32)]
        addr: u32,

        /// Words to write at consecutive addresses
        #[arg(required = true, value_parser = parse_hex_u64)]
        words: Vec<u64>,

        #[command(flatten)]
        bridge: BridgeArgs,
    },

    /// Show cycle costs for the configuration
    Timing {
        #[command(flatten)]
        bridge: BridgeArgs,
    },

    /// Dump the wire activity of a burst read, one line per tick
    Trace {
        /// First word address (hex or decimal)
        #[arg(short, long, value_parser = parse_hex_u32)]
        addr: u32,

        /// Number of consecutive words
        #[arg(short = 'n', long, default_value_t = 2)]
        count: u32,

        #[command(flatten)]
        bridge: BridgeArgs,
    },
}
