//! SPI framing types
//!
//! This module provides the lane configuration, the opcodes the bridge uses
//! and the command formatter that spreads an opcode across all lanes.

mod command;
mod lanes;
pub mod opcodes;

pub use command::{format_command, CommandSet, CommandWord};
pub use lanes::LaneCount;

/// Width of the address phase in bits (3-byte addressing)
pub const ADDRESS_BITS: u32 = 24;

/// Largest device byte address that fits in the address phase
pub const MAX_DEVICE_ADDRESS: u32 = (1 << ADDRESS_BITS) - 1;
