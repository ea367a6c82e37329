//! qspiram-core - Core library for the paired quad-SPI RAM bridge
//!
//! This crate turns ordinary memory-mapped read/write transactions into SPI
//! command sequences for two serial RAM chips wired side by side. Both chips
//! see the same command and address, while each one stores half of every data
//! word, so a quad configuration moves 8 data bits per clock.
//!
//! It is designed to be `no_std` compatible; the only thing `std` adds is
//! TOML configuration loading and `std::error::Error`.
//!
//! # Features
//!
//! - `std` - Enable standard library support and TOML configuration
//!
//! # Example
//!
//! ```ignore
//! use qspiram_core::{Bridge, BridgeConfig, LaneCount};
//!
//! fn copy_word<P: qspiram_core::wire::WirePort>(port: P) -> qspiram_core::Result<()> {
//!     let config = BridgeConfig::new(LaneCount::Quad);
//!     let mut bridge = Bridge::new(config, port)?;
//!     bridge.write(0x10, 0xDEAD_BEEF)?;
//!     let report = bridge.read(0x10)?;
//!     assert_eq!(report.data, 0xDEAD_BEEF);
//!     Ok(())
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod bridge;
pub mod bus;
pub mod config;
pub mod error;
pub mod io;
pub mod sequencer;
pub mod serdes;
pub mod spi;
pub mod trace;
pub mod wire;

pub use bridge::{Bridge, BridgeStats, TransactionReport};
pub use bus::{Access, Ack, BusRequest, Direction};
pub use config::{BridgeConfig, DataWidth, Endianness};
pub use error::{Error, Result};
pub use io::Cursor;
pub use spi::LaneCount;
pub use trace::TraceRecorder;
pub use wire::{DevicePair, WireDevice, WirePort};
