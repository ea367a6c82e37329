//! Error types for qspiram-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

/// Which configuration option failed to parse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionError {
    /// The key is not a known bridge option
    UnknownKey,
    /// The value could not be parsed for this key
    BadValue,
}

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Configuration errors
    /// Lane count is not 1, 2 or 4
    InvalidLaneCount(u8),
    /// Two parts of the design disagree on the lane count
    LaneMismatch {
        /// Lane count that was required
        expected: u8,
        /// Lane count that was found
        found: u8,
    },
    /// Bus word width is not 16, 32 or 64 bits
    InvalidDataWidth(u32),
    /// A `key=value` configuration option was rejected
    InvalidOption(OptionError),

    // Protocol errors
    /// A request was submitted while another one is still waiting for its ack
    RequestPending,
    /// The word address does not fit in the 24-bit device address space
    AddressOutOfRange(u32),
}

impl fmt::Display for OptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownKey => write!(f, "unknown option"),
            Self::BadValue => write!(f, "invalid option value"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLaneCount(n) => {
                write!(f, "invalid lane count {} (expected 1, 2 or 4)", n)
            }
            Self::LaneMismatch { expected, found } => {
                write!(
                    f,
                    "lane count mismatch: expected {} lanes, found {}",
                    expected, found
                )
            }
            Self::InvalidDataWidth(w) => {
                write!(f, "invalid data width {} (expected 16, 32 or 64)", w)
            }
            Self::InvalidOption(e) => write!(f, "{}", e),
            Self::RequestPending => write!(f, "a request is already in flight"),
            Self::AddressOutOfRange(addr) => {
                write!(f, "word address 0x{:08X} is beyond the 24-bit device range", addr)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

impl embedded_io::Error for Error {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            Self::AddressOutOfRange(_) => embedded_io::ErrorKind::InvalidInput,
            Self::RequestPending => embedded_io::ErrorKind::Other,
            _ => embedded_io::ErrorKind::InvalidData,
        }
    }
}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
