//! Bus-facing request and response types
//!
//! The memory-mapped transport itself lives outside this crate. What it
//! hands over is one [`BusRequest`] at a time, held until the bridge answers
//! it with a single [`Ack`].

use core::fmt;

/// Transfer direction of a bus transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Host reads from the devices
    Read,
    /// Host writes to the devices
    Write,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// What a request asks for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    /// Read one bus word
    Read,
    /// Write one bus word
    Write(u64),
}

/// One memory-mapped bus transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusRequest {
    /// Word address on the bus
    pub address: u32,
    /// Read or write (with data)
    pub access: Access,
}

impl BusRequest {
    /// Create a read request
    pub const fn read(address: u32) -> Self {
        Self {
            address,
            access: Access::Read,
        }
    }

    /// Create a write request
    pub const fn write(address: u32, data: u64) -> Self {
        Self {
            address,
            access: Access::Write(data),
        }
    }

    /// Direction of this request
    pub const fn direction(&self) -> Direction {
        match self.access {
            Access::Read => Direction::Read,
            Access::Write(_) => Direction::Write,
        }
    }

    /// Data to write, if this is a write
    pub const fn write_data(&self) -> Option<u64> {
        match self.access {
            Access::Read => None,
            Access::Write(data) => Some(data),
        }
    }
}

/// Single-cycle acknowledgment retiring a request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ack {
    /// The request being retired
    pub request: BusRequest,
    /// Read data, valid only on this cycle (zero for writes)
    pub data: u64,
}
