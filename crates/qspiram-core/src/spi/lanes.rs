//! SPI lane configuration

use core::fmt;

use super::{opcodes, ADDRESS_BITS};
use crate::error::{Error, Result};

/// Number of parallel data wires per device
///
/// Command, address and data all travel on the same lanes. Only lane 0 carries
/// meaning during the command phase (see [`format_command`](super::format_command)).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub enum LaneCount {
    /// Standard SPI: 1-1-1
    Single,
    /// Dual I/O: one opcode bit per clock on IO0, everything else on 2 lines
    Dual,
    /// Quad I/O: one opcode bit per clock on IO0, everything else on 4 lines
    #[default]
    Quad,
}

impl LaneCount {
    /// Returns the number of data lines
    pub const fn lanes(&self) -> u32 {
        match self {
            Self::Single => 1,
            Self::Dual => 2,
            Self::Quad => 4,
        }
    }

    /// Bit mask covering one lane group
    pub const fn mask(&self) -> u8 {
        match self {
            Self::Single => 0x1,
            Self::Dual => 0x3,
            Self::Quad => 0xF,
        }
    }

    /// Width of an interleaved command word in bits (`8 * lanes`)
    pub const fn command_bits(&self) -> u32 {
        8 * self.lanes()
    }

    /// Clocks needed to shift out a command word
    pub const fn command_cycles(&self) -> u32 {
        self.command_bits() / self.lanes()
    }

    /// Clocks needed to shift out the 24-bit address
    pub const fn address_cycles(&self) -> u32 {
        ADDRESS_BITS / self.lanes()
    }

    /// Clocks needed to move one bus word of `width_bits` across both devices
    pub const fn data_cycles(&self, width_bits: u32) -> u32 {
        width_bits / (2 * self.lanes())
    }

    /// Read opcode used for this lane count
    pub const fn read_opcode(&self) -> u8 {
        match self {
            Self::Single => opcodes::FAST_READ,
            Self::Dual => opcodes::DIOR,
            Self::Quad => opcodes::QIOR,
        }
    }

    /// Write opcode used for this lane count
    pub const fn write_opcode(&self) -> u8 {
        match self {
            Self::Single | Self::Dual => opcodes::WRITE,
            Self::Quad => opcodes::QIOW,
        }
    }
}

impl TryFrom<u8> for LaneCount {
    type Error = Error;

    fn try_from(lanes: u8) -> Result<Self> {
        match lanes {
            1 => Ok(Self::Single),
            2 => Ok(Self::Dual),
            4 => Ok(Self::Quad),
            n => Err(Error::InvalidLaneCount(n)),
        }
    }
}

impl From<LaneCount> for u8 {
    fn from(lanes: LaneCount) -> u8 {
        lanes.lanes() as u8
    }
}

impl fmt::Display for LaneCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => write!(f, "single (1-1-1)"),
            Self::Dual => write!(f, "dual I/O (1-2-2)"),
            Self::Quad => write!(f, "quad I/O (1-4-4)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_from_rejects_invalid_counts() {
        assert_eq!(LaneCount::try_from(4), Ok(LaneCount::Quad));
        assert_eq!(LaneCount::try_from(2), Ok(LaneCount::Dual));
        assert_eq!(LaneCount::try_from(1), Ok(LaneCount::Single));
        for n in [0u8, 3, 5, 8, 255] {
            assert_eq!(LaneCount::try_from(n), Err(Error::InvalidLaneCount(n)));
        }
    }

    #[test]
    fn test_phase_cycles() {
        assert_eq!(LaneCount::Quad.command_cycles(), 8);
        assert_eq!(LaneCount::Quad.address_cycles(), 6);
        assert_eq!(LaneCount::Quad.data_cycles(32), 4);
        assert_eq!(LaneCount::Dual.address_cycles(), 12);
        assert_eq!(LaneCount::Single.address_cycles(), 24);
        assert_eq!(LaneCount::Single.data_cycles(32), 16);
    }
}
