//! Command word formatting

use super::LaneCount;
use crate::bus::Direction;

/// An opcode interleaved across every lane of one device
///
/// The word is `8 * lanes` bits wide. Bit `b * lanes` carries opcode bit `b`
/// (the IO0 slot of that clock), every other bit is held high.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CommandWord {
    opcode: u8,
    lanes: LaneCount,
    value: u32,
}

impl CommandWord {
    /// The opcode this word was built from
    pub const fn opcode(&self) -> u8 {
        self.opcode
    }

    /// The wire-ready value
    pub const fn value(&self) -> u32 {
        self.value
    }

    /// Width of the word in bits
    pub const fn bits(&self) -> u32 {
        self.lanes.command_bits()
    }
}

/// Spread `opcode` across all lanes of a single device
///
/// Multi-I/O parts still take their opcode on IO0 only, but every lane has
/// to sit at a defined level while the opcode is clocked in. The unused lanes
/// are driven high. For quad I/O fast read (`0xEB`) this gives `0xFFFEFEFF`;
/// for a single lane the opcode is returned unchanged.
pub const fn format_command(opcode: u8, lanes: LaneCount) -> CommandWord {
    let width = lanes.command_bits();
    let step = lanes.lanes();
    let mut value: u32 = if width == 32 {
        u32::MAX
    } else {
        (1 << width) - 1
    };

    let mut b = 0;
    while b < 8 {
        if (opcode >> b) & 1 == 0 {
            value &= !(1 << (b * step));
        }
        b += 1;
    }

    CommandWord {
        opcode,
        lanes,
        value,
    }
}

/// The two command words a bridge ever sends, built once at construction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandSet {
    /// Fast-read command for the configured lane count
    pub read: CommandWord,
    /// Write command for the configured lane count
    pub write: CommandWord,
}

impl CommandSet {
    /// Format the read and write opcodes for `lanes`
    pub const fn new(lanes: LaneCount) -> Self {
        Self {
            read: format_command(lanes.read_opcode(), lanes),
            write: format_command(lanes.write_opcode(), lanes),
        }
    }

    /// Command word for a transfer in `direction`
    pub const fn for_direction(&self, direction: Direction) -> CommandWord {
        match direction {
            Direction::Read => self.read,
            Direction::Write => self.write,
        }
    }
}
