//! SPI RAM opcodes used by the bridge
//!
//! Only the fast-read and write families are needed. Which member of each
//! family is sent depends on the lane count, see
//! [`LaneCount::read_opcode`](super::LaneCount::read_opcode).

// ============================================================================
// Read commands - 3-byte address
// ============================================================================

/// Fast Read (1-1-1, with dummy clocks)
pub const FAST_READ: u8 = 0x0B;
/// Dual I/O Fast Read (1-2-2)
pub const DIOR: u8 = 0xBB;
/// Quad I/O Fast Read (1-4-4)
pub const QIOR: u8 = 0xEB;

// ============================================================================
// Write commands - 3-byte address
// ============================================================================

/// Write / Page Program
pub const WRITE: u8 = 0x02;
/// Quad I/O Write (1-4-4)
pub const QIOW: u8 = 0x38;

/// Returns true if `opcode` is one of the read commands above
pub const fn is_read(opcode: u8) -> bool {
    matches!(opcode, FAST_READ | DIOR | QIOR)
}

/// Returns true if `opcode` is one of the write commands above
pub const fn is_write(opcode: u8) -> bool {
    matches!(opcode, WRITE | QIOW)
}
