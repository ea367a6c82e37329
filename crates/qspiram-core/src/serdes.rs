//! Shared transmit/receive shift register
//!
//! One register serves every phase of a transaction. Outgoing values are
//! loaded left-aligned and leave from the top; incoming bits enter at the
//! bottom. Bit `i` of a lane group travels on DQ`i`.
//!
//! ```text
//!  transmit, gang=1:   [ A=B ][ ........ ] << lanes
//!  transmit, gang=0:   [  A  ][  B  ][ .. ] << 2*lanes
//!  receive:            [ ........ ][  A  ][  B  ]  <- 2*lanes new bits
//! ```

use crate::spi::LaneCount;

/// Bits presented to the two devices in one cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LaneBits {
    /// Lane group for device A
    pub a: u8,
    /// Lane group for device B
    pub b: u8,
}

/// Serializer/deserializer shared by every phase
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShiftRegister {
    bits: u64,
    width: u32,
    lanes: LaneCount,
}

impl ShiftRegister {
    /// Create an empty register `width` bits wide (at most 64)
    pub fn new(width: u32, lanes: LaneCount) -> Self {
        debug_assert!(width <= 64 && width >= 2 * lanes.lanes());
        Self {
            bits: 0,
            width,
            lanes,
        }
    }

    /// Register width in bits
    pub fn width(&self) -> u32 {
        self.width
    }

    fn mask(&self) -> u64 {
        if self.width == 64 {
            u64::MAX
        } else {
            (1 << self.width) - 1
        }
    }

    /// Load `value_bits` bits of `value` for transmission, most significant first
    pub fn load_transmit(&mut self, value: u64, value_bits: u32) {
        debug_assert!(value_bits <= self.width);
        let value = if value_bits == 64 {
            value
        } else {
            value & ((1 << value_bits) - 1)
        };
        self.bits = value << (self.width - value_bits);
    }

    /// Drop the register contents before a receive phase
    pub fn clear(&mut self) {
        self.bits = 0;
    }

    /// Lane groups the next shift would emit, without shifting
    pub fn peek_lanes(&self, gang: bool) -> LaneBits {
        let n = self.lanes.lanes();
        let mask = self.lanes.mask() as u64;
        let a = ((self.bits >> (self.width - n)) & mask) as u8;
        let b = if gang {
            a
        } else {
            ((self.bits >> (self.width - 2 * n)) & mask) as u8
        };
        LaneBits { a, b }
    }

    /// Emit one cycle worth of lane groups and shift them out
    ///
    /// With `gang` set both devices get the same top group and the register
    /// moves by one group; otherwise device B takes the group below device A's
    /// and the register moves by two.
    pub fn shift_out_lanes(&mut self, gang: bool) -> LaneBits {
        let out = self.peek_lanes(gang);
        let n = self.lanes.lanes();
        let shift = if gang { n } else { 2 * n };
        self.bits = (self.bits << shift) & self.mask();
        out
    }

    /// Capture one cycle worth of lane groups from both devices
    pub fn shift_in_lanes(&mut self, sample: LaneBits) {
        let n = self.lanes.lanes();
        let mask = self.lanes.mask() as u64;
        let incoming = ((sample.a as u64 & mask) << n) | (sample.b as u64 & mask);
        self.bits = ((self.bits << (2 * n)) | incoming) & self.mask();
    }

    /// Raw register contents
    pub fn current_value(&self) -> u64 {
        self.bits
    }
}
