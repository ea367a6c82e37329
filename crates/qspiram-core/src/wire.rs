//! Wire-facing signals and the device seam
//!
//! The sequencer never touches devices directly. Every tick it produces a
//! [`WirePins`] snapshot and hands it to a [`WirePort`], which returns the
//! lanes it sampled from the two devices.
//!
//! ## Implementing a device
//!
//! Anything that can react to one clock of chip-select, clock and data lines
//! implements [`WireDevice`]. [`DevicePair`] then fans the shared control
//! lines out to two devices and routes each its own data group.
//!
//! ```ignore
//! let pair = DevicePair::new(ram_a, ram_b)?;
//! let mut bridge = Bridge::new(BridgeConfig::new(LaneCount::Quad), pair)?;
//! ```

use bitflags::bitflags;

use crate::error::{Error, Result};
use crate::serdes::LaneBits;
use crate::spi::LaneCount;

bitflags! {
    /// Control signals for one tick
    ///
    /// Chip-select is active low, so an idle bus has `CS_N` set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Control: u8 {
        /// Chip select, active low (shared by both devices)
        const CS_N          = 1 << 0;
        /// Clock runs this tick (shared by both devices)
        const CLOCK         = 1 << 1;
        /// Bridge drives the data lanes
        const OUTPUT_ENABLE = 1 << 2;
        /// Both devices receive the same lane group
        const GANG          = 1 << 3;
        /// Bus acknowledgment pulse
        const ACK           = 1 << 4;
    }
}

impl Default for Control {
    fn default() -> Self {
        Control::CS_N
    }
}

/// Everything the bridge drives during one tick
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WirePins {
    /// Control lines
    pub control: Control,
    /// Output lane group for device A (meaningful with `OUTPUT_ENABLE`)
    pub dq_a: u8,
    /// Output lane group for device B (meaningful with `OUTPUT_ENABLE`)
    pub dq_b: u8,
}

impl WirePins {
    /// Returns true if chip-select is asserted
    pub fn selected(&self) -> bool {
        !self.control.contains(Control::CS_N)
    }

    /// Returns true if the clock runs this tick
    pub fn clocked(&self) -> bool {
        self.control.contains(Control::CLOCK)
    }

    /// Returns true if the bridge drives the data lanes
    pub fn driving(&self) -> bool {
        self.control.contains(Control::OUTPUT_ENABLE)
    }

    /// The view of a single device
    pub fn for_device_a(&self) -> DevicePins {
        DevicePins {
            selected: self.selected(),
            clocked: self.clocked(),
            dq: self.driving().then_some(self.dq_a),
        }
    }

    /// The view of a single device
    pub fn for_device_b(&self) -> DevicePins {
        DevicePins {
            selected: self.selected(),
            clocked: self.clocked(),
            dq: self.driving().then_some(self.dq_b),
        }
    }
}

/// Pins as seen by one device
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DevicePins {
    /// Chip-select asserted
    pub selected: bool,
    /// A clock edge occurs this tick
    pub clocked: bool,
    /// Lane group driven by the bridge, `None` while its outputs are off
    pub dq: Option<u8>,
}

/// A single serial device on `lanes` data wires
pub trait WireDevice {
    /// Lane count the device is wired for
    fn lanes(&self) -> LaneCount;

    /// Advance the device by one tick
    ///
    /// Returns the lane group the device drives this tick, or `None` if its
    /// outputs are off. Undriven lanes read as zero.
    fn clock(&mut self, pins: DevicePins) -> Option<u8>;
}

/// The two-device side of the bridge
pub trait WirePort {
    /// Lane count of the attached devices
    fn lanes(&self) -> LaneCount;

    /// Present `pins` for one tick and return what was sampled on the lanes
    fn exchange(&mut self, pins: &WirePins) -> LaneBits;
}

impl<P: WirePort + ?Sized> WirePort for &mut P {
    fn lanes(&self) -> LaneCount {
        (**self).lanes()
    }

    fn exchange(&mut self, pins: &WirePins) -> LaneBits {
        (**self).exchange(pins)
    }
}

/// Two devices sharing clock and chip-select
#[derive(Debug)]
pub struct DevicePair<A, B> {
    a: A,
    b: B,
    lanes: LaneCount,
}

impl<A: WireDevice, B: WireDevice> DevicePair<A, B> {
    /// Pair two devices, which must agree on the lane count
    pub fn new(a: A, b: B) -> Result<Self> {
        let lanes = a.lanes();
        if b.lanes() != lanes {
            return Err(Error::LaneMismatch {
                expected: lanes.into(),
                found: b.lanes().into(),
            });
        }
        Ok(Self { a, b, lanes })
    }

    /// Device A (upper lane group of every data slice)
    pub fn a(&self) -> &A {
        &self.a
    }

    /// Device B (lower lane group of every data slice)
    pub fn b(&self) -> &B {
        &self.b
    }

    /// Mutable access to device A
    pub fn a_mut(&mut self) -> &mut A {
        &mut self.a
    }

    /// Mutable access to device B
    pub fn b_mut(&mut self) -> &mut B {
        &mut self.b
    }

    /// Split the pair back into its devices
    pub fn into_inner(self) -> (A, B) {
        (self.a, self.b)
    }
}

impl<A: WireDevice, B: WireDevice> WirePort for DevicePair<A, B> {
    fn lanes(&self) -> LaneCount {
        self.lanes
    }

    fn exchange(&mut self, pins: &WirePins) -> LaneBits {
        let mask = self.lanes.mask();
        let a = self.a.clock(pins.for_device_a()).unwrap_or(0) & mask;
        let b = self.b.clock(pins.for_device_b()).unwrap_or(0) & mask;
        LaneBits { a, b }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Fixed {
        lanes: LaneCount,
        out: Option<u8>,
        last: Option<DevicePins>,
    }

    impl WireDevice for Fixed {
        fn lanes(&self) -> LaneCount {
            self.lanes
        }

        fn clock(&mut self, pins: DevicePins) -> Option<u8> {
            self.last = Some(pins);
            self.out
        }
    }

    fn fixed(lanes: LaneCount, out: Option<u8>) -> Fixed {
        Fixed {
            lanes,
            out,
            last: None,
        }
    }

    #[test]
    fn test_pair_rejects_mismatched_lanes() {
        let err = DevicePair::new(fixed(LaneCount::Quad, None), fixed(LaneCount::Dual, None))
            .unwrap_err();
        assert_eq!(
            err,
            Error::LaneMismatch {
                expected: 4,
                found: 2
            }
        );
    }

    #[test]
    fn test_pair_routes_groups() {
        let mut pair = DevicePair::new(
            fixed(LaneCount::Quad, Some(0x1A)),
            fixed(LaneCount::Quad, None),
        )
        .unwrap();
        let pins = WirePins {
            control: Control::CLOCK | Control::OUTPUT_ENABLE,
            dq_a: 0x3,
            dq_b: 0xC,
        };
        let sample = pair.exchange(&pins);
        // Device A drives more bits than it has lanes; B is floating
        assert_eq!(sample, LaneBits { a: 0xA, b: 0x0 });
        let a = pair.a().last.unwrap();
        let b = pair.b().last.unwrap();
        assert!(a.selected && a.clocked);
        assert_eq!(a.dq, Some(0x3));
        assert_eq!(b.dq, Some(0xC));
    }

    #[test]
    fn test_outputs_off_hide_lanes() {
        let pins = WirePins {
            control: Control::CLOCK,
            dq_a: 0xF,
            dq_b: 0xF,
        };
        assert_eq!(pins.for_device_a().dq, None);
        assert!(WirePins::default().for_device_b() == DevicePins::default());
    }
}
