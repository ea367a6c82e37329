//! qspiram-dummy - In-memory serial RAM model for testing
//!
//! This crate provides a cycle-level model of a quad-SPI RAM chip that plugs
//! into the bridge's wire seam. Two of them make up a [`DummyPair`], which is
//! enough to run the whole bridge without hardware.
//!
//! The model understands exactly what the bridge sends: an 8-clock opcode on
//! IO0, a 24-bit address on all lanes, an optional dummy window, then data
//! with an auto-incrementing address until chip-select rises.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
use alloc::vec;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use qspiram_core::config::{BridgeConfig, DEFAULT_DUMMY_CYCLES};
use qspiram_core::spi::LaneCount;
#[cfg(feature = "alloc")]
use qspiram_core::{
    bridge::Bridge,
    error::Result,
    spi::{opcodes, MAX_DEVICE_ADDRESS},
    wire::{DevicePair, DevicePins, WireDevice},
};

/// Default memory size of one device (64 Mbit, like the APS6404L)
pub const DEFAULT_SIZE: usize = 8 * 1024 * 1024;

/// Configuration for one emulated RAM
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Data lanes the device is wired for
    pub lanes: LaneCount,
    /// Memory size in bytes; addresses wrap around at this size
    pub size: usize,
    /// Clocks between the address and the first read data bit
    pub dummy_cycles: u8,
    /// Re-run the dummy window when a read resumes after a clock stall
    pub refetch_after_stall: bool,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            lanes: LaneCount::Quad,
            size: DEFAULT_SIZE,
            dummy_cycles: DEFAULT_DUMMY_CYCLES,
            refetch_after_stall: true,
        }
    }
}

impl DummyConfig {
    /// Device settings matching what `config` expects of the devices
    pub fn for_bridge(config: &BridgeConfig) -> Self {
        Self {
            lanes: config.lanes,
            dummy_cycles: config.dummy_cycles,
            refetch_after_stall: config.burst_read_dummy,
            ..Self::default()
        }
    }

    /// Set the memory size
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }
}

/// Where the device is within a chip-select session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    /// Chip-select high
    #[default]
    Deselected,
    /// Collecting the opcode on IO0
    Command,
    /// Collecting the 24-bit address
    Address,
    /// Read latency, outputs off
    Dummy,
    /// Driving read data
    ReadData,
    /// Sampling write data
    WriteData,
    /// Unknown opcode, waiting for chip-select to rise
    Ignore,
}

/// Emulated serial RAM
#[cfg(feature = "alloc")]
#[derive(Debug, Clone)]
pub struct SpiRamDevice {
    config: DummyConfig,
    data: Vec<u8>,
    phase: Phase,
    opcode: u8,
    shift: u32,
    count: u32,
    address: u32,
    commands: u32,
}

#[cfg(feature = "alloc")]
impl SpiRamDevice {
    /// Create a device with zeroed memory
    pub fn new(config: DummyConfig) -> Self {
        let data = vec![0; config.size.max(1)];
        Self {
            config,
            data,
            phase: Phase::Deselected,
            opcode: 0,
            shift: 0,
            count: 0,
            address: 0,
            commands: 0,
        }
    }

    /// Create a device with pre-filled memory
    pub fn with_data(config: DummyConfig, initial_data: &[u8]) -> Self {
        let mut ram = Self::new(config);
        let len = core::cmp::min(initial_data.len(), ram.data.len());
        ram.data[..len].copy_from_slice(&initial_data[..len]);
        ram
    }

    /// Get a reference to the memory contents
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the memory contents
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Opcodes received since creation
    pub fn command_count(&self) -> u32 {
        self.commands
    }

    fn enter(&mut self, phase: Phase) {
        self.phase = phase;
        self.shift = 0;
        self.count = 0;
    }

    fn index(&self) -> usize {
        self.address as usize % self.data.len()
    }

    fn advance(&mut self) {
        self.address = (self.address + 1) & MAX_DEVICE_ADDRESS;
    }

    fn arm_read(&mut self) {
        if self.config.dummy_cycles > 0 {
            self.enter(Phase::Dummy);
        } else {
            self.enter(Phase::ReadData);
        }
    }

    fn decode_command(&mut self, opcode: u8) {
        self.opcode = opcode;
        self.commands += 1;
        if opcodes::is_read(opcode) || opcodes::is_write(opcode) {
            self.enter(Phase::Address);
        } else {
            log::warn!("Dummy RAM: ignoring unsupported opcode 0x{:02X}", opcode);
            self.enter(Phase::Ignore);
        }
    }

    fn start_data(&mut self, address: u32) {
        log::trace!("Dummy RAM: opcode 0x{:02X} @ 0x{:06X}", self.opcode, address);
        self.address = address;
        if opcodes::is_read(self.opcode) {
            self.arm_read();
        } else {
            self.enter(Phase::WriteData);
        }
    }

    fn shift_out(&mut self) -> u8 {
        let lanes = self.config.lanes;
        let byte = self.data[self.index()];
        let out = (byte >> (8 - lanes.lanes() - self.count)) & lanes.mask();
        self.count += lanes.lanes();
        if self.count == 8 {
            self.count = 0;
            self.advance();
        }
        out
    }

    fn shift_in(&mut self, dq: u8) {
        let lanes = self.config.lanes;
        self.shift = (self.shift << lanes.lanes()) | (dq & lanes.mask()) as u32;
        self.count += lanes.lanes();
        if self.count == 8 {
            let index = self.index();
            self.data[index] = self.shift as u8;
            self.shift = 0;
            self.count = 0;
            self.advance();
        }
    }
}

#[cfg(feature = "alloc")]
impl WireDevice for SpiRamDevice {
    fn lanes(&self) -> LaneCount {
        self.config.lanes
    }

    fn clock(&mut self, pins: DevicePins) -> Option<u8> {
        if !pins.selected {
            if self.phase == Phase::WriteData && self.count != 0 {
                log::warn!("Dummy RAM: chip-select rose inside a byte, {} bits dropped", self.count);
            }
            self.enter(Phase::Deselected);
            return None;
        }
        if self.phase == Phase::Deselected {
            self.enter(Phase::Command);
        }
        if !pins.clocked {
            // Clock stalled on a byte boundary
            if self.phase == Phase::ReadData && self.count == 0 && self.config.refetch_after_stall {
                self.arm_read();
            }
            return None;
        }

        let lanes = self.config.lanes;
        let dq = pins.dq.unwrap_or(0);
        match self.phase {
            Phase::Command => {
                self.shift = (self.shift << 1) | (dq & 1) as u32;
                self.count += 1;
                if self.count == 8 {
                    self.decode_command(self.shift as u8);
                }
                None
            }
            Phase::Address => {
                self.shift = (self.shift << lanes.lanes()) | (dq & lanes.mask()) as u32;
                self.count += 1;
                if self.count == lanes.address_cycles() {
                    self.start_data(self.shift & MAX_DEVICE_ADDRESS);
                }
                None
            }
            Phase::Dummy => {
                self.count += 1;
                if self.count >= self.config.dummy_cycles as u32 {
                    self.enter(Phase::ReadData);
                }
                None
            }
            Phase::ReadData => Some(self.shift_out()),
            Phase::WriteData => {
                self.shift_in(dq);
                None
            }
            Phase::Deselected | Phase::Ignore => None,
        }
    }
}

/// Two emulated RAMs sharing clock and chip-select
#[cfg(feature = "alloc")]
pub type DummyPair = DevicePair<SpiRamDevice, SpiRamDevice>;

/// Create a pair of identical devices
#[cfg(feature = "alloc")]
pub fn new_pair(config: DummyConfig) -> Result<DummyPair> {
    DevicePair::new(SpiRamDevice::new(config.clone()), SpiRamDevice::new(config))
}

/// Create a bridge over a fresh pair of `size`-byte devices set up for `config`
#[cfg(feature = "alloc")]
pub fn new_bridge(config: BridgeConfig, size: usize) -> Result<Bridge<DummyPair>> {
    let devices = DummyConfig::for_bridge(&config).with_size(size);
    Bridge::new(config, new_pair(devices)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::{Read, Seek, SeekFrom, Write};
    use qspiram_core::config::{DataWidth, Endianness};
    use qspiram_core::io::Cursor;
    use qspiram_core::trace::TraceRecorder;
    use qspiram_core::wire::WirePort;

    const SIZE: usize = 0x1000;
    const ALL_LANES: [LaneCount; 3] = [LaneCount::Single, LaneCount::Dual, LaneCount::Quad];
    const ALL_WIDTHS: [DataWidth; 3] = [DataWidth::Bits16, DataWidth::Bits32, DataWidth::Bits64];

    fn pattern(address: u32, width: DataWidth) -> u64 {
        (0x0123_4567_89AB_CDEF_u64.rotate_left(address * 8) ^ address as u64) & width.mask()
    }

    #[test]
    fn test_round_trip_all_modes() {
        for lanes in ALL_LANES {
            for width in ALL_WIDTHS {
                let config = BridgeConfig::new(lanes).with_data_width(width);
                let mut bridge = new_bridge(config, SIZE).unwrap();
                for addr in [0, 1, 2, 0x40, 0x41, 7] {
                    bridge.write(addr, pattern(addr, width)).unwrap();
                }
                for addr in [7, 0, 1, 2, 0x41, 0x40] {
                    let report = bridge.read(addr).unwrap();
                    assert_eq!(
                        report.data,
                        pattern(addr, width),
                        "{} lanes, {}-bit, word {}",
                        lanes.lanes(),
                        width.bits(),
                        addr
                    );
                }
            }
        }
    }

    #[test]
    fn test_word_striped_across_devices() {
        let mut bridge = new_bridge(BridgeConfig::new(LaneCount::Quad), SIZE).unwrap();
        bridge.write(0x10, 0x1234_5678).unwrap();
        let pair = bridge.port();
        // Word 0x10 lives at byte 0x20 of each device, A takes the upper nibbles
        assert_eq!(pair.a().data()[0x20..0x22], [0x13, 0x57]);
        assert_eq!(pair.b().data()[0x20..0x22], [0x24, 0x68]);
        assert!(pair.a().data()[..0x20].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_halves_are_independent() {
        let mut bridge = new_bridge(BridgeConfig::new(LaneCount::Quad), SIZE).unwrap();
        bridge.port_mut().a_mut().data_mut()[0x8..0xA].copy_from_slice(&[0xFF, 0xFF]);
        assert_eq!(bridge.read(4).unwrap().data, 0xF0F0_F0F0);
        bridge.port_mut().b_mut().data_mut()[0x8..0xA].copy_from_slice(&[0xA5, 0x5A]);
        assert_eq!(bridge.read(4).unwrap().data, 0xFAF5_F5FA);
    }

    #[test]
    fn test_cold_and_burst_costs_with_devices() {
        for lanes in ALL_LANES {
            let config = BridgeConfig::new(lanes);
            let mut bridge = new_bridge(config, SIZE).unwrap();
            let cold = bridge.read(0x20).unwrap();
            assert_eq!(cold.cycles, config.cold_read_cycles());
            assert_eq!(cold.ticks, cold.cycles + 1);
            let burst = bridge.read(0x21).unwrap();
            assert!(burst.continued);
            assert_eq!(burst.cycles, config.burst_read_cycles());
            assert_eq!(burst.ticks, burst.cycles + 1);
        }
    }

    #[test]
    fn test_burst_reads_send_one_command() {
        for burst_read_dummy in [true, false] {
            let config = BridgeConfig::new(LaneCount::Quad).with_burst_read_dummy(burst_read_dummy);
            let mut bridge = new_bridge(config, SIZE).unwrap();
            for addr in 0..8 {
                bridge.write(addr, pattern(addr, DataWidth::Bits32)).unwrap();
            }
            assert_eq!(bridge.port().a().command_count(), 1);

            bridge.close_session().unwrap();
            for addr in 0..8 {
                let report = bridge.read(addr).unwrap();
                assert_eq!(report.continued, addr != 0);
                assert_eq!(report.data, pattern(addr, DataWidth::Bits32));
            }
            assert_eq!(bridge.port().a().command_count(), 2);
            assert_eq!(bridge.port().b().command_count(), 2);
        }
    }

    #[test]
    fn test_write_then_read_same_word() {
        let mut bridge = new_bridge(BridgeConfig::new(LaneCount::Dual), SIZE).unwrap();
        bridge.write(0x33, 0xFEED_FACE).unwrap();
        let report = bridge.read(0x33).unwrap();
        assert!(!report.continued);
        assert_eq!(report.data, 0xFEED_FACE);
        assert_eq!(bridge.port().a().command_count(), 2);
    }

    #[test]
    fn test_little_endian_round_trip() {
        let config = BridgeConfig::new(LaneCount::Quad).with_endianness(Endianness::Little);
        let mut bridge = new_bridge(config, SIZE).unwrap();
        bridge.write(0, 0x1122_3344).unwrap();
        assert_eq!(bridge.read(0).unwrap().data, 0x1122_3344);
        // Reversed on the wire: 0x44332211 striped over both devices
        assert_eq!(bridge.port().a().data()[..2], [0x43, 0x21]);
        assert_eq!(bridge.port().b().data()[..2], [0x43, 0x21]);
    }

    #[test]
    fn test_max_burst_and_idle_release() {
        let config = BridgeConfig::new(LaneCount::Quad)
            .with_max_burst(3)
            .with_idle_release(2);
        let mut bridge = new_bridge(config, SIZE).unwrap();
        for addr in 0..10 {
            bridge.write(addr, pattern(addr, DataWidth::Bits32)).unwrap();
        }
        assert_eq!(bridge.port().a().command_count(), 4);

        bridge.idle(5);
        assert_eq!(bridge.port().a().phase(), Phase::Deselected);
        for addr in 0..10 {
            assert_eq!(bridge.read(addr).unwrap().data, pattern(addr, DataWidth::Bits32));
        }
        assert_eq!(bridge.port().a().command_count(), 8);
    }

    #[test]
    fn test_zero_dummy_cycles() {
        let config = BridgeConfig::new(LaneCount::Single).with_dummy_cycles(0);
        let mut bridge = new_bridge(config, SIZE).unwrap();
        bridge.write(5, 0xA5A5_0F0F).unwrap();
        bridge.write(6, 0x0000_FFFF).unwrap();
        assert_eq!(bridge.read(5).unwrap().data, 0xA5A5_0F0F);
        assert_eq!(bridge.read(6).unwrap().data, 0x0000_FFFF);
    }

    #[test]
    fn test_unknown_opcode_is_ignored() {
        let mut ram = SpiRamDevice::new(DummyConfig::default().with_size(16));
        let mut clock = |dq: u8| {
            ram.clock(DevicePins {
                selected: true,
                clocked: true,
                dq: Some(dq),
            })
        };
        // 0x9F on IO0, other lanes high
        for bit in (0..8).rev() {
            clock(0xE | ((0x9F >> bit) & 1));
        }
        assert_eq!(clock(0xF), None);
        assert_eq!(ram.phase(), Phase::Ignore);
        assert_eq!(ram.command_count(), 1);
        ram.clock(DevicePins::default());
        assert_eq!(ram.phase(), Phase::Deselected);
    }

    #[test]
    fn test_address_wraps_at_device_size() {
        let mut bridge = new_bridge(BridgeConfig::new(LaneCount::Quad), 0x100).unwrap();
        bridge.write(0x80, 0xDEAD_BEEF).unwrap();
        assert_eq!(bridge.read(0).unwrap().data, 0xDEAD_BEEF);
    }

    #[test]
    fn test_cursor_unaligned_io() {
        let mut bridge = new_bridge(BridgeConfig::new(LaneCount::Quad), SIZE).unwrap();
        let mut cursor = Cursor::with_capacity(&mut bridge, 2 * SIZE as u64);
        assert_eq!(cursor.capacity(), 0x2000);

        cursor.write_all(&[0xAA; 16]).unwrap();
        assert_eq!(cursor.seek(SeekFrom::Start(3)).unwrap(), 3);
        cursor.write_all(b"hello").unwrap();
        assert_eq!(cursor.position(), 8);

        cursor.seek(SeekFrom::Start(0)).unwrap();
        let mut buf = [0u8; 16];
        cursor.read_exact(&mut buf).unwrap();
        assert_eq!(buf[..3], [0xAA; 3]);
        assert_eq!(&buf[3..8], b"hello");
        assert_eq!(buf[8..], [0xAA; 8]);

        cursor.seek(SeekFrom::Current(-12)).unwrap();
        let mut buf = [0u8; 2];
        cursor.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"el");

        // Bytes 0..4 form word 0, most significant byte first
        let bridge = cursor.into_inner();
        assert_eq!(bridge.read(0).unwrap().data, 0xAAAA_AA68);
    }

    #[test]
    fn test_cursor_bounds() {
        let mut bridge = new_bridge(BridgeConfig::new(LaneCount::Quad), SIZE).unwrap();
        let mut cursor = Cursor::with_capacity(&mut bridge, 10);
        assert_eq!(cursor.seek(SeekFrom::End(-2)).unwrap(), 8);
        assert_eq!(cursor.write(&[1, 2, 3, 4]).unwrap(), 2);
        assert!(cursor.write(&[5]).is_err());
        let mut buf = [0u8; 4];
        assert_eq!(cursor.read(&mut buf).unwrap(), 0);
        assert!(cursor.seek(SeekFrom::End(1)).is_err());
        assert!(cursor.seek(SeekFrom::Current(-11)).is_err());
        assert_eq!(cursor.position(), 10);

        cursor.seek(SeekFrom::Start(6)).unwrap();
        assert_eq!(cursor.read(&mut buf).unwrap(), 4);
        assert_eq!(buf, [0, 0, 1, 2]);
    }

    #[test]
    fn test_cursor_stream_ignores_endianness() {
        let mut images = [[0u8; 8], [0u8; 8]];
        for (image, endianness) in images.iter_mut().zip([Endianness::Big, Endianness::Little]) {
            let config = BridgeConfig::new(LaneCount::Quad).with_endianness(endianness);
            let mut bridge = new_bridge(config, SIZE).unwrap();
            Cursor::new(&mut bridge).write_all(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
            image[..4].copy_from_slice(&bridge.port().a().data()[..4]);
            image[4..].copy_from_slice(&bridge.port().b().data()[..4]);
        }
        assert_eq!(images[0], images[1]);
    }

    #[test]
    fn test_trace_shows_single_command_for_burst() {
        let config = BridgeConfig::new(LaneCount::Quad);
        let pair = new_pair(DummyConfig::for_bridge(&config).with_size(SIZE)).unwrap();
        let recorder: TraceRecorder<DummyPair, 256> = TraceRecorder::new(pair);
        let mut bridge = Bridge::new(config, recorder).unwrap();
        bridge.write(0, 1).unwrap();
        bridge.write(1, 2).unwrap();
        bridge.write(2, 3).unwrap();

        let trace = bridge.port();
        assert_eq!(trace.lanes(), LaneCount::Quad);
        let deselected = trace.entries().filter(|e| !e.pins.selected()).count();
        assert_eq!(deselected, 1);
        assert_eq!(trace.entries().filter(|e| e.is_ack()).count(), 3);
        assert_eq!(trace.inner().a().command_count(), 1);
    }
}
