//! Byte-stream access through the bridge
//!
//! [`Cursor`] exposes the word-addressed bus as a flat byte array through the
//! `embedded-io` traits. Sequential access turns into sequential bus words,
//! which the sequencer serves as bursts.
//!
//! Bytes are laid out in the configured bus byte order: byte 0 of a word is
//! the most significant one with [`Endianness::Big`] and the least significant
//! one with [`Endianness::Little`]. Either way, byte 0 is the first byte
//! shifted onto the wire, so the same stream leaves the same image in the
//! devices. Writes that cover part of a word read the word back first.

use embedded_io::{ErrorType, Read, Seek, SeekFrom, Write};

use crate::bridge::Bridge;
use crate::config::{DataWidth, Endianness};
use crate::error::{Error, Result};
use crate::wire::WirePort;

/// Split a bus word into bytes in stream order
///
/// Only the first `width.bytes()` entries are meaningful.
pub fn word_to_bytes(word: u64, width: DataWidth, endianness: Endianness) -> [u8; 8] {
    let word = word & width.mask();
    match endianness {
        Endianness::Big => (word << (64 - width.bits())).to_be_bytes(),
        Endianness::Little => word.to_le_bytes(),
    }
}

/// Assemble a bus word from `width.bytes()` bytes in stream order
pub fn bytes_to_word(bytes: &[u8], width: DataWidth, endianness: Endianness) -> u64 {
    let bytes = &bytes[..width.bytes()];
    match endianness {
        Endianness::Big => bytes.iter().fold(0, |acc, &b| (acc << 8) | b as u64),
        Endianness::Little => bytes.iter().rev().fold(0, |acc, &b| (acc << 8) | b as u64),
    }
}

/// Seekable byte cursor over a [`Bridge`]
pub struct Cursor<'a, P> {
    bridge: &'a mut Bridge<P>,
    position: u64,
    capacity: u64,
}

impl<'a, P: WirePort> Cursor<'a, P> {
    /// Cursor over the whole 24-bit device address space
    pub fn new(bridge: &'a mut Bridge<P>) -> Self {
        let capacity = bridge.word_count() as u64 * bridge.config().data_width.bytes() as u64;
        Self {
            bridge,
            position: 0,
            capacity,
        }
    }

    /// Cursor limited to the first `capacity` bytes
    ///
    /// Useful when the attached devices are smaller than the address space.
    pub fn with_capacity(bridge: &'a mut Bridge<P>, capacity: u64) -> Self {
        let mut cursor = Self::new(bridge);
        cursor.capacity = cursor.capacity.min(capacity);
        cursor
    }

    /// Current byte offset
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Size of the byte array
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Give back the bridge
    pub fn into_inner(self) -> &'a mut Bridge<P> {
        self.bridge
    }

    fn width(&self) -> DataWidth {
        self.bridge.config().data_width
    }

    fn endianness(&self) -> Endianness {
        self.bridge.config().endianness
    }

    /// Word address and byte offset within it
    fn locate(&self, position: u64) -> (u32, usize) {
        let bytes = self.width().bytes() as u64;
        ((position / bytes) as u32, (position % bytes) as usize)
    }

    fn remaining(&self, wanted: usize) -> usize {
        let available = self.capacity.saturating_sub(self.position);
        usize::try_from(available).map_or(wanted, |a| a.min(wanted))
    }
}

impl<P: WirePort> ErrorType for Cursor<'_, P> {
    type Error = Error;
}

impl<P: WirePort> Read for Cursor<'_, P> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let length = self.remaining(buf.len());
        let (width, endianness) = (self.width(), self.endianness());

        let mut done = 0;
        while done < length {
            let (address, offset) = self.locate(self.position);
            let word = self.bridge.read(address)?.data;
            let bytes = word_to_bytes(word, width, endianness);
            let n = usize::min(width.bytes() - offset, length - done);
            buf[done..done + n].copy_from_slice(&bytes[offset..offset + n]);
            done += n;
            self.position += n as u64;
        }
        Ok(length)
    }
}

impl<P: WirePort> Write for Cursor<'_, P> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let length = self.remaining(buf.len());
        if length == 0 && !buf.is_empty() {
            return Err(Error::AddressOutOfRange(self.bridge.word_count()));
        }
        let (width, endianness) = (self.width(), self.endianness());

        let mut done = 0;
        while done < length {
            let (address, offset) = self.locate(self.position);
            let n = usize::min(width.bytes() - offset, length - done);
            let mut bytes = if n == width.bytes() {
                [0; 8]
            } else {
                let word = self.bridge.read(address)?.data;
                word_to_bytes(word, width, endianness)
            };
            bytes[offset..offset + n].copy_from_slice(&buf[done..done + n]);
            self.bridge
                .write(address, bytes_to_word(&bytes, width, endianness))?;
            done += n;
            self.position += n as u64;
        }
        Ok(length)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<P: WirePort> Seek for Cursor<'_, P> {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::End(offset) => i128::from(self.capacity) + i128::from(offset),
            SeekFrom::Current(offset) => i128::from(self.position) + i128::from(offset),
        };
        if target < 0 || target > i128::from(self.capacity) {
            let bytes = self.width().bytes() as i128;
            let word = (target / bytes).clamp(0, u32::MAX as i128) as u32;
            return Err(Error::AddressOutOfRange(word));
        }
        self.position = target as u64;
        Ok(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_bytes_big() {
        let bytes = word_to_bytes(0x1122_3344, DataWidth::Bits32, Endianness::Big);
        assert_eq!(bytes[..4], [0x11, 0x22, 0x33, 0x44]);
        let bytes = word_to_bytes(0xBEEF, DataWidth::Bits16, Endianness::Big);
        assert_eq!(bytes[..2], [0xBE, 0xEF]);
    }

    #[test]
    fn test_word_bytes_little() {
        let bytes = word_to_bytes(0x1122_3344, DataWidth::Bits32, Endianness::Little);
        assert_eq!(bytes[..4], [0x44, 0x33, 0x22, 0x11]);
    }

    #[test]
    fn test_bytes_to_word() {
        let raw = [1, 2, 3, 4, 5, 6, 7, 8];
        assert_eq!(bytes_to_word(&raw, DataWidth::Bits64, Endianness::Big), 0x0102_0304_0506_0708);
        assert_eq!(bytes_to_word(&raw, DataWidth::Bits16, Endianness::Little), 0x0201);
        for endianness in [Endianness::Big, Endianness::Little] {
            let bytes = word_to_bytes(0xA1B2_C3D4, DataWidth::Bits32, endianness);
            assert_eq!(bytes_to_word(&bytes, DataWidth::Bits32, endianness), 0xA1B2_C3D4);
        }
    }

    #[test]
    fn test_stream_order_matches_device_order() {
        // Little endian reverses the word on the bus and again in the stream
        let width = DataWidth::Bits32;
        let bus = Endianness::Little.apply(0x1122_3344, width);
        let little = word_to_bytes(bus, width, Endianness::Little);
        let big = word_to_bytes(0x1122_3344, width, Endianness::Big);
        assert_eq!(little[..4], big[..4]);
    }
}
