//! Bridge configuration
//!
//! Everything here is fixed when the bridge is built. A configuration can be
//! assembled with the `with_*` builder methods, parsed from `key=value` pairs
//! (the format used on the command line), or, with the `std` feature, loaded
//! from TOML.

use core::fmt;

use crate::error::{Error, OptionError, Result};
use crate::spi::LaneCount;

/// Default number of dummy clocks between address and read data
pub const DEFAULT_DUMMY_CYCLES: u8 = 5;

/// Byte order of the bus-facing data word
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Endianness {
    /// Shift register value is the bus word
    #[default]
    Big,
    /// Bus word is the shift register value with its bytes reversed
    Little,
}

impl Endianness {
    /// Convert between shift register order and bus order
    ///
    /// The conversion is its own inverse, so the same call is used on the way
    /// in (write data) and on the way out (read data).
    pub const fn apply(&self, value: u64, width: DataWidth) -> u64 {
        let value = value & width.mask();
        match self {
            Self::Big => value,
            Self::Little => value.swap_bytes() >> (64 - width.bits()),
        }
    }
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Big => write!(f, "big"),
            Self::Little => write!(f, "little"),
        }
    }
}

/// Width of a bus word
///
/// Each of the two devices stores half of every word.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u32", into = "u32"))]
pub enum DataWidth {
    /// 16-bit bus words
    Bits16,
    /// 32-bit bus words
    #[default]
    Bits32,
    /// 64-bit bus words
    Bits64,
}

impl DataWidth {
    /// Width in bits
    pub const fn bits(&self) -> u32 {
        match self {
            Self::Bits16 => 16,
            Self::Bits32 => 32,
            Self::Bits64 => 64,
        }
    }

    /// Width in bytes
    pub const fn bytes(&self) -> usize {
        (self.bits() / 8) as usize
    }

    /// Bytes of every word held by each device
    pub const fn device_bytes(&self) -> u32 {
        self.bits() / 16
    }

    /// Mask selecting the low `bits()` bits
    pub const fn mask(&self) -> u64 {
        match self {
            Self::Bits64 => u64::MAX,
            _ => (1 << self.bits()) - 1,
        }
    }
}

impl TryFrom<u32> for DataWidth {
    type Error = Error;

    fn try_from(bits: u32) -> Result<Self> {
        match bits {
            16 => Ok(Self::Bits16),
            32 => Ok(Self::Bits32),
            64 => Ok(Self::Bits64),
            n => Err(Error::InvalidDataWidth(n)),
        }
    }
}

impl From<DataWidth> for u32 {
    fn from(width: DataWidth) -> u32 {
        width.bits()
    }
}

/// Construction-time bridge configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "kebab-case"))]
pub struct BridgeConfig {
    /// Data lanes per device
    pub lanes: LaneCount,
    /// Clocks between the address phase and the first captured read bit
    pub dummy_cycles: u8,
    /// Byte order of the bus-facing data word
    pub endianness: Endianness,
    /// Bus word width
    pub data_width: DataWidth,
    /// Re-run the dummy window before a continued read
    pub burst_read_dummy: bool,
    /// Most transactions one chip-select session may serve (`None` = unbounded)
    pub max_burst: Option<u32>,
    /// Close an open session after this many ticks without a request
    pub idle_release: Option<u32>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            lanes: LaneCount::Quad,
            dummy_cycles: DEFAULT_DUMMY_CYCLES,
            endianness: Endianness::Big,
            data_width: DataWidth::Bits32,
            burst_read_dummy: true,
            max_burst: None,
            idle_release: None,
        }
    }
}

impl BridgeConfig {
    /// Create a configuration with default settings for `lanes`
    pub fn new(lanes: LaneCount) -> Self {
        Self {
            lanes,
            ..Default::default()
        }
    }

    /// Set the number of dummy cycles
    pub fn with_dummy_cycles(mut self, cycles: u8) -> Self {
        self.dummy_cycles = cycles;
        self
    }

    /// Set the bus byte order
    pub fn with_endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = endianness;
        self
    }

    /// Set the bus word width
    pub fn with_data_width(mut self, width: DataWidth) -> Self {
        self.data_width = width;
        self
    }

    /// Choose whether a continued read re-runs the dummy window
    pub fn with_burst_read_dummy(mut self, enabled: bool) -> Self {
        self.burst_read_dummy = enabled;
        self
    }

    /// Limit the number of transactions per chip-select session
    pub fn with_max_burst(mut self, max: u32) -> Self {
        self.max_burst = Some(max);
        self
    }

    /// Close idle sessions after `ticks` ticks without a request
    pub fn with_idle_release(mut self, ticks: u32) -> Self {
        self.idle_release = Some(ticks);
        self
    }

    /// Width of the shift register: `max(command, address, data)`
    pub const fn register_bits(&self) -> u32 {
        let mut bits = self.lanes.command_bits();
        if crate::spi::ADDRESS_BITS > bits {
            bits = crate::spi::ADDRESS_BITS;
        }
        if self.data_width.bits() > bits {
            bits = self.data_width.bits();
        }
        bits
    }

    /// Clocked cycles of a read that opens a new session
    pub const fn cold_read_cycles(&self) -> u32 {
        self.lanes.command_cycles()
            + self.lanes.address_cycles()
            + self.dummy_cycles as u32
            + self.lanes.data_cycles(self.data_width.bits())
    }

    /// Clocked cycles of a write that opens a new session
    pub const fn cold_write_cycles(&self) -> u32 {
        self.lanes.command_cycles()
            + self.lanes.address_cycles()
            + self.lanes.data_cycles(self.data_width.bits())
    }

    /// Clocked cycles of a read continuing an open session
    pub const fn burst_read_cycles(&self) -> u32 {
        let dummy = if self.burst_read_dummy {
            self.dummy_cycles as u32
        } else {
            0
        };
        dummy + self.lanes.data_cycles(self.data_width.bits())
    }

    /// Clocked cycles of a write continuing an open session
    pub const fn burst_write_cycles(&self) -> u32 {
        self.lanes.data_cycles(self.data_width.bits())
    }

    /// Load a configuration from a TOML document
    ///
    /// Missing keys take their default value.
    #[cfg(feature = "std")]
    pub fn from_toml(text: &str) -> core::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

fn parse_number(value: &str) -> Result<u32> {
    let parsed = if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        value.parse::<u32>()
    };
    parsed.map_err(|_| Error::InvalidOption(OptionError::BadValue))
}

fn parse_bool(value: &str) -> Result<bool> {
    match value {
        "1" | "on" | "yes" | "true" => Ok(true),
        "0" | "off" | "no" | "false" => Ok(false),
        _ => Err(Error::InvalidOption(OptionError::BadValue)),
    }
}

/// Parse a bridge configuration from `key=value` pairs
///
/// Unspecified keys keep their defaults.
///
/// # Options
///
/// - `lanes=4` - data lanes per device (1, 2 or 4)
/// - `dummy=5` - dummy cycles before read data
/// - `endian=big` / `endian=little` - bus byte order
/// - `width=32` - bus word width (16, 32 or 64)
/// - `burst-dummy=on` - re-run the dummy window on continued reads
/// - `max-burst=16` - transactions per chip-select session (0 = unbounded)
/// - `idle-release=100` - ticks before an idle session is closed (0 = never)
pub fn parse_options(options: &[(&str, &str)]) -> Result<BridgeConfig> {
    let mut config = BridgeConfig::default();
    config.apply_options(options)?;
    Ok(config)
}

impl BridgeConfig {
    /// Override fields from `key=value` pairs, see [`parse_options`]
    pub fn apply_options(&mut self, options: &[(&str, &str)]) -> Result<()> {
        for &(key, value) in options {
            match key {
                "lanes" => {
                    let lanes = parse_number(value)?;
                    let lanes =
                        u8::try_from(lanes).map_err(|_| Error::InvalidLaneCount(u8::MAX))?;
                    self.lanes = LaneCount::try_from(lanes)?;
                }
                "dummy" => {
                    let cycles = parse_number(value)?;
                    self.dummy_cycles = u8::try_from(cycles)
                        .map_err(|_| Error::InvalidOption(OptionError::BadValue))?;
                }
                "endian" => {
                    self.endianness = match value {
                        "big" | "be" => Endianness::Big,
                        "little" | "le" => Endianness::Little,
                        _ => return Err(Error::InvalidOption(OptionError::BadValue)),
                    };
                }
                "width" => {
                    self.data_width = DataWidth::try_from(parse_number(value)?)?;
                }
                "burst-dummy" => {
                    self.burst_read_dummy = parse_bool(value)?;
                }
                "max-burst" => {
                    self.max_burst = Some(parse_number(value)?).filter(|&n| n > 0);
                }
                "idle-release" => {
                    self.idle_release = Some(parse_number(value)?).filter(|&n| n > 0);
                }
                _ => {
                    log::warn!("Unknown bridge option: {}={}", key, value);
                    return Err(Error::InvalidOption(OptionError::UnknownKey));
                }
            }
        }

        log::debug!(
            "Bridge config: {} lanes, {} dummy cycles, {}-bit words, {} endian",
            self.lanes.lanes(),
            self.dummy_cycles,
            self.data_width.bits(),
            self.endianness
        );

        Ok(())
    }
}

/// Split a `key=value,key=value` string into pairs
///
/// Entries without `=` are returned with an empty value.
pub fn split_options(options: &str) -> impl Iterator<Item = (&str, &str)> {
    options
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.split_once('=').unwrap_or((s, "")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.lanes, LaneCount::Quad);
        assert_eq!(config.dummy_cycles, 5);
        assert_eq!(config.endianness, Endianness::Big);
        assert_eq!(config.data_width.bits(), 32);
        assert_eq!(config.register_bits(), 32);
        assert!(config.burst_read_dummy);
        assert_eq!(config.max_burst, None);
    }

    #[test]
    fn test_register_bits() {
        let config = BridgeConfig::new(LaneCount::Single).with_data_width(DataWidth::Bits16);
        assert_eq!(config.register_bits(), 24);
        let config = BridgeConfig::new(LaneCount::Quad).with_data_width(DataWidth::Bits64);
        assert_eq!(config.register_bits(), 64);
    }

    #[test]
    fn test_cycle_costs() {
        let config = BridgeConfig::new(LaneCount::Quad);
        assert_eq!(config.cold_read_cycles(), 8 + 6 + 5 + 4);
        assert_eq!(config.cold_write_cycles(), 8 + 6 + 4);
        assert_eq!(config.burst_read_cycles(), 5 + 4);
        assert_eq!(config.burst_write_cycles(), 4);

        let config = BridgeConfig::new(LaneCount::Single).with_burst_read_dummy(false);
        assert_eq!(config.cold_read_cycles(), 8 + 24 + 5 + 16);
        assert_eq!(config.burst_read_cycles(), 16);
    }

    #[test]
    fn test_endianness() {
        let w = DataWidth::Bits32;
        assert_eq!(Endianness::Big.apply(0x1122_3344, w), 0x1122_3344);
        assert_eq!(Endianness::Little.apply(0x1122_3344, w), 0x4433_2211);
        assert_eq!(Endianness::Little.apply(0xAABB, DataWidth::Bits16), 0xBBAA);
        assert_eq!(
            Endianness::Little.apply(0x0102_0304_0506_0708, DataWidth::Bits64),
            0x0807_0605_0403_0201
        );
        // Bits above the word are dropped
        assert_eq!(Endianness::Big.apply(0xFF_1122_3344, w), 0x1122_3344);
    }

    #[test]
    fn test_parse_options() {
        let opts = [
            ("lanes", "2"),
            ("dummy", "8"),
            ("endian", "little"),
            ("width", "64"),
            ("burst-dummy", "off"),
            ("max-burst", "16"),
            ("idle-release", "0"),
        ];
        let config = parse_options(&opts).unwrap();
        assert_eq!(config.lanes, LaneCount::Dual);
        assert_eq!(config.dummy_cycles, 8);
        assert_eq!(config.endianness, Endianness::Little);
        assert_eq!(config.data_width, DataWidth::Bits64);
        assert!(!config.burst_read_dummy);
        assert_eq!(config.max_burst, Some(16));
        assert_eq!(config.idle_release, None);
    }

    #[test]
    fn test_parse_options_errors() {
        assert_eq!(parse_options(&[("lanes", "3")]), Err(Error::InvalidLaneCount(3)));
        assert_eq!(parse_options(&[("width", "24")]), Err(Error::InvalidDataWidth(24)));
        assert_eq!(
            parse_options(&[("speed", "10")]),
            Err(Error::InvalidOption(OptionError::UnknownKey))
        );
        assert_eq!(
            parse_options(&[("endian", "middle")]),
            Err(Error::InvalidOption(OptionError::BadValue))
        );
        assert_eq!(
            parse_options(&[("dummy", "300")]),
            Err(Error::InvalidOption(OptionError::BadValue))
        );
    }

    #[test]
    fn test_apply_options_keeps_base() {
        let mut config = BridgeConfig::new(LaneCount::Dual).with_dummy_cycles(7);
        config.apply_options(&[("endian", "le")]).unwrap();
        assert_eq!(config.lanes, LaneCount::Dual);
        assert_eq!(config.dummy_cycles, 7);
        assert_eq!(config.endianness, Endianness::Little);
    }

    #[test]
    fn test_split_options() {
        let mut it = split_options("lanes=4, dummy=0x6,,endian=le");
        assert_eq!(it.next(), Some(("lanes", "4")));
        assert_eq!(it.next(), Some(("dummy", "0x6")));
        assert_eq!(it.next(), Some(("endian", "le")));
        assert_eq!(it.next(), None);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_from_toml() {
        let config = BridgeConfig::from_toml(
            "lanes = 2\ndummy-cycles = 6\nendianness = \"little\"\nmax-burst = 8\n",
        )
        .unwrap();
        assert_eq!(config.lanes, LaneCount::Dual);
        assert_eq!(config.dummy_cycles, 6);
        assert_eq!(config.endianness, Endianness::Little);
        assert_eq!(config.max_burst, Some(8));
        assert_eq!(config.data_width, DataWidth::Bits32);

        assert!(BridgeConfig::from_toml("lanes = 3\n").is_err());
    }
}
