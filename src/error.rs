//! Error types for the command line tool

use thiserror::Error;

/// Errors reported by the CLI commands
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading an image or config file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML for a bridge configuration
    #[error("Invalid config file: {0}")]
    Config(#[from] toml::de::Error),

    /// The bridge refused a configuration or request
    #[error("Bridge error: {0}")]
    Bridge(#[from] qspiram_core::Error),

    /// Read-back after a write did not match
    #[error("Verify failed at word 0x{address:06X}: wrote 0x{expected:X}, read 0x{found:X}")]
    VerifyFailed {
        address: u32,
        expected: u64,
        found: u64,
    },

    /// Preload image runs past the end of the simulated RAM
    #[error("Image of {size} bytes does not fit at word 0x{address:06X}")]
    ImageTooLarge { address: u32, size: usize },
}

/// Result type for CLI commands
pub type Result<T> = std::result::Result<T, CliError>;
