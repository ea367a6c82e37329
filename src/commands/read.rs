//! Read command implementation

use embedded_io::{Seek, SeekFrom, Write};
use qspiram_core::{Bridge, BridgeConfig, Cursor, WirePort};
use qspiram_dummy::{new_bridge, DEFAULT_SIZE};
use std::path::Path;

use super::{log_summary, print_reports, read_words};
use crate::error::{CliError, Result};

/// Run the read command
pub fn run_read(config: BridgeConfig, addr: u32, count: u32, image: Option<&Path>) -> Result<()> {
    let mut bridge = new_bridge(config, DEFAULT_SIZE)?;

    if let Some(path) = image {
        let data = std::fs::read(path)?;
        preload(&mut bridge, addr, &data)?;
        println!("Preloaded {} bytes from {:?}", data.len(), path);
        // Start the reads from a closed session
        bridge.close_session()?;
    }

    let reports = read_words(&mut bridge, addr, count)?;
    print_reports(&reports, config.data_width);
    log_summary(bridge.stats());

    Ok(())
}

/// Write `data` into the pair as a byte stream starting at word `addr`
pub fn preload<P: WirePort>(bridge: &mut Bridge<P>, addr: u32, data: &[u8]) -> Result<()> {
    let width = bridge.config().data_width.bytes() as u64;
    let offset = addr as u64 * width;
    let mut cursor = Cursor::with_capacity(bridge, 2 * DEFAULT_SIZE as u64);

    if offset + data.len() as u64 > cursor.capacity() {
        return Err(CliError::ImageTooLarge {
            address: addr,
            size: data.len(),
        });
    }

    cursor.seek(SeekFrom::Start(offset))?;
    cursor.write_all(data)?;
    Ok(())
}
