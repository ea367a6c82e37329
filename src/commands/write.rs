//! Write command implementation

use qspiram_core::BridgeConfig;
use qspiram_dummy::{new_bridge, DEFAULT_SIZE};

use super::{log_summary, print_reports, read_words};
use crate::error::{CliError, Result};

/// Write `words` at consecutive addresses from `addr`, then verify them
pub fn run_write(config: BridgeConfig, addr: u32, words: &[u64]) -> Result<()> {
    let mut bridge = new_bridge(config, DEFAULT_SIZE)?;
    let mask = config.data_width.mask();

    let mut reports = Vec::with_capacity(words.len() * 2);
    for (i, &word) in words.iter().enumerate() {
        if word & !mask != 0 {
            log::warn!(
                "0x{:X} does not fit in {} bits, upper bits are dropped",
                word,
                config.data_width.bits()
            );
        }
        reports.push(bridge.write(addr.wrapping_add(i as u32), word & mask)?);
    }

    bridge.close_session()?;
    let readback = read_words(&mut bridge, addr, words.len() as u32)?;
    reports.extend_from_slice(&readback);
    print_reports(&reports, config.data_width);

    for (report, &word) in readback.iter().zip(words) {
        if report.data != word & mask {
            return Err(CliError::VerifyFailed {
                address: report.address,
                expected: word & mask,
                found: report.data,
            });
        }
    }

    println!("Verified {} words", words.len());
    log_summary(bridge.stats());
    Ok(())
}
