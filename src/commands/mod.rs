//! CLI command implementations
//!
//! Every command runs the bridge against a `qspiram-dummy` device pair. The
//! helpers here print transaction reports in a common format.

pub mod format;
pub mod read;
pub mod timing;
pub mod trace;
pub mod write;

use qspiram_core::{Bridge, BridgeConfig, BridgeStats, DataWidth, TransactionReport, WirePort};

use crate::error::Result;

/// Print one line per transaction
pub fn print_reports(reports: &[TransactionReport], width: DataWidth) {
    let digits = width.bytes() * 2;
    for report in reports {
        println!(
            "0x{:06X}  {:5}  0x{:0digits$X}  {:5} {:3} cycles {:3} ticks",
            report.address,
            report.direction.to_string(),
            report.data,
            if report.continued { "burst" } else { "cold" },
            report.cycles,
            report.ticks,
            digits = digits
        );
    }
}

/// Log bridge totals
pub fn log_summary(stats: BridgeStats) {
    log::info!(
        "{} transactions ({} in bursts), {} clocked cycles, {} ticks",
        stats.transactions,
        stats.continued,
        stats.cycles,
        stats.ticks
    );
}

/// Read `count` consecutive words starting at `addr`
pub fn read_words<P: WirePort>(
    bridge: &mut Bridge<P>,
    addr: u32,
    count: u32,
) -> Result<Vec<TransactionReport>> {
    let mut reports = Vec::with_capacity(count as usize);
    for i in 0..count {
        reports.push(bridge.read(addr.wrapping_add(i))?);
    }
    Ok(reports)
}

/// Recognisable test data for word `addr`
pub fn pattern(addr: u32, config: &BridgeConfig) -> u64 {
    (addr as u64 ^ 0xA5).wrapping_mul(0x9E37_79B9_7F4A_7C15) & config.data_width.mask()
}
