//! Trace command implementation

use qspiram_core::{Bridge, BridgeConfig, BridgeStats, TraceRecorder, TransactionReport};
use qspiram_dummy::{new_pair, DummyConfig, DummyPair, DEFAULT_SIZE};

use super::{log_summary, pattern, print_reports, read_words};
use crate::error::Result;

/// Ticks kept by the recorder
const TRACE_DEPTH: usize = 2048;

type Recorder = TraceRecorder<DummyPair, TRACE_DEPTH>;

/// Bridge traffic of one traced burst read
struct Capture {
    bridge: Bridge<Recorder>,
    reports: Vec<TransactionReport>,
    stats: BridgeStats,
}

/// Preload `count` words at `addr`, then record a burst read of them
fn capture(config: BridgeConfig, addr: u32, count: u32) -> Result<Capture> {
    let devices = DummyConfig::for_bridge(&config).with_size(DEFAULT_SIZE);
    let recorder: Recorder = TraceRecorder::new(new_pair(devices)?);
    let mut bridge = Bridge::new(config, recorder)?;

    // Something recognisable to read back
    for i in 0..count {
        let word = addr.wrapping_add(i);
        bridge.write(word, pattern(word, &config))?;
    }
    bridge.close_session()?;
    bridge.port_mut().clear();
    let preload = bridge.stats();

    let reports = read_words(&mut bridge, addr, count)?;
    let stats = bridge.stats().since(&preload);
    Ok(Capture {
        bridge,
        reports,
        stats,
    })
}

/// Run a burst read of `count` words and print every tick on the wire
pub fn run_trace(config: BridgeConfig, addr: u32, count: u32) -> Result<()> {
    let capture = capture(config, addr, count)?;

    let recorder = capture.bridge.port();
    if recorder.dropped() > 0 {
        log::warn!(
            "Only the last {} ticks are shown, {} dropped",
            recorder.len(),
            recorder.dropped()
        );
    }
    for entry in recorder.entries() {
        println!("{}", entry);
    }
    println!();
    print_reports(&capture.reports, config.data_width);
    log_summary(capture.stats);

    Ok(())
}
