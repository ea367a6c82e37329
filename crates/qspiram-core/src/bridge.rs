//! Host-facing bridge driver
//!
//! [`Bridge`] owns a [`Sequencer`] and the [`WirePort`] it talks to. It plays
//! the part of the bus: a request is presented tick after tick until the
//! sequencer acknowledges it, and the ack is turned into a
//! [`TransactionReport`] with the cycle accounting for that transaction.

use crate::bus::{Ack, BusRequest, Direction};
use crate::config::BridgeConfig;
use crate::error::{Error, Result};
use crate::sequencer::{Sequencer, State};
use crate::wire::WirePort;

/// Outcome of one retired transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransactionReport {
    /// Read or write
    pub direction: Direction,
    /// Word address on the bus
    pub address: u32,
    /// Read data, or the data that was written
    pub data: u64,
    /// Clocked SPI cycles spent on this transaction
    pub cycles: u32,
    /// Ticks from first sight of the request to its ack
    pub ticks: u32,
    /// Command and address were skipped (burst continuation)
    pub continued: bool,
}

/// Running totals over the life of a bridge
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Transactions retired
    pub transactions: u64,
    /// Of which continued an open session
    pub continued: u64,
    /// Clocked cycles spent on transactions
    pub cycles: u64,
    /// All ticks stepped, including idle ones
    pub ticks: u64,
}

impl BridgeStats {
    /// Totals accumulated since `earlier` was taken
    pub fn since(&self, earlier: &BridgeStats) -> BridgeStats {
        BridgeStats {
            transactions: self.transactions - earlier.transactions,
            continued: self.continued - earlier.continued,
            cycles: self.cycles - earlier.cycles,
            ticks: self.ticks - earlier.ticks,
        }
    }
}

/// Memory-mapped access to a pair of serial RAMs
#[derive(Debug)]
pub struct Bridge<P> {
    sequencer: Sequencer,
    port: P,
    pending: Option<BusRequest>,
    stats: BridgeStats,
}

impl<P: WirePort> Bridge<P> {
    /// Create a bridge, checking that `port` matches the configured lane count
    pub fn new(config: BridgeConfig, port: P) -> Result<Self> {
        let sequencer = Sequencer::for_port(config, &port)?;
        log::debug!(
            "Bridge ready: {}, cold read {} cycles, cold write {} cycles",
            config.lanes,
            config.cold_read_cycles(),
            config.cold_write_cycles()
        );
        Ok(Self {
            sequencer,
            port,
            pending: None,
            stats: BridgeStats::default(),
        })
    }

    /// The configuration in use
    pub fn config(&self) -> &BridgeConfig {
        self.sequencer.config()
    }

    /// The underlying state machine
    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    /// The wire port
    pub fn port(&self) -> &P {
        &self.port
    }

    /// Mutable access to the wire port
    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Tear the bridge down and return its port
    pub fn into_port(self) -> P {
        self.port
    }

    /// Running totals
    pub fn stats(&self) -> BridgeStats {
        self.stats
    }

    /// Number of addressable bus words
    pub fn word_count(&self) -> u32 {
        (crate::spi::MAX_DEVICE_ADDRESS + 1) / self.config().data_width.device_bytes()
    }

    /// Present a request to the bus
    ///
    /// Only one request may be in flight; it is retired by [`tick`](Self::tick).
    pub fn submit(&mut self, request: BusRequest) -> Result<()> {
        if self.pending.is_some() {
            return Err(Error::RequestPending);
        }
        self.sequencer.device_address(request.address)?;
        self.pending = Some(request);
        Ok(())
    }

    /// Returns true if a submitted request has not been retired yet
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Advance one tick, returning a report when a request is retired
    pub fn tick(&mut self) -> Option<TransactionReport> {
        let ack = self.sequencer.step(self.pending.as_ref(), &mut self.port);
        self.stats.ticks += 1;
        let ack = ack?;
        self.pending = None;
        Some(self.report(ack))
    }

    fn report(&mut self, ack: Ack) -> TransactionReport {
        let stats = self.sequencer.stats();
        self.stats.transactions += 1;
        self.stats.cycles += stats.cycles as u64;
        if stats.continued {
            self.stats.continued += 1;
        }

        let report = TransactionReport {
            direction: ack.request.direction(),
            address: ack.request.address,
            data: ack.request.write_data().unwrap_or(ack.data),
            cycles: stats.cycles,
            ticks: stats.ticks,
            continued: stats.continued,
        };
        log::trace!(
            "{} 0x{:06X} = 0x{:X} ({} cycles{})",
            report.direction,
            report.address,
            report.data,
            report.cycles,
            if report.continued { ", burst" } else { "" }
        );
        report
    }

    /// Run one request to completion
    pub fn transact(&mut self, request: BusRequest) -> Result<TransactionReport> {
        self.submit(request)?;
        loop {
            if let Some(report) = self.tick() {
                return Ok(report);
            }
        }
    }

    /// Read the word at `address`
    pub fn read(&mut self, address: u32) -> Result<TransactionReport> {
        self.transact(BusRequest::read(address))
    }

    /// Write `data` to the word at `address`
    pub fn write(&mut self, address: u32, data: u64) -> Result<TransactionReport> {
        self.transact(BusRequest::write(address, data))
    }

    /// Step `ticks` ticks with nothing new on the bus
    pub fn idle(&mut self, ticks: u32) {
        for _ in 0..ticks {
            if let Some(report) = self.tick() {
                log::debug!("Request 0x{:06X} retired while idling", report.address);
            }
        }
    }

    /// Release chip-select and forget the open session
    pub fn close_session(&mut self) -> Result<()> {
        if self.pending.is_some() {
            return Err(Error::RequestPending);
        }
        if self.sequencer.state() != State::Idle {
            self.sequencer.reset();
            // One idle tick so the devices see chip-select rise
            self.tick();
        }
        Ok(())
    }
}
