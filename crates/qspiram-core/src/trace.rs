//! Wire-level tracing
//!
//! [`TraceRecorder`] sits between the bridge and its port and keeps the last
//! `N` ticks in a ring buffer. It is meant for debugging and for tests that
//! need to look at what actually went over the wire.

use core::fmt;

use heapless::HistoryBuffer;

use crate::serdes::LaneBits;
use crate::spi::LaneCount;
use crate::wire::{Control, WirePins, WirePort};

/// One recorded tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceEntry {
    /// Tick number, counted from the creation of the recorder
    pub tick: u64,
    /// What the bridge drove
    pub pins: WirePins,
    /// What the bridge sampled
    pub sample: LaneBits,
}

impl TraceEntry {
    /// Returns true if this tick carried the bus acknowledgment
    pub fn is_ack(&self) -> bool {
        self.pins.control.contains(Control::ACK)
    }
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pins = &self.pins;
        write!(
            f,
            "{:>8}  cs={} clk={}",
            self.tick,
            if pins.selected() { 0 } else { 1 },
            if pins.clocked() { 1 } else { 0 }
        )?;
        if pins.driving() {
            let mode = if pins.control.contains(Control::GANG) { "gang" } else { "out " };
            write!(f, "  {} a={:X} b={:X}", mode, pins.dq_a, pins.dq_b)?;
        } else if pins.clocked() {
            write!(f, "  in   a={:X} b={:X}", self.sample.a, self.sample.b)?;
        }
        if self.is_ack() {
            write!(f, "  ACK")?;
        }
        Ok(())
    }
}

/// Port wrapper recording the last `N` ticks
pub struct TraceRecorder<P, const N: usize> {
    inner: P,
    history: HistoryBuffer<TraceEntry, N>,
    ticks: u64,
    recorded: u64,
}

impl<P: WirePort, const N: usize> TraceRecorder<P, N> {
    /// Wrap `inner`
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            history: HistoryBuffer::new(),
            ticks: 0,
            recorded: 0,
        }
    }

    /// The wrapped port
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Mutable access to the wrapped port
    pub fn inner_mut(&mut self) -> &mut P {
        &mut self.inner
    }

    /// Unwrap the port, dropping the history
    pub fn into_inner(self) -> P {
        self.inner
    }

    /// Ticks seen since creation
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Number of entries currently held
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Returns true if nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.history.len() == 0
    }

    /// Ticks recorded since the last clear that no longer fit in the ring
    pub fn dropped(&self) -> u64 {
        self.recorded - self.history.len() as u64
    }

    /// Recorded ticks, oldest first
    pub fn entries(&self) -> impl Iterator<Item = &TraceEntry> + '_ {
        self.history.oldest_ordered()
    }

    /// Most recent entry
    pub fn last(&self) -> Option<&TraceEntry> {
        self.history.recent()
    }

    /// Forget the history (the tick counter keeps running)
    pub fn clear(&mut self) {
        self.history.clear();
        self.recorded = 0;
    }
}

impl<P: WirePort, const N: usize> WirePort for TraceRecorder<P, N> {
    fn lanes(&self) -> LaneCount {
        self.inner.lanes()
    }

    fn exchange(&mut self, pins: &WirePins) -> LaneBits {
        let sample = self.inner.exchange(pins);
        self.history.write(TraceEntry {
            tick: self.ticks,
            pins: *pins,
            sample,
        });
        self.ticks += 1;
        self.recorded += 1;
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::Bridge;
    use crate::config::BridgeConfig;
    use std::format;
    use std::string::ToString;
    use std::vec::Vec;

    struct Echo;

    impl WirePort for Echo {
        fn lanes(&self) -> LaneCount {
            LaneCount::Quad
        }

        fn exchange(&mut self, _pins: &WirePins) -> LaneBits {
            LaneBits { a: 0x5, b: 0xA }
        }
    }

    #[test]
    fn test_ring_keeps_latest() {
        let mut rec: TraceRecorder<Echo, 4> = TraceRecorder::new(Echo);
        assert!(rec.is_empty());
        for _ in 0..6 {
            rec.exchange(&WirePins::default());
        }
        assert_eq!(rec.len(), 4);
        assert_eq!(rec.ticks(), 6);
        let ticks: Vec<u64> = rec.entries().map(|e| e.tick).collect();
        assert_eq!(ticks, [2, 3, 4, 5]);
        assert_eq!(rec.last().map(|e| e.tick), Some(5));
        assert_eq!(rec.dropped(), 2);

        rec.clear();
        assert!(rec.is_empty());
        assert_eq!(rec.ticks(), 6);
        assert_eq!(rec.dropped(), 0);
    }

    #[test]
    fn test_dropped_counts_from_clear() {
        let mut rec: TraceRecorder<Echo, 4> = TraceRecorder::new(Echo);
        for _ in 0..10 {
            rec.exchange(&WirePins::default());
        }
        rec.clear();
        for _ in 0..3 {
            rec.exchange(&WirePins::default());
        }
        assert_eq!(rec.len(), 3);
        assert_eq!(rec.dropped(), 0);
        for _ in 0..3 {
            rec.exchange(&WirePins::default());
        }
        assert_eq!(rec.dropped(), 2);
        assert_eq!(rec.ticks(), 16);
    }

    #[test]
    fn test_records_bridge_traffic() {
        let rec: TraceRecorder<Echo, 64> = TraceRecorder::new(Echo);
        let mut bridge = Bridge::new(BridgeConfig::default(), rec).unwrap();
        let report = bridge.read(0).unwrap();
        assert_eq!(report.data, 0x5A5A_5A5A);

        let rec = bridge.into_port();
        assert_eq!(rec.len() as u32, report.ticks);
        let acks: Vec<&TraceEntry> = rec.entries().filter(|e| e.is_ack()).collect();
        assert_eq!(acks.len(), 1);
        assert_eq!(acks[0].tick, rec.ticks() - 1);
        assert!(!rec.entries().next().unwrap().pins.selected());
    }

    #[test]
    fn test_display() {
        let entry = TraceEntry {
            tick: 12,
            pins: WirePins {
                control: Control::CLOCK | Control::OUTPUT_ENABLE | Control::GANG,
                dq_a: 0xE,
                dq_b: 0xE,
            },
            sample: LaneBits::default(),
        };
        assert_eq!(entry.to_string(), "      12  cs=0 clk=1  gang a=E b=E");

        let entry = TraceEntry {
            tick: 3,
            pins: WirePins {
                control: Control::CLOCK | Control::ACK,
                dq_a: 0,
                dq_b: 0,
            },
            sample: LaneBits { a: 0x1, b: 0x2 },
        };
        assert_eq!(format!("{}", entry), "       3  cs=0 clk=1  in   a=1 b=2  ACK");
    }
}
