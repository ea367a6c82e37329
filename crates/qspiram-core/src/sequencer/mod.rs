//! Cycle-stepped transaction sequencer
//!
//! The sequencer is the whole protocol engine. It owns the shift register and
//! the phase counter, and advances exactly one tick per [`Sequencer::step`]
//! call:
//!
//! ```text
//!  IDLE -> SEND_CMD -> SEND_ADDR -+-> SEND_DATA ---------------> WAIT_SEND_MORE
//!                                 +-> RECV_DUMMY -> RECV_DATA -> WAIT_RECV_MORE
//! ```
//!
//! From a `WAIT_*_MORE` state, a contiguous same-direction request jumps back
//! into the data phase with chip-select still asserted (see [`burst`]).
//! Everything else goes through `IDLE` and pays for command and address again.
//!
//! Every phase runs a fixed number of cycles. There is no abort path and no
//! way for a device to stall the bridge.

pub mod burst;
mod state;

pub use burst::{Decision, Session};
pub use state::State;

use crate::bus::{Access, Ack, BusRequest, Direction};
use crate::config::BridgeConfig;
use crate::error::{Error, Result};
use crate::serdes::ShiftRegister;
use crate::spi::{CommandSet, LaneCount, MAX_DEVICE_ADDRESS};
use crate::wire::{Control, WirePins, WirePort};

/// Cycle accounting for one transaction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransactionStats {
    /// Clocked SPI cycles spent on the transaction
    pub cycles: u32,
    /// All ticks from the first one that saw the request up to the ack
    pub ticks: u32,
    /// Command and address were skipped
    pub continued: bool,
}

/// The protocol state machine
#[derive(Clone, Debug)]
pub struct Sequencer {
    config: BridgeConfig,
    commands: CommandSet,
    state: State,
    counter: u32,
    sr: ShiftRegister,
    current: Option<BusRequest>,
    session: Session,
    stats: TransactionStats,
    handover: u32,
    misuse_reported: bool,
}

impl Sequencer {
    /// Build a sequencer, formatting both command words up front
    pub fn new(config: BridgeConfig) -> Self {
        let commands = CommandSet::new(config.lanes);
        log::debug!(
            "Sequencer: {} lanes, read cmd 0x{:0w$X}, write cmd 0x{:0w$X}",
            config.lanes.lanes(),
            commands.read.value(),
            commands.write.value(),
            w = (config.lanes.command_bits() / 4) as usize
        );
        Self {
            sr: ShiftRegister::new(config.register_bits(), config.lanes),
            config,
            commands,
            state: State::Idle,
            counter: 0,
            current: None,
            session: Session::default(),
            stats: TransactionStats::default(),
            handover: 0,
            misuse_reported: false,
        }
    }

    /// Build a sequencer for a port, refusing a port with a different lane count
    pub fn for_port<P: WirePort + ?Sized>(config: BridgeConfig, port: &P) -> Result<Self> {
        if port.lanes() != config.lanes {
            return Err(Error::LaneMismatch {
                expected: config.lanes.into(),
                found: port.lanes().into(),
            });
        }
        Ok(Self::new(config))
    }

    /// The configuration this sequencer was built with
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Lane count
    pub fn lanes(&self) -> LaneCount {
        self.config.lanes
    }

    /// Current state
    pub fn state(&self) -> State {
        self.state
    }

    /// Cycles spent in the current state
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// The shared shift register
    pub fn register(&self) -> &ShiftRegister {
        &self.sr
    }

    /// Burst bookkeeping of the open session
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Accounting of the transaction in flight, or of the last one retired
    pub fn stats(&self) -> TransactionStats {
        self.stats
    }

    /// The transaction in flight, if any
    pub fn current(&self) -> Option<&BusRequest> {
        self.current.as_ref()
    }

    /// Returns true while a transaction waits for its ack
    pub fn is_busy(&self) -> bool {
        self.current.is_some()
    }

    /// Returns true while chip-select is asserted
    pub fn session_open(&self) -> bool {
        self.state != State::Idle
    }

    /// Device byte address of bus word `address`
    ///
    /// Every word is striped across both devices, so each one holds
    /// `width / 16` bytes of it. For 32-bit words this is `address << 1`.
    pub fn device_address(&self, address: u32) -> Result<u32> {
        address
            .checked_mul(self.config.data_width.device_bytes())
            .filter(|&a| a <= MAX_DEVICE_ADDRESS)
            .ok_or(Error::AddressOutOfRange(address))
    }

    fn phase_cycles(&self) -> u32 {
        let lanes = self.config.lanes;
        match self.state {
            State::SendCmd => lanes.command_cycles(),
            State::SendAddr => lanes.address_cycles(),
            State::SendData | State::RecvData => lanes.data_cycles(self.config.data_width.bits()),
            State::RecvDummy => self.config.dummy_cycles as u32,
            State::Idle | State::WaitMore(_) => 0,
        }
    }

    fn enter(&mut self, state: State) {
        log::trace!("{} -> {}", self.state, state);
        self.state = state;
        self.counter = 0;
    }

    fn load_write_data(&mut self, data: u64) {
        let width = self.config.data_width;
        self.sr
            .load_transmit(self.config.endianness.apply(data, width), width.bits());
    }

    fn enter_read_data(&mut self, with_dummy: bool) {
        self.sr.clear();
        if with_dummy && self.config.dummy_cycles > 0 {
            self.enter(State::RecvDummy);
        } else {
            self.enter(State::RecvData);
        }
    }

    fn accept(&mut self, request: &BusRequest) {
        let command = self.commands.for_direction(request.direction());
        log::debug!(
            "CS asserted: {} @ 0x{:06X} (cmd 0x{:02X})",
            request.direction(),
            request.address,
            command.opcode()
        );
        self.sr.load_transmit(command.value() as u64, command.bits());
        self.current = Some(*request);
        self.stats = TransactionStats {
            cycles: 0,
            ticks: self.handover,
            continued: false,
        };
        self.handover = 0;
        self.session.reset();
        self.enter(State::SendCmd);
    }

    fn continue_session(&mut self, request: &BusRequest) {
        log::trace!(
            "Burst continues: {} @ 0x{:06X}",
            request.direction(),
            request.address
        );
        self.current = Some(*request);
        self.stats = TransactionStats {
            cycles: 0,
            ticks: 0,
            continued: true,
        };
        self.session.next_address = request.address.wrapping_add(1);
        self.session.idle_ticks = 0;
        match request.access {
            Access::Write(data) => {
                self.load_write_data(data);
                self.enter(State::SendData);
            }
            Access::Read => self.enter_read_data(self.config.burst_read_dummy),
        }
    }

    fn retire(&mut self, direction: Direction, data: u64) -> Option<Ack> {
        let request = self.current.take()?;
        self.session.served = self.session.served.saturating_add(1);
        self.session.idle_ticks = 0;
        self.misuse_reported = false;
        self.enter(State::WaitMore(direction));
        Some(Ack { request, data })
    }

    /// Advance the machine by one tick
    ///
    /// `request` is whatever the bus presents this tick; it has to stay
    /// presented until the returned ack retires it. The pins for this tick are
    /// derived from the state committed by the previous call and exchanged
    /// with `port` before the next state is computed.
    pub fn step<P: WirePort + ?Sized>(
        &mut self,
        request: Option<&BusRequest>,
        port: &mut P,
    ) -> Option<Ack> {
        if let (Some(current), Some(presented)) = (self.current.as_ref(), request) {
            if current != presented && !self.misuse_reported {
                log::warn!(
                    "Request {:?} presented while {:?} is in flight; ignoring it",
                    presented,
                    current
                );
                self.misuse_reported = true;
            }
        }

        let phase_cycles = self.phase_cycles();
        let last_cycle = self.state.clocked() && self.counter + 1 >= phase_cycles;

        let mut pins = WirePins {
            control: self.state.control(),
            dq_a: 0,
            dq_b: 0,
        };
        match self.state {
            State::SendCmd | State::SendAddr => {
                let out = self.sr.shift_out_lanes(true);
                pins.dq_a = out.a;
                pins.dq_b = out.b;
            }
            State::SendData => {
                let out = self.sr.shift_out_lanes(false);
                pins.dq_a = out.a;
                pins.dq_b = out.b;
            }
            _ => {}
        }
        if last_cycle && matches!(self.state, State::SendData | State::RecvData) {
            pins.control |= Control::ACK;
        }

        let sample = port.exchange(&pins);

        if self.current.is_some() {
            self.stats.ticks += 1;
            if self.state.clocked() {
                self.stats.cycles += 1;
            }
        }
        if self.state.clocked() {
            self.counter += 1;
        }

        match self.state {
            State::Idle => {
                if let Some(request) = request {
                    self.accept(request);
                    self.stats.ticks += 1;
                }
                None
            }
            State::SendCmd => {
                if last_cycle {
                    let current = self.current?;
                    let address = self.device_address(current.address).unwrap_or_else(|_| {
                        log::warn!(
                            "Word address 0x{:08X} truncated to 24 bits",
                            current.address
                        );
                        current.address.wrapping_mul(self.config.data_width.device_bytes())
                            & MAX_DEVICE_ADDRESS
                    });
                    self.sr
                        .load_transmit(address as u64, crate::spi::ADDRESS_BITS);
                    self.session.next_address = current.address.wrapping_add(1);
                    self.enter(State::SendAddr);
                }
                None
            }
            State::SendAddr => {
                if last_cycle {
                    match self.current?.access {
                        Access::Write(data) => {
                            self.load_write_data(data);
                            self.enter(State::SendData);
                        }
                        Access::Read => self.enter_read_data(true),
                    }
                }
                None
            }
            State::SendData => {
                if last_cycle {
                    self.retire(Direction::Write, 0)
                } else {
                    None
                }
            }
            State::RecvDummy => {
                if last_cycle {
                    self.enter(State::RecvData);
                }
                None
            }
            State::RecvData => {
                self.sr.shift_in_lanes(sample);
                if last_cycle {
                    let width = self.config.data_width;
                    let data = self.config.endianness.apply(self.sr.current_value(), width);
                    self.retire(Direction::Read, data)
                } else {
                    None
                }
            }
            State::WaitMore(direction) => {
                match burst::decide(direction, &self.session, request, &self.config) {
                    Decision::Hold => {
                        self.session.idle_ticks = self.session.idle_ticks.saturating_add(1)
                    }
                    Decision::Release => {
                        log::debug!(
                            "CS released after {} idle ticks",
                            self.session.idle_ticks.saturating_add(1)
                        );
                        self.enter(State::Idle);
                    }
                    Decision::Continue => {
                        if let Some(request) = request {
                            self.continue_session(request);
                            self.stats.ticks += 1;
                        }
                    }
                    Decision::Restart => {
                        log::debug!("CS released: burst broken after {} transfers", self.session.served);
                        self.handover = 1;
                        self.enter(State::Idle);
                    }
                }
                None
            }
        }
    }

    /// Drop any transaction in flight and release chip-select
    pub fn reset(&mut self) {
        self.current = None;
        self.session.reset();
        self.stats = TransactionStats::default();
        self.handover = 0;
        self.misuse_reported = false;
        self.sr.clear();
        self.enter(State::Idle);
    }
}
