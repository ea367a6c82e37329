//! Sequencer states

use core::fmt;

use crate::bus::Direction;
use crate::wire::Control;

/// Phase of the transaction state machine
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum State {
    /// Chip-select released, waiting for a request
    #[default]
    Idle,
    /// Shifting out the command word (ganged)
    SendCmd,
    /// Shifting out the 24-bit address (ganged)
    SendAddr,
    /// Shifting out write data (independent halves)
    SendData,
    /// Clocking through the read latency, outputs off
    RecvDummy,
    /// Capturing read data from both devices
    RecvData,
    /// Session held open after a transfer in the given direction
    WaitMore(Direction),
}

impl State {
    /// Returns true if the clock runs in this state
    pub const fn clocked(&self) -> bool {
        matches!(
            self,
            Self::SendCmd | Self::SendAddr | Self::SendData | Self::RecvDummy | Self::RecvData
        )
    }

    /// Control lines driven in this state (without the ack pulse)
    pub fn control(&self) -> Control {
        match self {
            Self::Idle => Control::CS_N,
            Self::SendCmd | Self::SendAddr => {
                Control::CLOCK | Control::OUTPUT_ENABLE | Control::GANG
            }
            Self::SendData => Control::CLOCK | Control::OUTPUT_ENABLE,
            Self::RecvDummy | Self::RecvData => Control::CLOCK,
            Self::WaitMore(_) => Control::empty(),
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "IDLE"),
            Self::SendCmd => write!(f, "SEND_CMD"),
            Self::SendAddr => write!(f, "SEND_ADDR"),
            Self::SendData => write!(f, "SEND_DATA"),
            Self::RecvDummy => write!(f, "RECV_DUMMY"),
            Self::RecvData => write!(f, "RECV_DATA"),
            Self::WaitMore(Direction::Read) => write!(f, "WAIT_RECV_MORE"),
            Self::WaitMore(Direction::Write) => write!(f, "WAIT_SEND_MORE"),
        }
    }
}
