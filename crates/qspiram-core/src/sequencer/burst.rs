//! Burst continuation policy
//!
//! After a data phase the sequencer keeps chip-select asserted and waits. If
//! the next request continues the previous one (same direction, next word),
//! the devices are still positioned right after the last word and the command
//! and address phases can be skipped. Anything else closes the session.

use crate::bus::{BusRequest, Direction};
use crate::config::BridgeConfig;

/// State kept across the transactions of one chip-select session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Session {
    /// Word address a continuation has to hit
    pub next_address: u32,
    /// Transactions completed in this session
    pub served: u32,
    /// Ticks spent waiting without a request
    pub idle_ticks: u32,
}

impl Session {
    /// Forget everything about the previous session
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// What to do with the open session this tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// No request: keep chip-select asserted and wait
    Hold,
    /// No request for too long: close the session
    Release,
    /// Request continues the session: go straight to the data phase
    Continue,
    /// Request does not continue the session: close it and start over
    Restart,
}

/// Decide how a session opened by a `direction` transfer treats `request`
pub fn decide(
    direction: Direction,
    session: &Session,
    request: Option<&BusRequest>,
    config: &BridgeConfig,
) -> Decision {
    let Some(request) = request else {
        return match config.idle_release {
            Some(limit) if session.idle_ticks.saturating_add(1) >= limit => Decision::Release,
            _ => Decision::Hold,
        };
    };

    let contiguous = request.address == session.next_address;
    let same_direction = request.direction() == direction;
    let within_limit = config.max_burst.map_or(true, |max| session.served < max);

    if contiguous && same_direction && within_limit {
        Decision::Continue
    } else {
        Decision::Restart
    }
}
