//! Read and switch the projector power state
//!
//! Switching first reads the current state and skips the command when the
//! projector is already where we want it. The read and the write are two separate
//! round trips: someone pressing the remote in between is not detected.

use std::fmt;

use crate::{client::{Connection, ProjectorStream}, commands::Command, proto, ConnectOptions, PowerState};

/// Power state a caller can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerTarget {
    /// Switch on
    On,
    /// Switch to standby
    Off,
}

impl PowerTarget {
    fn command(self) -> Command {
        match self {
            PowerTarget::On => Command::PowerOn,
            PowerTarget::Off => Command::PowerOff,
        }
    }

    fn is_reached_by(self, state: PowerState) -> bool {
        matches!(
            (self, state),
            (PowerTarget::On, PowerState::On) | (PowerTarget::Off, PowerState::Standby)
        )
    }
}

impl fmt::Display for PowerTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerTarget::On => f.write_str("on"),
            PowerTarget::Off => f.write_str("off"),
        }
    }
}

/// Successful result of [PowerControl::set_power_state]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerOutcome {
    /// Projector was already in the requested state, nothing was sent
    AlreadyInState,
    /// Power command was sent and acknowledged
    CommandIssued,
}

/// A high level controller that can read and switch projector power
pub trait PowerControl {
    /// Query the current power state
    fn read_power_state(&mut self) -> Result<PowerState, crate::Error>;

    /// Switch power, unless the projector already is in the requested state
    fn set_power_state(&mut self, target: PowerTarget) -> Result<PowerOutcome, crate::Error>;
}

impl<S: ProjectorStream> PowerControl for Connection<S> {
    fn read_power_state(&mut self) -> Result<PowerState, crate::Error> {
        let frame = self.transact(Command::StatusRead)?;
        let state = proto::decode_status_response(&frame)?;
        tracing::debug!("{} reports power {}", self.host(), state);
        Ok(state)
    }

    fn set_power_state(&mut self, target: PowerTarget) -> Result<PowerOutcome, crate::Error> {
        let current = self.read_power_state()?;

        if target.is_reached_by(current) {
            tracing::info!("{} is already {}, nothing to do", self.host(), target);
            return Ok(PowerOutcome::AlreadyInState);
        }

        if current == PowerState::NotSupported {
            tracing::warn!("{} does not report its power state, switching {} anyway", self.host(), target);
        }

        let command = target.command();
        let frame = self.transact(command)?;
        proto::decode_set_response(command, &frame)?;

        tracing::info!("Switched {} {}", self.host(), target);
        Ok(PowerOutcome::CommandIssued)
    }
}

/// Connect to `host`, switch its power and close the connection
pub fn switch(host: &str, target: PowerTarget, options: ConnectOptions) -> Result<PowerOutcome, crate::Error> {
    let mut connection = Connection::new(host, options);
    let outcome = connection.connect().and_then(|_| connection.set_power_state(target));
    connection.close();
    outcome
}
