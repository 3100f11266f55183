//! Encode commands and decode the frames a projector answers with
//!
//! Everything here is pure: no I/O and no hidden state, so identical input
//! always decodes to the identical result.

use std::fmt;

use thiserror::Error;

use crate::commands::{Command, ERROR_FRAME_LEN, STATUS_BYTE_OFFSET};

/// Power state reported by a status-read answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    /// Projector is running
    On,
    /// Projector is in standby
    Standby,
    /// Projector does not report its power state
    NotSupported,
}

impl PowerState {
    fn from_status_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(PowerState::Standby),
            0x01 => Some(PowerState::On),
            0xFF => Some(PowerState::NotSupported),
            _ => None,
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerState::On => f.write_str("on"),
            PowerState::Standby => f.write_str("standby"),
            PowerState::NotSupported => f.write_str("not supported"),
        }
    }
}

/// Bytes to send on the wire for a command
pub fn encode(command: Command) -> &'static [u8] {
    command.opcode()
}

/// Decode the answer to [Command::StatusRead]
pub fn decode_status_response(frame: &[u8]) -> Result<PowerState, Error> {
    check_header(Command::StatusRead, frame)?;

    let Some(status) = frame.get(STATUS_BYTE_OFFSET).cloned() else {
        return Err(Error::unrecognised(frame, Mismatch::Truncated { needed: STATUS_BYTE_OFFSET + 1 }));
    };

    PowerState::from_status_byte(status)
        .ok_or_else(|| Error::unrecognised(frame, Mismatch::Status(status)))
}

/// Decode the answer to [Command::PowerOn] or [Command::PowerOff]
pub fn decode_set_response(command: Command, frame: &[u8]) -> Result<(), Error> {
    check_header(command, frame)
}

/// Whether `frame` starts with the header of a successful answer to `command`
pub fn has_success_header(command: Command, frame: &[u8]) -> bool {
    header_mismatch(command, frame).is_none()
}

fn header_mismatch(command: Command, frame: &[u8]) -> Option<Mismatch> {
    command
        .expected_header()
        .iter()
        .find_map(|&(offset, expected)| match frame.get(offset).cloned() {
            Some(found) if found == expected => None,
            found => Some(Mismatch::Header { offset, expected, found }),
        })
}

/// An 8 byte frame without the success header is the projector's error answer.
/// Any other header mismatch is a frame we do not understand.
fn check_header(command: Command, frame: &[u8]) -> Result<(), Error> {
    match header_mismatch(command, frame) {
        None => Ok(()),
        Some(_) if frame.len() == ERROR_FRAME_LEN => Err(Error::CommandFailed { frame: frame.to_vec() }),
        Some(reason) => Err(Error::unrecognised(frame, reason)),
    }
}

/// Part of a response that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Mismatch {
    /// A header byte did not have its expected value (`None` if the frame is too short)
    #[error("wanted {expected:#04x} at offset {offset}, got {found:02x?}")]
    Header {
        /// Position in the frame
        offset: usize,
        /// Value a success answer carries
        expected: u8,
        /// Value actually received
        found: Option<u8>,
    },
    /// Status byte is not a known power state
    #[error("unknown power status {0:#04x}")]
    Status(u8),
    /// Frame ends before the status byte
    #[error("frame shorter than {needed} bytes")]
    Truncated {
        /// Minimum length required
        needed: usize,
    },
}

/// Error that can occur while decoding a response
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Projector answered with its error frame
    #[error("Command failed: {frame:02x?}")]
    CommandFailed {
        /// Raw bytes received
        frame: Vec<u8>,
    },
    /// Response did not pass header or status validation
    #[error("Unrecognised response {frame:02x?}: {reason}")]
    UnrecognisedResponse {
        /// Raw bytes received
        frame: Vec<u8>,
        /// What failed validation
        reason: Mismatch,
    },
}

impl Error {
    fn unrecognised(frame: &[u8], reason: Mismatch) -> Self {
        Error::UnrecognisedResponse { frame: frame.to_vec(), reason }
    }
}
