//! Set of commands understood by the projector

/// Length of the frame a projector answers with when it rejects a command
pub const ERROR_FRAME_LEN: usize = 8;

/// Length of a complete status-read answer
pub const STATUS_RESPONSE_LEN: usize = 22;

/// Length of a set-command answer
pub const SET_RESPONSE_LEN: usize = 8;

/// Offset of the power status byte in a status-read answer
pub const STATUS_BYTE_OFFSET: usize = 7;

/// A command that can be sent to the projector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Query the running status (power state)
    StatusRead,
    /// Switch the projector on
    PowerOn,
    /// Switch the projector to standby
    PowerOff,
}

impl Command {
    /// Request bytes sent on the wire
    pub fn opcode(self) -> &'static [u8] {
        match self {
            Command::StatusRead => &[0x00, 0x85, 0x00, 0x00, 0x01, 0x01, 0x87],
            Command::PowerOn => &[0x02, 0x00, 0x00, 0x00, 0x00, 0x02],
            Command::PowerOff => &[0x02, 0x01, 0x00, 0x00, 0x00, 0x03],
        }
    }

    /// Maximum number of bytes the projector answers with
    pub fn response_len(self) -> usize {
        match self {
            Command::StatusRead => STATUS_RESPONSE_LEN,
            Command::PowerOn | Command::PowerOff => SET_RESPONSE_LEN,
        }
    }

    /// `(offset, value)` pairs a successful answer must carry
    pub fn expected_header(self) -> &'static [(usize, u8)] {
        match self {
            Command::StatusRead => &[(0, 0x20), (1, 0x85), (4, 0x10)],
            Command::PowerOn => &[(0, 0x22), (1, 0x00), (4, 0x00)],
            Command::PowerOff => &[(0, 0x22), (1, 0x01), (4, 0x00)],
        }
    }
}
