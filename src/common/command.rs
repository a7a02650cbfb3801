// src/common/command.rs

//! Commands understood by the dive computer.

use arrayvec::ArrayVec;

use super::frame::MAX_PAYLOAD;
use super::types::DateTime;

pub const CMD_VERSION: u8 = 0x00;
pub const CMD_SET_TIME: u8 = 0x13;
pub const CMD_EXIT_PCLINK: u8 = 0x1D;
pub const CMD_LOGBOOK: u8 = 0x21;
pub const CMD_DIVE: u8 = 0x22;
pub const CMD_LOGBOOK_V4: u8 = 0x23;

/// Fixed-capacity buffer for a command payload.
pub type CommandPayload = ArrayVec<u8, MAX_PAYLOAD>;

/// A command together with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Version query; answered with the identification block.
    Version,

    /// Set the device clock.
    SetTime(DateTime),

    /// Leave PC-link mode.
    ExitPcLink,

    /// Request the logbook table using the given command code
    /// (`CMD_LOGBOOK` or `CMD_LOGBOOK_V4`, depending on the API version).
    Logbook { code: u8 },

    /// Request one dive by the raw 2-byte number from its logbook entry.
    Dive { number: [u8; 2] },
}

impl Command {
    /// The command byte sent on the wire.
    pub fn code(&self) -> u8 {
        match self {
            Command::Version => CMD_VERSION,
            Command::SetTime(_) => CMD_SET_TIME,
            Command::ExitPcLink => CMD_EXIT_PCLINK,
            Command::Logbook { code } => *code,
            Command::Dive { .. } => CMD_DIVE,
        }
    }

    /// The arguments sent after the command byte.
    pub fn payload(&self) -> CommandPayload {
        let mut payload = CommandPayload::new();
        match self {
            Command::SetTime(datetime) => payload.extend(datetime.encode()),
            Command::Dive { number } => payload.extend(number.iter().copied()),
            Command::Version | Command::ExitPcLink | Command::Logbook { .. } => {}
        }
        payload
    }

    /// Whether the small answer is followed by a bulk transfer.
    pub fn has_bulk_answer(&self) -> bool {
        matches!(self, Command::Logbook { .. } | Command::Dive { .. })
    }
}
