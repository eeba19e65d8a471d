//! Reply status codes.

use std::fmt;

pub const OK: u8 = 0x10;
pub const INVALID: u8 = 0x11;
pub const LOCKED: u8 = 0x12;
/// Never sent by a healthy peer; used for locally detected corruption.
pub const CHECKSUM_ERROR: u8 = 0x13;
pub const LOSE: u8 = 0x14;
pub const WIN: u8 = 0x15;
pub const DIFFICULTY_SET: u8 = 0x16;
pub const HELP_DENIED: u8 = 0x65;
pub const HELP_GRANTED: u8 = 0x66;

/// Status byte carried by every reply.
///
/// Any byte is structurally valid; values outside the table are kept as
/// [`Status::Unknown`] so they can still be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok,
    Invalid,
    Locked,
    ChecksumError,
    Lose,
    Win,
    DifficultySet,
    HelpDenied,
    HelpGranted,
    Unknown(u8),
}

impl Status {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            OK => Status::Ok,
            INVALID => Status::Invalid,
            LOCKED => Status::Locked,
            CHECKSUM_ERROR => Status::ChecksumError,
            LOSE => Status::Lose,
            WIN => Status::Win,
            DIFFICULTY_SET => Status::DifficultySet,
            HELP_DENIED => Status::HelpDenied,
            HELP_GRANTED => Status::HelpGranted,
            other => Status::Unknown(other),
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Status::Ok => OK,
            Status::Invalid => INVALID,
            Status::Locked => LOCKED,
            Status::ChecksumError => CHECKSUM_ERROR,
            Status::Lose => LOSE,
            Status::Win => WIN,
            Status::DifficultySet => DIFFICULTY_SET,
            Status::HelpDenied => HELP_DENIED,
            Status::HelpGranted => HELP_GRANTED,
            Status::Unknown(byte) => byte,
        }
    }

    /// Short text shown to players for this status.
    pub fn label(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Invalid => "INVALID",
            Status::Locked => "LOCKED",
            Status::ChecksumError => "CRC ERROR",
            Status::Lose => "YOU LOSE",
            Status::Win => "YOU WIN",
            Status::DifficultySet => "SETDIF",
            Status::HelpDenied => "NOOB",
            Status::HelpGranted => "OK_CHEAT",
            Status::Unknown(_) => "UNKNOWN",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Unknown(byte) => write!(f, "UNKNOWN(0x{byte:02X})"),
            other => f.write_str(other.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_byte_round_trips() {
        for byte in 0..=u8::MAX {
            assert_eq!(Status::from_byte(byte).as_byte(), byte);
        }
    }

    #[test]
    fn table_values() {
        assert_eq!(Status::from_byte(0x10), Status::Ok);
        assert_eq!(Status::from_byte(0x16), Status::DifficultySet);
        assert_eq!(Status::from_byte(0x65), Status::HelpDenied);
        assert_eq!(Status::from_byte(0x66), Status::HelpGranted);
        assert_eq!(Status::from_byte(0x42), Status::Unknown(0x42));
    }

    #[test]
    fn display_uses_labels() {
        assert_eq!(Status::Win.to_string(), "YOU WIN");
        assert_eq!(Status::Unknown(0x7f).to_string(), "UNKNOWN(0x7F)");
    }
}
