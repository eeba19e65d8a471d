//! Command opcodes.
//!
//! The opcode is the first byte of every frame in both directions. A reply
//! echoes the opcode of the command it answers, and the opcode alone decides
//! whether the reply is a short status frame or a full board frame.

use std::fmt;

use crate::codec::FrameShape;

pub const START: u8 = 0x01;
pub const RESTART: u8 = 0x02;
pub const GIVE_UP: u8 = 0x03;
pub const SET_CELL: u8 = 0x04;
pub const CLEAR_CELL: u8 = 0x05;
pub const CLEAR_ALL: u8 = 0x06;
pub const REQUEST_FIELD: u8 = 0x07;
pub const REQUEST_DIFFICULTY: u8 = 0x08;
pub const REQUEST_HELP: u8 = 0x98;
/// Help variant that answers with the whole solved board.
pub const REVEAL: u8 = 0x99;

/// A command understood by the board controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    /// Start a new game at the selected difficulty. Answered with a board.
    Start = START,
    /// Restart the current puzzle. Answered with a board.
    Restart = RESTART,
    /// Surrender the current game.
    GiveUp = GIVE_UP,
    /// Write a value: args are row, col, value.
    SetCell = SET_CELL,
    /// Clear a value: args are row, col.
    ClearCell = CLEAR_CELL,
    /// Clear every user-entered value.
    ClearAll = CLEAR_ALL,
    /// Ask for progress counters (empty cells at start, empty cells now).
    RequestField = REQUEST_FIELD,
    /// Select a difficulty level: arg is the level.
    RequestDifficulty = REQUEST_DIFFICULTY,
    /// Ask for a hint at a cell: args are row, col.
    RequestHelp = REQUEST_HELP,
    /// Ask for the full solution board.
    Reveal = REVEAL,
}

impl Command {
    /// Every command, in opcode order.
    pub const ALL: [Command; 10] = [
        Command::Start,
        Command::Restart,
        Command::GiveUp,
        Command::SetCell,
        Command::ClearCell,
        Command::ClearAll,
        Command::RequestField,
        Command::RequestDifficulty,
        Command::RequestHelp,
        Command::Reveal,
    ];

    pub fn opcode(self) -> u8 {
        self as u8
    }

    pub fn from_opcode(opcode: u8) -> Option<Self> {
        match opcode {
            START => Some(Command::Start),
            RESTART => Some(Command::Restart),
            GIVE_UP => Some(Command::GiveUp),
            SET_CELL => Some(Command::SetCell),
            CLEAR_CELL => Some(Command::ClearCell),
            CLEAR_ALL => Some(Command::ClearAll),
            REQUEST_FIELD => Some(Command::RequestField),
            REQUEST_DIFFICULTY => Some(Command::RequestDifficulty),
            REQUEST_HELP => Some(Command::RequestHelp),
            REVEAL => Some(Command::Reveal),
            _ => None,
        }
    }

    /// Shape of the controller's reply to this command.
    pub fn reply_shape(self) -> FrameShape {
        match self {
            Command::Start | Command::Restart | Command::Reveal => FrameShape::Long,
            _ => FrameShape::Short,
        }
    }

    /// Returns a human-readable name, as used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Command::Start => "START",
            Command::Restart => "RESTART",
            Command::GiveUp => "GIVE_UP",
            Command::SetCell => "SET_CELL",
            Command::ClearCell => "CLEAR_CELL",
            Command::ClearAll => "CLEAR_ALL",
            Command::RequestField => "REQUEST_FIELD",
            Command::RequestDifficulty => "REQUEST_DIFFICULTY",
            Command::RequestHelp => "REQUEST_HELP",
            Command::Reveal => "REVEAL",
        }
    }

    /// Parse a command name, case-insensitively. Accepts the log names and
    /// short aliases (`set`, `clear`, `field`, `help`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase().replace('-', "_");
        let cmd = match upper.as_str() {
            "START" => Command::Start,
            "RESTART" => Command::Restart,
            "GIVE_UP" | "GIVEUP" => Command::GiveUp,
            "SET_CELL" | "SET" => Command::SetCell,
            "CLEAR_CELL" | "CLEAR" => Command::ClearCell,
            "CLEAR_ALL" | "CLEARALL" => Command::ClearAll,
            "REQUEST_FIELD" | "FIELD" => Command::RequestField,
            "REQUEST_DIFFICULTY" | "DIFFICULTY" => Command::RequestDifficulty,
            "REQUEST_HELP" | "HELP" => Command::RequestHelp,
            "REVEAL" | "CHEAT" => Command::Reveal,
            _ => return None,
        };
        Some(cmd)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_table_matches_wire_values() {
        assert_eq!(Command::Start.opcode(), 0x01);
        assert_eq!(Command::Restart.opcode(), 0x02);
        assert_eq!(Command::GiveUp.opcode(), 0x03);
        assert_eq!(Command::SetCell.opcode(), 0x04);
        assert_eq!(Command::ClearCell.opcode(), 0x05);
        assert_eq!(Command::ClearAll.opcode(), 0x06);
        assert_eq!(Command::RequestField.opcode(), 0x07);
        assert_eq!(Command::RequestDifficulty.opcode(), 0x08);
        assert_eq!(Command::RequestHelp.opcode(), 0x98);
        assert_eq!(Command::Reveal.opcode(), 0x99);
    }

    #[test]
    fn from_opcode_inverts_opcode() {
        for cmd in Command::ALL {
            assert_eq!(Command::from_opcode(cmd.opcode()), Some(cmd));
        }
        assert_eq!(Command::from_opcode(0x00), None);
        assert_eq!(Command::from_opcode(0x09), None);
        assert_eq!(Command::from_opcode(0xFF), None);
    }

    #[test]
    fn only_board_commands_get_long_replies() {
        let long: Vec<_> = Command::ALL
            .into_iter()
            .filter(|c| c.reply_shape() == FrameShape::Long)
            .collect();
        assert_eq!(long, vec![Command::Start, Command::Restart, Command::Reveal]);
    }

    #[test]
    fn names_parse_back() {
        for cmd in Command::ALL {
            assert_eq!(Command::from_name(cmd.name()), Some(cmd));
        }
        assert_eq!(Command::from_name("set"), Some(Command::SetCell));
        assert_eq!(Command::from_name("give-up"), Some(Command::GiveUp));
        assert_eq!(Command::from_name("bogus"), None);
    }
}
