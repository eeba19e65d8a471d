use bytes::{Buf, BytesMut};
use tracing::{trace, warn};

use crate::board::{BoardSnapshot, Cell, BOARD_CELLS};
use crate::command::Command;
use crate::error::{FrameError, Result};
use crate::status::Status;

/// Outgoing command frame: opcode + 3 args + checksum.
pub const OUTGOING_FRAME_SIZE: usize = 5;

/// Short reply: opcode + status + 3 args + checksum.
pub const SHORT_FRAME_SIZE: usize = 6;

/// Board reply: opcode + status + 81 cells + checksum.
pub const LONG_FRAME_SIZE: usize = 2 + BOARD_CELLS + 1;

/// Smallest incoming frame; nothing is decoded from fewer buffered bytes.
pub const MIN_FRAME_SIZE: usize = SHORT_FRAME_SIZE;

/// XOR of every byte.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

/// True if `expected` is the checksum of `bytes`.
pub fn verify(bytes: &[u8], expected: u8) -> bool {
    checksum(bytes) == expected
}

/// Uppercase space-separated hex, as used in TX/RX logs.
pub fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{b:02X}"));
    }
    out
}

/// Encode a command into the 5-byte wire format.
///
/// Wire format:
/// ```text
/// ┌────────┬──────┬──────┬──────┬──────────────────┐
/// │ Opcode │ Arg1 │ Arg2 │ Arg3 │ XOR of bytes 0-3 │
/// └────────┴──────┴──────┴──────┴──────────────────┘
/// ```
pub fn encode(command: Command, a1: u8, a2: u8, a3: u8) -> [u8; OUTGOING_FRAME_SIZE] {
    let mut out = [command.opcode(), a1, a2, a3, 0];
    out[4] = checksum(&out[..4]);
    out
}

/// A command ready to be written to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutgoingFrame {
    pub command: Command,
    pub args: [u8; 3],
}

impl OutgoingFrame {
    pub fn new(command: Command, a1: u8, a2: u8, a3: u8) -> Self {
        Self {
            command,
            args: [a1, a2, a3],
        }
    }

    /// A command that takes no arguments; all three are sent as zero.
    pub fn simple(command: Command) -> Self {
        Self::new(command, 0, 0, 0)
    }

    pub fn set_cell(cell: Cell, value: u8) -> Self {
        Self::new(Command::SetCell, cell.row(), cell.col(), value)
    }

    pub fn clear_cell(cell: Cell) -> Self {
        Self::new(Command::ClearCell, cell.row(), cell.col(), 0)
    }

    pub fn request_help(cell: Cell) -> Self {
        Self::new(Command::RequestHelp, cell.row(), cell.col(), 0)
    }

    pub fn request_difficulty(level: u8) -> Self {
        Self::new(Command::RequestDifficulty, level, 0, 0)
    }

    pub fn to_bytes(&self) -> [u8; OUTGOING_FRAME_SIZE] {
        encode(self.command, self.args[0], self.args[1], self.args[2])
    }
}

impl From<Command> for OutgoingFrame {
    fn from(command: Command) -> Self {
        Self::simple(command)
    }
}

/// The two incoming frame layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameShape {
    /// 6-byte status reply.
    Short,
    /// 84-byte board reply.
    Long,
}

impl FrameShape {
    /// Total wire length, checksum included.
    pub fn len(self) -> usize {
        match self {
            FrameShape::Short => SHORT_FRAME_SIZE,
            FrameShape::Long => LONG_FRAME_SIZE,
        }
    }
}

/// A 6-byte status reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortFrame {
    pub command: Command,
    pub status: Status,
    pub args: [u8; 3],
}

impl ShortFrame {
    pub fn new(command: Command, status: Status, a1: u8, a2: u8, a3: u8) -> Self {
        Self {
            command,
            status,
            args: [a1, a2, a3],
        }
    }

    /// Wire bytes as the controller would send them.
    pub fn to_bytes(&self) -> [u8; SHORT_FRAME_SIZE] {
        let mut out = [
            self.command.opcode(),
            self.status.as_byte(),
            self.args[0],
            self.args[1],
            self.args[2],
            0,
        ];
        out[5] = checksum(&out[..5]);
        out
    }
}

/// An 84-byte board reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongFrame {
    pub command: Command,
    pub status: Status,
    pub board: BoardSnapshot,
}

impl LongFrame {
    /// Wire bytes as the controller would send them.
    pub fn to_bytes(&self) -> [u8; LONG_FRAME_SIZE] {
        let mut out = [0u8; LONG_FRAME_SIZE];
        out[0] = self.command.opcode();
        out[1] = self.status.as_byte();
        out[2..2 + BOARD_CELLS].copy_from_slice(self.board.as_bytes());
        out[LONG_FRAME_SIZE - 1] = checksum(&out[..LONG_FRAME_SIZE - 1]);
        out
    }
}

/// A checksum-validated frame from the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncomingFrame {
    Short(ShortFrame),
    Long(LongFrame),
}

impl IncomingFrame {
    pub fn command(&self) -> Command {
        match self {
            IncomingFrame::Short(f) => f.command,
            IncomingFrame::Long(f) => f.command,
        }
    }

    pub fn status(&self) -> Status {
        match self {
            IncomingFrame::Short(f) => f.status,
            IncomingFrame::Long(f) => f.status,
        }
    }

    pub fn shape(&self) -> FrameShape {
        match self {
            IncomingFrame::Short(_) => FrameShape::Short,
            IncomingFrame::Long(_) => FrameShape::Long,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            IncomingFrame::Short(f) => f.to_bytes().to_vec(),
            IncomingFrame::Long(f) => f.to_bytes().to_vec(),
        }
    }
}

/// A correctly bounded frame whose checksum did not match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorruptFrame {
    pub opcode: u8,
    /// Checksum computed over the received data span.
    pub expected: u8,
    /// Checksum byte actually received.
    pub actual: u8,
    pub len: usize,
}

/// Outcome of decoding one window of bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Frame(IncomingFrame),
    /// The window is shorter than the shape its opcode implies.
    NeedMoreBytes { needed: usize },
    ChecksumError(CorruptFrame),
}

/// One unit of output from the reassembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Frame(IncomingFrame),
    Corrupt(CorruptFrame),
    /// A leading byte that is not a known opcode was dropped.
    Skipped { byte: u8 },
}

/// What to do when a frame would start with an unknown opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownOpcodePolicy {
    /// Drop exactly that one byte, report it, and try again at the next byte.
    #[default]
    Skip,
    /// Consume the byte and fail with [`FrameError::UnknownOpcode`].
    Reject,
}

/// Configuration for frame decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameConfig {
    pub unknown_opcode: UnknownOpcodePolicy,
}

/// Decode the frame at the start of `buf`.
///
/// Only the first `shape.len()` bytes are looked at; anything after them is
/// ignored. Payload bytes are never validated beyond the checksum: any board
/// value and any argument byte is accepted.
pub fn decode(buf: &[u8]) -> Result<Decoded> {
    let Some(&opcode) = buf.first() else {
        return Ok(Decoded::NeedMoreBytes {
            needed: MIN_FRAME_SIZE,
        });
    };
    let command = Command::from_opcode(opcode).ok_or(FrameError::UnknownOpcode(opcode))?;
    Ok(decode_command(command, buf))
}

/// Decode the reply to `command` at the start of `buf`.
fn decode_command(command: Command, buf: &[u8]) -> Decoded {
    match command.reply_shape() {
        FrameShape::Short => match buf.first_chunk::<SHORT_FRAME_SIZE>() {
            Some(raw) => decode_short(command, raw),
            None => need_more(FrameShape::Short, buf),
        },
        FrameShape::Long => match buf.first_chunk::<LONG_FRAME_SIZE>() {
            Some(raw) => decode_long(command, raw),
            None => need_more(FrameShape::Long, buf),
        },
    }
}

fn need_more(shape: FrameShape, buf: &[u8]) -> Decoded {
    Decoded::NeedMoreBytes {
        needed: shape.len() - buf.len(),
    }
}

fn decode_short(command: Command, raw: &[u8; SHORT_FRAME_SIZE]) -> Decoded {
    if let Some(corrupt) = check(command, raw) {
        return Decoded::ChecksumError(corrupt);
    }
    Decoded::Frame(IncomingFrame::Short(ShortFrame::new(
        command,
        Status::from_byte(raw[1]),
        raw[2],
        raw[3],
        raw[4],
    )))
}

fn decode_long(command: Command, raw: &[u8; LONG_FRAME_SIZE]) -> Decoded {
    if let Some(corrupt) = check(command, raw) {
        return Decoded::ChecksumError(corrupt);
    }
    let mut cells = [0u8; BOARD_CELLS];
    cells.copy_from_slice(&raw[2..2 + BOARD_CELLS]);
    Decoded::Frame(IncomingFrame::Long(LongFrame {
        command,
        status: Status::from_byte(raw[1]),
        board: BoardSnapshot::from_cells(cells),
    }))
}

/// Compare the trailing checksum byte against the rest of the window.
fn check(command: Command, raw: &[u8]) -> Option<CorruptFrame> {
    let (&actual, data) = raw.split_last()?;
    let expected = checksum(data);
    (expected != actual).then(|| CorruptFrame {
        opcode: command.opcode(),
        expected,
        actual,
        len: raw.len(),
    })
}

/// Decode the next unit from a stream buffer.
///
/// Returns `Ok(None)` if the buffer doesn't hold a complete frame yet. A
/// frame's bytes are consumed whether or not its checksum matches; there is
/// no search for a new frame boundary after corruption.
pub fn decode_frame(src: &mut BytesMut, config: &FrameConfig) -> Result<Option<Inbound>> {
    if src.len() < MIN_FRAME_SIZE {
        return Ok(None); // Need more data
    }

    let opcode = src[0];
    let Some(command) = Command::from_opcode(opcode) else {
        src.advance(1);
        return match config.unknown_opcode {
            UnknownOpcodePolicy::Skip => {
                warn!(byte = %format!("0x{opcode:02X}"), "dropping byte with unknown opcode");
                Ok(Some(Inbound::Skipped { byte: opcode }))
            }
            UnknownOpcodePolicy::Reject => Err(FrameError::UnknownOpcode(opcode)),
        };
    };

    let shape = command.reply_shape();
    match decode_command(command, &src[..]) {
        Decoded::NeedMoreBytes { .. } => Ok(None), // Need more data
        Decoded::Frame(frame) => {
            let raw = src.split_to(shape.len());
            trace!(bytes = %hex(&raw), ?shape, "rx frame");
            Ok(Some(Inbound::Frame(frame)))
        }
        Decoded::ChecksumError(corrupt) => {
            let raw = src.split_to(shape.len());
            trace!(bytes = %hex(&raw), ?shape, "rx frame");
            warn!(
                opcode = %format!("0x{:02X}", corrupt.opcode),
                expected = %format!("0x{:02X}", corrupt.expected),
                actual = %format!("0x{:02X}", corrupt.actual),
                "checksum mismatch, frame discarded"
            );
            Ok(Some(Inbound::Corrupt(corrupt)))
        }
    }
}
