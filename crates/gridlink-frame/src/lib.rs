//! Fixed-layout framing for the gridlink board protocol.
//!
//! The controller speaks in frames whose length is implied by the leading
//! opcode byte; there is no length prefix and no sync marker:
//! - outgoing commands are 5 bytes: opcode, three arguments, checksum
//! - short replies are 6 bytes: opcode, status, three arguments, checksum
//! - board replies are 84 bytes: opcode, status, 81 cells, checksum
//!
//! Every checksum is the XOR of all bytes before it. The [`Reassembler`]
//! turns an arbitrarily chunked byte stream back into frames.

pub mod board;
pub mod codec;
pub mod command;
pub mod error;
pub mod reader;
pub mod reassembler;
pub mod status;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_codec;

pub use board::{progress_percent, BoardSnapshot, Cell, BOARD_CELLS, BOARD_SIDE};
pub use codec::{
    checksum, decode, decode_frame, encode, hex, verify, CorruptFrame, Decoded, FrameConfig,
    FrameShape, Inbound, IncomingFrame, LongFrame, OutgoingFrame, ShortFrame, UnknownOpcodePolicy,
    LONG_FRAME_SIZE, MIN_FRAME_SIZE, OUTGOING_FRAME_SIZE, SHORT_FRAME_SIZE,
};
pub use command::Command;
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use reassembler::Reassembler;
pub use status::Status;
pub use writer::FrameWriter;

#[cfg(feature = "async")]
pub use async_codec::GridCodec;
