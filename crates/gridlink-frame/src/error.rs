/// Errors that can occur during frame reading and writing.
///
/// A checksum mismatch is not an error here: the bytes were correctly
/// bounded, so the reassembler reports them as [`crate::Inbound::Corrupt`]
/// and carries on.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A frame started with a byte that is not a known opcode.
    #[error("unknown opcode 0x{0:02X}")]
    UnknownOpcode(u8),

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The link reached EOF.
    #[error("connection closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
