use bytes::BytesMut;

use crate::codec::{decode_frame, FrameConfig, Inbound};
use crate::error::Result;

const INITIAL_BUFFER_CAPACITY: usize = 512;

/// Turns arbitrarily chunked bytes from the link back into frames.
///
/// Bytes are appended as they arrive and frames are taken off the front as
/// soon as they are complete. Partial frames stay buffered across calls, so
/// splitting a stream at any points yields the same frames as feeding it
/// whole.
#[derive(Debug)]
pub struct Reassembler {
    buf: BytesMut,
    config: FrameConfig,
}

impl Reassembler {
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default())
    }

    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Append bytes read from the link.
    pub fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Take the next complete unit off the buffer, if there is one.
    ///
    /// Fails only under [`crate::UnknownOpcodePolicy::Reject`].
    pub fn next_inbound(&mut self) -> Result<Option<Inbound>> {
        decode_frame(&mut self.buf, &self.config)
    }

    /// Append a chunk and drain every unit it completes, in arrival order.
    ///
    /// On error, units decoded before the failing byte are lost to the
    /// caller; use [`Reassembler::next_inbound`] to keep them.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<Inbound>> {
        self.extend(chunk);
        let mut out = Vec::new();
        while let Some(inbound) = self.next_inbound()? {
            out.push(inbound);
        }
        Ok(out)
    }

    /// Number of bytes waiting for the rest of their frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Drop any partial frame.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl Default for Reassembler {
    fn default() -> Self {
        Self::new()
    }
}
