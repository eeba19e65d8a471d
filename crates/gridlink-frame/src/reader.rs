use std::io::{ErrorKind, Read};

use crate::codec::{FrameConfig, Inbound};
use crate::error::{FrameError, Result};
use crate::reassembler::Reassembler;

const READ_CHUNK_SIZE: usize = 256;

/// Reads frames from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete frames.
/// A read timeout on the stream is not an error: [`FrameReader::read_inbound`]
/// returns `Ok(None)` so the caller can check whether it should keep going.
pub struct FrameReader<T> {
    inner: T,
    reassembler: Reassembler,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            reassembler: Reassembler::with_config(config),
        }
    }

    /// Read the next unit (blocking up to the stream's read timeout).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached and
    /// `Ok(None)` when the read timed out with no complete frame buffered.
    pub fn read_inbound(&mut self) -> Result<Option<Inbound>> {
        loop {
            if let Some(inbound) = self.reassembler.next_inbound()? {
                return Ok(Some(inbound));
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    return Ok(None)
                }
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.reassembler.extend(&chunk[..read]);
        }
    }

    /// Bytes of an incomplete frame currently buffered.
    pub fn buffered(&self) -> usize {
        self.reassembler.buffered()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
