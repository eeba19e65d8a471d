use std::io::{ErrorKind, Write};

use tracing::debug;

use crate::codec::{hex, OutgoingFrame};
use crate::error::{FrameError, Result};

/// Writes command frames to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
}

impl<T: Write> FrameWriter<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Encode and write one command frame (blocking), then flush.
    pub fn send(&mut self, frame: &OutgoingFrame) -> Result<()> {
        let bytes = frame.to_bytes();
        debug!(
            command = frame.command.name(),
            bytes = %hex(&bytes),
            "tx frame"
        );
        self.write_all(&bytes)?;
        self.flush()
    }

    /// Write pre-encoded bytes verbatim (blocking).
    pub fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < bytes.len() {
            match self.inner.write(&bytes[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(())
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::board::Cell;
    use crate::command::Command;

    #[test]
    fn write_single_frame() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer
            .send(&OutgoingFrame::set_cell(Cell::new(2, 3).unwrap(), 7))
            .unwrap();

        let wire = writer.into_inner().into_inner();
        assert_eq!(wire, vec![0x04, 0x02, 0x03, 0x07, 0x02]);
    }

    #[test]
    fn write_multiple_frames_in_order() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send(&OutgoingFrame::simple(Command::Start)).unwrap();
        writer
            .send(&OutgoingFrame::simple(Command::RequestField))
            .unwrap();

        let wire = writer.into_inner().into_inner();
        assert_eq!(wire, vec![0x01, 0, 0, 0, 0x01, 0x07, 0, 0, 0, 0x07]);
    }

    #[test]
    fn short_writes_are_completed() {
        let mut writer = FrameWriter::new(OneByteWriter(Vec::new()));
        writer.send(&OutgoingFrame::simple(Command::GiveUp)).unwrap();
        assert_eq!(writer.get_ref().0, vec![0x03, 0, 0, 0, 0x03]);
    }

    #[test]
    fn zero_length_write_means_closed() {
        let mut writer = FrameWriter::new(ClosedWriter);
        let err = writer
            .send(&OutgoingFrame::simple(Command::ClearAll))
            .unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn write_error_propagates() {
        let mut writer = FrameWriter::new(BrokenWriter);
        let err = writer
            .send(&OutgoingFrame::simple(Command::ClearAll))
            .unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }

    struct OneByteWriter(Vec<u8>);

    impl Write for OneByteWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.push(buf[0]);
            Ok(1)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ClosedWriter;

    impl Write for ClosedWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
