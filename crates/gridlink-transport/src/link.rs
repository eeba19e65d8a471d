use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use serialport::SerialPort;
use tracing::debug;

use crate::error::Result;

/// An open duplex byte link to the controller. Implements `Read` and `Write`.
///
/// In production this wraps a serial port. On Unix an in-memory socket pair
/// can stand in for the port (see [`SerialLink::pair`]), which is how the
/// session layer is tested without hardware.
pub struct SerialLink {
    name: String,
    inner: SerialLinkInner,
}

enum SerialLinkInner {
    Port(Box<dyn SerialPort>),
    #[cfg(unix)]
    Socket(std::os::unix::net::UnixStream),
}

impl Read for SerialLink {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            SerialLinkInner::Port(port) => port.read(buf),
            #[cfg(unix)]
            SerialLinkInner::Socket(stream) => stream.read(buf),
        }
    }
}

impl Write for SerialLink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            SerialLinkInner::Port(port) => port.write(buf),
            #[cfg(unix)]
            SerialLinkInner::Socket(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            SerialLinkInner::Port(port) => port.flush(),
            #[cfg(unix)]
            SerialLinkInner::Socket(stream) => stream.flush(),
        }
    }
}

impl SerialLink {
    /// Wrap an already-opened serial port.
    pub(crate) fn from_port(name: impl Into<String>, port: Box<dyn SerialPort>) -> Self {
        Self {
            name: name.into(),
            inner: SerialLinkInner::Port(port),
        }
    }

    /// Create a connected in-memory link pair `(host, device)`.
    ///
    /// Bytes written to one end are read from the other. Dropping or shutting
    /// down either end makes reads on the other end return EOF, which is how a
    /// pulled cable looks to the session.
    #[cfg(unix)]
    pub fn pair(name: impl Into<String>) -> Result<(Self, Self)> {
        let name = name.into();
        let (host, device) = std::os::unix::net::UnixStream::pair()?;
        Ok((
            Self {
                name: name.clone(),
                inner: SerialLinkInner::Socket(host),
            },
            Self {
                name,
                inner: SerialLinkInner::Socket(device),
            },
        ))
    }

    /// Device name this link was opened on.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the read timeout. Reads that time out fail with `TimedOut` on a
    /// serial port and `WouldBlock` on a socket.
    pub fn set_read_timeout(&mut self, timeout: Duration) -> Result<()> {
        match &mut self.inner {
            SerialLinkInner::Port(port) => port
                .set_timeout(timeout)
                .map_err(|err| std::io::Error::from(err).into()),
            #[cfg(unix)]
            SerialLinkInner::Socket(stream) => {
                stream.set_read_timeout(Some(timeout)).map_err(Into::into)
            }
        }
    }

    /// Try to clone this link (a second handle on the same device).
    pub fn try_clone(&self) -> Result<Self> {
        let inner = match &self.inner {
            SerialLinkInner::Port(port) => SerialLinkInner::Port(
                port.try_clone().map_err(std::io::Error::from)?,
            ),
            #[cfg(unix)]
            SerialLinkInner::Socket(stream) => SerialLinkInner::Socket(stream.try_clone()?),
        };
        Ok(Self {
            name: self.name.clone(),
            inner,
        })
    }

    /// Shut the link down in both directions.
    ///
    /// Socket links wake any blocked reader immediately. Serial ports have no
    /// such primitive; a reader on a port notices at its next read timeout.
    pub fn shutdown(&self) {
        match &self.inner {
            SerialLinkInner::Port(port) => {
                let _ = port.clear(serialport::ClearBuffer::All);
                debug!(device = %self.name, "serial link released");
            }
            #[cfg(unix)]
            SerialLinkInner::Socket(stream) => {
                if let Err(err) = stream.shutdown(std::net::Shutdown::Both) {
                    if err.kind() != ErrorKind::NotConnected {
                        debug!(device = %self.name, error = %err, "link shutdown failed");
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.inner {
            SerialLinkInner::Port(_) => "serial",
            #[cfg(unix)]
            SerialLinkInner::Socket(_) => "socket",
        };
        f.debug_struct("SerialLink")
            .field("name", &self.name)
            .field("type", &kind)
            .finish()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn pair_carries_bytes_both_ways() {
        let (mut host, mut device) = SerialLink::pair("loop0").unwrap();

        host.write_all(&[0x04, 0x02, 0x03, 0x07, 0x02]).unwrap();
        let mut buf = [0u8; 5];
        device.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [0x04, 0x02, 0x03, 0x07, 0x02]);

        device.write_all(&[0xAA]).unwrap();
        let mut one = [0u8; 1];
        host.read_exact(&mut one).unwrap();
        assert_eq!(one, [0xAA]);
    }

    #[test]
    fn read_timeout_is_reported_as_timeout() {
        let (mut host, _device) = SerialLink::pair("loop1").unwrap();
        host.set_read_timeout(Duration::from_millis(10)).unwrap();

        let mut buf = [0u8; 8];
        let err = host.read(&mut buf).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::TimedOut | ErrorKind::WouldBlock
        ));
    }

    #[test]
    fn shutdown_unblocks_clone_with_eof() {
        let (host, _device) = SerialLink::pair("loop2").unwrap();
        let mut reader = host.try_clone().unwrap();

        let handle = std::thread::spawn(move || {
            let mut buf = [0u8; 8];
            reader.read(&mut buf).unwrap()
        });

        host.shutdown();
        assert_eq!(handle.join().unwrap(), 0);
    }

    #[test]
    fn dropping_device_end_reads_eof() {
        let (mut host, device) = SerialLink::pair("loop3").unwrap();
        drop(device);

        let mut buf = [0u8; 8];
        assert_eq!(host.read(&mut buf).unwrap(), 0);
        assert_eq!(host.name(), "loop3");
    }

    #[test]
    fn debug_names_link_type() {
        let (host, _device) = SerialLink::pair("loop4").unwrap();
        let text = format!("{host:?}");
        assert!(text.contains("socket"));
        assert!(text.contains("loop4"));
    }
}
