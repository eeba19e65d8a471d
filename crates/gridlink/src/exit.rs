use std::fmt;
use std::io;

use gridlink_session::SessionError;
use gridlink_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound | io::ErrorKind::BrokenPipe | io::ErrorKind::UnexpectedEof => {
            TRANSPORT_ERROR
        }
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Open { source, .. } if source.kind() == io::ErrorKind::PermissionDenied => {
            CliError::new(PERMISSION_DENIED, format!("{context}: {source}"))
        }
        TransportError::Io(source) => io_error(context, source),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn session_error(context: &str, err: SessionError) -> CliError {
    match err {
        SessionError::TransportUnavailable { device, source } => {
            transport_error(&format!("{context}: {device}"), source)
        }
        SessionError::NotConnected => CliError::new(FAILURE, format!("{context}: {err}")),
        SessionError::Spawn(source) => {
            CliError::new(INTERNAL, format!("{context}: cannot start session thread: {source}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_device_is_a_transport_error() {
        let err = session_error(
            "connect failed",
            SessionError::TransportUnavailable {
                device: "/dev/ttyUSB9".to_string(),
                source: TransportError::Open {
                    device: "/dev/ttyUSB9".to_string(),
                    source: io::Error::from(io::ErrorKind::NotFound),
                },
            },
        );
        assert_eq!(err.code, TRANSPORT_ERROR);
        assert!(err.message.starts_with("connect failed: /dev/ttyUSB9"));
    }

    #[test]
    fn permission_denied_keeps_its_code() {
        let err = transport_error(
            "open",
            TransportError::Open {
                device: "/dev/ttyS0".to_string(),
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            },
        );
        assert_eq!(err.code, PERMISSION_DENIED);
    }

    #[test]
    fn io_errors_map_to_codes() {
        let err = transport_error(
            "read",
            TransportError::Io(io::Error::from(io::ErrorKind::TimedOut)),
        );
        assert_eq!(err.code, TIMEOUT);
        assert_eq!(
            io_error("x", io::Error::from(io::ErrorKind::BrokenPipe)).code,
            TRANSPORT_ERROR
        );
    }

    #[test]
    fn spawn_failure_is_internal() {
        let err = session_error(
            "connect failed",
            SessionError::Spawn(io::Error::from(io::ErrorKind::OutOfMemory)),
        );
        assert_eq!(err.code, INTERNAL);
    }

    #[test]
    fn not_connected_is_a_plain_failure() {
        assert_eq!(session_error("send", SessionError::NotConnected).code, FAILURE);
    }
}
