use gridlink_transport::TransportError;

/// Errors that can occur in session operations.
///
/// Faults that happen after a session is up are never returned here; they
/// arrive as events and the session reconnects by itself.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The device could not be opened. The session was not created.
    #[error("device {device} unavailable: {source}")]
    TransportUnavailable {
        device: String,
        source: TransportError,
    },

    /// The session is not connected right now; nothing was written.
    #[error("not connected")]
    NotConnected,

    /// A background thread could not be started.
    #[error("failed to start session thread: {0}")]
    Spawn(std::io::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;
