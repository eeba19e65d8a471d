/// Errors that can occur in serial transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the named device.
    #[error("failed to open {device}: {source}")]
    Open {
        device: String,
        source: std::io::Error,
    },

    /// Failed to list the serial devices visible to this host.
    #[error("failed to enumerate serial devices: {0}")]
    Enumerate(std::io::Error),

    /// An I/O error occurred on an open link.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
