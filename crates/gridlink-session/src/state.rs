use std::fmt;

/// Where a session is in its connect → fault → reconnect lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No link. Terminal once reached through [`crate::Session::close`].
    Disconnected,
    /// The first open is in progress.
    Connecting,
    /// A link is open and the read task is running.
    Connected,
    /// The link failed; the reconnect supervisor is about to take over.
    Faulted,
    /// Polling for the device to come back.
    Reconnecting,
}

impl ConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Faulted => "faulted",
            ConnectionState::Reconnecting => "reconnecting",
        }
    }

    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
