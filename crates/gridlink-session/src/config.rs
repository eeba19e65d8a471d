use std::time::Duration;

use gridlink_frame::FrameConfig;
use gridlink_transport::DEFAULT_READ_TIMEOUT;

/// Polling period while waiting for a lost device to come back.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(1);

/// Controls session behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Read timeout applied to every opened link. The read task checks for
    /// shutdown at least this often. Must be non-zero.
    pub read_timeout: Duration,
    /// Fixed delay between reconnect attempts. There is no backoff and no
    /// retry limit.
    pub reconnect_interval: Duration,
    /// Frame decoding options, including the unknown-opcode policy.
    pub frame: FrameConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            frame: FrameConfig::default(),
        }
    }
}
