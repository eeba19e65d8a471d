//! Device session management for gridlink.
//!
//! This is the "just works" layer. Open a session on a serial device, send
//! commands, and receive decoded events on one ordered channel. If the
//! device disappears the session reconnects to it on its own when it comes
//! back.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod session;
pub mod state;
mod supervisor;

pub use config::{SessionConfig, DEFAULT_RECONNECT_INTERVAL};
pub use dispatch::{event_for_frame, event_for_inbound, Dispatcher};
pub use error::{Result, SessionError};
pub use event::{Event, Events};
pub use session::{connect, connect_with_config, Session};
pub use state::ConnectionState;
