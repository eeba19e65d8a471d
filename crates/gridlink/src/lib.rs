//! Host-side protocol engine for gridlink puzzle board controllers.
//!
//! A gridlink controller is a microcontroller driving a 9×9 number board. It
//! speaks a small fixed-format binary protocol over a serial link: 5-byte
//! command frames out, 6-byte status or 84-byte board frames back, each
//! closed by an XOR checksum.
//!
//! # Crate Structure
//!
//! - [`transport`]: Serial device enumeration and links
//! - [`frame`]: Opcodes, status codes, frame codec and reassembly
//! - [`session`]: Connection lifecycle, events and automatic reconnection
//!   (behind the default `session` feature)
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use gridlink::frame::Command;
//! use gridlink::session::connect;
//! use gridlink::transport::SerialConnector;
//!
//! let (session, events) = connect("/dev/ttyUSB0", Arc::new(SerialConnector::default()))?;
//! session.send(Command::RequestField)?;
//! for event in events.iter().take(2) {
//!     println!("{event}");
//! }
//! # Ok::<(), gridlink::session::SessionError>(())
//! ```

/// Re-export transport types.
pub mod transport {
    pub use gridlink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use gridlink_frame::*;
}

/// Re-export session types (requires `session` feature).
#[cfg(feature = "session")]
pub mod session {
    pub use gridlink_session::*;
}
