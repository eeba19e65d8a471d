//! Serial transport for talking to a gridlink board controller.
//!
//! This is the lowest layer of gridlink. It knows how to enumerate visible
//! serial devices and open one as a [`SerialLink`] at the fixed line settings
//! the controller expects (115200 baud, 8N1). Everything else builds on the
//! [`Connector`] seam so that sessions can be exercised without hardware.

pub mod connector;
pub mod error;
pub mod link;

pub use connector::{
    device_names, Connector, DeviceInfo, DeviceKind, SerialConfig, SerialConnector,
    DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT,
};
pub use error::{Result, TransportError};
pub use link::SerialLink;
