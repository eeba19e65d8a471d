use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPortType, StopBits};
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::link::SerialLink;

/// Line speed the controller firmware runs its UART at.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Short read timeout so a reader can notice shutdown without blocking forever.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Serial line settings. Data bits, parity and stop bits are fixed at 8N1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialConfig {
    /// Baud rate. Default: 115200.
    pub baud_rate: u32,
    /// Read timeout applied when the port is opened. Default: 100 ms.
    pub read_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

/// Bus a serial device hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Usb,
    Bluetooth,
    Pci,
    Unknown,
}

impl DeviceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceKind::Usb => "USB",
            DeviceKind::Bluetooth => "Bluetooth",
            DeviceKind::Pci => "PCI",
            DeviceKind::Unknown => "Unknown",
        }
    }
}

/// A serial device currently visible to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Platform device name, e.g. `/dev/ttyACM0` or `COM3`.
    pub name: String,
    pub kind: DeviceKind,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub serial_number: Option<String>,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
}

impl DeviceInfo {
    /// A device known only by name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DeviceKind::Unknown,
            manufacturer: None,
            product: None,
            serial_number: None,
            vid: None,
            pid: None,
        }
    }
}

/// Enumerates and opens devices.
///
/// The session layer only ever reaches hardware through this trait, so the
/// reconnect path can be driven by a fake that makes devices appear and
/// disappear on demand.
pub trait Connector: Send + Sync {
    /// Devices visible right now.
    fn available_devices(&self) -> Result<Vec<DeviceInfo>>;

    /// Open the named device as a duplex link.
    fn open(&self, device: &str) -> Result<SerialLink>;
}

/// Names of the devices visible right now.
pub fn device_names(connector: &dyn Connector) -> Result<Vec<String>> {
    Ok(connector
        .available_devices()?
        .into_iter()
        .map(|info| info.name)
        .collect())
}

/// Real serial ports via the `serialport` crate.
#[derive(Debug, Clone, Default)]
pub struct SerialConnector {
    config: SerialConfig,
}

impl SerialConnector {
    pub fn new(config: SerialConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SerialConfig {
        &self.config
    }
}

impl Connector for SerialConnector {
    /// On macOS only `/dev/cu.*` devices are listed; the `/dev/tty.*` twins
    /// block on open waiting for carrier detect.
    fn available_devices(&self) -> Result<Vec<DeviceInfo>> {
        let ports = serialport::available_ports()
            .map_err(|err| TransportError::Enumerate(err.into()))?;

        Ok(ports
            .into_iter()
            .filter(|_p| {
                #[cfg(target_os = "macos")]
                {
                    !_p.port_name.starts_with("/dev/tty.")
                }
                #[cfg(not(target_os = "macos"))]
                {
                    true
                }
            })
            .map(|p| match p.port_type {
                SerialPortType::UsbPort(usb) => DeviceInfo {
                    name: p.port_name,
                    kind: DeviceKind::Usb,
                    manufacturer: usb.manufacturer,
                    product: usb.product,
                    serial_number: usb.serial_number,
                    vid: Some(usb.vid),
                    pid: Some(usb.pid),
                },
                SerialPortType::BluetoothPort => DeviceInfo {
                    kind: DeviceKind::Bluetooth,
                    ..DeviceInfo::named(p.port_name)
                },
                SerialPortType::PciPort => DeviceInfo {
                    kind: DeviceKind::Pci,
                    ..DeviceInfo::named(p.port_name)
                },
                SerialPortType::Unknown => DeviceInfo::named(p.port_name),
            })
            .collect())
    }

    fn open(&self, device: &str) -> Result<SerialLink> {
        let port = serialport::new(device, self.config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(self.config.read_timeout)
            .open()
            .map_err(|err| TransportError::Open {
                device: device.to_string(),
                source: err.into(),
            })?;

        // Drop anything the controller sent before we were listening.
        if let Err(err) = port.clear(serialport::ClearBuffer::All) {
            debug!(device, error = %err, "could not clear serial buffers");
        }

        info!(
            device,
            baud = self.config.baud_rate,
            "opened serial device (8N1)"
        );
        Ok(SerialLink::from_port(device, port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedConnector(Vec<DeviceInfo>);

    impl Connector for FixedConnector {
        fn available_devices(&self) -> Result<Vec<DeviceInfo>> {
            Ok(self.0.clone())
        }

        fn open(&self, device: &str) -> Result<SerialLink> {
            Err(TransportError::Open {
                device: device.to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
        }
    }

    #[test]
    fn default_config_is_115200_with_short_timeout() {
        let config = SerialConfig::default();
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.read_timeout, Duration::from_millis(100));
    }

    #[test]
    fn device_names_projects_infos() {
        let connector = FixedConnector(vec![
            DeviceInfo::named("/dev/ttyACM0"),
            DeviceInfo {
                kind: DeviceKind::Usb,
                vid: Some(0x0483),
                pid: Some(0x374b),
                ..DeviceInfo::named("/dev/ttyUSB1")
            },
        ]);

        let names = device_names(&connector).unwrap();
        assert_eq!(names, vec!["/dev/ttyACM0", "/dev/ttyUSB1"]);
    }

    #[test]
    fn open_missing_device_reports_device_name() {
        let connector = SerialConnector::default();
        let err = connector
            .open("/dev/gridlink-definitely-missing")
            .unwrap_err();
        assert!(matches!(err, TransportError::Open { ref device, .. } if device == "/dev/gridlink-definitely-missing"));
        assert!(err.to_string().contains("/dev/gridlink-definitely-missing"));
    }

    #[test]
    fn device_kind_labels() {
        assert_eq!(DeviceKind::Usb.as_str(), "USB");
        assert_eq!(DeviceKind::Unknown.as_str(), "Unknown");
    }
}
