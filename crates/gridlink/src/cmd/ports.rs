use gridlink_transport::{Connector, SerialConnector};

use crate::cmd::PortsArgs;
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{print_devices, OutputFormat};

pub fn run(args: PortsArgs, format: OutputFormat) -> CliResult<i32> {
    let devices = SerialConnector::default()
        .available_devices()
        .map_err(|err| transport_error("listing serial devices failed", err))?;
    tracing::debug!(count = devices.len(), "enumerated serial devices");

    if args.names {
        for device in &devices {
            println!("{}", device.name);
        }
    } else {
        print_devices(&devices, format);
    }
    Ok(SUCCESS)
}
