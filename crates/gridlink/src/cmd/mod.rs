use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Subcommand};
use gridlink_frame::{FrameConfig, UnknownOpcodePolicy};
use gridlink_session::{connect_with_config, Events, Session, SessionConfig};
use gridlink_transport::{SerialConfig, SerialConnector, DEFAULT_BAUD_RATE};

use crate::exit::{session_error, CliError, CliResult, INTERNAL};
use crate::output::OutputFormat;

pub mod monitor;
pub mod play;
pub mod ports;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List serial devices visible to this host.
    Ports(PortsArgs),
    /// Connect and print every event until Ctrl-C.
    Monitor(MonitorArgs),
    /// Send a single command.
    Send(SendArgs),
    /// Drive a board with line commands read from stdin.
    Play(PlayArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Ports(args) => ports::run(args, format),
        Command::Monitor(args) => monitor::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Play(args) => play::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// How to reach the controller. Shared by every command that opens a link.
#[derive(Args, Debug, Clone)]
pub struct LinkArgs {
    /// Serial device, e.g. /dev/ttyUSB0 or COM3.
    #[arg(env = "GRIDLINK_PORT")]
    pub port: String,
    /// Line speed.
    #[arg(long, env = "GRIDLINK_BAUD", default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Serial read timeout (e.g. 100ms).
    #[arg(long, default_value = "100ms")]
    pub read_timeout: String,
    /// Delay between reconnect attempts after the device disappears.
    #[arg(long, env = "GRIDLINK_RECONNECT_INTERVAL", default_value = "1s")]
    pub reconnect_interval: String,
    /// Treat bytes that cannot start a frame as a link fault instead of
    /// skipping them.
    #[arg(long)]
    pub strict_framing: bool,
}

impl LinkArgs {
    pub fn session_config(&self) -> CliResult<SessionConfig> {
        Ok(SessionConfig {
            read_timeout: parse_duration(&self.read_timeout)?,
            reconnect_interval: parse_duration(&self.reconnect_interval)?,
            frame: FrameConfig {
                unknown_opcode: if self.strict_framing {
                    UnknownOpcodePolicy::Reject
                } else {
                    UnknownOpcodePolicy::Skip
                },
            },
        })
    }

    pub fn connect(&self) -> CliResult<(Session, Events)> {
        let config = self.session_config()?;
        let connector = SerialConnector::new(SerialConfig {
            baud_rate: self.baud,
            read_timeout: config.read_timeout,
        });
        connect_with_config(&self.port, Arc::new(connector), config)
            .map_err(|err| session_error("connect failed", err))
    }
}

#[derive(Args, Debug, Default)]
pub struct PortsArgs {
    /// Print device names only, one per line.
    #[arg(long)]
    pub names: bool,
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Exit after N reply events.
    #[arg(long)]
    pub count: Option<usize>,
    /// Do not send REQUEST_FIELD after a reconnect.
    #[arg(long)]
    pub no_resync: bool,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Command name, e.g. start, set, clear, field, difficulty, help, reveal.
    pub command: String,
    /// Row, 0-8.
    #[arg(long)]
    pub row: Option<u8>,
    /// Column, 0-8.
    #[arg(long)]
    pub col: Option<u8>,
    /// Cell value for set, level for difficulty.
    #[arg(long)]
    pub value: Option<u8>,
    /// Wait for the reply and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait for the reply when --wait is set (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct PlayArgs {
    #[command(flatten)]
    pub link: LinkArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::usage("duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::usage(format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::usage("duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

pub fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn strict_framing_selects_reject_policy() {
        let link = LinkArgs {
            port: "/dev/ttyUSB0".to_string(),
            baud: DEFAULT_BAUD_RATE,
            read_timeout: "50ms".to_string(),
            reconnect_interval: "2s".to_string(),
            strict_framing: true,
        };
        let config = link.session_config().expect("config should build");
        assert_eq!(config.frame.unknown_opcode, UnknownOpcodePolicy::Reject);
        assert_eq!(config.read_timeout, Duration::from_millis(50));
        assert_eq!(config.reconnect_interval, Duration::from_secs(2));
    }
}
