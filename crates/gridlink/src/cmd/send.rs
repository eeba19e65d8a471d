use std::time::{Duration, Instant};

use gridlink_frame::{Cell, Command, OutgoingFrame};
use gridlink_session::{Event, Events};

use crate::cmd::{parse_duration, SendArgs};
use crate::exit::{session_error, CliError, CliResult, SUCCESS, TIMEOUT};
use crate::output::{print_event, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let command = Command::from_name(&args.command)
        .ok_or_else(|| CliError::usage(format!("unknown command: {}", args.command)))?;
    let frame = build_frame(command, args.row, args.col, args.value).map_err(CliError::usage)?;
    let wait_timeout = parse_duration(&args.wait_timeout)?;

    let (session, events) = args.link.connect()?;
    session
        .send(frame)
        .map_err(|err| session_error("send failed", err))?;

    if args.wait {
        let event = wait_for_reply(&events, wait_timeout).ok_or_else(|| {
            CliError::new(
                TIMEOUT,
                format!("no reply to {command} within {}ms", wait_timeout.as_millis()),
            )
        })?;
        print_event(&event, format);
    }

    session.close();
    Ok(SUCCESS)
}

/// Build the wire frame for `command`, checking that the arguments it needs
/// are present and on the board.
pub fn build_frame(
    command: Command,
    row: Option<u8>,
    col: Option<u8>,
    value: Option<u8>,
) -> Result<OutgoingFrame, String> {
    let cell = || -> Result<Cell, String> {
        match (row, col) {
            (Some(row), Some(col)) => Cell::new(row, col)
                .ok_or_else(|| format!("cell ({row}, {col}) is off the board; rows and columns are 0-8")),
            _ => Err(format!("{command} needs a row and a column")),
        }
    };

    match command {
        Command::SetCell => {
            let cell = cell()?;
            let value = value.ok_or_else(|| format!("{command} needs a value"))?;
            if !(1..=9).contains(&value) {
                return Err(format!("value {value} is out of range 1-9"));
            }
            Ok(OutgoingFrame::set_cell(cell, value))
        }
        Command::ClearCell => Ok(OutgoingFrame::clear_cell(cell()?)),
        Command::RequestHelp => Ok(OutgoingFrame::request_help(cell()?)),
        Command::RequestDifficulty => {
            let level = value.ok_or_else(|| format!("{command} needs a level"))?;
            Ok(OutgoingFrame::request_difficulty(level))
        }
        other => Ok(OutgoingFrame::simple(other)),
    }
}

/// First event decoded from a reply, skipping lifecycle and line noise.
fn wait_for_reply(events: &Events, timeout: Duration) -> Option<Event> {
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.checked_duration_since(Instant::now())?;
        let event = events.recv_timeout(remaining)?;
        if event.is_reply() {
            return Some(event);
        }
        tracing::debug!(event = event.kind(), "waiting for reply");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_cell_needs_cell_and_value() {
        let frame = build_frame(Command::SetCell, Some(2), Some(3), Some(7)).unwrap();
        assert_eq!(frame.to_bytes(), [0x04, 0x02, 0x03, 0x07, 0x02]);

        assert!(build_frame(Command::SetCell, Some(2), None, Some(7)).is_err());
        assert!(build_frame(Command::SetCell, Some(2), Some(3), None).is_err());
        assert!(build_frame(Command::SetCell, Some(9), Some(3), Some(7)).is_err());
        assert!(build_frame(Command::SetCell, Some(2), Some(3), Some(0)).is_err());
    }

    #[test]
    fn difficulty_takes_level_from_value() {
        let frame = build_frame(Command::RequestDifficulty, None, None, Some(2)).unwrap();
        assert_eq!(frame.args, [2, 0, 0]);
        assert!(build_frame(Command::RequestDifficulty, None, None, None).is_err());
    }

    #[test]
    fn simple_commands_ignore_arguments() {
        let frame = build_frame(Command::Reveal, Some(1), Some(1), Some(1)).unwrap();
        assert_eq!(frame.to_bytes(), [0x99, 0, 0, 0, 0x99]);
    }

    #[test]
    fn wait_for_reply_skips_lifecycle_events() {
        let (tx, events) = gridlink_session_events();
        tx.send(Event::Connected {
            device: "x".to_string(),
        })
        .unwrap();
        tx.send(Event::ProtocolFault { byte: 0 }).unwrap();
        tx.send(Event::GameWon).unwrap();

        assert_eq!(
            wait_for_reply(&events, Duration::from_millis(100)),
            Some(Event::GameWon)
        );
        assert_eq!(wait_for_reply(&events, Duration::from_millis(20)), None);
    }

    fn gridlink_session_events() -> (std::sync::mpsc::Sender<Event>, Events) {
        let (tx, rx) = std::sync::mpsc::channel();
        (tx, Events::from(rx))
    }
}
