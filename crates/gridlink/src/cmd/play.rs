use std::io::BufRead;
use std::thread;

use gridlink_frame::{Command, OutgoingFrame};
use gridlink_session::SessionError;

use crate::cmd::send::build_frame;
use crate::cmd::PlayArgs;
use crate::exit::{io_error, session_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_event, OutputFormat};

const USAGE: &str = "\
commands:
  start | restart | giveup | reveal
  set ROW COL VALUE     clear ROW COL     clearall
  field                 difficulty LEVEL  help ROW COL
  ?                     quit";

/// One parsed input line.
#[derive(Debug, PartialEq, Eq)]
pub enum PlayLine {
    Send(OutgoingFrame),
    Usage,
    Quit,
    Blank,
}

pub fn parse_line(line: &str) -> Result<PlayLine, String> {
    let mut words = line.split_whitespace();
    let Some(word) = words.next() else {
        return Ok(PlayLine::Blank);
    };
    match word.to_ascii_lowercase().as_str() {
        "quit" | "exit" => return Ok(PlayLine::Quit),
        "?" => return Ok(PlayLine::Usage),
        _ => {}
    }

    let command = Command::from_name(word).ok_or_else(|| format!("unknown command: {word}"))?;
    let numbers = words
        .map(|w| w.parse::<u8>().map_err(|_| format!("not a number: {w}")))
        .collect::<Result<Vec<u8>, String>>()?;

    let expected = match command {
        Command::SetCell => 3,
        Command::ClearCell | Command::RequestHelp => 2,
        Command::RequestDifficulty => 1,
        _ => 0,
    };
    if numbers.len() != expected {
        return Err(format!("{word} takes {expected} number(s), got {}", numbers.len()));
    }

    let arg = |i: usize| numbers.get(i).copied();
    let frame = match command {
        Command::RequestDifficulty => build_frame(command, None, None, arg(0)),
        _ => build_frame(command, arg(0), arg(1), arg(2)),
    }?;
    Ok(PlayLine::Send(frame))
}

pub fn run(args: PlayArgs, format: OutputFormat) -> CliResult<i32> {
    let (session, events) = args.link.connect()?;

    let printer = thread::Builder::new()
        .name("gridlink-events".to_string())
        .spawn(move || {
            for event in events {
                print_event(&event, format);
            }
        })
        .map_err(|err| CliError::new(INTERNAL, format!("cannot start event printer: {err}")))?;

    eprintln!("{USAGE}");
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line.map_err(|err| io_error("reading stdin failed", err))?;
        match parse_line(&line) {
            Ok(PlayLine::Send(frame)) => match session.send(frame) {
                Ok(()) => {}
                Err(SessionError::NotConnected) => {
                    eprintln!("not connected; waiting for {} to come back", session.device());
                }
                Err(err) => return Err(session_error("send failed", err)),
            },
            Ok(PlayLine::Usage) => eprintln!("{USAGE}"),
            Ok(PlayLine::Quit) => break,
            Ok(PlayLine::Blank) => {}
            Err(message) => eprintln!("{message} (type ? for help)"),
        }
    }

    // Dropping the session closes the channel, which ends the printer.
    drop(session);
    if printer.join().is_err() {
        tracing::warn!("event printer panicked");
    }
    Ok(SUCCESS)
}
