//! Connects to a controller, asks for the current progress and a fresh board,
//! and prints what comes back.
//!
//! Run with:
//!   cargo run --example board-status -- /dev/ttyUSB0

use std::sync::Arc;
use std::time::Duration;

use gridlink::frame::{progress_percent, Command};
use gridlink::session::{connect, Event};
use gridlink::transport::SerialConnector;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let port = std::env::args()
        .nth(1)
        .ok_or("usage: board-status <PORT>")?;

    let (session, events) = connect(&port, Arc::new(SerialConnector::default()))?;
    session.send(Command::RequestField)?;
    session.send(Command::Start)?;

    let mut replies = 0;
    while replies < 2 {
        let Some(event) = events.recv_timeout(Duration::from_secs(3)) else {
            eprintln!("no reply from {port}");
            break;
        };
        match &event {
            Event::ProgressUpdated {
                total_empty,
                current_empty,
            } => {
                println!(
                    "progress: {}% ({current_empty} of {total_empty} cells left)",
                    progress_percent(*total_empty, *current_empty)
                );
            }
            Event::BoardUpdated { board, .. } => print!("{board}"),
            other => println!("{other}"),
        }
        if event.is_reply() {
            replies += 1;
        }
    }

    session.close();
    Ok(())
}
