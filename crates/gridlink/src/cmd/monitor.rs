use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use gridlink_frame::Command;
use gridlink_session::Event;

use crate::cmd::{install_ctrlc_handler, MonitorArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_event, OutputFormat};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

pub fn run(args: MonitorArgs, format: OutputFormat) -> CliResult<i32> {
    let (session, events) = args.link.connect()?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut replies = 0usize;
    while running.load(Ordering::SeqCst) {
        let Some(event) = events.recv_timeout(POLL_INTERVAL) else {
            continue;
        };
        print_event(&event, format);

        if matches!(event, Event::Reconnected { .. }) && !args.no_resync {
            // The board may have changed while the link was down.
            if let Err(err) = session.send(Command::RequestField) {
                tracing::warn!(error = %err, "resync request failed");
            }
        }

        if event.is_reply() {
            replies = replies.saturating_add(1);
            if args.count.is_some_and(|count| replies >= count) {
                break;
            }
        }
    }

    session.close();
    while let Some(event) = events.try_recv() {
        print_event(&event, format);
    }
    Ok(SUCCESS)
}
