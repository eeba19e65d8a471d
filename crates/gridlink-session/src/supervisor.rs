//! Reconnect supervisor.
//!
//! Started by a read task that hit a fault. Polls the visible device list at
//! a fixed interval until the session's device shows up again, reopens it,
//! and hands the new link to a fresh read task. Gives up only when the
//! session is closed.

use std::sync::Arc;

use gridlink_transport::device_names;
use tracing::{debug, info, trace, warn};

use crate::event::Event;
use crate::session::Shared;
use crate::state::ConnectionState;

pub(crate) fn run(shared: Arc<Shared>) {
    shared.set_state(ConnectionState::Reconnecting);
    shared.dispatcher.emit(Event::Reconnecting {
        device: shared.device.clone(),
    });
    info!(
        device = %shared.device,
        interval_ms = shared.config.reconnect_interval.as_millis() as u64,
        "waiting for device"
    );

    let mut attempts: u64 = 0;
    loop {
        if shared.is_closing() {
            break;
        }

        attempts += 1;
        if try_reconnect(&shared, attempts) {
            return;
        }

        if shared.wait_for_close(shared.config.reconnect_interval) {
            break;
        }
    }

    debug!(device = %shared.device, attempts, "reconnect abandoned by close");
}

/// One poll. Returns true once a new read task owns the link, or when the
/// session started closing while the link was being opened.
fn try_reconnect(shared: &Arc<Shared>, attempt: u64) -> bool {
    let visible = match device_names(shared.connector.as_ref()) {
        Ok(names) => names,
        Err(err) => {
            debug!(attempt, error = %err, "device enumeration failed");
            return false;
        }
    };
    if !visible.iter().any(|name| name == &shared.device) {
        trace!(device = %shared.device, attempt, "device not visible");
        return false;
    }

    let parts = match shared.open_link() {
        Ok(parts) => parts,
        Err(err) => {
            debug!(device = %shared.device, attempt, error = %err, "reopen failed");
            return false;
        }
    };

    let reconnected = Event::Reconnected {
        device: shared.device.clone(),
    };
    match shared.install(parts, reconnected) {
        Ok(true) => {
            info!(device = %shared.device, attempt, "device reconnected");
            true
        }
        Ok(false) => true,
        Err(err) => {
            warn!(device = %shared.device, error = %err, "cannot start read task");
            shared.dispatcher.emit(Event::Faulted {
                reason: format!("cannot start read task: {err}"),
            });
            false
        }
    }
}
