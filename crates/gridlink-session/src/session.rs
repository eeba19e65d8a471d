use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use gridlink_frame::{Command, FrameError, FrameReader, FrameWriter, OutgoingFrame};
use gridlink_transport::{Connector, SerialLink};
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::dispatch::Dispatcher;
use crate::error::{Result, SessionError};
use crate::event::{Event, Events};
use crate::state::ConnectionState;
use crate::supervisor;

/// Open `device` and start a session with default configuration.
///
/// Returns the session handle and the consumer end of its event channel.
/// The first event is always [`Event::Connected`].
pub fn connect(device: &str, connector: Arc<dyn Connector>) -> Result<(Session, Events)> {
    connect_with_config(device, connector, SessionConfig::default())
}

/// Open `device` and start a session with explicit configuration.
///
/// Fails with [`SessionError::TransportUnavailable`] if the device cannot be
/// opened. The engine does not retry a failed first open.
pub fn connect_with_config(
    device: &str,
    connector: Arc<dyn Connector>,
    config: SessionConfig,
) -> Result<(Session, Events)> {
    let (tx, rx) = mpsc::channel();
    let shared = Arc::new(Shared {
        device: device.to_string(),
        connector,
        config,
        dispatcher: Dispatcher::new(tx),
        state: Mutex::new(ConnectionState::Connecting),
        active: Mutex::new(None),
        closing: Mutex::new(false),
        wake: Condvar::new(),
        tasks: Mutex::new(Vec::new()),
    });

    let parts = shared
        .open_link()
        .map_err(|source| SessionError::TransportUnavailable {
            device: device.to_string(),
            source,
        })?;

    let connected = Event::Connected {
        device: device.to_string(),
    };
    if let Err(err) = shared.install(parts, connected) {
        *lock(&shared.state) = ConnectionState::Disconnected;
        return Err(SessionError::Spawn(err));
    }
    info!(device, "session connected");

    Ok((Session { shared }, Events::new(rx)))
}

/// A live binding to one controller.
///
/// `send` may be called from any thread. Replies and lifecycle changes arrive
/// on the [`Events`] returned alongside the session. Dropping the session
/// closes it.
pub struct Session {
    shared: Arc<Shared>,
}

impl Session {
    /// Name of the device this session is bound to.
    pub fn device(&self) -> &str {
        &self.shared.device
    }

    pub fn state(&self) -> ConnectionState {
        *lock(&self.shared.state)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.shared.config
    }

    /// Encode and write one command.
    ///
    /// Fails with [`SessionError::NotConnected`] if no link is up, in which
    /// case nothing was written. A write failure takes the link down so the
    /// read task can start reconnection; the caller sees `NotConnected`.
    pub fn send(&self, frame: impl Into<OutgoingFrame>) -> Result<()> {
        let frame = frame.into();
        let mut slot = lock(&self.shared.active);
        let Some(active) = slot.as_mut() else {
            debug!(command = frame.command.name(), "send while not connected");
            return Err(SessionError::NotConnected);
        };

        match active.writer.send(&frame) {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(
                    device = %self.shared.device,
                    command = frame.command.name(),
                    error = %err,
                    "write failed"
                );
                if let Some(active) = slot.take() {
                    active.shut_down();
                }
                Err(SessionError::NotConnected)
            }
        }
    }

    /// Send `command` with optional coordinates and value. Missing arguments
    /// go out as zero.
    pub fn send_command(
        &self,
        command: Command,
        row: Option<u8>,
        col: Option<u8>,
        value: Option<u8>,
    ) -> Result<()> {
        self.send(OutgoingFrame::new(
            command,
            row.unwrap_or(0),
            col.unwrap_or(0),
            value.unwrap_or(0),
        ))
    }

    /// Close the link and stop every background thread.
    ///
    /// Idempotent. Never starts reconnection. Emits exactly one
    /// [`Event::Disconnected`] over the life of the session.
    pub fn close(&self) {
        {
            let _state = lock(&self.shared.state);
            let mut closing = lock(&self.shared.closing);
            if *closing {
                return;
            }
            *closing = true;
        }
        self.shared.wake.notify_all();

        if let Some(active) = lock(&self.shared.active).take() {
            active.shut_down();
        }

        loop {
            let handles = std::mem::take(&mut *lock(&self.shared.tasks));
            if handles.is_empty() {
                break;
            }
            for handle in handles {
                if handle.join().is_err() {
                    warn!(device = %self.shared.device, "session thread panicked");
                }
            }
        }

        self.shared.finish_disconnect();
        info!(device = %self.shared.device, "session closed");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("device", &self.shared.device)
            .field("state", &self.state())
            .finish()
    }
}

/// The write half of the current link.
struct ActiveLink {
    writer: FrameWriter<SerialLink>,
    stop: Arc<AtomicBool>,
}

impl ActiveLink {
    /// Tell the read task to stop and unblock it where the link allows.
    fn shut_down(self) {
        self.stop.store(true, Ordering::SeqCst);
        self.writer.get_ref().shutdown();
    }
}

pub(crate) type LinkParts = (FrameReader<SerialLink>, FrameWriter<SerialLink>);

/// State shared between the handle, the read task and the supervisor.
///
/// Lock order: `state` before `closing`. `active` and `tasks` are never held
/// while taking another lock.
pub(crate) struct Shared {
    pub(crate) device: String,
    pub(crate) connector: Arc<dyn Connector>,
    pub(crate) config: SessionConfig,
    pub(crate) dispatcher: Dispatcher,
    state: Mutex<ConnectionState>,
    active: Mutex<Option<ActiveLink>>,
    closing: Mutex<bool>,
    wake: Condvar,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Shared {
    /// Open the device and split it into reader and writer halves.
    pub(crate) fn open_link(&self) -> gridlink_transport::Result<LinkParts> {
        let mut link = self.connector.open(&self.device)?;
        link.set_read_timeout(self.config.read_timeout)?;
        let read_half = link.try_clone()?;
        Ok((
            FrameReader::with_config(read_half, self.config.frame),
            FrameWriter::new(link),
        ))
    }

    /// Make `parts` the current link, emit `event` and start a read task.
    ///
    /// Returns `Ok(false)` without installing anything if the session is
    /// closing.
    pub(crate) fn install(
        self: &Arc<Self>,
        (reader, writer): LinkParts,
        event: Event,
    ) -> std::io::Result<bool> {
        let mut state = lock(&self.state);
        if self.is_closing() {
            ActiveLink {
                writer,
                stop: Arc::new(AtomicBool::new(true)),
            }
            .shut_down();
            return Ok(false);
        }

        let stop = Arc::new(AtomicBool::new(false));
        *lock(&self.active) = Some(ActiveLink {
            writer,
            stop: Arc::clone(&stop),
        });
        *state = ConnectionState::Connected;
        // Emitted before the read task exists so it precedes every reply.
        self.dispatcher.emit(event);

        let shared = Arc::clone(self);
        let task_stop = Arc::clone(&stop);
        let spawned = thread::Builder::new()
            .name("gridlink-reader".to_string())
            .spawn(move || read_loop(shared, reader, task_stop));
        match spawned {
            Ok(handle) => {
                self.track(handle);
                Ok(true)
            }
            Err(err) => {
                if let Some(active) = lock(&self.active).take() {
                    active.shut_down();
                }
                *state = ConnectionState::Reconnecting;
                Err(err)
            }
        }
    }

    fn track(&self, handle: JoinHandle<()>) {
        let mut tasks = lock(&self.tasks);
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }

    pub(crate) fn is_closing(&self) -> bool {
        *lock(&self.closing)
    }

    /// Sleep for up to `timeout`, waking early on close. Returns whether the
    /// session is closing.
    pub(crate) fn wait_for_close(&self, timeout: Duration) -> bool {
        let closing = lock(&self.closing);
        let (closing, _) = self
            .wake
            .wait_timeout_while(closing, timeout, |closing| !*closing)
            .unwrap_or_else(PoisonError::into_inner);
        *closing
    }

    pub(crate) fn set_state(&self, next: ConnectionState) {
        *lock(&self.state) = next;
    }

    pub(crate) fn finish_disconnect(&self) {
        let mut state = lock(&self.state);
        if *state == ConnectionState::Disconnected {
            return;
        }
        *state = ConnectionState::Disconnected;
        self.dispatcher.emit(Event::Disconnected);
    }

    /// Called by a read task on its way out.
    fn on_read_task_exit(self: &Arc<Self>, stop: &Arc<AtomicBool>, reason: String) {
        {
            let mut active = lock(&self.active);
            if active
                .as_ref()
                .is_some_and(|current| Arc::ptr_eq(&current.stop, stop))
            {
                if let Some(current) = active.take() {
                    current.shut_down();
                }
            }
        }

        let mut state = lock(&self.state);
        if self.is_closing() {
            debug!(device = %self.device, "read task stopped by close");
            return;
        }

        warn!(device = %self.device, reason = %reason, "link faulted");
        *state = ConnectionState::Faulted;
        self.dispatcher.emit(Event::Faulted { reason });

        let shared = Arc::clone(self);
        match thread::Builder::new()
            .name("gridlink-reconnect".to_string())
            .spawn(move || supervisor::run(shared))
        {
            Ok(handle) => self.track(handle),
            Err(err) => {
                warn!(device = %self.device, error = %err, "cannot start reconnect supervisor");
            }
        }
    }
}

fn read_loop(shared: Arc<Shared>, mut reader: FrameReader<SerialLink>, stop: Arc<AtomicBool>) {
    debug!(device = %shared.device, "read task started");
    let reason = loop {
        if stop.load(Ordering::SeqCst) {
            break "link shut down".to_string();
        }
        if shared.is_closing() {
            break "session closing".to_string();
        }

        match reader.read_inbound() {
            Ok(Some(inbound)) => {
                shared.dispatcher.deliver(inbound);
            }
            Ok(None) => continue,
            Err(FrameError::UnknownOpcode(byte)) => {
                shared.dispatcher.emit(Event::ProtocolFault { byte });
                break format!("unknown opcode {byte:#04X}");
            }
            Err(FrameError::ConnectionClosed) => break "device closed the link".to_string(),
            Err(err) => break err.to_string(),
        }
    };
    // Serial ports open exclusively; the supervisor cannot reopen the device
    // while this half is alive.
    drop(reader);
    shared.on_read_task_exit(&stop, reason);
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
