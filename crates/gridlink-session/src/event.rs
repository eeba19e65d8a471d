use std::fmt;
use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

use gridlink_frame::{BoardSnapshot, Cell, Command, Status};

/// Everything a session reports to its consumer.
///
/// The set is closed: lifecycle changes and decoded replies travel on the
/// same ordered channel so a consumer never has to merge two streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The first open succeeded and the read task is running.
    Connected { device: String },
    /// The link failed mid-session.
    Faulted { reason: String },
    /// The supervisor is polling for the device.
    Reconnecting { device: String },
    /// The device came back. Re-issue REQUEST_FIELD to resynchronize; commands
    /// lost while faulted are not replayed.
    Reconnected { device: String },
    /// The session was closed. Always the last event.
    Disconnected,

    /// A full board arrived. Any status-specific outcome rides along in
    /// `nested` so the frame still yields exactly one event.
    BoardUpdated {
        command: Command,
        board: BoardSnapshot,
        nested: Option<Box<Event>>,
    },
    CellConfirmed { cell: Cell, value: u8 },
    CellRejected { cell: Cell },
    CellLocked { cell: Cell },
    CellCleared { cell: Cell },
    GameWon,
    GameAbandoned,
    ProgressUpdated { total_empty: u8, current_empty: u8 },
    DifficultyConfirmed { level: u8 },
    HintApplied { cell: Cell, value: u8 },
    /// Any reply without a more specific meaning.
    StatusChanged { command: Command, status: Status },

    /// A frame failed its checksum (`reported_by_peer == false`) or the
    /// controller said our command failed its checksum.
    IntegrityFault { opcode: u8, reported_by_peer: bool },
    /// A byte that cannot start a frame was dropped.
    ProtocolFault { byte: u8 },
}

impl Event {
    /// Stable snake_case name, used as the `event` field in CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Connected { .. } => "connected",
            Event::Faulted { .. } => "faulted",
            Event::Reconnecting { .. } => "reconnecting",
            Event::Reconnected { .. } => "reconnected",
            Event::Disconnected => "disconnected",
            Event::BoardUpdated { .. } => "board_updated",
            Event::CellConfirmed { .. } => "cell_confirmed",
            Event::CellRejected { .. } => "cell_rejected",
            Event::CellLocked { .. } => "cell_locked",
            Event::CellCleared { .. } => "cell_cleared",
            Event::GameWon => "game_won",
            Event::GameAbandoned => "game_abandoned",
            Event::ProgressUpdated { .. } => "progress_updated",
            Event::DifficultyConfirmed { .. } => "difficulty_confirmed",
            Event::HintApplied { .. } => "hint_applied",
            Event::StatusChanged { .. } => "status_changed",
            Event::IntegrityFault { .. } => "integrity_fault",
            Event::ProtocolFault { .. } => "protocol_fault",
        }
    }

    /// True for connection lifecycle events, false for decoded replies and
    /// faults on the wire.
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Event::Connected { .. }
                | Event::Faulted { .. }
                | Event::Reconnecting { .. }
                | Event::Reconnected { .. }
                | Event::Disconnected
        )
    }

    /// True for events decoded from a validated reply frame.
    pub fn is_reply(&self) -> bool {
        !self.is_lifecycle()
            && !matches!(
                self,
                Event::IntegrityFault {
                    reported_by_peer: false,
                    ..
                } | Event::ProtocolFault { .. }
            )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Connected { device } => write!(f, "connected to {device}"),
            Event::Faulted { reason } => write!(f, "link faulted: {reason}"),
            Event::Reconnecting { device } => write!(f, "waiting for {device}"),
            Event::Reconnected { device } => write!(f, "reconnected to {device}"),
            Event::Disconnected => f.write_str("disconnected"),
            Event::BoardUpdated {
                command,
                board,
                nested,
            } => {
                write!(f, "{command} board, {} empty", board.empty_count())?;
                if let Some(nested) = nested {
                    write!(f, " ({nested})")?;
                }
                Ok(())
            }
            Event::CellConfirmed { cell, value } => write!(f, "cell {cell} set to {value}"),
            Event::CellRejected { cell } => write!(f, "cell {cell} rejected"),
            Event::CellLocked { cell } => write!(f, "cell {cell} locked"),
            Event::CellCleared { cell } => write!(f, "cell {cell} cleared"),
            Event::GameWon => f.write_str("game won"),
            Event::GameAbandoned => f.write_str("game abandoned"),
            Event::ProgressUpdated {
                total_empty,
                current_empty,
            } => write!(
                f,
                "{current_empty} of {total_empty} cells empty ({}% solved)",
                gridlink_frame::progress_percent(*total_empty, *current_empty)
            ),
            Event::DifficultyConfirmed { level } => write!(f, "difficulty set to {level}"),
            Event::HintApplied { cell, value } => write!(f, "hint: cell {cell} is {value}"),
            Event::StatusChanged { command, status } => write!(f, "{command}: {status}"),
            Event::IntegrityFault {
                opcode,
                reported_by_peer: true,
            } => write!(f, "controller rejected checksum of {opcode:#04X} command"),
            Event::IntegrityFault { opcode, .. } => {
                write!(f, "dropped {opcode:#04X} frame with bad checksum")
            }
            Event::ProtocolFault { byte } => write!(f, "dropped unknown byte {byte:#04X}"),
        }
    }
}

/// The consumer end of a session's event channel.
///
/// Events arrive in the order frames arrived on the wire, interleaved with
/// lifecycle events at the points they happened. Iteration ends once the
/// session is closed and every background thread has exited.
#[derive(Debug)]
pub struct Events {
    rx: Receiver<Event>,
}

impl Events {
    pub(crate) fn new(rx: Receiver<Event>) -> Self {
        Self { rx }
    }

    /// Block until the next event. `None` once the session is gone.
    pub fn recv(&self) -> Option<Event> {
        self.rx.recv().ok()
    }

    /// Block for at most `timeout`. `None` on timeout or once the session is
    /// gone.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Event> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Return an event only if one is already queued.
    pub fn try_recv(&self) -> Option<Event> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Borrowing blocking iterator.
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.rx.iter()
    }
}

/// Wrap a bare receiver, for consumers that feed events from elsewhere.
impl From<Receiver<Event>> for Events {
    fn from(rx: Receiver<Event>) -> Self {
        Self::new(rx)
    }
}

impl IntoIterator for Events {
    type Item = Event;
    type IntoIter = std::sync::mpsc::IntoIter<Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.rx.into_iter()
    }
}
