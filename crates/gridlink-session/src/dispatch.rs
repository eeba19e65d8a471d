//! Reply-to-event mapping.

use std::sync::mpsc::Sender;

use gridlink_frame::{Cell, Command, IncomingFrame, Inbound, ShortFrame, Status};
use tracing::{debug, trace};

use crate::event::Event;

/// Map one validated frame to exactly one event.
pub fn event_for_frame(frame: IncomingFrame) -> Event {
    let command = frame.command();
    let status = frame.status();

    if status == Status::ChecksumError {
        return Event::IntegrityFault {
            opcode: command.opcode(),
            reported_by_peer: true,
        };
    }

    match frame {
        IncomingFrame::Long(long) => Event::BoardUpdated {
            command,
            board: long.board,
            nested: board_outcome(command, status).map(Box::new),
        },
        IncomingFrame::Short(short) => short_event(short),
    }
}

/// Map one reassembler unit to exactly one event.
pub fn event_for_inbound(inbound: Inbound) -> Event {
    match inbound {
        Inbound::Frame(frame) => event_for_frame(frame),
        Inbound::Corrupt(corrupt) => Event::IntegrityFault {
            opcode: corrupt.opcode,
            reported_by_peer: false,
        },
        Inbound::Skipped { byte } => Event::ProtocolFault { byte },
    }
}

fn board_outcome(command: Command, status: Status) -> Option<Event> {
    match status {
        Status::Ok => None,
        Status::Win => Some(Event::GameWon),
        Status::Lose => Some(Event::GameAbandoned),
        other => Some(Event::StatusChanged {
            command,
            status: other,
        }),
    }
}

fn short_event(frame: ShortFrame) -> Event {
    let ShortFrame {
        command,
        status,
        args: [a1, a2, a3],
    } = frame;
    let cell = Cell::new(a1, a2);
    let fallback = Event::StatusChanged { command, status };

    match (command, status) {
        (Command::SetCell, Status::Ok) => {
            cell.map_or(fallback, |cell| Event::CellConfirmed { cell, value: a3 })
        }
        (Command::SetCell, Status::Invalid) => {
            cell.map_or(fallback, |cell| Event::CellRejected { cell })
        }
        (Command::SetCell | Command::ClearCell | Command::RequestField, Status::Locked) => {
            cell.map_or(fallback, |cell| Event::CellLocked { cell })
        }
        (Command::SetCell, Status::Win) => Event::GameWon,
        (Command::GiveUp, Status::Lose) => Event::GameAbandoned,
        (Command::ClearCell, Status::Ok) => {
            cell.map_or(fallback, |cell| Event::CellCleared { cell })
        }
        (Command::RequestField, Status::Ok) => Event::ProgressUpdated {
            total_empty: a1,
            current_empty: a2,
        },
        (Command::RequestDifficulty, Status::DifficultySet) => {
            Event::DifficultyConfirmed { level: a1 }
        }
        (Command::RequestHelp, Status::HelpGranted) => {
            cell.map_or(fallback, |cell| Event::HintApplied { cell, value: a3 })
        }
        (Command::RequestHelp, _) => cell.map_or(fallback, |cell| Event::CellLocked { cell }),
        _ => fallback,
    }
}

/// Sends events into a session's ordered channel.
///
/// Cloned into every background thread; all clones feed the same queue, so
/// the consumer sees one FIFO stream.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    events: Sender<Event>,
}

impl Dispatcher {
    pub fn new(events: Sender<Event>) -> Self {
        Self { events }
    }

    /// Translate and deliver one reassembler unit.
    ///
    /// Returns `false` once the consumer has dropped its receiver.
    pub fn deliver(&self, inbound: Inbound) -> bool {
        let event = event_for_inbound(inbound);
        trace!(event = event.kind(), "dispatch");
        self.emit(event)
    }

    /// Deliver an already-built event.
    pub fn emit(&self, event: Event) -> bool {
        match self.events.send(event) {
            Ok(()) => true,
            Err(err) => {
                debug!(event = err.0.kind(), "event receiver dropped");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use gridlink_frame::{decode, BoardSnapshot, CorruptFrame, Decoded, LongFrame};

    use super::*;

    fn short(command: Command, status: Status, a1: u8, a2: u8, a3: u8) -> Event {
        event_for_frame(IncomingFrame::Short(ShortFrame::new(
            command, status, a1, a2, a3,
        )))
    }

    fn board(command: Command, status: Status) -> Event {
        event_for_frame(IncomingFrame::Long(LongFrame {
            command,
            status,
            board: BoardSnapshot::empty(),
        }))
    }

    fn cell(row: u8, col: u8) -> Cell {
        Cell::new(row, col).unwrap()
    }

    #[test]
    fn reference_set_cell_reply() {
        let Decoded::Frame(frame) = decode(&[0x04, 0x10, 0x02, 0x03, 0x07, 0x12]).unwrap() else {
            panic!("expected a frame");
        };
        assert_eq!(
            event_for_frame(frame),
            Event::CellConfirmed {
                cell: cell(2, 3),
                value: 7
            }
        );
    }

    #[test]
    fn mapping_table() {
        use Command::*;

        let cases = [
            (short(SetCell, Status::Invalid, 1, 2, 5), Event::CellRejected { cell: cell(1, 2) }),
            (short(SetCell, Status::Locked, 1, 2, 5), Event::CellLocked { cell: cell(1, 2) }),
            (short(SetCell, Status::Win, 8, 8, 9), Event::GameWon),
            (short(GiveUp, Status::Lose, 0, 0, 0), Event::GameAbandoned),
            (short(ClearCell, Status::Ok, 4, 5, 0), Event::CellCleared { cell: cell(4, 5) }),
            (short(ClearCell, Status::Locked, 4, 5, 0), Event::CellLocked { cell: cell(4, 5) }),
            (
                short(RequestField, Status::Ok, 45, 30, 0),
                Event::ProgressUpdated {
                    total_empty: 45,
                    current_empty: 30,
                },
            ),
            (short(RequestField, Status::Locked, 3, 3, 0), Event::CellLocked { cell: cell(3, 3) }),
            (
                short(RequestDifficulty, Status::DifficultySet, 2, 0, 0),
                Event::DifficultyConfirmed { level: 2 },
            ),
            (
                short(RequestHelp, Status::HelpGranted, 6, 7, 4),
                Event::HintApplied {
                    cell: cell(6, 7),
                    value: 4,
                },
            ),
            (short(RequestHelp, Status::HelpDenied, 6, 7, 0), Event::CellLocked { cell: cell(6, 7) }),
            (short(RequestHelp, Status::Locked, 6, 7, 0), Event::CellLocked { cell: cell(6, 7) }),
        ];

        for (got, want) in cases {
            assert_eq!(got, want);
        }
    }

    #[test]
    fn peer_checksum_error_wins_over_everything() {
        for command in Command::ALL {
            let expected = Event::IntegrityFault {
                opcode: command.opcode(),
                reported_by_peer: true,
            };
            assert_eq!(short(command, Status::ChecksumError, 1, 1, 1), expected);
            assert_eq!(board(command, Status::ChecksumError), expected);
        }
    }

    #[test]
    fn board_frames_nest_their_outcome() {
        let Event::BoardUpdated { nested, .. } = board(Command::Start, Status::Ok) else {
            panic!("expected a board");
        };
        assert_eq!(nested, None);

        let Event::BoardUpdated { nested, .. } = board(Command::Reveal, Status::Win) else {
            panic!("expected a board");
        };
        assert_eq!(nested.as_deref(), Some(&Event::GameWon));

        let Event::BoardUpdated { nested, .. } = board(Command::Restart, Status::Lose) else {
            panic!("expected a board");
        };
        assert_eq!(nested.as_deref(), Some(&Event::GameAbandoned));

        let Event::BoardUpdated { command, nested, .. } = board(Command::Reveal, Status::HelpGranted)
        else {
            panic!("expected a board");
        };
        assert_eq!(command, Command::Reveal);
        assert_eq!(
            nested.as_deref(),
            Some(&Event::StatusChanged {
                command: Command::Reveal,
                status: Status::HelpGranted,
            })
        );
    }

    #[test]
    fn off_board_coordinates_fall_back_to_status() {
        assert_eq!(
            short(Command::SetCell, Status::Ok, 9, 0, 1),
            Event::StatusChanged {
                command: Command::SetCell,
                status: Status::Ok,
            }
        );
        assert_eq!(
            short(Command::RequestHelp, Status::HelpGranted, 0, 200, 1),
            Event::StatusChanged {
                command: Command::RequestHelp,
                status: Status::HelpGranted,
            }
        );
    }

    #[test]
    fn unmatched_pairs_pass_status_through() {
        for (command, status) in [
            (Command::ClearAll, Status::Ok),
            (Command::ClearAll, Status::Locked),
            (Command::SetCell, Status::Unknown(0x42)),
            (Command::GiveUp, Status::Ok),
            (Command::RequestDifficulty, Status::Invalid),
        ] {
            assert_eq!(
                short(command, status, 0, 0, 0),
                Event::StatusChanged { command, status }
            );
        }
    }

    #[test]
    fn corrupt_and_skipped_units() {
        let corrupt = Inbound::Corrupt(CorruptFrame {
            opcode: 0x05,
            expected: 0x11,
            actual: 0x12,
            len: 6,
        });
        assert_eq!(
            event_for_inbound(corrupt),
            Event::IntegrityFault {
                opcode: 0x05,
                reported_by_peer: false,
            }
        );
        assert_eq!(
            event_for_inbound(Inbound::Skipped { byte: 0xEE }),
            Event::ProtocolFault { byte: 0xEE }
        );
    }

    #[test]
    fn dispatcher_preserves_order_and_reports_dropped_receiver() {
        let (tx, rx) = mpsc::channel();
        let dispatcher = Dispatcher::new(tx);
        assert!(dispatcher.deliver(Inbound::Skipped { byte: 1 }));
        assert!(dispatcher.emit(Event::GameWon));
        assert!(dispatcher.deliver(Inbound::Skipped { byte: 2 }));

        let got: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            got,
            vec![
                Event::ProtocolFault { byte: 1 },
                Event::GameWon,
                Event::ProtocolFault { byte: 2 },
            ]
        );

        drop(rx);
        assert!(!dispatcher.emit(Event::GameAbandoned));
    }
}
