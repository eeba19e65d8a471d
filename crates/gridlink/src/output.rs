use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use gridlink_frame::{BoardSnapshot, Cell};
use gridlink_session::Event;
use gridlink_transport::DeviceInfo;
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct EventOutput<'a> {
    event: &'a str,
    summary: String,
    #[serde(skip_serializing_if = "Value::is_null")]
    detail: Value,
    timestamp: String,
}

#[derive(Serialize)]
struct DeviceOutput<'a> {
    name: &'a str,
    kind: &'a str,
    manufacturer: Option<&'a str>,
    product: Option<&'a str>,
    serial_number: Option<&'a str>,
    vid: Option<String>,
    pid: Option<String>,
}

impl<'a> From<&'a DeviceInfo> for DeviceOutput<'a> {
    fn from(info: &'a DeviceInfo) -> Self {
        Self {
            name: &info.name,
            kind: info.kind.as_str(),
            manufacturer: info.manufacturer.as_deref(),
            product: info.product.as_deref(),
            serial_number: info.serial_number.as_deref(),
            vid: info.vid.map(|vid| format!("{vid:04x}")),
            pid: info.pid.map(|pid| format!("{pid:04x}")),
        }
    }
}

pub fn print_event(event: &Event, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = EventOutput {
                event: event.kind(),
                summary: event.to_string(),
                detail: event_detail(event),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["EVENT", "SUMMARY"])
                .add_row(vec![event.kind().to_string(), event.to_string()]);
            println!("{table}");
            if let Event::BoardUpdated { board, .. } = event {
                println!("{}", board_table(board));
            }
        }
        OutputFormat::Pretty => {
            println!("{:<20} {event}", event.kind());
            if let Event::BoardUpdated { board, .. } = event {
                print!("{board}");
            }
        }
    }
}

pub fn print_devices(devices: &[DeviceInfo], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out: Vec<DeviceOutput<'_>> = devices.iter().map(DeviceOutput::from).collect();
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["NAME", "KIND", "MANUFACTURER", "PRODUCT", "VID:PID"]);
            for device in devices {
                let out = DeviceOutput::from(device);
                table.add_row(vec![
                    out.name.to_string(),
                    out.kind.to_string(),
                    out.manufacturer.unwrap_or("-").to_string(),
                    out.product.unwrap_or("-").to_string(),
                    usb_id(&out),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            if devices.is_empty() {
                println!("no serial devices found");
            }
            for device in devices {
                let out = DeviceOutput::from(device);
                println!("{:<24} {:<10} {}", out.name, out.kind, usb_id(&out));
            }
        }
    }
}

fn usb_id(out: &DeviceOutput<'_>) -> String {
    match (&out.vid, &out.pid) {
        (Some(vid), Some(pid)) => format!("{vid}:{pid}"),
        _ => "-".to_string(),
    }
}

/// Structured fields of an event for JSON output.
pub fn event_detail(event: &Event) -> Value {
    match event {
        Event::Connected { device }
        | Event::Reconnecting { device }
        | Event::Reconnected { device } => json!({ "device": device }),
        Event::Faulted { reason } => json!({ "reason": reason }),
        Event::Disconnected | Event::GameWon | Event::GameAbandoned => Value::Null,
        Event::BoardUpdated {
            command,
            board,
            nested,
        } => json!({
            "command": command.name(),
            "empty_cells": board.empty_count(),
            "rows": board.rows().map(<[u8]>::to_vec).collect::<Vec<_>>(),
            "nested": nested.as_deref().map(|inner| json!({
                "event": inner.kind(),
                "detail": event_detail(inner),
            })),
        }),
        Event::CellConfirmed { cell, value } | Event::HintApplied { cell, value } => {
            let mut detail = cell_json(*cell);
            detail["value"] = json!(value);
            detail
        }
        Event::CellRejected { cell } | Event::CellLocked { cell } | Event::CellCleared { cell } => {
            cell_json(*cell)
        }
        Event::ProgressUpdated {
            total_empty,
            current_empty,
        } => json!({
            "total_empty": total_empty,
            "current_empty": current_empty,
            "percent": gridlink_frame::progress_percent(*total_empty, *current_empty),
        }),
        Event::DifficultyConfirmed { level } => json!({ "level": level }),
        Event::StatusChanged { command, status } => json!({
            "command": command.name(),
            "status": status.to_string(),
            "status_byte": status.as_byte(),
        }),
        Event::IntegrityFault {
            opcode,
            reported_by_peer,
        } => json!({ "opcode": opcode, "reported_by_peer": reported_by_peer }),
        Event::ProtocolFault { byte } => json!({ "byte": byte }),
    }
}

fn cell_json(cell: Cell) -> Value {
    json!({ "row": cell.row(), "col": cell.col() })
}

fn board_table(board: &BoardSnapshot) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    for row in board.rows() {
        table.add_row(
            row.iter()
                .map(|&value| {
                    if value == 0 {
                        " ".to_string()
                    } else {
                        value.to_string()
                    }
                })
                .collect::<Vec<_>>(),
        );
    }
    table
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use gridlink_frame::{Command, Status};

    use super::*;

    #[test]
    fn cell_events_carry_coordinates() {
        let cell = Cell::new(2, 3).expect("cell should be on the board");
        let detail = event_detail(&Event::CellConfirmed { cell, value: 7 });
        assert_eq!(detail, json!({ "row": 2, "col": 3, "value": 7 }));
    }

    #[test]
    fn board_detail_includes_rows_and_nested_outcome() {
        let detail = event_detail(&Event::BoardUpdated {
            command: Command::Reveal,
            board: BoardSnapshot::empty(),
            nested: Some(Box::new(Event::GameWon)),
        });
        assert_eq!(detail["command"], "REVEAL");
        assert_eq!(detail["empty_cells"], 81);
        assert_eq!(detail["rows"].as_array().map(Vec::len), Some(9));
        assert_eq!(detail["nested"]["event"], "game_won");
    }

    #[test]
    fn status_detail_names_the_status() {
        let detail = event_detail(&Event::StatusChanged {
            command: Command::ClearAll,
            status: Status::Unknown(0x42),
        });
        assert_eq!(detail["status"], "UNKNOWN(0x42)");
        assert_eq!(detail["status_byte"], 0x42);
    }

    #[test]
    fn device_output_formats_usb_ids() {
        let mut info = DeviceInfo::named("/dev/ttyACM0");
        info.vid = Some(0x2341);
        info.pid = Some(0x0043);
        let out = DeviceOutput::from(&info);
        assert_eq!(usb_id(&out), "2341:0043");
        assert_eq!(usb_id(&DeviceOutput::from(&DeviceInfo::named("x"))), "-");
    }
}
