#![cfg(all(unix, feature = "cli"))]

use std::process::Command;

fn gridlink() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_gridlink"));
    cmd.env_remove("GRIDLINK_PORT")
        .env_remove("GRIDLINK_LOG")
        .arg("--log-level")
        .arg("error");
    cmd
}

fn missing_device() -> String {
    format!(
        "/tmp/gridlink-missing-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    )
}

#[test]
fn version_prints_package_version() {
    let output = gridlink()
        .arg("version")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("gridlink {}", env!("CARGO_PKG_VERSION")));
}

#[test]
fn version_extended_reports_features() {
    let output = gridlink()
        .arg("version")
        .arg("--extended")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("name: gridlink"));
    assert!(stdout.contains("cli=true"));
    assert!(stdout.contains("84-byte replies"));
}

#[test]
fn send_to_missing_device_returns_transport_error() {
    let output = gridlink()
        .arg("send")
        .arg(missing_device())
        .arg("start")
        .output()
        .expect("send should run");

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("connect failed"));
}

#[test]
fn send_unknown_command_is_usage_error() {
    let output = gridlink()
        .arg("send")
        .arg(missing_device())
        .arg("jump")
        .output()
        .expect("send should run");

    assert_eq!(output.status.code(), Some(64));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown command: jump"));
}

#[test]
fn send_set_without_cell_is_usage_error() {
    let output = gridlink()
        .arg("send")
        .arg(missing_device())
        .arg("set")
        .arg("--value")
        .arg("4")
        .output()
        .expect("send should run");

    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn port_can_come_from_environment() {
    let output = gridlink()
        .env("GRIDLINK_PORT", missing_device())
        .arg("monitor")
        .output()
        .expect("monitor should run");

    // Parsed fine; failed only because the device does not exist.
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn ports_json_is_an_array_when_enumeration_works() {
    let output = gridlink()
        .arg("--format")
        .arg("json")
        .arg("ports")
        .output()
        .expect("ports should run");

    if output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let trimmed = stdout.trim();
        assert!(trimmed.starts_with('[') && trimmed.ends_with(']'));
    } else {
        assert_eq!(output.status.code(), Some(3));
    }
}
