// tests/common/mod.rs
// Shared test utilities for integration tests
#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Format a vanilla server chat line, newline included
pub fn chat(time: &str, user: &str, text: &str) -> String {
    format!("[{}] [Server thread/INFO]: <{}> {}\n", time, user, text)
}

/// Format a non-chat server line, newline included
pub fn server_line(time: &str, text: &str) -> String {
    format!("[{}] [Server thread/INFO]: {}\n", time, text)
}

/// Write a gzip-compressed rotated log
pub fn write_rotated(dir: &Path, name: &str, lines: &[String]) {
    let file = File::create(dir.join(name)).expect("Failed to create rotated log");
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder
        .write_all(lines.concat().as_bytes())
        .expect("Failed to write rotated log");
    encoder.finish().expect("Failed to finish gzip stream");
}

/// Append lines to the live log, creating it if needed
pub fn append_live(dir: &Path, lines: &[String]) {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("latest.log"))
        .expect("Failed to open live log");
    file.write_all(lines.concat().as_bytes())
        .expect("Failed to append to live log");
}

/// Simulate the server rolling `latest.log` over into a rotated log and
/// starting a fresh live log
pub fn rotate_live(dir: &Path, name: &str) {
    let content = std::fs::read_to_string(dir.join("latest.log")).unwrap_or_default();
    write_rotated(dir, name, &[content]);
    std::fs::write(dir.join("latest.log"), b"").expect("Failed to truncate live log");
}

/// Command for the coordwatch binary with a clean environment and piped output
pub fn coordwatch_command(args: &[&str]) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_coordwatch"));
    command
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("POLLING_INTERVAL")
        .env_remove("COORDWATCH_LOG_DIR")
        .env_remove("COORDWATCH_LIVE_FILE")
        .env_remove("COORDWATCH_CHECKPOINT")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    command
}

/// Run the coordwatch binary and return (stdout, stderr, exit code)
pub fn run_coordwatch(args: &[&str]) -> (String, String, i32) {
    let output = coordwatch_command(args)
        .output()
        .expect("Failed to execute coordwatch");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code().unwrap_or(-1),
    )
}
