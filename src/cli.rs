// Command-line interface definitions

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::OutputFormat;
use crate::reader::DEFAULT_LIVE_FILE;

#[derive(Parser, Debug)]
#[command(name = "coordwatch")]
#[command(about = "Report coordinates that players post in Minecraft server chat")]
#[command(
    long_about = "Report coordinates that players post in Minecraft server chat\n\n\
coordwatch polls a server log directory, reads rotated logs (YYYY-MM-DD-n.log.gz) and the\n\
live log incrementally, and emits one notification per coordinate mention. Progress is\n\
kept in a checkpoint file so restarts neither repeat nor skip messages.\n\n\
COMMON EXAMPLES:\n  coordwatch /srv/minecraft/logs\n  coordwatch logs --once -F text\n  \
POLLING_INTERVAL=10 coordwatch logs --checkpoint state/last_read.json"
)]
#[command(version)]
pub struct Cli {
    /// Server log directory holding rotated logs and the live log
    #[arg(env = "COORDWATCH_LOG_DIR")]
    pub log_dir: PathBuf,

    /// Name of the live log inside the log directory
    #[arg(
        long = "live-file",
        env = "COORDWATCH_LIVE_FILE",
        default_value = DEFAULT_LIVE_FILE,
        help_heading = "Input Options"
    )]
    pub live_file: String,

    /// Checkpoint file recording how far the logs have been read
    #[arg(
        long = "checkpoint",
        env = "COORDWATCH_CHECKPOINT",
        default_value = "last_read.json",
        help_heading = "Input Options"
    )]
    pub checkpoint: PathBuf,

    /// Time between polling cycles, e.g. "30s", "2m", or plain seconds
    #[arg(
        long = "interval",
        env = "POLLING_INTERVAL",
        default_value = "30s",
        value_parser = parse_interval,
        help_heading = "Polling Options"
    )]
    pub interval: Duration,

    /// Run a single polling cycle and exit
    #[arg(long = "once", help_heading = "Polling Options")]
    pub once: bool,

    /// Notification output format
    #[arg(
        short = 'F',
        long = "output-format",
        value_enum,
        default_value = "json",
        help_heading = "Output Options"
    )]
    pub output_format: OutputFormat,

    /// Print scan statistics to stderr after every cycle
    #[arg(long = "stats", help_heading = "Output Options")]
    pub stats: bool,

    /// Log debug details (overridden by RUST_LOG)
    #[arg(short = 'v', long = "verbose", conflicts_with = "quiet", help_heading = "Output Options")]
    pub verbose: bool,

    /// Only log warnings and errors (overridden by RUST_LOG)
    #[arg(short = 'q', long = "quiet", help_heading = "Output Options")]
    pub quiet: bool,
}

/// Parse a polling interval. Bare numbers are seconds.
pub fn parse_interval(value: &str) -> Result<Duration, String> {
    let value = value.trim();
    let interval = match value.parse::<u64>() {
        Ok(secs) => Duration::from_secs(secs),
        Err(_) => humantime::parse_duration(value)
            .map_err(|e| format!("invalid interval '{}': {}", value, e))?,
    };

    if interval.is_zero() {
        return Err("interval must be greater than zero".to_string());
    }
    Ok(interval)
}
