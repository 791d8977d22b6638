use clap::ValueEnum;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use crate::checkpoint::JsonCheckpointStore;
use crate::cli::Cli;
use crate::notify::{JsonLinesSink, NotificationSink, TextSink};
use crate::reader::LogReader;

/// Main configuration struct for coordwatch
#[derive(Debug, Clone)]
pub struct CoordwatchConfig {
    pub input: InputConfig,
    pub checkpoint: CheckpointConfig,
    pub polling: PollingConfig,
    pub output: OutputConfig,
}

/// Where the server writes its logs
#[derive(Debug, Clone)]
pub struct InputConfig {
    pub log_dir: PathBuf,
    pub live_file: String,
}

#[derive(Debug, Clone)]
pub struct CheckpointConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct PollingConfig {
    pub interval: Duration,
    pub once: bool,
}

#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub stats: bool,
    pub verbosity: Verbosity,
}

/// How notifications are rendered on stdout
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One JSON object per notification
    #[default]
    Json,
    /// One human-readable line per notification
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    /// Default log filter, used when RUST_LOG is unset
    pub fn default_filter(self) -> &'static str {
        match self {
            Verbosity::Quiet => "warn",
            Verbosity::Normal => "info",
            Verbosity::Verbose => "debug",
        }
    }
}

impl CoordwatchConfig {
    /// Create configuration from CLI arguments
    pub fn from_cli(cli: &Cli) -> Self {
        let verbosity = if cli.verbose {
            Verbosity::Verbose
        } else if cli.quiet {
            Verbosity::Quiet
        } else {
            Verbosity::Normal
        };

        Self {
            input: InputConfig {
                log_dir: cli.log_dir.clone(),
                live_file: cli.live_file.clone(),
            },
            checkpoint: CheckpointConfig {
                path: cli.checkpoint.clone(),
            },
            polling: PollingConfig {
                interval: cli.interval,
                once: cli.once,
            },
            output: OutputConfig {
                format: cli.output_format,
                stats: cli.stats,
                verbosity,
            },
        }
    }

    pub fn build_reader(&self) -> LogReader<JsonCheckpointStore> {
        LogReader::new(JsonCheckpointStore::new(&self.checkpoint.path))
            .with_live_file(self.input.live_file.clone())
    }

    pub fn build_sink<'a, W: Write + 'a>(&self, out: W) -> Box<dyn NotificationSink + 'a> {
        match self.output.format {
            OutputFormat::Json => Box::new(JsonLinesSink::new(out)),
            OutputFormat::Text => Box::new(TextSink::new(out)),
        }
    }
}
