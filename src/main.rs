use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::unbounded;
use std::io;

use coordwatch::checkpoint::CheckpointStore;
use coordwatch::cli::Cli;
use coordwatch::config::CoordwatchConfig;
use coordwatch::coords::CoordinateEntry;
use coordwatch::error::ErrorSeverity;
use coordwatch::notify::{Notification, NotificationSink};
use coordwatch::platform::{self, ExitCode, SignalHandler};
use coordwatch::reader::LogReader;

fn main() {
    let cli = Cli::parse();
    let config = CoordwatchConfig::from_cli(&cli);

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.output.verbosity.default_filter()),
    )
    .init();

    match run(&config) {
        Ok(code) => code.exit(),
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::GeneralError.exit();
        }
    }
}

fn run(config: &CoordwatchConfig) -> Result<ExitCode> {
    let (ctrl_tx, ctrl_rx) = unbounded();
    let _signal_handler =
        SignalHandler::new(ctrl_tx).context("Failed to install signal handlers")?;

    let mut reader = config.build_reader();
    let stdout = io::stdout();
    let mut sink = config.build_sink(stdout.lock());

    log::info!(
        "watching {} (live log {}, checkpoint {}, every {})",
        config.input.log_dir.display(),
        config.input.live_file,
        reader.store().path().display(),
        humantime::format_duration(config.polling.interval)
    );

    loop {
        let succeeded = run_cycle(&mut reader, sink.as_mut(), config);

        if config.polling.once {
            return Ok(if succeeded {
                ExitCode::Success
            } else {
                ExitCode::GeneralError
            });
        }
        if !platform::wait_for_next_cycle(&ctrl_rx, config.polling.interval) {
            log::info!("shutting down");
            return Ok(ExitCode::Success);
        }
    }
}

/// One polling cycle. Failures are logged here and retried on the next cycle.
fn run_cycle<S: CheckpointStore>(
    reader: &mut LogReader<S>,
    sink: &mut dyn NotificationSink,
    config: &CoordwatchConfig,
) -> bool {
    let entries = match reader.read_new_coordinates(&config.input.log_dir) {
        Ok(entries) => entries,
        Err(e) => {
            // Already checkpointed: lost if the process exits before a good cycle
            let committed = reader.take_carried();
            if !committed.is_empty() {
                log::info!(
                    "delivering {} coordinate(s) read before the failure",
                    committed.len()
                );
                deliver(sink, &committed);
            }
            match e.severity() {
                ErrorSeverity::Integrity => {
                    log::error!("log directory and checkpoint disagree: {}", e);
                    if let Some(remedy) = e.remedy() {
                        log::error!("to recover, {}", remedy);
                    }
                }
                ErrorSeverity::Transient => {
                    log::error!("polling cycle failed, will retry: {}", e);
                }
            }
            return false;
        }
    };

    let stats = reader.last_stats();
    if config.output.stats {
        eprintln!("{}", stats);
    } else if stats.coordinates > 0 {
        log::info!("{}", stats);
    } else {
        log::debug!("{}", stats);
    }

    deliver(sink, &entries);
    true
}

fn deliver(sink: &mut dyn NotificationSink, entries: &[CoordinateEntry]) {
    for entry in entries {
        if let Err(e) = sink.send(&Notification::from_entry(entry)) {
            log::error!(
                "failed to deliver coordinates from {}: {:#}",
                entry.username,
                e
            );
        }
    }
}
