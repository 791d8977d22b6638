//! Incremental, rotation-aware scanning of a server log directory.
//!
//! Each call to [`LogReader::read_new_coordinates`] picks up where the
//! previous one stopped:
//!
//! 1. rotated logs newer than the checkpoint are read oldest first, and the
//!    checkpoint is persisted after each one;
//! 2. the live log is read from the recorded line count onwards, and the new
//!    count is persisted.
//!
//! The first rotated log after the checkpoint used to be the live log, so
//! the lines already consumed from it are skipped.

use chrono::{Local, NaiveDate};
use std::io;
use std::path::Path;

use crate::checkpoint::{Checkpoint, CheckpointStore};
use crate::coords::CoordinateEntry;
use crate::decompression::LogStream;
use crate::error::ScrapeError;
use crate::message::extract_chat_message;
use crate::rotation::{list_rotated_logs, RotatedLog};
use crate::stats::ScanStats;

/// Name of the file the server is currently appending to
pub const DEFAULT_LIVE_FILE: &str = "latest.log";

pub struct LogReader<S> {
    store: S,
    live_file: String,
    today: Option<NaiveDate>,
    stats: ScanStats,
    // Entries whose checkpoint is persisted but that a failed cycle never returned
    carried: Vec<CoordinateEntry>,
}

impl<S: CheckpointStore> LogReader<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            live_file: DEFAULT_LIVE_FILE.to_string(),
            today: None,
            stats: ScanStats::new(),
            carried: Vec::new(),
        }
    }

    pub fn with_live_file<N: Into<String>>(mut self, name: N) -> Self {
        self.live_file = name.into();
        self
    }

    /// Pin the date given to live log messages instead of the local date
    pub fn with_today(mut self, date: NaiveDate) -> Self {
        self.today = Some(date);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Statistics of the most recent successful cycle
    pub fn last_stats(&self) -> &ScanStats {
        &self.stats
    }

    /// Entries from units that were checkpointed during a cycle that then
    /// failed. Callers that may exit before the next successful cycle
    /// should deliver these right away.
    pub fn take_carried(&mut self) -> Vec<CoordinateEntry> {
        std::mem::take(&mut self.carried)
    }

    /// Scan `log_dir` for coordinates posted since the previous call.
    ///
    /// On error the checkpoint is left at the last fully consumed unit, so
    /// the failed file is read again on the next call. Entries from units
    /// that were committed before the failure stay with the reader: they are
    /// returned by [`take_carried`](Self::take_carried) or, failing that, at
    /// the front of the next successful call.
    pub fn read_new_coordinates(
        &mut self,
        log_dir: &Path,
    ) -> Result<Vec<CoordinateEntry>, ScrapeError> {
        let mut stats = ScanStats::new();
        stats.start_timer();

        let rotated = list_rotated_logs(log_dir)?;
        let mut entries = Vec::new();

        let (mut checkpoint, pending) = match self.store.load() {
            Some(checkpoint) => {
                let pending = pending_rotations(&rotated, &checkpoint, log_dir)?;
                (checkpoint, pending)
            }
            None => {
                log::info!(
                    "no checkpoint found, reading all {} rotated logs in {}",
                    rotated.len(),
                    log_dir.display()
                );
                (Checkpoint::default(), &rotated[..])
            }
        };

        if !pending.is_empty() && checkpoint.last_rotated_file.is_some() {
            log::info!("{} new rotated log(s) since last cycle", pending.len());
        }

        for (index, log) in pending.iter().enumerate() {
            let already_read = if index == 0 {
                checkpoint.live_line_count
            } else {
                0
            };
            self.read_rotated(log, already_read, &mut entries, &mut stats)?;
            checkpoint.record_rotated(&log.name);
            self.store.persist(&checkpoint)?;
            stats.coordinates += entries.len();
            self.carried.append(&mut entries);
        }

        self.read_live(log_dir, &mut checkpoint, &mut entries, &mut stats)?;
        self.store.persist(&checkpoint)?;
        stats.coordinates += entries.len();
        self.carried.append(&mut entries);

        let entries = std::mem::take(&mut self.carried);
        stats.finish();
        self.stats = stats;
        Ok(entries)
    }

    fn read_rotated(
        &self,
        log: &RotatedLog,
        already_read: usize,
        entries: &mut Vec<CoordinateEntry>,
        stats: &mut ScanStats,
    ) -> Result<(), ScrapeError> {
        log::info!("reading {}", log.name);
        let read_error = |source| ScrapeError::ReadLog {
            path: log.path.clone(),
            source,
        };

        let mut stream = LogStream::open(&log.path).map_err(read_error)?;
        let mut bytes = Vec::new();
        let mut line = String::new();
        let mut line_index = 0;

        while stream
            .read_log_line(&mut bytes, &mut line)
            .map_err(read_error)?
            > 0
        {
            if line_index < already_read {
                stats.lines_skipped += 1;
            } else {
                scan_line(&line, log.date, entries, stats);
            }
            line_index += 1;
        }

        stats.rotated_files_read += 1;
        Ok(())
    }

    fn read_live(
        &self,
        log_dir: &Path,
        checkpoint: &mut Checkpoint,
        entries: &mut Vec<CoordinateEntry>,
        stats: &mut ScanStats,
    ) -> Result<(), ScrapeError> {
        let path = log_dir.join(&self.live_file);
        let read_error = |source| ScrapeError::ReadLog {
            path: path.clone(),
            source,
        };

        let mut stream = match LogStream::open(&path) {
            Ok(stream) => stream,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("{} does not exist yet", path.display());
                return Ok(());
            }
            Err(e) => return Err(read_error(e)),
        };

        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        let already_read = checkpoint.live_line_count;
        let mut bytes = Vec::new();
        let mut line = String::new();
        let mut complete_lines = 0;

        while stream
            .read_log_line(&mut bytes, &mut line)
            .map_err(read_error)?
            > 0
        {
            // The server may be halfway through writing the last line
            if !line.ends_with('\n') {
                break;
            }
            if complete_lines < already_read {
                stats.lines_skipped += 1;
            } else {
                scan_line(&line, today, entries, stats);
            }
            complete_lines += 1;
        }

        if complete_lines < already_read {
            // Either the server rotated and the compressed copy is not listed
            // yet, or the file was replaced by hand. In the second case the
            // first lines of the new file will be skipped once it grows past
            // the stored count.
            log::warn!(
                "{} has {} lines but {} were already read; waiting for the rotated copy \
                 to appear. If the live log was replaced without rotation, its first {} \
                 lines will be skipped: delete the checkpoint to re-read everything",
                path.display(),
                complete_lines,
                already_read,
                already_read
            );
        } else {
            checkpoint.record_live(complete_lines);
        }
        Ok(())
    }
}

/// Rotated logs that have not been consumed yet, oldest first
fn pending_rotations<'a>(
    rotated: &'a [RotatedLog],
    checkpoint: &Checkpoint,
    log_dir: &Path,
) -> Result<&'a [RotatedLog], ScrapeError> {
    let Some(last) = &checkpoint.last_rotated_file else {
        return Ok(rotated);
    };

    match rotated.iter().position(|log| &log.name == last) {
        Some(index) => Ok(&rotated[index + 1..]),
        None => Err(ScrapeError::MissingCheckpointLog {
            name: last.clone(),
            directory: log_dir.to_path_buf(),
        }),
    }
}

fn scan_line(
    line: &str,
    date: NaiveDate,
    entries: &mut Vec<CoordinateEntry>,
    stats: &mut ScanStats,
) {
    stats.lines_read += 1;

    let Some(message) = extract_chat_message(line) else {
        return;
    };
    stats.chat_messages += 1;

    if let Some(entry) = CoordinateEntry::from_message(&message, date) {
        log::debug!("found coordinates: {}", entry);
        entries.push(entry);
    }
}
