//! Rotated log discovery.
//!
//! The server rolls `latest.log` over into `YYYY-MM-DD-n.log.gz`, where `n`
//! counts rotations within the day.

use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ScrapeError;

/// File name suffixes of rotated logs
pub const ROTATED_SUFFIXES: &[&str] = &[".log.gz", ".log.zst"];

/// A rotated, immutable log file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotatedLog {
    pub name: String,
    pub path: PathBuf,
    pub date: NaiveDate,
    pub sequence: u32,
}

impl RotatedLog {
    /// Build from a file in `dir`, or `None` if the name isn't a dated rotation
    pub fn from_name(dir: &Path, name: &str) -> Option<Self> {
        let (date, sequence) = parse_rotated_name(name)?;
        Some(Self {
            name: name.to_string(),
            path: dir.join(name),
            date,
            sequence,
        })
    }
}

/// Split `2024-01-31-2.log.gz` into its date and sequence number
pub fn parse_rotated_name(name: &str) -> Option<(NaiveDate, u32)> {
    let stem = ROTATED_SUFFIXES
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))?;

    let mut parts = stem.split('-');
    let year = parts.next()?.parse::<i32>().ok()?;
    let month = parts.next()?.parse::<u32>().ok()?;
    let day = parts.next()?.parse::<u32>().ok()?;
    let sequence = parts.next()?.parse::<u32>().ok()?;
    if parts.next().is_some() {
        return None;
    }

    Some((NaiveDate::from_ymd_opt(year, month, day)?, sequence))
}

/// List rotated logs in `dir`, oldest first
pub fn list_rotated_logs(dir: &Path) -> Result<Vec<RotatedLog>, ScrapeError> {
    let list_error = |source| ScrapeError::ListDirectory {
        path: dir.to_path_buf(),
        source,
    };

    let mut logs = Vec::new();
    for entry in fs::read_dir(dir).map_err(list_error)? {
        let entry = entry.map_err(list_error)?;
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if !ROTATED_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
            continue;
        }
        match RotatedLog::from_name(dir, name) {
            Some(log) => logs.push(log),
            None => log::debug!("skipping {}: not a dated log rotation", name),
        }
    }

    // Same as name order for ISO dates, but 2024-01-01-10 stays after 2024-01-01-9
    logs.sort_by(|a, b| {
        (a.date, a.sequence, &a.name).cmp(&(b.date, b.sequence, &b.name))
    });
    Ok(logs)
}
