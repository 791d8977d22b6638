//! Persisted progress of the log reader.
//!
//! On disk the checkpoint is a small JSON document:
//! `{"log_file": "2024-01-01-1.log.gz", "line_number": 42}`.

use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::ScrapeError;

/// How far the reader has got
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Newest rotated log that has been read to the end
    #[serde(rename = "log_file", default, skip_serializing_if = "Option::is_none")]
    pub last_rotated_file: Option<String>,
    /// Complete lines already consumed from the live log
    #[serde(rename = "line_number", default)]
    pub live_line_count: usize,
}

impl Checkpoint {
    /// Mark a rotated log as fully read. The live log restarted when that
    /// file was rotated out, so the live line count starts over.
    pub fn record_rotated(&mut self, name: &str) {
        self.last_rotated_file = Some(name.to_string());
        self.live_line_count = 0;
    }

    pub fn record_live(&mut self, line_count: usize) {
        self.live_line_count = line_count;
    }
}

/// Where checkpoints live between polling cycles
pub trait CheckpointStore {
    /// `None` means nothing was ever persisted (or it could not be read back),
    /// which the reader treats as a first run.
    fn load(&self) -> Option<Checkpoint>;

    /// Durably replace the stored checkpoint
    fn persist(&self, checkpoint: &Checkpoint) -> Result<(), ScrapeError>;
}

/// Checkpoint kept in a JSON file, replaced atomically on every write
#[derive(Debug, Clone)]
pub struct JsonCheckpointStore {
    path: PathBuf,
}

impl JsonCheckpointStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "checkpoint".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_atomically(&self, contents: &[u8]) -> io::Result<()> {
        let temp_path = self.temp_path();
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(contents)?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &self.path)?;
        sync_dir(&self.parent_dir())
    }

    /// Directory holding the checkpoint file, `.` for a bare file name
    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

// The rename is only durable once the directory entry itself is flushed
#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

impl CheckpointStore for JsonCheckpointStore {
    fn load(&self) -> Option<Checkpoint> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("no checkpoint at {}", self.path.display());
                return None;
            }
            Err(e) => {
                log::warn!(
                    "could not read checkpoint {}, starting over: {}",
                    self.path.display(),
                    e
                );
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(checkpoint) => Some(checkpoint),
            Err(e) => {
                log::warn!(
                    "checkpoint {} is corrupt, starting over: {}",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    fn persist(&self, checkpoint: &Checkpoint) -> Result<(), ScrapeError> {
        let encoded = serde_json::to_vec(checkpoint)?;
        self.write_atomically(&encoded)
            .map_err(|source| ScrapeError::CheckpointWrite {
                path: self.path.clone(),
                source,
            })
    }
}

/// In-process store, for embedding and tests
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    stored: RefCell<Option<Checkpoint>>,
    writes: Cell<usize>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_checkpoint(checkpoint: Checkpoint) -> Self {
        Self {
            stored: RefCell::new(Some(checkpoint)),
            writes: Cell::new(0),
        }
    }

    /// Number of successful `persist` calls so far
    pub fn writes(&self) -> usize {
        self.writes.get()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn load(&self) -> Option<Checkpoint> {
        self.stored.borrow().clone()
    }

    fn persist(&self, checkpoint: &Checkpoint) -> Result<(), ScrapeError> {
        *self.stored.borrow_mut() = Some(checkpoint.clone());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

impl<S: CheckpointStore + ?Sized> CheckpointStore for &S {
    fn load(&self) -> Option<Checkpoint> {
        (**self).load()
    }

    fn persist(&self, checkpoint: &Checkpoint) -> Result<(), ScrapeError> {
        (**self).persist(checkpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_first_run() {
        let dir = TempDir::new().unwrap();
        let store = JsonCheckpointStore::new(dir.path().join("last_read.json"));
        assert!(store.load().is_none());
    }

    #[test]
    fn test_corrupt_file_is_first_run() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("last_read.json");
        fs::write(&path, "{\"log_file\": ").unwrap();
        assert!(JsonCheckpointStore::new(&path).load().is_none());

        fs::write(&path, "\"just a string\"").unwrap();
        assert!(JsonCheckpointStore::new(&path).load().is_none());
    }

    #[test]
    fn test_persist_then_load() {
        let dir = TempDir::new().unwrap();
        let store = JsonCheckpointStore::new(dir.path().join("last_read.json"));
        let checkpoint = Checkpoint {
            last_rotated_file: Some("2024-01-01-1.log.gz".to_string()),
            live_line_count: 17,
        };

        store.persist(&checkpoint).unwrap();
        assert_eq!(store.load(), Some(checkpoint));
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn test_parent_dir_of_bare_file_name() {
        let store = JsonCheckpointStore::new("last_read.json");
        assert_eq!(store.parent_dir(), PathBuf::from("."));

        let store = JsonCheckpointStore::new("state/last_read.json");
        assert_eq!(store.parent_dir(), PathBuf::from("state"));
    }

    #[test]
    fn test_repeated_persist_replaces_previous() {
        let dir = TempDir::new().unwrap();
        let store = JsonCheckpointStore::new(dir.path().join("last_read.json"));
        for count in 1..=3 {
            store
                .persist(&Checkpoint {
                    last_rotated_file: None,
                    live_line_count: count,
                })
                .unwrap();
            assert!(sync_dir(&store.parent_dir()).is_ok());
        }
        assert_eq!(store.load().unwrap().live_line_count, 3);
        let leftovers: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_on_disk_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("last_read.json");
        let store = JsonCheckpointStore::new(&path);
        store
            .persist(&Checkpoint {
                last_rotated_file: Some("2024-01-01-1.log.gz".to_string()),
                live_line_count: 0,
            })
            .unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["log_file"], "2024-01-01-1.log.gz");
        assert_eq!(raw["line_number"], 0);
    }

    #[test]
    fn test_reads_checkpoint_without_rotated_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("last_read.json");
        fs::write(&path, r#"{"line_number": 9}"#).unwrap();

        let checkpoint = JsonCheckpointStore::new(&path).load().unwrap();
        assert_eq!(checkpoint.last_rotated_file, None);
        assert_eq!(checkpoint.live_line_count, 9);
    }

    #[test]
    fn test_persist_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let store = JsonCheckpointStore::new(dir.path().join("nope").join("last_read.json"));
        let err = store.persist(&Checkpoint::default()).unwrap_err();
        assert!(matches!(err, ScrapeError::CheckpointWrite { .. }));
    }

    #[test]
    fn test_record_rotated_resets_live_count() {
        let mut checkpoint = Checkpoint {
            last_rotated_file: None,
            live_line_count: 40,
        };
        checkpoint.record_rotated("2024-01-02-1.log.gz");
        assert_eq!(checkpoint.last_rotated_file.as_deref(), Some("2024-01-02-1.log.gz"));
        assert_eq!(checkpoint.live_line_count, 0);
    }
}
