use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// How the polling loop should treat a failed cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// The on-disk state contradicts the checkpoint; an operator has to step in
    Integrity,
    /// I/O trouble that may clear up by the next cycle
    Transient,
}

/// Errors raised while scanning a log directory
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("failed to list log directory {}: {source}", path.display())]
    ListDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read log file {}: {source}", path.display())]
    ReadLog {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write checkpoint {}: {source}", path.display())]
    CheckpointWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode checkpoint: {0}")]
    CheckpointEncode(#[from] serde_json::Error),

    #[error(
        "checkpoint refers to rotated log '{name}' which is no longer in {}; \
         refusing to guess where to resume",
        directory.display()
    )]
    MissingCheckpointLog { name: String, directory: PathBuf },
}

impl ScrapeError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ScrapeError::MissingCheckpointLog { .. } => ErrorSeverity::Integrity,
            _ => ErrorSeverity::Transient,
        }
    }

    /// Operator-facing hint printed alongside integrity errors
    pub fn remedy(&self) -> Option<String> {
        match self {
            ScrapeError::MissingCheckpointLog { name, .. } => Some(format!(
                "restore '{}' into the log directory, or edit the checkpoint to name the \
                 newest rotated log that has already been reported",
                name
            )),
            _ => None,
        }
    }
}
