// Core library for coordwatch: incremental chat log scanning for player coordinates

pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod coords;
pub mod decompression;
pub mod error;
pub mod message;
pub mod notify;
pub mod platform;
pub mod reader;
pub mod rotation;
pub mod stats;

pub use checkpoint::{Checkpoint, CheckpointStore, JsonCheckpointStore, MemoryCheckpointStore};
pub use config::CoordwatchConfig;
pub use coords::{extract_coordinates, CoordinateEntry, CoordinatePosition};
pub use error::{ErrorSeverity, ScrapeError};
pub use message::{extract_chat_message, ChatMessage};
pub use notify::{Notification, NotificationSink};
pub use reader::LogReader;
