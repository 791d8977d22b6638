use std::fmt;
use std::time::{Duration, Instant};

/// Statistics collected during one polling cycle
#[derive(Debug, Clone, Default)]
pub struct ScanStats {
    pub rotated_files_read: usize,
    pub lines_read: usize,
    pub lines_skipped: usize,
    pub chat_messages: usize,
    pub coordinates: usize,
    pub processing_time: Duration,
    start_time: Option<Instant>,
}

impl ScanStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    pub fn finish(&mut self) {
        if let Some(start) = self.start_time {
            self.processing_time = start.elapsed();
        }
    }
}

impl fmt::Display for ScanStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rotated files: {} | Lines: {} read, {} already seen | \
             Chat: {} | Coordinates: {} | Time: {:.2}s",
            self.rotated_files_read,
            self.lines_read,
            self.lines_skipped,
            self.chat_messages,
            self.coordinates,
            self.processing_time.as_secs_f64()
        )
    }
}
