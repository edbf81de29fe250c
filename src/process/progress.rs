use tracing::{debug, info};

use super::utils::format_count;

/// Notified after every batch with the running total (header included).
pub trait Progress {
    fn update(&mut self, rows_written: u64, target_rows: u64);
}

impl<F: FnMut(u64, u64)> Progress for F {
    fn update(&mut self, rows_written: u64, target_rows: u64) {
        self(rows_written, target_rows)
    }
}

/// Logs every batch at debug level and every tenth of the target at info.
#[derive(Debug)]
pub struct LogProgress {
    name: String,
    last_decile: u64,
}

impl LogProgress {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            last_decile: 0,
        }
    }
}

impl Progress for LogProgress {
    fn update(&mut self, rows_written: u64, target_rows: u64) {
        debug!(
            file = %self.name,
            "Progress: {} / {} rows written",
            format_count(rows_written),
            format_count(target_rows)
        );
        let decile = decile(rows_written, target_rows);
        if decile > self.last_decile {
            self.last_decile = decile;
            info!(
                file = %self.name,
                "Progress: {} / {} rows written ({}%)",
                format_count(rows_written),
                format_count(target_rows),
                decile * 10
            );
        }
    }
}

fn decile(done: u64, total: u64) -> u64 {
    if total == 0 {
        return 10;
    }
    ((done as u128 * 10) / total as u128) as u64
}
