//! Progress lines at a fixed cadence

use crate::summary::{RunMode, Tally};
use std::time::{Duration, Instant};

/// Longest gap between progress lines while documents keep arriving
const PROGRESS_INTERVAL: Duration = Duration::from_secs(5);

/// Emits a progress line every `every` scanned documents or every
/// [`PROGRESS_INTERVAL`], whichever comes first
#[derive(Debug)]
pub struct Progress {
    mode: RunMode,
    every: u64,
    last_at: Instant,
    last_scanned: u64,
}

impl Progress {
    /// Create reporter; `every == 0` disables it
    #[must_use]
    pub fn new(mode: RunMode, every: u64) -> Self {
        Self {
            mode,
            every,
            last_at: Instant::now(),
            last_scanned: 0,
        }
    }

    /// Line to print for the current counts, if one is due
    pub fn tick(&mut self, tally: &Tally) -> Option<String> {
        if self.every == 0 || tally.scanned == self.last_scanned {
            return None;
        }
        let due_by_count = tally.scanned % self.every == 0;
        let due_by_time = self.last_at.elapsed() >= PROGRESS_INTERVAL;
        if !(due_by_count || due_by_time) {
            return None;
        }
        self.last_at = Instant::now();
        self.last_scanned = tally.scanned;
        Some(line(self.mode, tally))
    }
}

/// Render one progress line
#[must_use]
pub fn line(mode: RunMode, tally: &Tally) -> String {
    format!(
        "[{mode}] scanned={} migrated={} skipped={} failed={}",
        tally.scanned, tally.migrated, tally.skipped, tally.failed
    )
}
