//! Running totals for one ingest run.

use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

/// Per-run counters. Single writer: the pipeline coordinator.
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    pub run_id: Uuid,
    /// Records pulled from the reader, before any filtering.
    pub seen: u64,
    pub dropped_language: u64,
    pub unclassified: u64,
    /// Rejected by the cursor continuity check.
    pub stale: u64,
    pub malformed: u64,
    pub sunk: u64,
    /// Accepted by the sink but already stored there.
    pub duplicates: u64,
    pub sink_failures: u64,
    #[serde(skip)]
    pub processing_time: Duration,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl RunStats {
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            seen: 0,
            dropped_language: 0,
            unclassified: 0,
            stale: 0,
            malformed: 0,
            sunk: 0,
            duplicates: 0,
            sink_failures: 0,
            processing_time: Duration::ZERO,
            elapsed: Duration::ZERO,
        }
    }

    /// Records that passed the language filter.
    #[must_use]
    pub fn processed(&self) -> u64 {
        self.seen.saturating_sub(self.dropped_language)
    }

    /// Mean processing latency per processed record, in seconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn secs_per_item(&self) -> f64 {
        let processed = self.processed();
        if processed == 0 {
            0.0
        } else {
            self.processing_time.as_secs_f64() / processed as f64
        }
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}
