//! The reader abstraction shared by live and replay modes.

use async_trait::async_trait;
use serde::Serialize;

use flock_core::RawRecord;

use crate::shutdown::Shutdown;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedMode {
    Live,
    Replay,
}

impl std::fmt::Display for FeedMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedMode::Live => f.write_str("live"),
            FeedMode::Replay => f.write_str("replay"),
        }
    }
}

/// Reader lifecycle.
///
/// Live: `Idle → Connecting → Streaming ↔ Reconnecting → Stopped`.
/// Replay: `Idle → Fetching → PageReady ↔ Fetching → Exhausted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReaderState {
    Idle,
    Connecting,
    Streaming,
    Reconnecting,
    Stopped,
    Fetching,
    PageReady,
    Exhausted,
}

impl ReaderState {
    /// Whether the reader will never yield another record.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, ReaderState::Stopped | ReaderState::Exhausted)
    }
}

/// Reader-side totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReaderStats {
    pub records: u64,
    /// Live: completed back-off cycles.
    pub reconnects: u64,
    /// Replay: pages fetched.
    pub pages: u64,
    /// Replay: page requests retried after a transient failure.
    pub retries: u64,
}

/// A source of raw records.
///
/// Readers absorb every transport fault themselves; the only outward signal
/// is `None` from [`FeedReader::next_record`], meaning the reader is done.
#[async_trait]
pub trait FeedReader: Send {
    fn mode(&self) -> FeedMode;

    fn state(&self) -> ReaderState;

    /// Next record, or `None` once stopped, exhausted, or cancelled.
    async fn next_record(&mut self, shutdown: &mut Shutdown) -> Option<RawRecord>;

    /// Opaque token locating the most recently delivered record, if the
    /// source has one.
    fn continuation(&self) -> Option<String>;

    fn stats(&self) -> ReaderStats;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(ReaderState::Stopped.is_terminal());
        assert!(ReaderState::Exhausted.is_terminal());
        assert!(!ReaderState::Reconnecting.is_terminal());
        assert!(!ReaderState::PageReady.is_terminal());
    }

    #[test]
    fn mode_renders_lowercase() {
        assert_eq!(FeedMode::Replay.to_string(), "replay");
        assert_eq!(serde_json::to_string(&FeedMode::Live).unwrap(), r#""live""#);
    }
}
