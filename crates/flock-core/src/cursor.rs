//! Replay high-water mark.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The last durably sunk item's timestamp plus the page token it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub timestamp: DateTime<Utc>,
    pub continuation: Option<String>,
}

impl Cursor {
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, continuation: Option<String>) -> Self {
        Self {
            timestamp,
            continuation,
        }
    }

    /// Whether an item stamped `timestamp` is newer than this cursor.
    #[must_use]
    pub fn admits(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp > self.timestamp
    }

    /// Fold a new commit into this cursor without regressing the timestamp.
    ///
    /// The continuation token always follows the latest commit.
    #[must_use]
    pub fn advance(&self, timestamp: DateTime<Utc>, continuation: Option<String>) -> Self {
        Self {
            timestamp: self.timestamp.max(timestamp),
            continuation,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn admits_only_strictly_newer() {
        let cursor = Cursor::new(at(100), None);
        assert!(cursor.admits(at(101)));
        assert!(!cursor.admits(at(100)));
        assert!(!cursor.admits(at(99)));
    }

    #[test]
    fn advance_never_regresses() {
        let cursor = Cursor::new(at(100), Some("a".to_string()));
        let next = cursor.advance(at(50), Some("b".to_string()));
        assert_eq!(next.timestamp, at(100));
        assert_eq!(next.continuation.as_deref(), Some("b"));
        let next = next.advance(at(150), None);
        assert_eq!(next.timestamp, at(150));
    }
}
