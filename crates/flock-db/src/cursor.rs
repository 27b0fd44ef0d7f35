//! Durable replay cursors.
//!
//! Commits are monotonic in the timestamp: a commit older than the stored
//! cursor keeps the stored timestamp and only updates the continuation token.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, warn};

use flock_core::Cursor;

use crate::StoreError;

#[async_trait]
pub trait CursorStore: Send {
    /// The stored cursor, or `None` if nothing has been committed yet.
    ///
    /// # Errors
    ///
    /// Any failure to read the backing store.
    async fn load(&mut self) -> Result<Option<Cursor>, StoreError>;

    /// Fold a commit into the stored cursor and return the result.
    ///
    /// # Errors
    ///
    /// Any failure to read or write the backing store. On error the stored
    /// cursor is unchanged.
    async fn commit(
        &mut self,
        timestamp: DateTime<Utc>,
        continuation: Option<String>,
    ) -> Result<Cursor, StoreError>;
}

fn fold(current: Option<&Cursor>, timestamp: DateTime<Utc>, continuation: Option<String>) -> Cursor {
    match current {
        Some(cursor) => cursor.advance(timestamp, continuation),
        None => Cursor::new(timestamp, continuation),
    }
}

/// JSON file written atomically through a sibling temp file and a rename.
pub struct FileCursorStore {
    path: PathBuf,
    cached: Option<Cursor>,
    loaded: bool,
}

impl FileCursorStore {
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            cached: None,
            loaded: false,
        }
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CursorStore for FileCursorStore {
    async fn load(&mut self) -> Result<Option<Cursor>, StoreError> {
        if self.loaded {
            return Ok(self.cached.clone());
        }
        let cursor = match tokio::fs::read(&self.path).await {
            // An unreadable cursor means starting over; the next commit
            // replaces the file.
            Ok(bytes) => match serde_json::from_slice::<Cursor>(&bytes) {
                Ok(cursor) => Some(cursor),
                Err(e) => {
                    warn!(
                        path = %self.path.display(),
                        error = %e,
                        "cursor file unreadable; starting from scratch"
                    );
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(self.io_err(e)),
        };
        self.cached.clone_from(&cursor);
        self.loaded = true;
        Ok(cursor)
    }

    async fn commit(
        &mut self,
        timestamp: DateTime<Utc>,
        continuation: Option<String>,
    ) -> Result<Cursor, StoreError> {
        let current = self.load().await?;
        let next = fold(current.as_ref(), timestamp, continuation);

        let bytes = serde_json::to_vec_pretty(&next)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_err(e))?;
        }
        let temp = self.temp_path();
        tokio::fs::write(&temp, &bytes)
            .await
            .map_err(|e| self.io_err(e))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| self.io_err(e))?;

        debug!(path = %self.path.display(), timestamp = %next.timestamp, "cursor committed");
        self.cached = Some(next.clone());
        Ok(next)
    }
}

/// One row per destination in `feed_cursors`; the upsert keeps the greater
/// timestamp.
pub struct PgCursorStore {
    pool: PgPool,
    destination: String,
}

impl PgCursorStore {
    #[must_use]
    pub fn new(pool: PgPool, destination: &str) -> Self {
        Self {
            pool,
            destination: destination.to_string(),
        }
    }
}

#[async_trait]
impl CursorStore for PgCursorStore {
    async fn load(&mut self) -> Result<Option<Cursor>, StoreError> {
        let row = sqlx::query_as::<_, (DateTime<Utc>, Option<String>)>(
            "SELECT last_timestamp, continuation FROM feed_cursors WHERE destination = $1",
        )
        .bind(&self.destination)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(timestamp, continuation)| Cursor::new(timestamp, continuation)))
    }

    async fn commit(
        &mut self,
        timestamp: DateTime<Utc>,
        continuation: Option<String>,
    ) -> Result<Cursor, StoreError> {
        let (timestamp, continuation) = sqlx::query_as::<_, (DateTime<Utc>, Option<String>)>(
            "INSERT INTO feed_cursors (destination, last_timestamp, continuation) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (destination) DO UPDATE SET \
               last_timestamp = GREATEST(feed_cursors.last_timestamp, EXCLUDED.last_timestamp), \
               continuation = EXCLUDED.continuation, \
               updated_at = NOW() \
             RETURNING last_timestamp, continuation",
        )
        .bind(&self.destination)
        .bind(timestamp)
        .bind(continuation)
        .fetch_one(&self.pool)
        .await?;
        Ok(Cursor::new(timestamp, continuation))
    }
}

#[derive(Debug, Default)]
struct MemoryCursorState {
    cursor: Option<Cursor>,
    commits: usize,
}

/// In-memory store that also counts commits. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryCursorStore {
    state: Arc<Mutex<MemoryCursorState>>,
}

impl MemoryCursorStore {
    #[must_use]
    pub fn new(initial: Option<Cursor>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryCursorState {
                cursor: initial,
                commits: 0,
            })),
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<Cursor> {
        self.state.lock().ok().and_then(|s| s.cursor.clone())
    }

    #[must_use]
    pub fn commits(&self) -> usize {
        self.state.lock().map(|s| s.commits).unwrap_or(0)
    }
}

#[async_trait]
impl CursorStore for MemoryCursorStore {
    async fn load(&mut self) -> Result<Option<Cursor>, StoreError> {
        Ok(self.current())
    }

    async fn commit(
        &mut self,
        timestamp: DateTime<Utc>,
        continuation: Option<String>,
    ) -> Result<Cursor, StoreError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let next = fold(state.cursor.as_ref(), timestamp, continuation);
        state.cursor = Some(next.clone());
        state.commits += 1;
        Ok(next)
    }
}
