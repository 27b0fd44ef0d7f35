//! Destinations for normalized items.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use flock_core::NormalizedItem;

use crate::{to_db_count, StoreError};

/// What a successful `write` did with the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Stored,
    /// An item with the same id was already stored; nothing was written.
    Duplicate,
}

/// Accepts one normalized item at a time. A successful `write` means the
/// item is durable enough to advance the replay cursor past it, whether it
/// was stored now or earlier.
#[async_trait]
pub trait Sink: Send {
    /// Short destination name for logs.
    fn name(&self) -> &str;

    /// # Errors
    ///
    /// Any failure to persist `item`.
    async fn write(&mut self, item: &NormalizedItem) -> Result<WriteOutcome, StoreError>;
}

/// Appends one JSON object per line.
pub struct JsonlSink {
    path: PathBuf,
    file: File,
}

impl JsonlSink {
    /// Open `path` for appending, creating it and its parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file cannot be opened.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let io_err = |source| StoreError::Io {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(io_err)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Sink for JsonlSink {
    fn name(&self) -> &str {
        "jsonl"
    }

    async fn write(&mut self, item: &NormalizedItem) -> Result<WriteOutcome, StoreError> {
        let mut line = serde_json::to_vec(item)?;
        line.push(b'\n');

        let io_err = |source| StoreError::Io {
            path: self.path.display().to_string(),
            source,
        };
        self.file.write_all(&line).await.map_err(io_err)?;
        self.file.flush().await.map_err(io_err)?;
        Ok(WriteOutcome::Stored)
    }
}

/// Inserts into `feed_items`. Items whose id is already stored are skipped
/// and reported as [`WriteOutcome::Duplicate`].
pub struct PgSink {
    pool: PgPool,
    run_id: Uuid,
}

impl PgSink {
    #[must_use]
    pub fn new(pool: PgPool, run_id: Uuid) -> Self {
        Self { pool, run_id }
    }
}

#[async_trait]
impl Sink for PgSink {
    fn name(&self) -> &str {
        "postgres"
    }

    async fn write(&mut self, item: &NormalizedItem) -> Result<WriteOutcome, StoreError> {
        let result = sqlx::query(
            "INSERT INTO feed_items \
             (item_id, run_id, posted_at, text, hashtags, author, author_location, \
              followers, following, favorites, retweets, sentiment, topic) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             ON CONFLICT DO NOTHING",
        )
        .bind(item.id.as_deref())
        .bind(self.run_id)
        .bind(item.timestamp)
        .bind(&item.text)
        .bind(&item.hashtags)
        .bind(&item.author)
        .bind(item.author_location.as_deref())
        .bind(to_db_count(item.followers))
        .bind(to_db_count(item.following))
        .bind(to_db_count(item.favorites))
        .bind(to_db_count(item.retweets))
        .bind(item.sentiment.as_str())
        .bind(item.topic.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            Ok(WriteOutcome::Duplicate)
        } else {
            Ok(WriteOutcome::Stored)
        }
    }
}

/// Keeps items in memory. Clones share the same buffer, so a caller can
/// hand one clone to a pipeline and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    items: Arc<Mutex<Vec<NormalizedItem>>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn items(&self) -> Vec<NormalizedItem> {
        self.items
            .lock()
            .map(|items| items.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Sink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn write(&mut self, item: &NormalizedItem) -> Result<WriteOutcome, StoreError> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(item.clone());
        Ok(WriteOutcome::Stored)
    }
}
