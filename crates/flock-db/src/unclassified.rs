//! Side channel for records that matched no topic.
//!
//! Each entry carries the raw record, its searchable summary, and the topic
//! groups it was checked against, so keyword lists can be tuned later.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use flock_core::{RawRecord, TopicConfig};

use crate::StoreError;

#[async_trait]
pub trait UnclassifiedLog: Send {
    /// # Errors
    ///
    /// Any failure to persist the entry.
    async fn record(
        &mut self,
        raw: &RawRecord,
        summary: &Value,
        topics: &TopicConfig,
    ) -> Result<(), StoreError>;
}

fn groups_json(topics: &TopicConfig) -> Value {
    topics
        .iter()
        .map(|topic| {
            (
                topic.label.clone(),
                Value::from(topic.keywords.clone()),
            )
        })
        .collect::<serde_json::Map<_, _>>()
        .into()
}

/// Appends delimited, pretty-printed dumps to a text file.
pub struct FileUnclassifiedLog {
    path: PathBuf,
}

impl FileUnclassifiedLog {
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    fn render(raw: &RawRecord, summary: &Value, topics: &TopicConfig) -> Result<String, StoreError> {
        Ok(format!(
            "===== unclassified @ {} =====\n--- raw ---\n{}\n--- summary ---\n{}\n--- groups ---\n{}\n\n",
            Utc::now().to_rfc3339(),
            serde_json::to_string_pretty(raw)?,
            serde_json::to_string_pretty(summary)?,
            serde_json::to_string_pretty(&groups_json(topics))?,
        ))
    }
}

#[async_trait]
impl UnclassifiedLog for FileUnclassifiedLog {
    async fn record(
        &mut self,
        raw: &RawRecord,
        summary: &Value,
        topics: &TopicConfig,
    ) -> Result<(), StoreError> {
        let entry = Self::render(raw, summary, topics)?;
        let io_err = |source| StoreError::Io {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(io_err)?;
        file.write_all(entry.as_bytes()).await.map_err(io_err)?;
        file.flush().await.map_err(io_err)
    }
}

/// Keeps entries in memory as `(raw, summary)` pairs. Clones share entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryUnclassifiedLog {
    entries: Arc<Mutex<Vec<(RawRecord, Value)>>>,
}

impl MemoryUnclassifiedLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entries(&self) -> Vec<(RawRecord, Value)> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl UnclassifiedLog for MemoryUnclassifiedLog {
    async fn record(
        &mut self,
        raw: &RawRecord,
        summary: &Value,
        _topics: &TopicConfig,
    ) -> Result<(), StoreError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((raw.clone(), summary.clone()));
        Ok(())
    }
}
