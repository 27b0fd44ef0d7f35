//! Persistence for the flock pipeline: item sinks, the unclassified side log,
//! and replay cursor stores, in file and Postgres flavours.

use thiserror::Error;

pub mod cursor;
pub mod pool;
pub mod sink;
pub mod unclassified;

pub use cursor::{CursorStore, FileCursorStore, MemoryCursorStore, PgCursorStore};
pub use pool::{connect_pool_from_config, ping, run_migrations, PoolConfig};
pub use sink::{JsonlSink, MemorySink, PgSink, Sink, WriteOutcome};
pub use unclassified::{FileUnclassifiedLog, MemoryUnclassifiedLog, UnclassifiedLog};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("DATABASE_URL is not set")]
    MissingDatabaseUrl,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Saturating conversion for counters stored in `BIGINT` columns.
pub(crate) fn to_db_count(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_saturate() {
        assert_eq!(to_db_count(42), 42);
        assert_eq!(to_db_count(u64::MAX), i64::MAX);
    }

    #[test]
    fn missing_url_message_names_the_variable() {
        assert_eq!(
            StoreError::MissingDatabaseUrl.to_string(),
            "DATABASE_URL is not set"
        );
    }
}
