//! Postgres connection pool and schema migrations.

use std::collections::HashSet;
use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};

use flock_core::AppConfig;

use crate::StoreError;

// Relative to crates/flock-db/Cargo.toml.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(10),
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout: Duration::from_secs(config.db_acquire_timeout_secs),
        }
    }

    /// Open a pool against `database_url` with these limits.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if no connection can be established.
    pub async fn connect(&self, database_url: &str) -> Result<PgPool, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.acquire_timeout)
            .connect(database_url)
            .await?;
        Ok(pool)
    }
}

/// Connect using the URL and pool settings of an [`AppConfig`].
///
/// # Errors
///
/// Returns [`StoreError::MissingDatabaseUrl`] if no URL is configured, or
/// [`StoreError::Sqlx`] if the connection cannot be established.
pub async fn connect_pool_from_config(config: &AppConfig) -> Result<PgPool, StoreError> {
    let database_url = config
        .database_url
        .as_deref()
        .ok_or(StoreError::MissingDatabaseUrl)?;
    PoolConfig::from_app_config(config)
        .connect(database_url)
        .await
}

/// Apply pending migrations and return how many ran.
///
/// # Errors
///
/// Returns [`StoreError::Migration`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, StoreError> {
    let applied = applied_versions(pool).await;
    MIGRATOR.run(pool).await?;
    Ok(MIGRATOR
        .iter()
        .filter(|migration| !applied.contains(&migration.version))
        .count())
}

/// Versions already recorded as applied. Empty on a fresh database, where
/// the bookkeeping table does not exist yet.
async fn applied_versions(pool: &PgPool) -> HashSet<i64> {
    sqlx::query_scalar::<_, i64>("SELECT version FROM _sqlx_migrations WHERE success")
        .fetch_all(pool)
        .await
        .map(|versions| versions.into_iter().collect())
        .unwrap_or_default()
}

/// Round-trip a trivial query to prove the pool is usable.
///
/// # Errors
///
/// Returns [`StoreError::Sqlx`] if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}
