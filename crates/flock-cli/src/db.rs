//! `flock db` handlers.

use clap::Subcommand;

use flock_core::AppConfig;

#[derive(Debug, Subcommand)]
pub enum DbCommands {
    /// Check that `DATABASE_URL` accepts connections
    Ping,
    /// Apply pending migrations
    Migrate,
}

pub(crate) async fn run_db(config: &AppConfig, command: DbCommands) -> anyhow::Result<()> {
    let pool = flock_db::connect_pool_from_config(config).await?;
    match command {
        DbCommands::Ping => {
            flock_db::ping(&pool).await?;
            println!("database ok");
        }
        DbCommands::Migrate => {
            let applied = flock_db::run_migrations(&pool).await?;
            tracing::info!(applied, "migrations complete");
            println!("applied {applied} migration(s)");
        }
    }
    pool.close().await;
    Ok(())
}
