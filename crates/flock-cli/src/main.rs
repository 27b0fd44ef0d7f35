mod db;
mod ingest;
mod pipeline;
mod topics;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::{db::DbCommands, topics::TopicsCommands};

#[derive(Debug, Parser)]
#[command(name = "flock")]
#[command(about = "Topic-classified social feed ingest")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Where sunk items go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputKind {
    /// Append JSON lines to `FLOCK_OUTPUT_PATH`
    Jsonl,
    /// Insert into the `feed_items` table at `DATABASE_URL`
    Postgres,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Follow the live stream for every topic keyword until interrupted
    Stream {
        #[arg(long, value_enum, default_value_t = OutputKind::Jsonl)]
        output: OutputKind,

        /// Do not echo sunk items to stdout
        #[arg(long)]
        quiet: bool,
    },
    /// Page back through search results for every topic keyword
    Fetch {
        #[arg(long, value_enum, default_value_t = OutputKind::Jsonl)]
        output: OutputKind,

        /// Continue from the stored cursor and skip items it has already seen
        #[arg(long)]
        resume: bool,

        /// Override `FLOCK_REPLAY_MAX_PAGES`
        #[arg(long)]
        max_pages: Option<usize>,

        /// Stop after this many records
        #[arg(long)]
        target: Option<usize>,

        /// Start paging at this continuation token instead of the newest page
        #[arg(long)]
        from_token: Option<String>,
    },
    /// Inspect or edit the topic configuration
    Topics {
        /// Topic file to use instead of `FLOCK_TOPICS_PATH`
        #[arg(long, global = true)]
        file: Option<PathBuf>,

        #[command(subcommand)]
        command: TopicsCommands,
    },
    /// Postgres helpers
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = flock_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Some(Commands::Stream { output, quiet }) => {
            ingest::run_stream(&config, output, quiet).await?;
        }
        Some(Commands::Fetch {
            output,
            resume,
            max_pages,
            target,
            from_token,
        }) => {
            let options = ingest::FetchOptions {
                resume,
                max_pages,
                target,
                from_token,
            };
            ingest::run_fetch(&config, output, options).await?;
        }
        Some(Commands::Topics { file, command }) => {
            let path = file.unwrap_or_else(|| config.topics_path.clone());
            topics::run_topics(&path, command)?;
        }
        Some(Commands::Db { command }) => db::run_db(&config, command).await?,
        None => println!("flock: try `flock --help`"),
    }

    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM. A handler that cannot be installed never
/// resolves.
pub(crate) async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, stopping after the current item");
}
