//! `flock stream` and `flock fetch` handlers.
//!
//! Both wire the configured collaborators into a [`Pipeline`] and run it
//! until the reader finishes or the process is interrupted. Interruption is
//! a clean exit: the run totals are still reported.

use std::time::Duration;

use anyhow::Context;
use tracing::info;
use uuid::Uuid;

use flock_core::{load_topics, AppConfig, RunStats, TopicConfig};
use flock_db::{
    CursorStore, FileCursorStore, FileUnclassifiedLog, JsonlSink, PgCursorStore, PgSink, Sink,
};
use flock_feed::{
    HttpSearchSource, HttpStreamSource, LiveReader, ReplayOptions, ReplayReader, Shutdown,
};
use flock_sentiment::{HttpRemoteClassifier, SentimentEnsemble};

use crate::pipeline::Pipeline;
use crate::OutputKind;

/// Cursor row name in `feed_cursors` for the Postgres destination.
const PG_CURSOR_DESTINATION: &str = "feed_items";

pub(crate) struct FetchOptions {
    pub resume: bool,
    pub max_pages: Option<usize>,
    pub target: Option<usize>,
    pub from_token: Option<String>,
}

struct Destination {
    sink: Box<dyn Sink>,
    cursor: Box<dyn CursorStore>,
}

pub(crate) async fn run_stream(
    config: &AppConfig,
    output: OutputKind,
    quiet: bool,
) -> anyhow::Result<()> {
    let token = bearer_token(config)?;
    let topics = load_run_topics(config)?;
    let tracks = topics.tracks();

    let run_id = Uuid::new_v4();
    let destination = open_destination(config, output, run_id).await?;
    let source = HttpStreamSource::new(
        &config.stream_url,
        token,
        &tracks,
        config.request_timeout_secs,
        &config.user_agent,
    )?;
    let mut reader = LiveReader::new(
        source,
        Duration::from_secs(config.reconnect_backoff_secs),
    );

    let mut pipeline = Pipeline::new(
        run_id,
        topics,
        build_ensemble(config)?,
        destination.sink,
        destination.cursor,
        Box::new(FileUnclassifiedLog::new(&config.unclassified_path)),
        &config.language,
    )
    .with_echo(!quiet);

    info!(tracks = tracks.len(), output = ?output, "starting live stream; Ctrl-C to stop");
    let mut shutdown = listen_for_shutdown();
    let stats = pipeline.run(&mut reader, &mut shutdown).await;
    print_summary(&stats)
}

pub(crate) async fn run_fetch(
    config: &AppConfig,
    output: OutputKind,
    options: FetchOptions,
) -> anyhow::Result<()> {
    let token = bearer_token(config)?;
    let topics = load_run_topics(config)?;
    let terms = topics.tracks();

    let run_id = Uuid::new_v4();
    let mut destination = open_destination(config, output, run_id).await?;
    let threshold = if options.resume {
        let cursor = destination
            .cursor
            .load()
            .await
            .context("loading replay cursor")?;
        match &cursor {
            Some(c) => info!(cursor = %c.timestamp, "resuming after stored cursor"),
            None => info!("no stored cursor; starting from scratch"),
        }
        cursor
    } else {
        None
    };

    let source = HttpSearchSource::new(
        &config.search_url,
        token,
        config.replay_page_size,
        config.request_timeout_secs,
        &config.user_agent,
    )?;
    let replay_options = ReplayOptions {
        max_pages: options.max_pages.unwrap_or(config.replay_max_pages),
        target_count: options.target.or(config.replay_target_count),
        max_retries: config.replay_max_retries,
        retry_backoff_ms: config.replay_retry_backoff_ms,
        start_token: options.from_token,
    };
    let mut reader = ReplayReader::new(source, terms, replay_options);

    let mut pipeline = Pipeline::new(
        run_id,
        topics,
        build_ensemble(config)?,
        destination.sink,
        destination.cursor,
        Box::new(FileUnclassifiedLog::new(&config.unclassified_path)),
        &config.language,
    )
    .with_threshold(threshold);

    let mut shutdown = listen_for_shutdown();
    let stats = pipeline.run(&mut reader, &mut shutdown).await;
    print_summary(&stats)
}

fn bearer_token(config: &AppConfig) -> anyhow::Result<&str> {
    config
        .bearer_token
        .as_deref()
        .context("FLOCK_BEARER_TOKEN must be set to read the feed")
}

fn load_run_topics(config: &AppConfig) -> anyhow::Result<TopicConfig> {
    load_topics(&config.topics_path).with_context(|| {
        format!(
            "loading topics from {}; create it with `flock topics add`",
            config.topics_path.display()
        )
    })
}

fn build_ensemble(config: &AppConfig) -> anyhow::Result<SentimentEnsemble> {
    if !config.remote_sentiment {
        return Ok(SentimentEnsemble::local_only());
    }
    let remote = HttpRemoteClassifier::new(
        &config.sentiment_url,
        config.request_timeout_secs,
        &config.user_agent,
    )?;
    Ok(SentimentEnsemble::with_remote(Box::new(remote)))
}

async fn open_destination(
    config: &AppConfig,
    output: OutputKind,
    run_id: Uuid,
) -> anyhow::Result<Destination> {
    match output {
        OutputKind::Jsonl => {
            let sink = JsonlSink::open(&config.output_path).await?;
            Ok(Destination {
                sink: Box::new(sink),
                cursor: Box::new(FileCursorStore::new(&config.cursor_path())),
            })
        }
        OutputKind::Postgres => {
            let pool = flock_db::connect_pool_from_config(config).await?;
            flock_db::run_migrations(&pool).await?;
            Ok(Destination {
                sink: Box::new(PgSink::new(pool.clone(), run_id)),
                cursor: Box::new(PgCursorStore::new(pool, PG_CURSOR_DESTINATION)),
            })
        }
    }
}

fn listen_for_shutdown() -> Shutdown {
    let (trigger, shutdown) = flock_feed::shutdown_channel();
    tokio::spawn(async move {
        crate::shutdown_signal().await;
        trigger.trigger();
    });
    shutdown
}

fn print_summary(stats: &RunStats) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(stats)?);
    println!(
        "{} item(s) in {:.1}s ({:.4}s per item)",
        stats.sunk,
        stats.elapsed.as_secs_f64(),
        stats.secs_per_item()
    );
    Ok(())
}
