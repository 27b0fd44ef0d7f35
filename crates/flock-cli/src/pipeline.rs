//! Pipeline coordinator.
//!
//! Pulls records from one [`FeedReader`] and takes each through the language
//! filter, topic classification, normalization, the replay continuity check,
//! sentiment scoring, and the sink. Items are processed strictly in read
//! order, so cursor commits follow read order too.

use std::time::Instant;

use tracing::{debug, info, warn};
use uuid::Uuid;

use flock_classify::{classify, extract_id, normalize_record, summarize};
use flock_core::{Cursor, NormalizedItem, RawRecord, RunStats, Sentiment, TopicConfig};
use flock_db::{CursorStore, Sink, UnclassifiedLog, WriteOutcome};
use flock_feed::{FeedReader, Shutdown};
use flock_sentiment::SentimentEnsemble;

/// What happened to one language-matched record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Sunk,
    Duplicate,
    Unclassified,
    Malformed,
    Stale,
    SinkFailed,
}

pub(crate) struct Pipeline {
    run_id: Uuid,
    topics: TopicConfig,
    ensemble: SentimentEnsemble,
    sink: Box<dyn Sink>,
    cursor_store: Box<dyn CursorStore>,
    unclassified: Box<dyn UnclassifiedLog>,
    language: String,
    /// Items at or before this cursor are rejected as already seen.
    threshold: Option<Cursor>,
    echo: bool,
}

impl Pipeline {
    pub(crate) fn new(
        run_id: Uuid,
        topics: TopicConfig,
        ensemble: SentimentEnsemble,
        sink: Box<dyn Sink>,
        cursor_store: Box<dyn CursorStore>,
        unclassified: Box<dyn UnclassifiedLog>,
        language: &str,
    ) -> Self {
        Self {
            run_id,
            topics,
            ensemble,
            sink,
            cursor_store,
            unclassified,
            language: language.to_string(),
            threshold: None,
            echo: false,
        }
    }

    /// Enable the continuity check against `threshold`. `None` disables it.
    pub(crate) fn with_threshold(mut self, threshold: Option<Cursor>) -> Self {
        self.threshold = threshold;
        self
    }

    /// Print one line per sunk item to stdout.
    pub(crate) fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Drain `reader` until it finishes or `shutdown` fires, returning the
    /// run totals.
    pub(crate) async fn run<R>(&mut self, reader: &mut R, shutdown: &mut Shutdown) -> RunStats
    where
        R: FeedReader + ?Sized,
    {
        let mut stats = RunStats {
            run_id: self.run_id,
            ..RunStats::new()
        };
        let started = Instant::now();
        info!(
            run_id = %self.run_id,
            mode = %reader.mode(),
            sink = self.sink.name(),
            topics = self.topics.len(),
            continuity_check = self.threshold.is_some(),
            "pipeline started"
        );

        while let Some(record) = reader.next_record(shutdown).await {
            stats.seen += 1;
            if record.language() != Some(self.language.as_str()) {
                stats.dropped_language += 1;
                continue;
            }

            let item_started = Instant::now();
            let outcome = self.process(&record, reader.continuation()).await;
            stats.processing_time += item_started.elapsed();

            match outcome {
                Outcome::Sunk => stats.sunk += 1,
                Outcome::Duplicate => stats.duplicates += 1,
                Outcome::Unclassified => stats.unclassified += 1,
                Outcome::Malformed => stats.malformed += 1,
                Outcome::Stale => stats.stale += 1,
                Outcome::SinkFailed => stats.sink_failures += 1,
            }
        }

        stats.elapsed = started.elapsed();
        let reader_stats = reader.stats();
        info!(
            run_id = %stats.run_id,
            state = ?reader.state(),
            seen = stats.seen,
            sunk = stats.sunk,
            duplicates = stats.duplicates,
            unclassified = stats.unclassified,
            stale = stats.stale,
            malformed = stats.malformed,
            dropped_language = stats.dropped_language,
            sink_failures = stats.sink_failures,
            reconnects = reader_stats.reconnects,
            pages = reader_stats.pages,
            retries = reader_stats.retries,
            elapsed_secs = stats.elapsed.as_secs_f64(),
            secs_per_item = stats.secs_per_item(),
            "pipeline finished"
        );
        stats
    }

    async fn process(
        &mut self,
        record: &RawRecord,
        continuation: Option<String>,
    ) -> Outcome {
        let summary = summarize(record);
        let topic = classify(&summary, &self.topics);

        if topic.is_unclassified() {
            debug!(id = ?extract_id(record), "no topic matched");
            if let Err(e) = self
                .unclassified
                .record(record, &summary.to_json(), &self.topics)
                .await
            {
                warn!(error = %e, "failed to write unclassified log entry");
            }
            return Outcome::Unclassified;
        }

        // Sentiment is filled in after the cheap checks so malformed and
        // stale records never reach the remote classifier.
        let mut item = match normalize_record(record, topic, Sentiment::Neutral) {
            Ok(item) => item,
            Err(e) => {
                warn!(error = %e, "dropping malformed record");
                return Outcome::Malformed;
            }
        };

        if let Some(threshold) = &self.threshold {
            if !threshold.admits(item.timestamp) {
                debug!(
                    id = ?item.id,
                    timestamp = %item.timestamp,
                    cursor = %threshold.timestamp,
                    "skipping already-seen item"
                );
                return Outcome::Stale;
            }
        }

        item.sentiment = self.ensemble.score(&item.text).await;

        let written = match self.sink.write(&item).await {
            Ok(written) => written,
            Err(e) => {
                warn!(sink = self.sink.name(), id = ?item.id, error = %e, "sink write failed; item dropped");
                return Outcome::SinkFailed;
            }
        };

        match self.cursor_store.commit(item.timestamp, continuation).await {
            Ok(cursor) => debug!(
                id = ?item.id,
                topic = %item.topic,
                sentiment = %item.sentiment,
                cursor = %cursor.timestamp,
                "item sunk"
            ),
            Err(e) => warn!(id = ?item.id, error = %e, "cursor commit failed"),
        }

        if written == WriteOutcome::Duplicate {
            debug!(id = ?item.id, "item already stored");
            return Outcome::Duplicate;
        }
        if self.echo {
            println!("{}", echo_line(&item));
        }
        Outcome::Sunk
    }
}

fn echo_line(item: &NormalizedItem) -> String {
    format!(
        "[{}|{}] @{}: {}",
        item.topic, item.sentiment, item.author, item.text
    )
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
