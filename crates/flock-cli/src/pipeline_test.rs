use std::collections::{HashSet, VecDeque};

use async_trait::async_trait;
use flock_classify::parse_timestamp;
use flock_core::{Topic, TopicLabel};
use flock_db::{MemoryCursorStore, MemorySink, MemoryUnclassifiedLog, StoreError};
use flock_feed::{FeedMode, ReaderState, ReaderStats};
use serde_json::{json, Value};

use super::*;

const T0: &str = "Wed Jun 19 17:02:11 +0000 2019";
const T1: &str = "Wed Jun 19 17:05:00 +0000 2019";
const T2: &str = "Wed Jun 19 18:00:00 +0000 2019";

/// Replays a fixed list of records, each tagged with a continuation token.
struct ListReader {
    records: VecDeque<(RawRecord, Option<String>)>,
    current: Option<String>,
    delivered: u64,
}

impl ListReader {
    fn new(records: Vec<RawRecord>) -> Self {
        Self::with_tokens(records.into_iter().map(|r| (r, None)).collect())
    }

    fn with_tokens(records: Vec<(RawRecord, Option<String>)>) -> Self {
        Self {
            records: records.into(),
            current: None,
            delivered: 0,
        }
    }
}

#[async_trait]
impl FeedReader for ListReader {
    fn mode(&self) -> FeedMode {
        FeedMode::Replay
    }

    fn state(&self) -> ReaderState {
        if self.records.is_empty() {
            ReaderState::Exhausted
        } else {
            ReaderState::PageReady
        }
    }

    async fn next_record(&mut self, shutdown: &mut Shutdown) -> Option<RawRecord> {
        if shutdown.is_triggered() {
            return None;
        }
        let (record, token) = self.records.pop_front()?;
        self.current = token;
        self.delivered += 1;
        Some(record)
    }

    fn continuation(&self) -> Option<String> {
        self.current.clone()
    }

    fn stats(&self) -> ReaderStats {
        ReaderStats {
            records: self.delivered,
            ..ReaderStats::default()
        }
    }
}

struct FailingSink;

#[async_trait]
impl Sink for FailingSink {
    fn name(&self) -> &str {
        "failing"
    }

    async fn write(&mut self, _item: &NormalizedItem) -> Result<WriteOutcome, StoreError> {
        Err(StoreError::Io {
            path: "nowhere".to_string(),
            source: std::io::Error::other("disk full"),
        })
    }
}

/// Stores each id once, like a table keyed on the item id.
#[derive(Default)]
struct KeyedSink {
    ids: HashSet<String>,
}

#[async_trait]
impl Sink for KeyedSink {
    fn name(&self) -> &str {
        "keyed"
    }

    async fn write(&mut self, item: &NormalizedItem) -> Result<WriteOutcome, StoreError> {
        match &item.id {
            Some(id) if !self.ids.insert(id.clone()) => Ok(WriteOutcome::Duplicate),
            _ => Ok(WriteOutcome::Stored),
        }
    }
}

fn topics() -> TopicConfig {
    TopicConfig::new(vec![
        Topic::new("bitcoin", ["btc"]),
        Topic::new("crypto", ["bitcoin mining", "ethereum"]),
        Topic::new("oracle", ["oci"]),
    ])
    .unwrap()
}

fn tweet(id: &str, text: &str, created_at: &str) -> RawRecord {
    RawRecord::new(json!({
        "id_str": id,
        "lang": "en",
        "created_at": created_at,
        "text": text,
        "favorite_count": 3,
        "user": {"screen_name": "casey", "followers_count": 120, "friends_count": 80},
        "entities": {"hashtags": [{"text": "Mining"}]},
    }))
}

struct Harness {
    sink: MemorySink,
    cursor: MemoryCursorStore,
    unclassified: MemoryUnclassifiedLog,
    pipeline: Pipeline,
}

fn harness(threshold: Option<Cursor>) -> Harness {
    let sink = MemorySink::new();
    let cursor = MemoryCursorStore::new(threshold.clone());
    let unclassified = MemoryUnclassifiedLog::new();
    let pipeline = Pipeline::new(
        Uuid::new_v4(),
        topics(),
        SentimentEnsemble::local_only(),
        Box::new(sink.clone()),
        Box::new(cursor.clone()),
        Box::new(unclassified.clone()),
        "en",
    )
    .with_threshold(threshold);
    Harness {
        sink,
        cursor,
        unclassified,
        pipeline,
    }
}

#[tokio::test]
async fn sinks_classified_items_and_commits_cursor() {
    let mut h = harness(None);
    let mut reader = ListReader::new(vec![
        tweet("1", "Bitcoin mining difficulty hits a record", T0),
        tweet("2", "OCI launches a new region", T1),
    ]);

    let stats = h.pipeline.run(&mut reader, &mut Shutdown::never()).await;

    assert_eq!(stats.seen, 2);
    assert_eq!(stats.sunk, 2);
    let items = h.sink.items();
    assert_eq!(items[0].topic, TopicLabel::Topic("crypto".to_string()));
    assert_eq!(items[0].author, "casey");
    assert_eq!(items[0].hashtags, vec!["mining".to_string()]);
    assert_eq!(items[0].followers, 120);
    assert_eq!(items[0].favorites, 3);
    assert_eq!(items[1].topic, TopicLabel::Topic("oracle".to_string()));

    assert_eq!(h.cursor.commits(), 2);
    assert_eq!(
        h.cursor.current().unwrap().timestamp,
        parse_timestamp(T1).unwrap()
    );
    assert!(h.unclassified.entries().is_empty());
}

#[tokio::test]
async fn unclassified_items_go_to_side_log_without_commit() {
    let mut h = harness(None);
    let mut reader = ListReader::new(vec![tweet("7", "lovely weather this morning", T0)]);

    let stats = h.pipeline.run(&mut reader, &mut Shutdown::never()).await;

    assert_eq!(stats.unclassified, 1);
    assert_eq!(stats.sunk, 0);
    assert!(h.sink.items().is_empty());
    assert_eq!(h.cursor.commits(), 0);

    let entries = h.unclassified.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].1["text"], Value::from("lovely weather this morning"));
}

#[tokio::test]
async fn unclassified_items_skip_the_continuity_check() {
    // An unclassified item older than the cursor is still logged, not
    // counted as stale.
    let threshold = Cursor::new(parse_timestamp(T2).unwrap(), None);
    let mut h = harness(Some(threshold));
    let mut reader = ListReader::new(vec![tweet("7", "lovely weather", T0)]);

    let stats = h.pipeline.run(&mut reader, &mut Shutdown::never()).await;

    assert_eq!(stats.unclassified, 1);
    assert_eq!(stats.stale, 0);
    assert_eq!(h.unclassified.entries().len(), 1);
}

#[tokio::test]
async fn other_languages_are_dropped_silently() {
    let mut h = harness(None);
    let mut spanish = tweet("3", "bitcoin mining en todas partes", T0).into_value();
    spanish["lang"] = json!("es");
    let mut reader = ListReader::new(vec![
        RawRecord::new(spanish),
        tweet("4", "ethereum upgrade ships", T1),
    ]);

    let stats = h.pipeline.run(&mut reader, &mut Shutdown::never()).await;

    assert_eq!(stats.seen, 2);
    assert_eq!(stats.dropped_language, 1);
    assert_eq!(stats.processed(), 1);
    assert_eq!(h.sink.items().len(), 1);
    assert!(h.unclassified.entries().is_empty());
}

#[tokio::test]
async fn malformed_timestamps_are_dropped() {
    let mut h = harness(None);
    let mut reader = ListReader::new(vec![
        tweet("5", "btc to the moon", "yesterday-ish"),
        tweet("6", "btc to the moon", T0),
    ]);

    let stats = h.pipeline.run(&mut reader, &mut Shutdown::never()).await;

    assert_eq!(stats.malformed, 1);
    assert_eq!(stats.sunk, 1);
    assert_eq!(h.sink.items()[0].id.as_deref(), Some("6"));
    assert_eq!(h.cursor.commits(), 1);
}

#[tokio::test]
async fn replay_rejects_items_at_or_before_cursor() {
    let threshold = Cursor::new(parse_timestamp(T1).unwrap(), None);
    let mut h = harness(Some(threshold));
    let mut reader = ListReader::new(vec![
        tweet("1", "btc rallies", T0),
        tweet("2", "btc rallies again", T1),
        tweet("3", "btc rallies once more", T2),
    ]);

    let stats = h.pipeline.run(&mut reader, &mut Shutdown::never()).await;

    assert_eq!(stats.stale, 2);
    assert_eq!(stats.sunk, 1);
    assert_eq!(h.sink.items()[0].id.as_deref(), Some("3"));
    assert_eq!(
        h.cursor.current().unwrap().timestamp,
        parse_timestamp(T2).unwrap()
    );
}

#[tokio::test]
async fn sink_failures_are_counted_and_never_committed() {
    let cursor = MemoryCursorStore::new(None);
    let mut pipeline = Pipeline::new(
        Uuid::new_v4(),
        topics(),
        SentimentEnsemble::local_only(),
        Box::new(FailingSink),
        Box::new(cursor.clone()),
        Box::new(MemoryUnclassifiedLog::new()),
        "en",
    );
    let mut reader = ListReader::new(vec![tweet("1", "btc", T0), tweet("2", "btc", T1)]);

    let stats = pipeline.run(&mut reader, &mut Shutdown::never()).await;

    assert_eq!(stats.sink_failures, 2);
    assert_eq!(stats.sunk, 0);
    assert_eq!(cursor.commits(), 0);
    assert!(cursor.current().is_none());
}

#[tokio::test]
async fn duplicates_are_counted_apart_and_still_committed() {
    let cursor = MemoryCursorStore::new(None);
    let mut pipeline = Pipeline::new(
        Uuid::new_v4(),
        topics(),
        SentimentEnsemble::local_only(),
        Box::<KeyedSink>::default(),
        Box::new(cursor.clone()),
        Box::new(MemoryUnclassifiedLog::new()),
        "en",
    );
    let mut reader = ListReader::new(vec![
        tweet("1", "btc", T0),
        tweet("1", "btc", T1),
        tweet("2", "btc", T2),
    ]);

    let stats = pipeline.run(&mut reader, &mut Shutdown::never()).await;

    assert_eq!(stats.sunk, 2);
    assert_eq!(stats.duplicates, 1);
    assert_eq!(cursor.commits(), 3);
    assert_eq!(
        cursor.current().unwrap().timestamp,
        parse_timestamp(T2).unwrap()
    );
}

#[tokio::test]
async fn commits_carry_the_readers_continuation() {
    let mut h = harness(None);
    let mut reader = ListReader::with_tokens(vec![
        (tweet("1", "btc", T0), None),
        (tweet("2", "btc", T1), Some("1139".to_string())),
    ]);

    h.pipeline.run(&mut reader, &mut Shutdown::never()).await;

    let cursor = h.cursor.current().unwrap();
    assert_eq!(cursor.continuation.as_deref(), Some("1139"));
}

#[tokio::test]
async fn cancelled_run_reports_totals_so_far() {
    let mut h = harness(None);
    let mut reader = ListReader::new(vec![tweet("1", "btc", T0)]);
    let (trigger, mut shutdown) = flock_feed::shutdown_channel();
    trigger.trigger();

    let stats = h.pipeline.run(&mut reader, &mut shutdown).await;

    assert_eq!(stats.seen, 0);
    assert!(h.sink.items().is_empty());
}

#[tokio::test]
async fn run_stats_carry_the_pipeline_run_id() {
    let run_id = Uuid::new_v4();
    let mut pipeline = Pipeline::new(
        run_id,
        topics(),
        SentimentEnsemble::local_only(),
        Box::new(MemorySink::new()),
        Box::new(MemoryCursorStore::new(None)),
        Box::new(MemoryUnclassifiedLog::new()),
        "en",
    );

    let stats = pipeline
        .run(&mut ListReader::new(Vec::new()), &mut Shutdown::never())
        .await;
    assert_eq!(stats.run_id, run_id);
}

#[test]
fn echo_line_shows_topic_sentiment_and_author() {
    let item = NormalizedItem {
        id: Some("1".to_string()),
        timestamp: parse_timestamp(T0).unwrap(),
        text: "btc is up".to_string(),
        hashtags: Vec::new(),
        author: "casey".to_string(),
        author_location: None,
        followers: 0,
        following: 0,
        favorites: 0,
        retweets: 0,
        sentiment: Sentiment::Positive,
        topic: TopicLabel::Topic("bitcoin".to_string()),
    };
    assert_eq!(echo_line(&item), "[bitcoin|positive] @casey: btc is up");
}
