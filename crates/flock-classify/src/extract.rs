//! Field extraction from raw records.
//!
//! Every extractor is total: a record missing any or all of the expected
//! structure yields an empty or absent value, never an error.

use serde_json::Value;

use flock_core::RawRecord;

/// Text locations in priority order. Retweet bodies beat the wrapper, and
/// extended (untruncated) text beats the short form.
const TEXT_PATHS: &[&[&str]] = &[
    &["retweeted_status", "extended_tweet", "full_text"],
    &["retweeted_status", "full_text"],
    &["extended_tweet", "full_text"],
    &["full_text"],
    &["retweeted_status", "text"],
    &["text"],
];

/// Hashtag entity lists in priority order.
const HASHTAG_PATHS: &[&[&str]] = &[
    &["quoted_status", "extended_tweet", "entities", "hashtags"],
    &["retweeted_status", "extended_tweet", "entities", "hashtags"],
    &["retweeted_status", "entities", "hashtags"],
    &["extended_tweet", "entities", "hashtags"],
    &["quoted_status", "entities", "hashtags"],
    &["entities", "hashtags"],
];

/// Best available body text, or `""` when no text path resolves.
#[must_use]
pub fn extract_text(record: &RawRecord) -> String {
    TEXT_PATHS
        .iter()
        .find_map(|path| record.get_str(path))
        .unwrap_or_default()
        .to_string()
}

/// Hashtag texts from the first resolving entity list, in order of appearance.
///
/// Entries without a string `text` are skipped.
#[must_use]
pub fn extract_hashtags(record: &RawRecord) -> Vec<String> {
    HASHTAG_PATHS
        .iter()
        .find_map(|path| record.get_path(path).and_then(Value::as_array))
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.get("text").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Opaque record id: `id_str`, else a numeric `id` rendered as a string.
#[must_use]
pub fn extract_id(record: &RawRecord) -> Option<String> {
    if let Some(id) = record.get_str(&["id_str"]).filter(|s| !s.is_empty()) {
        return Some(id.to_string());
    }
    match record.get_path(&["id"])? {
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[must_use]
pub fn extract_created_at(record: &RawRecord) -> Option<&str> {
    record.get_str(&["created_at"])
}

#[must_use]
pub fn extract_author(record: &RawRecord) -> Option<&str> {
    record.get_str(&["user", "screen_name"])
}

#[must_use]
pub fn extract_location(record: &RawRecord) -> Option<&str> {
    record.get_str(&["user", "location"])
}

#[must_use]
pub fn extract_language(record: &RawRecord) -> Option<&str> {
    record.language()
}

/// A non-negative counter at `path`. Absent, negative, fractional, or
/// non-numeric values read as zero.
#[must_use]
pub fn extract_count(record: &RawRecord, path: &[&str]) -> u64 {
    record.get_path(path).and_then(Value::as_u64).unwrap_or(0)
}
