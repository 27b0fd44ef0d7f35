//! Assembly of a [`NormalizedItem`] from a raw record and its verdicts.

use chrono::{DateTime, Utc};

use flock_core::{clean_text, sanitize_field, NormalizedItem, RawRecord, Sentiment, TopicLabel};

use crate::error::NormalizeError;
use crate::extract::{
    extract_author, extract_count, extract_created_at, extract_hashtags, extract_id,
    extract_location, extract_text,
};

/// Fixed `created_at` layout, e.g. `Wed Jun 19 17:02:11 +0000 2019`.
pub const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Parse a `created_at` string into UTC.
///
/// # Errors
///
/// Returns the underlying [`chrono::ParseError`] when `raw` does not follow
/// [`CREATED_AT_FORMAT`].
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_str(raw.trim(), CREATED_AT_FORMAT).map(|dt| dt.with_timezone(&Utc))
}

/// Flatten and sanitize `record` into a sink-ready item.
///
/// # Errors
///
/// Returns [`NormalizeError`] when the timestamp is missing or unparsable.
/// Every other field falls back to an empty or zero value.
pub fn normalize_record(
    record: &RawRecord,
    topic: TopicLabel,
    sentiment: Sentiment,
) -> Result<NormalizedItem, NormalizeError> {
    let id = extract_id(record);
    let display_id = || id.clone().unwrap_or_else(|| "<no id>".to_string());

    let created_at = extract_created_at(record).ok_or_else(|| NormalizeError::MissingTimestamp {
        id: display_id(),
    })?;
    let timestamp =
        parse_timestamp(created_at).map_err(|source| NormalizeError::InvalidTimestamp {
            id: display_id(),
            value: created_at.to_string(),
            source,
        })?;

    let hashtags = extract_hashtags(record)
        .iter()
        .map(|tag| sanitize_field(tag).to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect();

    let author_location = extract_location(record)
        .map(|loc| sanitize_field(loc).trim().to_string())
        .filter(|loc| !loc.is_empty());

    Ok(NormalizedItem {
        id,
        timestamp,
        text: clean_text(&extract_text(record)),
        hashtags,
        author: sanitize_field(extract_author(record).unwrap_or_default()),
        author_location,
        followers: extract_count(record, &["user", "followers_count"]),
        following: extract_count(record, &["user", "friends_count"]),
        favorites: extract_count(record, &["favorite_count"]),
        retweets: extract_count(record, &["retweet_count"]),
        sentiment,
        topic,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn sample() -> RawRecord {
        RawRecord::new(json!({
            "id": 1_141_412_000_000_000_000_u64,
            "id_str": "1141412000000000000",
            "created_at": "Wed Jun 19 17:02:11 +0000 2019",
            "lang": "en",
            "text": "RT @miner: Bitcoin\nMining is BACK 🚀 #BTC",
            "favorite_count": 4,
            "retweet_count": 9,
            "entities": {"hashtags": [{"text": "BTC"}, {"text": "Mining🚀"}]},
            "user": {
                "screen_name": "o'neil_\"btc\"",
                "location": "Zürich 🇨🇭",
                "followers_count": 120,
                "friends_count": 80
            }
        }))
    }

    #[test]
    fn parses_fixed_timestamp_format() {
        let ts = parse_timestamp("Wed Jun 19 17:02:11 +0000 2019").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2019, 6, 19, 17, 2, 11).unwrap());
    }

    #[test]
    fn offset_timestamps_convert_to_utc() {
        let ts = parse_timestamp("Wed Jun 19 19:02:11 +0200 2019").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2019, 6, 19, 17, 2, 11).unwrap());
    }

    #[test]
    fn normalizes_all_fields() {
        let item = normalize_record(
            &sample(),
            TopicLabel::Topic("crypto".to_string()),
            Sentiment::Positive,
        )
        .unwrap();

        assert_eq!(item.id.as_deref(), Some("1141412000000000000"));
        assert_eq!(item.text, "rt bitcoin mining is back");
        assert_eq!(item.hashtags, vec!["btc", "mining"]);
        assert_eq!(item.author, "oneil_btc");
        assert_eq!(item.author_location.as_deref(), Some("Zrich"));
        assert_eq!(item.followers, 120);
        assert_eq!(item.following, 80);
        assert_eq!(item.favorites, 4);
        assert_eq!(item.retweets, 9);
        assert_eq!(item.sentiment, Sentiment::Positive);
        assert_eq!(item.topic, TopicLabel::Topic("crypto".to_string()));
    }

    #[test]
    fn emoji_only_location_is_absent() {
        let record = RawRecord::new(json!({
            "created_at": "Wed Jun 19 17:02:11 +0000 2019",
            "user": {"location": "🌍🌎"}
        }));
        let item = normalize_record(&record, TopicLabel::Unclassified, Sentiment::Neutral).unwrap();
        assert!(item.author_location.is_none());
        assert_eq!(item.author, "");
        assert_eq!(item.text, "");
    }

    #[test]
    fn missing_timestamp_is_an_error() {
        let record = RawRecord::new(json!({"id_str": "7", "text": "hi"}));
        let err = normalize_record(&record, TopicLabel::Unclassified, Sentiment::Neutral)
            .unwrap_err();
        assert!(matches!(err, NormalizeError::MissingTimestamp { ref id } if id == "7"));
    }

    #[test]
    fn malformed_timestamp_is_an_error() {
        let record = RawRecord::new(json!({"created_at": "2019-06-19T17:02:11Z"}));
        let err = normalize_record(&record, TopicLabel::Unclassified, Sentiment::Neutral)
            .unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidTimestamp { .. }));
        assert!(err.to_string().contains("<no id>"));
    }
}
