//! The normalized, classified row handed to sinks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Sentinel label for records that match no configured topic.
pub const UNCLASSIFIED: &str = "unclassified";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of topic classification. Never null: no match is `Unclassified`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TopicLabel {
    Topic(String),
    Unclassified,
}

impl TopicLabel {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            TopicLabel::Topic(label) => label,
            TopicLabel::Unclassified => UNCLASSIFIED,
        }
    }

    #[must_use]
    pub fn is_unclassified(&self) -> bool {
        matches!(self, TopicLabel::Unclassified)
    }
}

impl std::fmt::Display for TopicLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TopicLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TopicLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw == UNCLASSIFIED {
            Ok(TopicLabel::Unclassified)
        } else {
            Ok(TopicLabel::Topic(raw))
        }
    }
}

/// A flattened, sanitized record ready for a sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedItem {
    /// Streamed items without a usable id carry `None`.
    pub id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub text: String,
    pub hashtags: Vec<String>,
    pub author: String,
    pub author_location: Option<String>,
    pub followers: u64,
    pub following: u64,
    pub favorites: u64,
    pub retweets: u64,
    pub sentiment: Sentiment,
    pub topic: TopicLabel,
}
