//! Topic groups: labels and the keyword phrases that select them.
//!
//! The on-disk format is a YAML mapping from label to a list of phrases:
//!
//! ```yaml
//! bitcoin:
//!   - btc
//!   - satoshi nakamoto
//! oracle: [oci, "autonomous database"]
//! ```
//!
//! JSON objects are valid YAML, so a `{"label": ["kw", ...]}` file loads too.
//! Mapping order is preserved and is the classifier's tie-break order.

use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::item::UNCLASSIFIED;
use crate::ConfigError;

/// One topic group. The label's normalized form is always `keywords[0]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Topic {
    pub label: String,
    pub keywords: Vec<String>,
}

impl Topic {
    /// Build a topic, normalizing phrases and putting the label first.
    ///
    /// Blank and duplicate phrases are dropped.
    #[must_use]
    pub fn new<I, S>(label: &str, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let label = label.trim().to_string();
        let mut seen = HashSet::new();
        let phrases = std::iter::once(normalize_phrase(&label))
            .chain(keywords.into_iter().map(|k| normalize_phrase(k.as_ref())))
            .filter(|p| !p.is_empty() && seen.insert(p.clone()))
            .collect();
        Self {
            label,
            keywords: phrases,
        }
    }
}

/// Ordered, validated topic groups. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TopicConfig {
    topics: Vec<Topic>,
}

impl TopicConfig {
    /// Validate and wrap a list of topics.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for blank, reserved, or duplicate labels.
    pub fn new(topics: Vec<Topic>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for topic in &topics {
            if topic.label.is_empty() {
                return Err(ConfigError::Validation(
                    "topic label must be non-empty".to_string(),
                ));
            }
            let lower = topic.label.to_lowercase();
            if lower == UNCLASSIFIED {
                return Err(ConfigError::Validation(format!(
                    "'{}' is reserved and cannot be used as a topic label",
                    topic.label
                )));
            }
            if !seen.insert(lower) {
                return Err(ConfigError::Validation(format!(
                    "duplicate topic label: '{}'",
                    topic.label
                )));
            }
        }
        Ok(Self { topics })
    }

    /// Parse the YAML mapping format.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TopicsFileParse`] for malformed YAML and
    /// [`ConfigError::Validation`] for a shape or label problem.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let mapping: Mapping =
            serde_yaml::from_str(content).map_err(ConfigError::TopicsFileParse)?;

        let mut topics = Vec::with_capacity(mapping.len());
        for (key, value) in &mapping {
            let label = scalar_to_string(key).ok_or_else(|| {
                ConfigError::Validation(format!("topic label must be a scalar, got {key:?}"))
            })?;
            let keywords = match value {
                Value::Null => Vec::new(),
                Value::Sequence(items) => items
                    .iter()
                    .map(|item| {
                        scalar_to_string(item).ok_or_else(|| {
                            ConfigError::Validation(format!(
                                "keyword for topic '{label}' must be a scalar"
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?,
                other => vec![scalar_to_string(other).ok_or_else(|| {
                    ConfigError::Validation(format!(
                        "keywords for topic '{label}' must be a list"
                    ))
                })?],
            };
            topics.push(Topic::new(&label, keywords));
        }

        Self::new(topics)
    }

    /// Render back to the YAML mapping format, preserving order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TopicsFileSerialize`] if YAML emission fails.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        let mut mapping = Mapping::new();
        for topic in &self.topics {
            let keywords = topic
                .keywords
                .iter()
                .map(|k| Value::String(k.clone()))
                .collect();
            mapping.insert(Value::String(topic.label.clone()), Value::Sequence(keywords));
        }
        serde_yaml::to_string(&mapping).map_err(ConfigError::TopicsFileSerialize)
    }

    /// Return a new config with `keywords` added to `label`, creating the
    /// topic at the end if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if the resulting config is invalid.
    pub fn with_topic<I, S>(&self, label: &str, keywords: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let wanted = label.trim().to_lowercase();
        let mut topics = self.topics.clone();
        if let Some(existing) = topics.iter_mut().find(|t| t.label.to_lowercase() == wanted) {
            let merged: Vec<String> = existing
                .keywords
                .iter()
                .cloned()
                .chain(keywords.into_iter().map(|k| k.as_ref().to_string()))
                .collect();
            *existing = Topic::new(&existing.label, merged);
        } else {
            topics.push(Topic::new(label, keywords));
        }
        Self::new(topics)
    }

    #[must_use]
    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Topic> {
        self.topics.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Every phrase of every topic, in order, without duplicates.
    ///
    /// This is the filter list sent to a live stream.
    #[must_use]
    pub fn tracks(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.topics
            .iter()
            .flat_map(|t| t.keywords.iter())
            .filter(|k| seen.insert(k.as_str()))
            .cloned()
            .collect()
    }
}

impl<'a> IntoIterator for &'a TopicConfig {
    type Item = &'a Topic;
    type IntoIter = std::slice::Iter<'a, Topic>;

    fn into_iter(self) -> Self::IntoIter {
        self.topics.iter()
    }
}

/// Load and validate topic groups from a file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or parsed, fails
/// validation, or defines no topics.
pub fn load_topics(path: &Path) -> Result<TopicConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::TopicsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let config = TopicConfig::from_yaml(&content)?;
    if config.is_empty() {
        return Err(ConfigError::Validation(format!(
            "no topics defined in {}",
            path.display()
        )));
    }
    Ok(config)
}

/// Persist topic groups, creating parent directories as needed.
///
/// # Errors
///
/// Returns `ConfigError` if serialization or the write fails.
pub fn save_topics(path: &Path, config: &TopicConfig) -> Result<(), ConfigError> {
    let io_err = |e| ConfigError::TopicsFileIo {
        path: path.display().to_string(),
        source: e,
    };
    let rendered = config.to_yaml()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, rendered).map_err(io_err)
}

fn normalize_phrase(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
