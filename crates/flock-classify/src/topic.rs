//! Topic classification over a record summary.
//!
//! A keyword phrase matches a text leaf when every one of its words occurs
//! somewhere in the leaf as a substring, case-insensitively. Among all
//! matches the phrase with the most words wins; ties go to the topic that
//! appears first in the configuration.

use tracing::warn;

use flock_core::{TopicConfig, TopicLabel};

use crate::summary::{FieldNode, MAX_DEPTH};

#[derive(Debug, Clone, Copy)]
struct Match {
    words: usize,
    topic_index: usize,
}

impl Match {
    fn beats(self, other: Option<Match>) -> bool {
        match other {
            None => true,
            Some(other) => {
                self.words > other.words
                    || (self.words == other.words && self.topic_index < other.topic_index)
            }
        }
    }
}

#[derive(Debug)]
enum Halt {
    TooDeep,
    Truncated,
}

/// Pick the single best topic for a summary tree.
///
/// Trees nested beyond [`MAX_DEPTH`] or containing a truncated subtree are
/// reported as unclassified.
#[must_use]
pub fn classify(tree: &FieldNode, topics: &TopicConfig) -> TopicLabel {
    let mut best: Option<Match> = None;
    if let Err(halt) = visit(tree, topics, 0, &mut best) {
        warn!(reason = ?halt, max_depth = MAX_DEPTH, "record too deeply nested; leaving unclassified");
        return TopicLabel::Unclassified;
    }

    best.and_then(|m| topics.topics().get(m.topic_index))
        .map_or(TopicLabel::Unclassified, |topic| {
            TopicLabel::Topic(topic.label.clone())
        })
}

/// Classify a single text leaf.
#[must_use]
pub fn classify_text(text: &str, topics: &TopicConfig) -> TopicLabel {
    classify(&FieldNode::Text(text.to_string()), topics)
}

fn visit(
    node: &FieldNode,
    topics: &TopicConfig,
    depth: usize,
    best: &mut Option<Match>,
) -> Result<(), Halt> {
    match node {
        FieldNode::Text(text) => {
            match_leaf(text, topics, best);
            Ok(())
        }
        FieldNode::Truncated => Err(Halt::Truncated),
        _ if depth > MAX_DEPTH => Err(Halt::TooDeep),
        FieldNode::List(items) => items
            .iter()
            .try_for_each(|item| visit(item, topics, depth + 1, best)),
        FieldNode::Map(entries) => entries
            .iter()
            .try_for_each(|(_, value)| visit(value, topics, depth + 1, best)),
    }
}

fn match_leaf(text: &str, topics: &TopicConfig, best: &mut Option<Match>) {
    let leaf = text.to_lowercase();
    for (topic_index, topic) in topics.iter().enumerate() {
        for phrase in &topic.keywords {
            if phrase_matches(phrase, &leaf) {
                let candidate = Match {
                    words: phrase.split_whitespace().count(),
                    topic_index,
                };
                if candidate.beats(*best) {
                    *best = Some(candidate);
                }
            }
        }
    }
}

fn phrase_matches(phrase: &str, leaf: &str) -> bool {
    let mut words = phrase.split_whitespace().peekable();
    words.peek().is_some() && words.all(|word| leaf.contains(word))
}

#[cfg(test)]
#[path = "topic_test.rs"]
mod tests;
