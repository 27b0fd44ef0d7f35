//! Searchable summary of a raw record.
//!
//! A record carries far more structure than is worth matching against. The
//! summary keeps the body text, the author handle, urls, ids, and hashtags,
//! and follows only the nested objects that can contain more of them.

use serde_json::{Map, Value};

use flock_core::RawRecord;

/// Nesting bound shared by summarization and classification. Depth counts
/// container levels (objects and lists) below the root; leaves do not count.
pub const MAX_DEPTH: usize = 32;

/// Nested objects the summary descends into.
const NESTED_FIELDS: &[&str] = &[
    "retweeted_status",
    "quoted_status",
    "user",
    "extended_tweet",
    "entities",
];

/// Leaf fields kept verbatim.
const VERBATIM_FIELDS: &[&str] = &["expanded_url", "display_url", "id_str"];

/// Typed summary tree. Map entries keep source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldNode {
    Text(String),
    List(Vec<FieldNode>),
    Map(Vec<(String, FieldNode)>),
    /// Stands in for structure nested deeper than [`MAX_DEPTH`].
    Truncated,
}

impl FieldNode {
    /// Render as JSON for diagnostics.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            FieldNode::Text(text) => Value::String(text.clone()),
            FieldNode::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            FieldNode::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, node)| (key.clone(), node.to_json()))
                    .collect(),
            ),
            FieldNode::Truncated => Value::String("<truncated>".to_string()),
        }
    }
}

/// Build the searchable summary tree of `record`.
///
/// A non-mapping root summarizes to an empty map.
#[must_use]
pub fn summarize(record: &RawRecord) -> FieldNode {
    match record.value().as_object() {
        Some(object) => summarize_object(object, 0),
        None => FieldNode::Map(Vec::new()),
    }
}

fn summarize_object(object: &Map<String, Value>, depth: usize) -> FieldNode {
    if depth > MAX_DEPTH {
        return FieldNode::Truncated;
    }

    let mut entries = Vec::new();
    for (field, value) in object {
        let field = field.as_str();
        match field {
            "text" | "full_text" => {
                if let Some(text) = value.as_str() {
                    entries.push((field.to_string(), FieldNode::Text(fold_text(text))));
                }
            }
            "screen_name" => {
                if let Some(name) = value.as_str() {
                    entries.push(("twitter_user".to_string(), FieldNode::Text(name.to_string())));
                }
            }
            _ if VERBATIM_FIELDS.contains(&field) => {
                if let Some(text) = value.as_str() {
                    entries.push((field.to_string(), FieldNode::Text(text.to_string())));
                }
            }
            _ if NESTED_FIELDS.contains(&field) => {
                if let Some(nested) = value.as_object().filter(|o| !o.is_empty()) {
                    entries.push((field.to_string(), summarize_object(nested, depth + 1)));
                }
            }
            "hashtags" => {
                if let Some(tags) = value.as_array().filter(|a| !a.is_empty()) {
                    let node = bounded_list(depth + 1, || {
                        tags.iter()
                            .filter_map(|tag| tag.get("text").and_then(Value::as_str))
                            .map(|text| FieldNode::Text(text.to_lowercase()))
                            .collect()
                    });
                    entries.push((field.to_string(), node));
                }
            }
            "urls" => {
                // The list is one level, each link object the next.
                if let Some(urls) = value.as_array().filter(|a| !a.is_empty()) {
                    let node = bounded_list(depth + 1, || {
                        urls.iter()
                            .filter_map(Value::as_object)
                            .map(|link| summarize_object(link, depth + 2))
                            .collect()
                    });
                    entries.push((field.to_string(), node));
                }
            }
            _ => {}
        }
    }
    FieldNode::Map(entries)
}

fn bounded_list(depth: usize, items: impl FnOnce() -> Vec<FieldNode>) -> FieldNode {
    if depth > MAX_DEPTH {
        FieldNode::Truncated
    } else {
        FieldNode::List(items())
    }
}

/// ASCII-only, lowercase, single line. Sigil tokens are kept so hashtags in
/// the body stay searchable.
fn fold_text(text: &str) -> String {
    text.chars()
        .filter(char::is_ascii)
        .map(|c| if c == '\n' { ' ' } else { c.to_ascii_lowercase() })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn entry<'a>(node: &'a FieldNode, key: &str) -> Option<&'a FieldNode> {
        match node {
            FieldNode::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    #[test]
    fn keeps_searchable_fields_only() {
        let record = RawRecord::new(json!({
            "text": "Bitcoin\nMining 🚀",
            "id_str": "42",
            "lang": "en",
            "favorite_count": 3,
            "user": {"screen_name": "Casey", "followers_count": 10}
        }));
        let tree = summarize(&record);

        assert_eq!(
            entry(&tree, "text"),
            Some(&FieldNode::Text("bitcoin mining ".to_string()))
        );
        assert_eq!(entry(&tree, "id_str"), Some(&FieldNode::Text("42".to_string())));
        assert!(entry(&tree, "lang").is_none());
        assert!(entry(&tree, "favorite_count").is_none());

        let user = entry(&tree, "user").unwrap();
        assert_eq!(
            entry(user, "twitter_user"),
            Some(&FieldNode::Text("Casey".to_string()))
        );
        assert!(entry(user, "followers_count").is_none());
    }

    #[test]
    fn includes_every_hashtag_and_url() {
        let record = RawRecord::new(json!({
            "entities": {
                "hashtags": [{"text": "BTC"}, {"text": "Crypto"}],
                "urls": [
                    {"expanded_url": "https://a.example/x", "display_url": "a.example/x"},
                    {"expanded_url": "https://b.example/y"}
                ]
            }
        }));
        let tree = summarize(&record);
        let entities = entry(&tree, "entities").unwrap();

        assert_eq!(
            entry(entities, "hashtags"),
            Some(&FieldNode::List(vec![
                FieldNode::Text("btc".to_string()),
                FieldNode::Text("crypto".to_string()),
            ]))
        );
        match entry(entities, "urls") {
            Some(FieldNode::List(links)) => assert_eq!(links.len(), 2),
            other => panic!("expected url list, got {other:?}"),
        }
    }

    #[test]
    fn skips_empty_and_null_nested_objects() {
        let record = RawRecord::new(json!({"retweeted_status": null, "quoted_status": {}}));
        assert_eq!(summarize(&record), FieldNode::Map(Vec::new()));
    }

    #[test]
    fn deep_nesting_is_truncated() {
        let mut value = json!({"text": "needle"});
        for _ in 0..(MAX_DEPTH + 5) {
            value = json!({"retweeted_status": value});
        }
        let tree = summarize(&RawRecord::new(value));

        let mut node = &tree;
        let mut hops = 0;
        while let Some(next) = entry(node, "retweeted_status") {
            node = next;
            hops += 1;
        }
        assert_eq!(node, &FieldNode::Truncated);
        assert_eq!(hops, MAX_DEPTH + 1);
    }

    #[test]
    fn lists_count_toward_depth() {
        let mut value = json!({"text": "needle", "entities": {"hashtags": [{"text": "Deep"}]}});
        for _ in 0..(MAX_DEPTH - 1) {
            value = json!({"user": value});
        }
        let tree = summarize(&RawRecord::new(value));

        let mut node = &tree;
        while let Some(next) = entry(node, "user") {
            node = next;
        }
        let entities = entry(node, "entities").expect("entities kept");
        assert_eq!(entry(entities, "hashtags"), Some(&FieldNode::Truncated));
    }

    #[test]
    fn non_object_root_is_empty() {
        assert_eq!(
            summarize(&RawRecord::new(json!([1, 2]))),
            FieldNode::Map(Vec::new())
        );
    }

    #[test]
    fn to_json_marks_truncation() {
        let tree = FieldNode::Map(vec![
            ("text".to_string(), FieldNode::Text("hi".to_string())),
            ("user".to_string(), FieldNode::Truncated),
        ]);
        assert_eq!(tree.to_json(), json!({"text": "hi", "user": "<truncated>"}));
    }
}
