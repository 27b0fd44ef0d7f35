//! Search continuation tokens.
//!
//! A search response describes its next page as a ready-made query string in
//! `search_metadata.next_results`, e.g.
//!
//! ```text
//! ?max_id=1141411111111111110&q=bitcoin&count=100&include_entities=1
//! ```
//!
//! The token carried between pages is the `max_id` value.

/// Extracts the `max_id` continuation token from a `next_results` query
/// string. Returns `None` when the input is absent, empty, or has no
/// non-empty `max_id` parameter.
#[must_use]
pub fn extract_next_token(next_results: Option<&str>) -> Option<String> {
    extract_query_param(next_results?, "max_id")
}

/// Extracts the value of a named query parameter from a query string, with
/// or without a leading `?` or URL prefix. Values are not percent-decoded:
/// `max_id` is always numeric.
fn extract_query_param(query: &str, param: &str) -> Option<String> {
    let query = query.split_once('?').map_or(query, |(_, q)| q);

    let needle = format!("{param}=");
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix(needle.as_str()))
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_max_id_from_next_results() {
        let next = "?max_id=1141411111111111110&q=bitcoin&count=100&include_entities=1";
        assert_eq!(
            extract_next_token(Some(next)).as_deref(),
            Some("1141411111111111110")
        );
    }

    #[test]
    fn accepts_full_urls_and_any_position() {
        let next = "https://api.example/search.json?q=btc&max_id=42";
        assert_eq!(extract_next_token(Some(next)).as_deref(), Some("42"));
    }

    #[test]
    fn none_when_absent_or_empty() {
        assert!(extract_next_token(None).is_none());
        assert!(extract_next_token(Some("")).is_none());
        assert!(extract_next_token(Some("?q=btc&count=100")).is_none());
        assert!(extract_next_token(Some("?max_id=&q=btc")).is_none());
    }

    #[test]
    fn does_not_match_parameter_suffixes() {
        assert!(extract_next_token(Some("?since_max_id=5")).is_none());
    }
}
