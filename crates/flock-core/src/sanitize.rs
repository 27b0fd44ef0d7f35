//! Text cleanup applied before classification and before sink handoff.
//!
//! Both functions are idempotent: running them on their own output is a no-op.

/// Token prefixes stripped from record text (mentions, hashtags, cashtags).
const SIGILS: [char; 4] = ['#', '@', '$', '|'];

/// Strip quotes and non-ASCII characters from a user-facing field.
#[must_use]
pub fn sanitize_field(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii() && *c != '"' && *c != '\'')
        .collect()
}

/// Normalize record text for language processing and matching.
///
/// Drops non-ASCII (emoji included), lowercases, collapses all whitespace
/// runs (newlines included) into single spaces, and removes tokens that start
/// with a mention, hashtag, or cashtag sigil.
#[must_use]
pub fn clean_text(input: &str) -> String {
    let ascii: String = input
        .chars()
        .filter(char::is_ascii)
        .collect::<String>()
        .to_ascii_lowercase();

    ascii
        .split_whitespace()
        .filter(|token| !is_sigil_token(token))
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_sigil_token(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) if SIGILS.contains(&first) => chars.next().is_some(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_quotes_and_non_ascii() {
        assert_eq!(sanitize_field("O'Brien \"Señor\" 🚀"), "OBrien Seor ");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for input in ["O'Brien", "plain", "ünïcödé \"quoted\"", "", "'''"] {
            let once = sanitize_field(input);
            assert_eq!(sanitize_field(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn clean_text_lowercases_and_collapses_newlines() {
        assert_eq!(clean_text("Hello\nWORLD\n\n  again"), "hello world again");
    }

    #[test]
    fn clean_text_removes_sigil_tokens() {
        assert_eq!(
            clean_text("@oracle loves #cloud and $ORCL | today"),
            "loves and | today"
        );
    }

    #[test]
    fn clean_text_strips_emoji() {
        assert_eq!(clean_text("bitcoin 🚀🚀 to the moon"), "bitcoin to the moon");
    }

    #[test]
    fn clean_text_is_idempotent() {
        let inputs = [
            "RT @someone: Bitcoin mining is BACK 🚀 #btc",
            "  spaced\tout\r\ntext ",
            "",
            "# lonely sigil",
        ];
        for input in inputs {
            let once = clean_text(input);
            assert_eq!(clean_text(&once), once, "not idempotent for {input:?}");
        }
    }
}
