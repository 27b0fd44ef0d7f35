//! Word tokenizer shared by the local scorers.

use std::sync::LazyLock;

use regex::Regex;

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z][A-Za-z']*").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    /// Lowercased word with trailing apostrophes removed.
    pub word: String,
    /// Written in capitals (two letters or more).
    pub shouted: bool,
}

pub(crate) fn tokenize(text: &str) -> Vec<Token> {
    WORD.find_iter(text)
        .map(|m| {
            let raw = m.as_str().trim_end_matches('\'');
            Token {
                word: raw.to_ascii_lowercase(),
                shouted: raw.len() > 1 && raw.chars().all(|c| !c.is_ascii_lowercase()),
            }
        })
        .collect()
}

pub(crate) fn is_negation(word: &str) -> bool {
    matches!(
        word,
        "not" | "no" | "never" | "nor" | "none" | "nothing" | "nobody" | "neither" | "cannot"
    ) || word.ends_with("n't")
}
