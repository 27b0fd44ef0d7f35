//! Averaged lexicon polarity.
//!
//! Each polar word contributes its weight, scaled by a directly preceding
//! intensifier and flipped (at half strength) by a negation up to three words
//! back. The score is the mean of the contributions, clamped to `[-1.0, 1.0]`.
//! Text with no polar words scores exactly `0.0`.

use crate::tokenize::{is_negation, tokenize};

/// Word polarities. Keys are lowercase single words.
pub(crate) const LEXICON: &[(&str, f32)] = &[
    // Positive
    ("good", 0.7),
    ("great", 0.8),
    ("excellent", 1.0),
    ("amazing", 0.6),
    ("awesome", 1.0),
    ("best", 1.0),
    ("better", 0.5),
    ("love", 0.5),
    ("loved", 0.7),
    ("like", 0.2),
    ("happy", 0.8),
    ("nice", 0.6),
    ("win", 0.8),
    ("winning", 0.5),
    ("gain", 0.4),
    ("gains", 0.4),
    ("bullish", 0.5),
    ("strong", 0.4),
    ("success", 0.5),
    ("successful", 0.8),
    ("secure", 0.4),
    ("fast", 0.2),
    ("easy", 0.4),
    ("exciting", 0.3),
    ("innovative", 0.5),
    ("profit", 0.3),
    ("recommend", 0.4),
    ("interesting", 0.5),
    ("wonderful", 1.0),
    ("perfect", 1.0),
    // Negative
    ("bad", -0.7),
    ("worse", -0.4),
    ("worst", -1.0),
    ("terrible", -1.0),
    ("awful", -1.0),
    ("horrible", -1.0),
    ("hate", -0.8),
    ("sad", -0.5),
    ("poor", -0.4),
    ("wrong", -0.5),
    ("fail", -0.5),
    ("failed", -0.5),
    ("failure", -0.3),
    ("loss", -0.3),
    ("losses", -0.3),
    ("lose", -0.3),
    ("crash", -0.4),
    ("bearish", -0.5),
    ("scam", -0.6),
    ("fraud", -0.6),
    ("hack", -0.3),
    ("hacked", -0.5),
    ("risky", -0.4),
    ("slow", -0.3),
    ("weak", -0.4),
    ("broken", -0.4),
    ("angry", -0.5),
    ("stupid", -0.8),
    ("useless", -0.5),
    ("dangerous", -0.6),
];

/// Multipliers applied to the next word only.
const INTENSIFIERS: &[(&str, f32)] = &[
    ("very", 1.3),
    ("really", 1.3),
    ("so", 1.2),
    ("too", 1.2),
    ("extremely", 1.5),
    ("incredibly", 1.5),
    ("super", 1.4),
    ("slightly", 0.5),
    ("somewhat", 0.7),
    ("barely", 0.4),
];

const NEGATION_WINDOW: usize = 3;
const NEGATION_FACTOR: f32 = -0.5;

fn lookup(table: &[(&str, f32)], word: &str) -> Option<f32> {
    table.iter().find(|(w, _)| *w == word).map(|&(_, v)| v)
}

/// Mean polarity of the polar words in `text`, in `[-1.0, 1.0]`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn polarity(text: &str) -> f32 {
    let tokens = tokenize(text);
    let mut contributions = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        let Some(mut score) = lookup(LEXICON, &token.word) else {
            continue;
        };

        if let Some(prev) = i.checked_sub(1).map(|p| &tokens[p]) {
            if let Some(factor) = lookup(INTENSIFIERS, &prev.word) {
                score *= factor;
            }
        }

        let window = &tokens[i.saturating_sub(NEGATION_WINDOW)..i];
        if window.iter().any(|t| is_negation(&t.word)) {
            score *= NEGATION_FACTOR;
        }

        contributions.push(score.clamp(-1.0, 1.0));
    }

    if contributions.is_empty() {
        return 0.0;
    }
    let mean = contributions.iter().sum::<f32>() / contributions.len() as f32;
    mean.clamp(-1.0, 1.0)
}
