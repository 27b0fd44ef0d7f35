//! Compound valence score.
//!
//! Word valences on a `[-4, 4]` scale are summed after adjustment for
//! boosters, negation, capitalized emphasis and a contrastive `but`, then
//! normalized into `(-1, 1)` as `x / sqrt(x² + 15)`.

use crate::tokenize::{is_negation, tokenize, Token};

pub(crate) const VALENCE: &[(&str, f32)] = &[
    // Positive
    ("good", 1.9),
    ("great", 3.1),
    ("excellent", 2.7),
    ("amazing", 2.8),
    ("awesome", 3.1),
    ("best", 3.2),
    ("better", 1.9),
    ("love", 3.2),
    ("loved", 2.9),
    ("like", 1.5),
    ("happy", 2.7),
    ("nice", 1.8),
    ("win", 2.8),
    ("winning", 2.4),
    ("gain", 2.4),
    ("gains", 1.8),
    ("bullish", 1.5),
    ("strong", 2.3),
    ("success", 2.7),
    ("successful", 2.8),
    ("secure", 1.4),
    ("easy", 1.9),
    ("exciting", 2.2),
    ("profit", 1.9),
    ("recommend", 1.5),
    ("interesting", 1.7),
    ("wonderful", 2.7),
    ("perfect", 2.7),
    ("thanks", 1.9),
    ("lol", 1.9),
    // Negative
    ("bad", -2.5),
    ("worse", -2.1),
    ("worst", -3.1),
    ("terrible", -2.1),
    ("awful", -2.0),
    ("horrible", -2.5),
    ("hate", -2.7),
    ("sad", -2.1),
    ("poor", -2.1),
    ("wrong", -2.1),
    ("fail", -2.5),
    ("failed", -2.3),
    ("failure", -2.3),
    ("loss", -1.3),
    ("losses", -1.7),
    ("lose", -1.7),
    ("crash", -1.7),
    ("bearish", -1.5),
    ("scam", -2.1),
    ("fraud", -2.8),
    ("hacked", -1.7),
    ("risky", -0.8),
    ("weak", -1.9),
    ("broken", -2.1),
    ("angry", -2.3),
    ("stupid", -2.4),
    ("useless", -1.8),
    ("dangerous", -2.1),
    ("killed", -3.5),
    ("panic", -2.3),
];

const BOOST: f32 = 0.293;

const BOOSTERS: &[&str] = &[
    "very",
    "really",
    "extremely",
    "incredibly",
    "absolutely",
    "totally",
    "so",
    "super",
    "hugely",
    "most",
];

const DAMPENERS: &[&str] = &["slightly", "somewhat", "barely", "hardly", "marginally"];

const NEGATION_SCALAR: f32 = -0.74;
const CAPS_BOOST: f32 = 0.733;
const EXCLAMATION_BOOST: f32 = 0.292;
const MAX_EXCLAMATIONS: usize = 4;
const NORMALIZATION_ALPHA: f32 = 15.0;

/// Look-back distances for boosters and negations, with decay per step.
const LOOKBACK_DECAY: [f32; 3] = [1.0, 0.95, 0.9];

fn lookup(word: &str) -> Option<f32> {
    VALENCE.iter().find(|(w, _)| *w == word).map(|&(_, v)| v)
}

fn booster(word: &str, valence: f32) -> f32 {
    let magnitude = if BOOSTERS.contains(&word) {
        BOOST
    } else if DAMPENERS.contains(&word) {
        -BOOST
    } else {
        return 0.0;
    };
    if valence < 0.0 {
        -magnitude
    } else {
        magnitude
    }
}

fn word_valence(tokens: &[Token], i: usize, mixed_case: bool) -> Option<f32> {
    let token = &tokens[i];
    let mut valence = lookup(&token.word)?;

    if token.shouted && mixed_case {
        valence += CAPS_BOOST.copysign(valence);
    }

    for (distance, decay) in LOOKBACK_DECAY.iter().enumerate() {
        let Some(prev) = i.checked_sub(distance + 1).map(|p| &tokens[p]) else {
            break;
        };
        valence += booster(&prev.word, valence) * decay;
    }

    let window = &tokens[i.saturating_sub(LOOKBACK_DECAY.len())..i];
    if window.iter().any(|t| is_negation(&t.word)) {
        valence *= NEGATION_SCALAR;
    }

    Some(valence)
}

/// Normalized compound valence of `text`, in `(-1.0, 1.0)`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn compound(text: &str) -> f32 {
    let tokens = tokenize(text);
    let mixed_case = tokens.iter().any(|t| !t.shouted) && tokens.iter().any(|t| t.shouted);

    let mut valences: Vec<f32> = (0..tokens.len())
        .map(|i| word_valence(&tokens, i, mixed_case).unwrap_or(0.0))
        .collect();

    // A contrastive "but" shifts weight onto the clause that follows it.
    if let Some(pivot) = tokens.iter().position(|t| t.word == "but") {
        for (i, valence) in valences.iter_mut().enumerate() {
            if i < pivot {
                *valence *= 0.5;
            } else if i > pivot {
                *valence *= 1.5;
            }
        }
    }

    let mut sum: f32 = valences.iter().sum();
    if sum == 0.0 {
        return 0.0;
    }

    let exclamations = text.matches('!').count().min(MAX_EXCLAMATIONS);
    sum += (exclamations as f32 * EXCLAMATION_BOOST).copysign(sum);

    (sum / (sum * sum + NORMALIZATION_ALPHA).sqrt()).clamp(-1.0, 1.0)
}
