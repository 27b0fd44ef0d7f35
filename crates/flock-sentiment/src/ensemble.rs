//! Combination of local and remote sentiment signals.

use tracing::{debug, warn};

use flock_core::Sentiment;

use crate::lexicon::polarity;
use crate::remote::RemoteClassifier;
use crate::valence::compound;

/// The two local signals for one text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalScores {
    /// Averaged lexicon polarity.
    pub tb: f32,
    /// Normalized compound valence.
    pub vs: f32,
}

impl LocalScores {
    #[must_use]
    pub fn of(text: &str) -> Self {
        Self {
            tb: polarity(text),
            vs: compound(text),
        }
    }
}

/// Fixed decision table over the local scores and an optional remote label.
///
/// Rows are evaluated top to bottom; the first match wins. Several rows are
/// subsumed by earlier ones and kept so the table reads as a whole.
#[must_use]
#[allow(clippy::if_same_then_else)]
pub fn decide(tb: f32, vs: f32, remote: Option<Sentiment>) -> Sentiment {
    match remote {
        None => {
            if tb <= 0.0 && vs <= -0.5 {
                Sentiment::Negative
            } else if tb <= 0.0 && vs <= -0.1 {
                Sentiment::Negative
            } else if tb == 0.0 && vs > -0.1 && vs < 0.1 {
                Sentiment::Neutral
            } else if tb >= 0.0 && vs >= 0.1 {
                Sentiment::Positive
            } else if tb > 0.0 && vs >= 0.1 {
                Sentiment::Positive
            } else {
                Sentiment::Neutral
            }
        }
        Some(r) => {
            if tb < 0.0 && vs <= -0.1 && r == Sentiment::Negative {
                Sentiment::Negative
            } else if tb <= 0.0 && vs < 0.0 && r == Sentiment::Neutral {
                Sentiment::Negative
            } else if tb >= 0.0 && vs > 0.0 && r == Sentiment::Neutral {
                Sentiment::Positive
            } else if tb > 0.0 && vs >= 0.1 && r == Sentiment::Positive {
                Sentiment::Positive
            } else {
                Sentiment::Neutral
            }
        }
    }
}

/// Scores text with the local scorers and, when configured, a remote
/// classifier.
pub struct SentimentEnsemble {
    remote: Option<Box<dyn RemoteClassifier>>,
}

impl SentimentEnsemble {
    /// Local scorers only.
    #[must_use]
    pub fn local_only() -> Self {
        Self { remote: None }
    }

    #[must_use]
    pub fn with_remote(remote: Box<dyn RemoteClassifier>) -> Self {
        Self {
            remote: Some(remote),
        }
    }

    #[must_use]
    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Sentiment of `text`. Never fails: remote errors degrade to the
    /// local-only branch of the decision table.
    pub async fn score(&self, text: &str) -> Sentiment {
        let remote = match &self.remote {
            Some(classifier) => match classifier.classify(text).await {
                Ok(label) => Some(label),
                Err(e) => {
                    warn!(error = %e, "remote sentiment unavailable; using local scores only");
                    None
                }
            },
            None => None,
        };

        let LocalScores { tb, vs } = LocalScores::of(text);
        let sentiment = decide(tb, vs, remote);
        debug!(tb, vs, remote = ?remote, %sentiment, "scored sentiment");
        sentiment
    }
}
