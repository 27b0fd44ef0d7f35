//! Sentiment scoring for feed items.
//!
//! Two local scorers (an averaged lexicon polarity and a normalized compound
//! valence) are combined with an optional remote classifier through a fixed
//! decision table. The remote call is best-effort: any failure falls back to
//! the local-only branch.

pub mod ensemble;
pub mod error;
pub mod lexicon;
pub mod remote;
pub mod valence;

mod tokenize;

pub use ensemble::{decide, LocalScores, SentimentEnsemble};
pub use error::SentimentError;
pub use lexicon::polarity;
pub use remote::{HttpRemoteClassifier, RemoteClassifier};
pub use valence::compound;
