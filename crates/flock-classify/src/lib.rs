//! Field extraction, summarization, topic classification, and normalization
//! of raw feed records.

pub mod error;
pub mod extract;
pub mod normalize;
pub mod summary;
pub mod topic;

pub use error::NormalizeError;
pub use extract::{
    extract_author, extract_count, extract_created_at, extract_hashtags, extract_id,
    extract_language, extract_location, extract_text,
};
pub use normalize::{normalize_record, parse_timestamp, CREATED_AT_FORMAT};
pub use summary::{summarize, FieldNode, MAX_DEPTH};
pub use topic::{classify, classify_text};
