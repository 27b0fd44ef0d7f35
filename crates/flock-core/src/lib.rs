//! Shared data model and configuration for the flock ingest pipeline.

pub mod app_config;
pub mod config;
pub mod cursor;
pub mod item;
pub mod record;
pub mod sanitize;
pub mod stats;
pub mod topics;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use cursor::Cursor;
pub use item::{NormalizedItem, Sentiment, TopicLabel, UNCLASSIFIED};
pub use record::RawRecord;
pub use sanitize::{clean_text, sanitize_field};
pub use stats::RunStats;
pub use topics::{load_topics, save_topics, Topic, TopicConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("topics file I/O error for {path}: {source}")]
    TopicsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse topics file: {0}")]
    TopicsFileParse(#[source] serde_yaml::Error),

    #[error("failed to serialize topics: {0}")]
    TopicsFileSerialize(#[source] serde_yaml::Error),

    #[error("topics validation error: {0}")]
    Validation(String),
}
