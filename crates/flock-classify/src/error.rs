use thiserror::Error;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("record {id} has no created_at timestamp")]
    MissingTimestamp { id: String },

    #[error("record {id} has unparsable created_at \"{value}\": {source}")]
    InvalidTimestamp {
        id: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}
