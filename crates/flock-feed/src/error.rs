use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("stream closed by server")]
    StreamClosed,

    #[error("no data from {url} for {secs}s")]
    Stalled { url: String, secs: u64 },

    #[error("line from {url} exceeded {limit} bytes without a newline")]
    LineTooLong { url: String, limit: usize },

    #[error("not connected")]
    NotConnected,

    #[error("cancelled")]
    Cancelled,
}
