use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub topics_path: PathBuf,
    /// Only records tagged with this language are processed.
    pub language: String,
    pub stream_url: String,
    pub search_url: String,
    pub bearer_token: Option<String>,
    pub sentiment_url: String,
    pub remote_sentiment: bool,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub reconnect_backoff_secs: u64,
    pub replay_max_pages: usize,
    pub replay_page_size: u32,
    pub replay_target_count: Option<usize>,
    pub replay_max_retries: u32,
    pub replay_retry_backoff_ms: u64,
    pub output_path: PathBuf,
    pub unclassified_path: PathBuf,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl AppConfig {
    /// Path of the file-backed cursor that sits next to the JSONL output.
    #[must_use]
    pub fn cursor_path(&self) -> PathBuf {
        let mut name = self
            .output_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".cursor.json");
        self.output_path.with_file_name(name)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("topics_path", &self.topics_path)
            .field("language", &self.language)
            .field("stream_url", &self.stream_url)
            .field("search_url", &self.search_url)
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .field("sentiment_url", &self.sentiment_url)
            .field("remote_sentiment", &self.remote_sentiment)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("reconnect_backoff_secs", &self.reconnect_backoff_secs)
            .field("replay_max_pages", &self.replay_max_pages)
            .field("replay_page_size", &self.replay_page_size)
            .field("replay_target_count", &self.replay_target_count)
            .field("replay_max_retries", &self.replay_max_retries)
            .field("replay_retry_backoff_ms", &self.replay_retry_backoff_ms)
            .field("output_path", &self.output_path)
            .field("unclassified_path", &self.unclassified_path)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
