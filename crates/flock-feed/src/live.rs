//! Live streaming reader.
//!
//! The reader holds one long-lived connection to a [`StreamSource`]. Any
//! failure (refused connection, bad status, dropped stream, unreadable line)
//! is logged and followed by a fixed back-off and a fresh connection. The
//! loop only ends when shutdown fires.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use flock_core::RawRecord;

use crate::error::FeedError;
use crate::reader::{FeedMode, FeedReader, ReaderState, ReaderStats};
use crate::shutdown::Shutdown;

/// Keep-alive newlines arrive every ~30 s; three missed ones means the
/// connection is dead even if the socket is still open.
pub const DEFAULT_STALL_TIMEOUT: Duration = Duration::from_secs(90);

/// Longest unterminated line the stream buffer holds before the connection
/// is dropped.
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

/// A connection-oriented record stream.
#[async_trait]
pub trait StreamSource: Send {
    /// Open (or reopen) the stream, discarding any previous connection.
    ///
    /// # Errors
    ///
    /// Any failure to establish the stream.
    async fn connect(&mut self) -> Result<(), FeedError>;

    /// Next record from the open stream. `Ok(None)` means the server closed it.
    ///
    /// # Errors
    ///
    /// Any transport or decoding failure on the open stream.
    async fn read(&mut self) -> Result<Option<RawRecord>, FeedError>;
}

/// Filter-stream endpoint: `POST` with `track=<comma-joined phrases>`,
/// bearer auth, newline-delimited JSON back.
pub struct HttpStreamSource {
    client: Client,
    url: String,
    bearer_token: String,
    track: String,
    stall_timeout: Duration,
    max_line_bytes: usize,
    response: Option<reqwest::Response>,
    buffer: Vec<u8>,
}

impl HttpStreamSource {
    /// The client sets a connect timeout only; an overall request timeout
    /// would cut a healthy stream. Stalls are caught by the stall timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        url: &str,
        bearer_token: &str,
        tracks: &[String],
        connect_timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, FeedError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
            bearer_token: bearer_token.to_string(),
            track: tracks.join(","),
            stall_timeout: DEFAULT_STALL_TIMEOUT,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            response: None,
            buffer: Vec::new(),
        })
    }

    #[must_use]
    pub fn with_stall_timeout(mut self, stall_timeout: Duration) -> Self {
        self.stall_timeout = stall_timeout;
        self
    }

    #[must_use]
    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    /// Pop the next non-blank line already buffered.
    fn take_line(&mut self) -> Option<Vec<u8>> {
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if !line.trim_ascii().is_empty() {
                return Some(line);
            }
        }
        None
    }
}

#[async_trait]
impl StreamSource for HttpStreamSource {
    async fn connect(&mut self) -> Result<(), FeedError> {
        self.response = None;
        self.buffer.clear();

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.bearer_token)
            .form(&[("track", self.track.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        self.response = Some(response);
        Ok(())
    }

    async fn read(&mut self) -> Result<Option<RawRecord>, FeedError> {
        loop {
            if let Some(line) = self.take_line() {
                let record = serde_json::from_slice(line.trim_ascii()).map_err(|source| {
                    FeedError::Deserialize {
                        context: format!("stream line from {}", self.url),
                        source,
                    }
                })?;
                return Ok(Some(RawRecord::new(record)));
            }

            // Whatever is left holds no newline.
            if self.buffer.len() > self.max_line_bytes {
                self.buffer.clear();
                self.response = None;
                return Err(FeedError::LineTooLong {
                    url: self.url.clone(),
                    limit: self.max_line_bytes,
                });
            }

            let response = self.response.as_mut().ok_or(FeedError::NotConnected)?;
            let chunk = tokio::time::timeout(self.stall_timeout, response.chunk())
                .await
                .map_err(|_| FeedError::Stalled {
                    url: self.url.clone(),
                    secs: self.stall_timeout.as_secs(),
                })??;

            match chunk {
                Some(bytes) => self.buffer.extend_from_slice(&bytes),
                None => {
                    self.response = None;
                    return Ok(None);
                }
            }
        }
    }
}

/// Live-mode [`FeedReader`] over any [`StreamSource`].
pub struct LiveReader<S> {
    source: S,
    backoff: Duration,
    state: ReaderState,
    stats: ReaderStats,
}

impl<S: StreamSource> LiveReader<S> {
    #[must_use]
    pub fn new(source: S, backoff: Duration) -> Self {
        Self {
            source,
            backoff,
            state: ReaderState::Idle,
            stats: ReaderStats::default(),
        }
    }

    fn stop(&mut self) -> Option<RawRecord> {
        if self.state != ReaderState::Stopped {
            info!(
                records = self.stats.records,
                reconnects = self.stats.reconnects,
                "live reader stopped"
            );
        }
        self.state = ReaderState::Stopped;
        None
    }

    fn fault(&mut self, err: &FeedError) {
        warn!(
            error = %err,
            backoff_secs = self.backoff.as_secs_f64(),
            "stream transport failure; reconnecting after back-off"
        );
        self.state = ReaderState::Reconnecting;
    }
}

#[async_trait]
impl<S: StreamSource> FeedReader for LiveReader<S> {
    fn mode(&self) -> FeedMode {
        FeedMode::Live
    }

    fn state(&self) -> ReaderState {
        self.state
    }

    async fn next_record(&mut self, shutdown: &mut Shutdown) -> Option<RawRecord> {
        loop {
            if shutdown.is_triggered() || self.state == ReaderState::Stopped {
                return self.stop();
            }

            match self.state {
                ReaderState::Streaming => {
                    let outcome = tokio::select! {
                        result = self.source.read() => Some(result),
                        () = shutdown.triggered() => None,
                    };
                    match outcome {
                        None => return self.stop(),
                        Some(Ok(Some(record))) => {
                            self.stats.records += 1;
                            return Some(record);
                        }
                        Some(Ok(None)) => self.fault(&FeedError::StreamClosed),
                        Some(Err(e)) => self.fault(&e),
                    }
                }
                ReaderState::Reconnecting => {
                    if !shutdown.sleep(self.backoff).await {
                        return self.stop();
                    }
                    self.stats.reconnects += 1;
                    self.state = ReaderState::Connecting;
                }
                _ => {
                    self.state = ReaderState::Connecting;
                    debug!("connecting to stream");
                    let outcome = tokio::select! {
                        result = self.source.connect() => Some(result),
                        () = shutdown.triggered() => None,
                    };
                    match outcome {
                        None => return self.stop(),
                        Some(Ok(())) => {
                            info!(reconnects = self.stats.reconnects, "stream connected");
                            self.state = ReaderState::Streaming;
                        }
                        Some(Err(e)) => self.fault(&e),
                    }
                }
            }
        }
    }

    fn continuation(&self) -> Option<String> {
        None
    }

    fn stats(&self) -> ReaderStats {
        self.stats
    }
}
