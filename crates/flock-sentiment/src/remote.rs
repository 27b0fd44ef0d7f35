//! Remote sentiment classification service.
//!
//! Wire contract: `POST` a form body `text=...`; a `200` response carries
//! JSON `{"label": "neg" | "neutral" | "pos", ...}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use flock_core::Sentiment;

use crate::error::SentimentError;

/// A classifier that labels text out of process.
#[async_trait]
pub trait RemoteClassifier: Send + Sync {
    /// Label `text`.
    ///
    /// # Errors
    ///
    /// Any transport failure, non-success status, or unreadable body.
    async fn classify(&self, text: &str) -> Result<Sentiment, SentimentError>;
}

#[derive(Debug, Deserialize)]
struct LabelResponse {
    label: String,
}

fn parse_label(label: &str) -> Result<Sentiment, SentimentError> {
    match label {
        "neg" => Ok(Sentiment::Negative),
        "neutral" => Ok(Sentiment::Neutral),
        "pos" => Ok(Sentiment::Positive),
        other => Err(SentimentError::UnknownLabel(other.to_string())),
    }
}

/// HTTP client for the form-post sentiment endpoint.
pub struct HttpRemoteClassifier {
    client: Client,
    url: String,
}

impl HttpRemoteClassifier {
    /// # Errors
    ///
    /// Returns [`SentimentError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, SentimentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl RemoteClassifier for HttpRemoteClassifier {
    async fn classify(&self, text: &str) -> Result<Sentiment, SentimentError> {
        let response = self
            .client
            .post(&self.url)
            .form(&[("text", text)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SentimentError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        let body = response.bytes().await?;
        let parsed: LabelResponse =
            serde_json::from_slice(&body).map_err(|source| SentimentError::Deserialize {
                context: format!("sentiment response from {}", self.url),
                source,
            })?;
        parse_label(&parsed.label)
    }
}
