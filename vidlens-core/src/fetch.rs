use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, warn};
use url::Url;

use crate::config::FetchSection;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid video url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("failed to fetch video: {status} {reason}")]
    Status { status: u16, reason: String },
    #[error("video exceeds {limit} bytes")]
    TooLarge { limit: usize },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait VideoFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError>;
}

pub struct HttpVideoFetcher {
    client: reqwest::Client,
    timeout: Duration,
    max_bytes: usize,
}

impl HttpVideoFetcher {
    pub fn new(config: &FetchSection) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: &FetchSection) -> Self {
        Self {
            client,
            timeout: config.timeout(),
            max_bytes: config.max_bytes,
        }
    }

    async fn download(&self, url: Url) -> Result<Bytes, FetchError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }

        // The payload is always tagged as mp4 downstream; only report mismatches.
        if let Some(content_type) = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
        {
            if !content_type.starts_with("video/") {
                warn!(target: "fetch", %url, content_type, "resource is not tagged as video");
            }
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes as u64 {
                return Err(FetchError::TooLarge {
                    limit: self.max_bytes,
                });
            }
        }

        let mut buffer = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if buffer.len() + chunk.len() > self.max_bytes {
                return Err(FetchError::TooLarge {
                    limit: self.max_bytes,
                });
            }
            buffer.extend_from_slice(&chunk);
        }
        debug!(target: "fetch", %url, bytes = buffer.len(), "video downloaded");
        Ok(buffer.freeze())
    }
}

#[async_trait]
impl VideoFetcher for HttpVideoFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        let parsed = parse_video_url(url)?;
        match timeout(self.timeout, self.download(parsed)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.timeout)),
        }
    }
}

fn parse_video_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url.trim()).map_err(|err| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: err.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(FetchError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme {other}"),
        }),
    }
}
