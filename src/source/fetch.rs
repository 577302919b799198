//! Fetch capability
//!
//! The engine never talks to the network directly: adapters go through a
//! [`Fetcher`], which the binary backs with `reqwest` and tests back with
//! scripted responses.

use super::SourceError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};

/// A single GET request
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            timeout,
        }
    }

    /// Add a header unless one with the same name (case-insensitive) is present
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        if !self.headers.iter().any(|(n, _)| n.eq_ignore_ascii_case(&name)) {
            self.headers.push((name, value.into()));
        }
        self
    }
}

/// Raw response; any status is returned, classification happens in [`fetch_body`]
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

/// Transport boundary: URL and headers in, status and body out
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, SourceError>;
}

/// `reqwest`-backed fetcher
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, SourceError> {
        let mut builder = self.client.get(&request.url).timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let classify = |e: reqwest::Error| {
            if e.is_timeout() {
                SourceError::Timeout {
                    url: request.url.clone(),
                    timeout_ms: request.timeout.as_millis() as u64,
                }
            } else {
                SourceError::Transport {
                    url: request.url.clone(),
                    reason: e.to_string(),
                }
            }
        };

        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify)?;

        Ok(FetchResponse { status, body })
    }
}

/// Fetch a body, treating non-2xx like a transport error.
///
/// The request timeout is enforced here as well, so a fetcher that ignores it
/// cannot block the chain. Retryable failures are retried `retries` times with
/// a fixed delay.
pub async fn fetch_body(
    fetcher: &dyn Fetcher,
    request: &FetchRequest,
    retries: u32,
    retry_delay: Duration,
) -> Result<String, SourceError> {
    let mut attempt = 0;
    loop {
        let started = Instant::now();
        let result = match tokio::time::timeout(request.timeout, fetcher.fetch(request)).await {
            Ok(Ok(response)) if (200..300).contains(&response.status) => Ok(response.body),
            Ok(Ok(response)) => Err(SourceError::Status {
                url: request.url.clone(),
                status: response.status,
            }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(SourceError::Timeout {
                url: request.url.clone(),
                timeout_ms: request.timeout.as_millis() as u64,
            }),
        };

        tracing::debug!(
            url = %request.url,
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "Fetch finished"
        );

        match result {
            Err(e) if e.is_retryable() && attempt < retries => {
                attempt += 1;
                tracing::debug!(url = %request.url, attempt, error = %e, "Retrying fetch");
                tokio::time::sleep(retry_delay).await;
            }
            other => return other,
        }
    }
}
