//! HTTP fetcher for the upstream document.

use crate::error::{SyncError, SyncResult, TransportError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Fetches a document and returns its complete body.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}

/// Fetcher backed by a `reqwest` client.
///
/// Redirects are followed. Non-2xx responses are not errors: their body
/// is handed on like any other.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher with an optional request timeout.
    pub fn new(timeout: Option<Duration>) -> SyncResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| SyncError::FetchFailed(TransportError::Client(e.to_string())))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let shown = redact(url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::Request {
                url: shown.to_string(),
                message: e.without_url().to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("GET {} returned {}; passing the body on", shown, status);
        }

        let body = response.bytes().await.map_err(|e| TransportError::Body {
            url: shown.to_string(),
            message: e.without_url().to_string(),
        })?;

        debug!("GET {} -> {} ({} bytes)", shown, status, body.len());
        Ok(body.to_vec())
    }
}

/// Strips the query string, which may carry an API key.
fn redact(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

/// Scripted fetchers for testing.
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// A fetcher returning queued responses, then a fixed one.
    #[derive(Debug, Default)]
    pub struct StaticFetcher {
        queued: Mutex<VecDeque<Result<Vec<u8>, TransportError>>>,
        fallback: Mutex<Option<Result<Vec<u8>, TransportError>>>,
        urls: Mutex<Vec<String>>,
    }

    impl StaticFetcher {
        /// Creates a fetcher that always returns `body`.
        pub fn with_body(body: impl Into<Vec<u8>>) -> Self {
            let fetcher = Self::default();
            fetcher.respond_with(Ok(body.into()));
            fetcher
        }

        /// Creates a fetcher that always fails with `error`.
        pub fn failing(error: TransportError) -> Self {
            let fetcher = Self::default();
            fetcher.respond_with(Err(error));
            fetcher
        }

        /// Sets the response returned once the queue is empty.
        pub fn respond_with(&self, response: Result<Vec<u8>, TransportError>) {
            *self.fallback.lock().unwrap() = Some(response);
        }

        /// Queues a one-shot response.
        pub fn queue(&self, response: Result<Vec<u8>, TransportError>) {
            self.queued.lock().unwrap().push_back(response);
        }

        /// Number of fetches performed.
        pub fn calls(&self) -> usize {
            self.urls.lock().unwrap().len()
        }

        /// URLs fetched, in order.
        pub fn urls(&self) -> Vec<String> {
            self.urls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError> {
            self.urls.lock().unwrap().push(url.to_string());
            if let Some(response) = self.queued.lock().unwrap().pop_front() {
                return response;
            }
            self.fallback
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| {
                    Err(TransportError::Request {
                        url: url.to_string(),
                        message: "no response scripted".to_string(),
                    })
                })
        }
    }
}
