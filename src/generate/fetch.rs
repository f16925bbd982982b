// src/generate/fetch.rs

//! Fetching source playlists over HTTP.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::errors::GenerateError;
use crate::exec::BoxFuture;

/// Source of playlist text, keyed by URL.
pub trait PlaylistFetcher: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, GenerateError>>;
}

/// `reqwest`-backed fetcher with a per-request timeout and fixed user agent.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, GenerateError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| GenerateError::Fetch {
                url: String::new(),
                reason: format!("failed to create HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }
}

impl PlaylistFetcher for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, GenerateError>> {
        Box::pin(async move {
            let fail = |reason: String| GenerateError::Fetch {
                url: url.to_string(),
                reason,
            };

            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| fail(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(fail(format!("HTTP status {status}")));
            }

            let body = response.text().await.map_err(|e| fail(e.to_string()))?;
            debug!(url, bytes = body.len(), "fetched playlist");
            Ok(body)
        })
    }
}
