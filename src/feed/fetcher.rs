use futures::StreamExt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use url::Url;

use crate::config::Config;
use crate::feed::model::{NormalizedArticle, NormalizedFeed};
use crate::feed::normalize::normalize;
use crate::feed::parser::{parse_document, ParseError};
use crate::feed::progress::{self, Progress, Stage};
use crate::storage::StoreError;
use crate::util::{validate_url, UrlValidationError};

/// Transport-level failures. None of these are retried.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Response body exceeded the configured size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
}

/// Errors surfaced by the feed pipeline and the library flows built on it.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The URL failed to parse or was rejected by the host policy.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] UrlValidationError),
    #[error(transparent)]
    Network(#[from] NetworkError),
    /// The body was read but is not a usable feed. Nothing is stored.
    #[error("Failed to parse feed: {0}")]
    ParsingFailed(#[from] ParseError),
    /// A feed with the same URL is already subscribed.
    #[error("Feed already exists: {0}")]
    DuplicateFeed(Url),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A normalized feed with its articles, as produced by one fetch.
pub type FetchedFeed = (NormalizedFeed, Vec<NormalizedArticle>);

/// HTTP front end of the pipeline.
///
/// Constructed explicitly from a [`Config`] and passed to whoever needs it.
/// Cloning is cheap: clones share the connection pool and configuration.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    config: Arc<Config>,
}

impl FeedClient {
    /// Builds a client with the configured user agent.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Network`] if the TLS backend fails to initialize.
    pub fn new(config: &Config) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(NetworkError::Request)?;
        Ok(Self::with_http(http, config.clone()))
    }

    /// Wraps an existing HTTP client (caller controls its configuration).
    pub fn with_http(http: reqwest::Client, config: Config) -> Self {
        Self {
            http,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetches, parses and normalizes the feed at `url`.
    ///
    /// `category` is copied onto the returned feed unchanged. When
    /// `progress` is supplied, each pipeline stage is published on it.
    ///
    /// Dropping the returned future cancels the request; no partial body is
    /// ever handed to the parser.
    ///
    /// # Errors
    ///
    /// - [`FeedError::InvalidUrl`] - unparseable URL or disallowed host
    /// - [`FeedError::Network`] - transport failure, non-2xx status, timeout,
    ///   oversized or truncated body
    /// - [`FeedError::ParsingFailed`] - the body is not RSS, Atom or JSON Feed
    pub async fn fetch_feed(
        &self,
        url: &str,
        category: Option<&str>,
        progress: Option<&watch::Sender<Progress>>,
    ) -> Result<FetchedFeed, FeedError> {
        progress::report(progress, Stage::Fetching);
        let url = validate_url(url, self.config.allow_private_hosts)?;

        let bytes = self
            .get_bytes(&url, self.config.max_feed_size_bytes)
            .await?;

        progress::report(progress, Stage::Parsing);
        let (kind, document) = parse_document(&bytes).inspect_err(|e| {
            tracing::warn!(url = %url, error = %e, "Feed could not be parsed");
        })?;

        progress::report(progress, Stage::Processing(kind));
        let (feed, articles) = normalize(&document, &url, category);

        progress::report(progress, Stage::Finishing);
        tracing::info!(
            url = %url,
            format = %kind,
            title = %feed.title,
            articles = articles.len(),
            "Fetched feed"
        );

        progress::report(progress, Stage::Done);
        Ok((feed, articles))
    }

    /// Sends a GET and returns the response if its status is 2xx.
    ///
    /// The timeout covers the request up to the response head only.
    pub(crate) async fn get(&self, url: &Url) -> Result<reqwest::Response, NetworkError> {
        tracing::debug!(url = %url, "GET");
        let response = tokio::time::timeout(
            self.config.request_timeout(),
            self.http.get(url.clone()).send(),
        )
        .await
        .map_err(|_| NetworkError::Timeout)??;

        if !response.status().is_success() {
            return Err(NetworkError::HttpStatus(response.status().as_u16()));
        }
        Ok(response)
    }

    /// Sends a GET and reads the whole 2xx body, at most `limit` bytes.
    ///
    /// The timeout covers both the request and the body read.
    pub(crate) async fn get_bytes(&self, url: &Url, limit: usize) -> Result<Vec<u8>, NetworkError> {
        let request = async {
            let response = self.http.get(url.clone()).send().await?;
            if !response.status().is_success() {
                return Err(NetworkError::HttpStatus(response.status().as_u16()));
            }
            read_limited_bytes(response, limit).await
        };

        tracing::debug!(url = %url, "GET");
        tokio::time::timeout(self.config.request_timeout(), request)
            .await
            .map_err(|_| NetworkError::Timeout)?
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, NetworkError> {
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len > limit as u64 {
            return Err(NetworkError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(NetworkError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(NetworkError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
