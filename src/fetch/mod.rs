//! Upstream replay feed.
//!
//! The replay dataset is published as a GitHub gist whose history is the
//! version log. A refresh always takes the newest revision in full:
//! list the gist's commits, open the newest one, follow the raw URL of the
//! replay file.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

/// Errors that can occur while fetching the upstream snapshot.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Gist has no revisions")]
    EmptyHistory,

    #[error("Gist revision has no file named {0}")]
    MissingFile(String),

    #[error("Content too large: {size} bytes (max {max_size})")]
    ContentTooLarge { size: usize, max_size: usize },

    #[error("Snapshot is not valid UTF-8: {0}")]
    InvalidEncoding(#[from] std::string::FromUtf8Error),
}

/// Where raw replay snapshots come from.
#[async_trait]
pub trait MatchSource: Send + Sync {
    /// The newest full snapshot as CSV text.
    async fn latest_snapshot(&self) -> Result<String, FetchError>;
}

/// Configuration for the gist fetcher.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// GitHub API root
    pub api_base: String,

    pub gist_id: String,

    /// File inside the gist holding the replay CSV
    pub file_name: String,

    /// Request timeout
    pub timeout: Duration,

    /// Maximum snapshot size to accept (default 200MB)
    pub max_content_size: usize,

    /// User agent string (the GitHub API rejects requests without one)
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com/".to_string(),
            gist_id: "3c6a1d310025803d5ccdc2786e60ede8".to_string(),
            file_name: "GGST_replays.csv".to_string(),
            timeout: Duration::from_secs(60),
            max_content_size: 200 * 1024 * 1024,
            user_agent: format!("floor-stats/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GistCommit {
    url: String,
}

#[derive(Debug, Deserialize)]
struct GistRevision {
    files: HashMap<String, GistFile>,
}

#[derive(Debug, Deserialize)]
struct GistFile {
    raw_url: String,
}

/// Fetches the newest replay snapshot from a GitHub gist.
pub struct GistFetcher {
    client: Client,
    config: FetcherConfig,
}

impl GistFetcher {
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("floor-stats")),
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    /// `{api_base}/gists/{id}/commits`
    fn commits_url(&self) -> Result<Url, FetchError> {
        let mut base = self.config.api_base.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        Url::parse(&base)
            .and_then(|b| b.join(&format!("gists/{}/commits", self.config.gist_id)))
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }

    /// Raw URL of the replay file in the newest gist revision.
    pub async fn latest_raw_url(&self) -> Result<String, FetchError> {
        let commits: Vec<GistCommit> = self.get(self.commits_url()?.as_str()).await?.json().await?;
        let newest = commits.into_iter().next().ok_or(FetchError::EmptyHistory)?;

        let revision: GistRevision = self.get(&newest.url).await?.json().await?;
        revision
            .files
            .get(&self.config.file_name)
            .map(|f| f.raw_url.clone())
            .ok_or_else(|| FetchError::MissingFile(self.config.file_name.clone()))
    }
}

/// Check the size limit and decode the body. Invalid UTF-8 fails the fetch.
fn decode_snapshot(body: &[u8], max_content_size: usize) -> Result<String, FetchError> {
    if body.len() > max_content_size {
        return Err(FetchError::ContentTooLarge {
            size: body.len(),
            max_size: max_content_size,
        });
    }
    Ok(String::from_utf8(body.to_vec())?)
}

#[async_trait]
impl MatchSource for GistFetcher {
    async fn latest_snapshot(&self) -> Result<String, FetchError> {
        let raw_url = self.latest_raw_url().await?;
        info!("Fetching replay snapshot from {}", raw_url);

        let body = self.get(&raw_url).await?.bytes().await?;
        let snapshot = decode_snapshot(&body, self.config.max_content_size)?;

        info!("Fetched replay snapshot ({} bytes)", body.len());
        Ok(snapshot)
    }
}
