//! Remote YUM metadata fetches.

use async_trait::async_trait;
use reposync_core::config::ValidationConfig;

/// Path of the repository metadata descriptor, relative to a normalized URL.
pub const REPOMD_PATH: &str = "repodata/repomd.xml";

/// Path of the detached repomd signature, relative to a normalized URL.
pub const REPOMD_SIGNATURE_PATH: &str = "repodata/repomd.xml.asc";

/// A completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A fetch that produced no response.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Timeout occurred")]
    Timeout,

    #[error("{0}")]
    Transport(String),
}

/// Fetches raw repository files. Implemented over HTTP in production and
/// swapped out in tests.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError>;
}

/// [`MetadataFetcher`] backed by a shared `reqwest` client.
#[derive(Clone)]
pub struct HttpMetadataFetcher {
    client: reqwest::Client,
}

impl HttpMetadataFetcher {
    pub fn new(config: &ValidationConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout())
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl MetadataFetcher for HttpMetadataFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let response = self.client.get(url).send().await.map_err(map_reqwest)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_reqwest)?;

        tracing::debug!(url, status, bytes = body.len(), "Fetched repository file");
        Ok(FetchResponse {
            status,
            body: body.to_vec(),
        })
    }
}

fn map_reqwest(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(err.to_string())
    }
}
