//! Snapshot retrieval.
//!
//! [`FeedFetcher`] pulls one GTFS-RT snapshot over HTTP; [`FileSource`] reads
//! a saved snapshot from disk. Both implement [`SnapshotSource`], which is
//! all the refresh loop depends on.

mod basic;
mod client;
mod source;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;
pub use source::{FileSource, SnapshotSource};

use reqwest::{StatusCode, Url};
use tracing::debug;

use crate::error::{ConfigError, FeedError, TransportError};
use crate::snapshot::FeedSnapshot;
use auth::Credential;

/// Longest slice of an error response body kept in [`TransportError::Status`].
const MAX_ERROR_BODY: usize = 200;

/// Fetches snapshots from one feed endpoint. No retries: a failed fetch is
/// reported and the caller decides what to do with the cycle.
pub struct FeedFetcher<C> {
    client: C,
    endpoint: Url,
}

impl<C: HttpClient> FeedFetcher<C> {
    /// # Errors
    ///
    /// [`ConfigError::InvalidUrl`] when `endpoint` is not an absolute http(s)
    /// URL.
    pub fn new(client: C, endpoint: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidUrl {
            url: endpoint.to_string(),
            reason,
        };
        let url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        Ok(Self {
            client,
            endpoint: url,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub async fn fetch(&self) -> Result<FeedSnapshot, FeedError> {
        fetch_bytes(&self.client, &self.endpoint).await
    }
}

impl FeedFetcher<Box<dyn HttpClient>> {
    /// Builds a fetcher whose requests carry `credential`.
    pub fn authenticated<C>(
        client: C,
        endpoint: &str,
        credential: &Credential,
    ) -> Result<Self, ConfigError>
    where
        C: HttpClient + 'static,
    {
        FeedFetcher::new(credential.apply(client)?, endpoint)
    }
}

/// Issues a GET for `url` and returns the body as a snapshot.
///
/// 401 and 403 map to [`FeedError::Auth`]; any other non-success status, and
/// any network or timeout failure, maps to [`FeedError::Transport`].
#[tracing::instrument(skip_all, fields(url = %url))]
pub async fn fetch_bytes<C: HttpClient + ?Sized>(
    client: &C,
    url: &Url,
) -> Result<FeedSnapshot, FeedError> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.clone());

    let resp = client.execute(req).await?;
    let status = resp.status();

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(FeedError::Auth {
            status: status.as_u16(),
        });
    }

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(TransportError::Status {
            status: status.as_u16(),
            body: body.chars().take(MAX_ERROR_BODY).collect(),
        }
        .into());
    }

    let bytes = resp.bytes().await?;
    debug!(bytes = bytes.len(), "Feed bytes received");
    Ok(FeedSnapshot::from(bytes))
}
