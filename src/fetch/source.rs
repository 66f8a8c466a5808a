use std::path::PathBuf;

use async_trait::async_trait;

use super::{FeedFetcher, HttpClient};
use crate::error::{FeedError, TransportError};
use crate::snapshot::FeedSnapshot;

/// Anything that can produce one feed snapshot per call.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch(&self) -> Result<FeedSnapshot, FeedError>;

    /// Human-readable origin, used in log fields.
    fn describe(&self) -> String;
}

#[async_trait]
impl<C: HttpClient> SnapshotSource for FeedFetcher<C> {
    async fn fetch(&self) -> Result<FeedSnapshot, FeedError> {
        FeedFetcher::fetch(self).await
    }

    fn describe(&self) -> String {
        self.endpoint().to_string()
    }
}

/// Serves a snapshot saved to disk, re-read on every fetch.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SnapshotSource for FileSource {
    async fn fetch(&self) -> Result<FeedSnapshot, FeedError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| TransportError::Io {
                path: self.path.display().to_string(),
                source,
            })?;
        Ok(FeedSnapshot::from(bytes))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
