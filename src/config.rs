//! Command-line and environment configuration.
//!
//! Every value can come from a flag or from the environment (a `.env` file is
//! loaded first by the binary). Validation happens once at startup and turns
//! raw values into the typed inputs the pipeline takes, so nothing downstream
//! reads ambient state.

use std::time::Duration;

use clap::Args;
use reqwest::Url;

use crate::arrivals::{DEFAULT_LIMIT, ExtractRequest};
use crate::error::ConfigError;
use crate::fetch::auth::{Credential, DEFAULT_KEY_HEADER, KeyPlacement};
use crate::fetch::{BasicClient, FeedFetcher, FileSource, SnapshotSource};

/// The MTA's L-line real-time feed.
pub const DEFAULT_FEED_URL: &str =
    "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2Fgtfs-l";

/// Which stop to watch and how many arrivals to show.
#[derive(Debug, Clone, Args)]
pub struct StopArgs {
    /// GTFS stop id, including direction suffix (e.g. L12N)
    #[arg(short, long = "stop", env = "STOP_ID")]
    pub stop_id: String,

    /// Number of upcoming arrivals to keep
    #[arg(short, long, env = "STACK_LIMIT", default_value_t = DEFAULT_LIMIT)]
    pub limit: usize,
}

impl StopArgs {
    pub fn request(&self) -> Result<ExtractRequest, ConfigError> {
        ExtractRequest::new(self.stop_id.clone(), self.limit)
    }
}

/// Where snapshots come from and how to authenticate.
#[derive(Debug, Clone, Args)]
pub struct FeedArgs {
    /// Feed URL, or path to a saved .pb snapshot
    #[arg(short = 'f', long = "feed", env = "FEED_URL", default_value = DEFAULT_FEED_URL, value_name = "URL_OR_FILE")]
    pub source: String,

    /// API key sent with every HTTP request
    #[arg(long, env = "MTA_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Header that carries the API key
    #[arg(long, env = "API_KEY_HEADER", default_value = DEFAULT_KEY_HEADER)]
    pub key_header: String,

    /// Send the API key as this query parameter instead of a header
    #[arg(long, env = "API_KEY_PARAM")]
    pub key_param: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long, env = "FETCH_TIMEOUT", default_value_t = 30)]
    pub timeout: u64,
}

impl FeedArgs {
    /// `true` for an http(s) URL in any letter case; anything else is a path.
    pub fn is_remote(&self) -> bool {
        Url::parse(&self.source).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
    }

    /// The validated credential. Only remote sources need one.
    pub fn credential(&self) -> Result<Credential, ConfigError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(ConfigError::MissingCredential)?;
        let placement = match &self.key_param {
            Some(param) => KeyPlacement::QueryParam(param.clone()),
            None => KeyPlacement::Header(self.key_header.clone()),
        };
        Credential::new(key, placement)
    }

    /// Builds the snapshot source: an authenticated HTTP fetcher for URLs, a
    /// file reader for anything else.
    pub fn snapshot_source(&self) -> anyhow::Result<Box<dyn SnapshotSource>> {
        if !self.is_remote() {
            return Ok(Box::new(FileSource::new(&self.source)));
        }
        let credential = self.credential()?;
        let client = BasicClient::with_timeout(Duration::from_secs(self.timeout.max(1)))?;
        let fetcher = FeedFetcher::authenticated(client, &self.source, &credential)?;
        Ok(Box::new(fetcher))
    }
}

/// Refresh period for the `watch` loop.
pub fn refresh_interval(seconds: u64) -> Result<Duration, ConfigError> {
    if seconds == 0 {
        return Err(ConfigError::ZeroInterval);
    }
    Ok(Duration::from_secs(seconds))
}
