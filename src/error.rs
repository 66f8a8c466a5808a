//! Error types for the fetch → extract pipeline.

/// Errors surfaced by a single refresh cycle.
///
/// None of these stop the refresh loop; the caller decides whether to skip
/// the cycle, keep showing the previous board, or alert an operator.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The feed rejected the access credential (401 / 403).
    #[error("feed rejected the API key (HTTP {status})")]
    Auth { status: u16 },

    /// Network failure, timeout, or a non-success response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The snapshot bytes are not a valid GTFS-RT `FeedMessage`.
    #[error("malformed feed: {0}")]
    Decode(#[from] prost::DecodeError),
}

impl FeedError {
    /// Returns `true` when retrying on the next cycle may succeed without
    /// anyone intervening.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, FeedError::Auth { .. })
    }

    /// Short machine-friendly label, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            FeedError::Auth { .. } => "auth_error",
            FeedError::Transport(_) => "transport_error",
            FeedError::Decode(_) => "decode_error",
        }
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        FeedError::Transport(TransportError::Http(err))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Invalid startup configuration. The only error kind that is fatal to the
/// process.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing access credential")]
    MissingCredential,

    #[error("credential cannot be sent as {placement}: {reason}")]
    InvalidCredential {
        placement: &'static str,
        reason: String,
    },

    #[error("target stop id must not be empty")]
    EmptyStopId,

    #[error("arrival limit must be at least 1")]
    ZeroLimit,

    #[error("refresh interval must be at least 1 second")]
    ZeroInterval,

    #[error("invalid feed URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}
