//! Credential decorators for [`HttpClient`].
//!
//! [`ApiKey`] sends the key as a header, [`UrlParam`] as a query parameter.
//! [`Credential`] is the validated config value that picks one of them.

mod api_key;
mod url_param;

pub use api_key::ApiKey;
pub use url_param::UrlParam;

use std::fmt;

use super::client::HttpClient;
use crate::error::ConfigError;

/// Header the MTA feeds read the key from.
pub const DEFAULT_KEY_HEADER: &str = "x-api-key";

/// Where the key travels on each request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPlacement {
    Header(String),
    QueryParam(String),
}

impl Default for KeyPlacement {
    fn default() -> Self {
        KeyPlacement::Header(DEFAULT_KEY_HEADER.to_string())
    }
}

/// A non-empty access key plus its placement.
#[derive(Clone)]
pub struct Credential {
    key: String,
    placement: KeyPlacement,
}

impl Credential {
    /// # Errors
    ///
    /// [`ConfigError::MissingCredential`] when `key` is empty or blank.
    pub fn new(key: impl Into<String>, placement: KeyPlacement) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ConfigError::MissingCredential);
        }
        Ok(Self { key, placement })
    }

    pub fn placement(&self) -> &KeyPlacement {
        &self.placement
    }

    /// Wraps `inner` in the decorator matching this credential's placement.
    pub fn apply<C>(&self, inner: C) -> Result<Box<dyn HttpClient>, ConfigError>
    where
        C: HttpClient + 'static,
    {
        let client: Box<dyn HttpClient> = match &self.placement {
            KeyPlacement::Header(name) => Box::new(ApiKey::new(inner, name, &self.key)?),
            KeyPlacement::QueryParam(name) => Box::new(UrlParam::new(inner, name, &self.key)?),
        };
        Ok(client)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("key", &"<redacted>")
            .field("placement", &self.placement)
            .finish()
    }
}
