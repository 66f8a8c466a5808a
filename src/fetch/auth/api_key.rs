use crate::error::ConfigError;
use crate::fetch::client::HttpClient;
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};

/// An [`HttpClient`] wrapper that injects an API key as an HTTP header.
///
/// The MTA real-time feeds expect the key in `x-api-key`; other agencies use
/// `Authorization` or a provider-specific name. Header name and value are
/// validated once at construction so every request can reuse them.
pub struct ApiKey<C> {
    inner: C,
    header_name: HeaderName,
    key: HeaderValue,
}

impl<C> ApiKey<C> {
    /// # Errors
    ///
    /// [`ConfigError::MissingCredential`] for an empty key, or
    /// [`ConfigError::InvalidCredential`] when the name or key are not legal
    /// header text.
    pub fn new(inner: C, header_name: &str, key: &str) -> Result<Self, ConfigError> {
        if key.is_empty() {
            return Err(ConfigError::MissingCredential);
        }
        let header_name =
            HeaderName::from_bytes(header_name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        let mut key = HeaderValue::from_str(key).map_err(|e| invalid(e.to_string()))?;
        key.set_sensitive(true);

        Ok(Self {
            inner,
            header_name,
            key,
        })
    }

    /// Convenience constructor that uses `Authorization: Bearer <key>`.
    pub fn bearer(inner: C, key: &str) -> Result<Self, ConfigError> {
        if key.is_empty() {
            return Err(ConfigError::MissingCredential);
        }
        Self::new(inner, "Authorization", &format!("Bearer {key}"))
    }

    pub fn header_name(&self) -> &HeaderName {
        &self.header_name
    }
}

fn invalid(reason: String) -> ConfigError {
    ConfigError::InvalidCredential {
        placement: "header",
        reason,
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut()
            .insert(self.header_name.clone(), self.key.clone());
        self.inner.execute(req).await
    }
}
