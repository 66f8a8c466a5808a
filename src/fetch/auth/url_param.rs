use crate::error::ConfigError;
use crate::fetch::client::HttpClient;
use async_trait::async_trait;

/// An [`HttpClient`] wrapper that appends an API key as a URL query parameter.
pub struct UrlParam<C> {
    inner: C,
    param_name: String,
    key: String,
}

impl<C> UrlParam<C> {
    pub fn new(inner: C, param_name: &str, key: &str) -> Result<Self, ConfigError> {
        if key.is_empty() {
            return Err(ConfigError::MissingCredential);
        }
        if param_name.is_empty() {
            return Err(ConfigError::InvalidCredential {
                placement: "query parameter",
                reason: "parameter name is empty".to_string(),
            });
        }
        Ok(Self {
            inner,
            param_name: param_name.to_string(),
            key: key.to_string(),
        })
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for UrlParam<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.url_mut()
            .query_pairs_mut()
            .append_pair(&self.param_name, &self.key);
        self.inner.execute(req).await
    }
}
