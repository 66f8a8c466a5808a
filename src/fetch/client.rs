use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes a prepared request. Decorators in [`auth`](super::auth) wrap an
/// inner client to attach credentials.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

#[async_trait]
impl<C: HttpClient + ?Sized> HttpClient for Box<C> {
    async fn execute(&self, req: Request) -> reqwest::Result<Response> {
        (**self).execute(req).await
    }
}
