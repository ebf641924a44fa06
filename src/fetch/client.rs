use async_trait::async_trait;
use reqwest::{Request, Response};

/// Transport seam for outbound HTTP; wrappers in [`auth`](super::auth) layer
/// credentials on top of a concrete client.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
