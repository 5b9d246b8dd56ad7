//! Network collaborators: plain HTTP fetching and the headless rendering
//! service. Both sit behind traits so the orchestrator can be driven by
//! test doubles.

mod chrome;
mod request;

pub use chrome::ChromeFetcher;
pub use request::RequestFetcher;

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url` as text. Non-2xx, timeouts, empty or oversized bodies are errors.
    async fn fetch(&self, url: &str) -> Result<String>;

    /// GET `url` as raw bytes, rejecting anything over `max_bytes`.
    async fn fetch_bytes(&self, url: &str, max_bytes: usize) -> Result<Vec<u8>>;
}

#[async_trait]
pub trait Renderer: Send + Sync {
    /// HTML of `url` after script execution.
    async fn render(&self, url: &str, timeout: Duration) -> Result<String>;
}
