use super::Renderer;
use crate::config::ExtractorConfig;
use crate::error::{ExtractError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct ContentRequest<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct ContentResponse {
    content: String,
}

/// Client for the page-rendering service (`POST {base}/api/fetch-content`),
/// which loads the page in a headless browser and returns the settled DOM.
pub struct ChromeFetcher {
    endpoint: String,
    client: Client,
}

impl ChromeFetcher {
    pub fn new(service_url: &str) -> Result<Self> {
        let endpoint = format!("{}/api/fetch-content", service_url.trim_end_matches('/'));
        let client = Client::builder().build()?;
        Ok(Self { endpoint, client })
    }

    /// `None` when no rendering service is configured.
    pub fn from_config(config: &ExtractorConfig) -> Option<Result<Self>> {
        config.render_service_url.as_deref().map(Self::new)
    }
}

#[async_trait]
impl Renderer for ChromeFetcher {
    async fn render(&self, url: &str, timeout: Duration) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(timeout)
            .json(&ContentRequest { url })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ExtractError::Render(format!(
                "Chrome fetch failed with status: {}",
                response.status()
            )));
        }

        let content: ContentResponse = response.json().await?;
        if content.content.trim().is_empty() {
            return Err(ExtractError::EmptyBody(url.to_string()));
        }
        Ok(content.content)
    }
}
