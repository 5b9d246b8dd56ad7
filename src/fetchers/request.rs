use super::Fetcher;
use crate::config::ExtractorConfig;
use crate::error::{ExtractError, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::{header, Client, Response};
use std::time::Duration;

pub struct RequestFetcher {
    client: Client,
    max_html_bytes: usize,
}

impl RequestFetcher {
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        Self::with_options(
            Some(config.fetch_timeout()),
            &config.user_agent,
            config.max_html_bytes,
        )
    }

    pub fn with_options(
        timeout: Option<Duration>,
        user_agent: &str,
        max_html_bytes: usize,
    ) -> Result<Self> {
        let timeout = timeout.unwrap_or(Duration::from_secs(30));
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            max_html_bytes,
        })
    }

    async fn get_capped(&self, url: &str, max_bytes: usize) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = read_capped(response, max_bytes).await?;
        if body.is_empty() {
            return Err(ExtractError::EmptyBody(url.to_string()));
        }
        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }
}

/// Reads the body chunk by chunk, bailing out as soon as the cap is crossed.
async fn read_capped(mut response: Response, max_bytes: usize) -> Result<Vec<u8>> {
    if let Some(length) = response.content_length() {
        let length = usize::try_from(length).unwrap_or(usize::MAX);
        if length > max_bytes {
            return Err(ExtractError::TooLarge {
                limit: max_bytes,
                actual: length,
            });
        }
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        body.extend_from_slice(&chunk);
        if body.len() > max_bytes {
            return Err(ExtractError::TooLarge {
                limit: max_bytes,
                actual: body.len(),
            });
        }
    }
    Ok(body)
}

#[async_trait]
impl Fetcher for RequestFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let body = self.get_capped(url, self.max_html_bytes).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    async fn fetch_bytes(&self, url: &str, max_bytes: usize) -> Result<Vec<u8>> {
        self.get_capped(url, max_bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher(max_html_bytes: usize) -> RequestFetcher {
        RequestFetcher::with_options(Some(Duration::from_secs(5)), "test-agent", max_html_bytes)
            .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/menu")
            .match_header("user-agent", "test-agent")
            .with_status(200)
            .with_body("<html><body>menu</body></html>")
            .create_async()
            .await;

        let html = fetcher(1024)
            .fetch(&format!("{}/menu", server.url()))
            .await
            .unwrap();
        assert_eq!(html, "<html><body>menu</body></html>");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .with_body("not here")
            .create_async()
            .await;

        let err = fetcher(1024)
            .fetch(&format!("{}/missing", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::HttpStatus { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_oversized_body_is_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/big")
            .with_status(200)
            .with_body("x".repeat(64))
            .create_async()
            .await;

        let err = fetcher(16)
            .fetch(&format!("{}/big", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::TooLarge { limit: 16, .. }));
    }

    #[tokio::test]
    async fn test_empty_body_is_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/empty")
            .with_status(200)
            .with_body("")
            .create_async()
            .await;

        let err = fetcher(1024)
            .fetch(&format!("{}/empty", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::EmptyBody(_)));
    }

    #[tokio::test]
    async fn test_fetch_bytes_uses_given_cap() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/menu.pdf")
            .with_status(200)
            .with_body(vec![b'%'; 32])
            .create_async()
            .await;

        let url = format!("{}/menu.pdf", server.url());
        let fetcher = fetcher(8);
        assert_eq!(fetcher.fetch_bytes(&url, 64).await.unwrap().len(), 32);
        assert!(fetcher.fetch_bytes(&url, 10).await.is_err());
    }
}
