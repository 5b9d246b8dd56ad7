use std::time::Duration;

use log::debug;

use crate::config::ExtractorConfig;
use crate::fetchers::{ChromeFetcher, Fetcher, Renderer, RequestFetcher};
use crate::pipelines::UrlPipeline;
use crate::{ExtractError, ExtractionResult};

/// Builder for configuring a [`MenuExtractor`]
#[derive(Default)]
pub struct MenuExtractorBuilder {
    config: Option<ExtractorConfig>,
    fetcher: Option<Box<dyn Fetcher>>,
    renderer: Option<Box<dyn Renderer>>,
    render: Option<bool>,
    crawl_homepage: Option<bool>,
    max_html_bytes: Option<usize>,
    timeout: Option<Duration>,
}

impl MenuExtractorBuilder {
    /// Start from an explicit configuration instead of the defaults
    ///
    /// # Example
    /// ```
    /// use menu_extract::{ExtractorConfig, MenuExtractor};
    ///
    /// let config = ExtractorConfig {
    ///     max_crawl_links: 5,
    ///     ..Default::default()
    /// };
    /// let builder = MenuExtractor::builder().config(config);
    /// ```
    pub fn config(mut self, config: ExtractorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace the HTTP fetcher (used for pages, homepages and PDFs)
    pub fn fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.fetcher = Some(Box::new(fetcher));
        self
    }

    /// Replace the rendering service client. Enables rendering unless
    /// [`render(false)`](Self::render) is set explicitly.
    pub fn renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    /// Turn the rendered-HTML fallback on or off
    pub fn render(mut self, enabled: bool) -> Self {
        self.render = Some(enabled);
        self
    }

    /// Turn the homepage crawl fallback on or off
    ///
    /// # Example
    /// ```
    /// use menu_extract::MenuExtractor;
    ///
    /// let builder = MenuExtractor::builder().crawl_homepage(false);
    /// ```
    pub fn crawl_homepage(mut self, enabled: bool) -> Self {
        self.crawl_homepage = Some(enabled);
        self
    }

    /// Byte cap for HTML; larger documents count as failed fetches
    pub fn max_html_bytes(mut self, bytes: usize) -> Self {
        self.max_html_bytes = Some(bytes);
        self
    }

    /// Set a timeout for HTTP requests
    ///
    /// # Example
    /// ```
    /// use menu_extract::MenuExtractor;
    /// use std::time::Duration;
    ///
    /// let builder = MenuExtractor::builder().timeout(Duration::from_secs(10));
    /// ```
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Assemble the extractor
    ///
    /// # Errors
    /// * `ExtractError::Builder` if rendering is enabled but neither a renderer
    ///   nor `render_service_url` is configured
    /// * `ExtractError::Fetch` if the HTTP client cannot be created
    pub fn build(self) -> Result<MenuExtractor, ExtractError> {
        let mut config = self.config.unwrap_or_default();
        if let Some(bytes) = self.max_html_bytes {
            config.max_html_bytes = bytes;
        }
        if let Some(timeout) = self.timeout {
            config.fetch_timeout_secs = timeout.as_secs().max(1);
        }
        if let Some(crawl) = self.crawl_homepage {
            config.homepage_crawl_enabled = crawl;
        }
        config.render_enabled = self
            .render
            .unwrap_or(config.render_enabled || self.renderer.is_some());

        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Box::new(RequestFetcher::new(&config)?),
        };

        let renderer = match self.renderer {
            Some(renderer) => Some(renderer),
            None => ChromeFetcher::from_config(&config)
                .transpose()?
                .map(|chrome| Box::new(chrome) as Box<dyn Renderer>),
        };

        if config.render_enabled && renderer.is_none() {
            return Err(ExtractError::Builder(
                "Rendering is enabled but no renderer or render_service_url is configured"
                    .to_string(),
            ));
        }

        debug!(
            "MenuExtractor: render={} crawl={} max_html_bytes={}",
            config.render_enabled, config.homepage_crawl_enabled, config.max_html_bytes
        );

        Ok(MenuExtractor {
            config,
            fetcher,
            renderer,
        })
    }
}

/// Finds the menu behind a candidate URL: static page, rendered page,
/// in-page PDFs, then the site's homepage links.
///
/// # Example
/// ```no_run
/// use menu_extract::MenuExtractor;
///
/// # async fn run() -> Result<(), menu_extract::ExtractError> {
/// let extractor = MenuExtractor::builder().build()?;
/// let result = extractor.try_extract_menu("https://bistro.example/menu").await;
/// if result.found {
///     println!("{}", result.to_json().unwrap_or_default());
/// }
/// # Ok(())
/// # }
/// ```
pub struct MenuExtractor {
    config: ExtractorConfig,
    fetcher: Box<dyn Fetcher>,
    renderer: Option<Box<dyn Renderer>>,
}

impl MenuExtractor {
    pub fn builder() -> MenuExtractorBuilder {
        MenuExtractorBuilder::default()
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Never fails: errors anywhere along the way yield `found == false`.
    pub async fn try_extract_menu(&self, url: &str) -> ExtractionResult {
        self.pipeline().process(url).await
    }

    /// Tries candidates in order and returns the first found menu.
    pub async fn extract_first(&self, candidates: &[String]) -> ExtractionResult {
        self.pipeline().process_first(candidates).await
    }

    fn pipeline(&self) -> UrlPipeline<'_> {
        UrlPipeline {
            fetcher: self.fetcher.as_ref(),
            renderer: self.renderer.as_deref(),
            config: &self.config,
        }
    }
}
