use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// Runtime knobs for the extraction pipeline
#[derive(Debug, Deserialize, Clone)]
pub struct ExtractorConfig {
    /// Whether to re-scan pages through the rendering service
    #[serde(default)]
    pub render_enabled: bool,
    /// Whether to crawl the candidate's homepage for menu links
    #[serde(default = "default_true")]
    pub homepage_crawl_enabled: bool,
    /// Static fetch and PDF download timeout in seconds
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// Rendering timeout in milliseconds
    #[serde(default = "default_render_timeout_ms")]
    pub render_timeout_ms: u64,
    /// Byte cap for HTML responses; anything larger counts as a failed fetch
    #[serde(default = "default_max_html_bytes")]
    pub max_html_bytes: usize,
    /// Byte cap for PDF downloads
    #[serde(default = "default_max_pdf_bytes")]
    pub max_pdf_bytes: usize,
    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Base URL of the rendering service (e.g. "http://localhost:3000")
    pub render_service_url: Option<String>,
    /// Upper bound on homepage links followed per candidate
    #[serde(default = "default_max_crawl_links")]
    pub max_crawl_links: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            render_enabled: false,
            homepage_crawl_enabled: default_true(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            render_timeout_ms: default_render_timeout_ms(),
            max_html_bytes: default_max_html_bytes(),
            max_pdf_bytes: default_max_pdf_bytes(),
            user_agent: default_user_agent(),
            render_service_url: None,
            max_crawl_links: default_max_crawl_links(),
        }
    }
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_fetch_timeout_secs() -> u64 {
    20
}

fn default_render_timeout_ms() -> u64 {
    30_000
}

fn default_max_html_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_max_pdf_bytes() -> usize {
    20 * 1024 * 1024
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_max_crawl_links() -> usize {
    20
}

impl ExtractorConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with MENU_EXTRACT__ prefix
    /// 2. menu-extract.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: MENU_EXTRACT__RENDER_ENABLED=true
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout_ms)
    }
}

/// See [`ExtractorConfig::load`].
pub fn load_config() -> Result<ExtractorConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("menu-extract").required(false))
        // Use double underscore after the prefix: MENU_EXTRACT__MAX_HTML_BYTES
        .add_source(
            Environment::with_prefix("MENU_EXTRACT")
                .prefix_separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = ExtractorConfig::default();
        assert!(!config.render_enabled);
        assert!(config.homepage_crawl_enabled);
        assert_eq!(config.fetch_timeout(), Duration::from_secs(20));
        assert_eq!(config.render_timeout(), Duration::from_millis(30_000));
        assert_eq!(config.max_html_bytes, 5 * 1024 * 1024);
        assert!(config.render_service_url.is_none());
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let settings = Config::builder()
            .add_source(File::from_str(
                "render_enabled = true\nmax_html_bytes = 1024\nrender_service_url = \"http://render:3000\"",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();

        let config: ExtractorConfig = settings.try_deserialize().unwrap();
        assert!(config.render_enabled);
        assert_eq!(config.max_html_bytes, 1024);
        assert_eq!(config.render_service_url.as_deref(), Some("http://render:3000"));
        // untouched fields keep their defaults
        assert!(config.homepage_crawl_enabled);
        assert_eq!(config.max_crawl_links, 20);
    }

    #[test]
    fn test_load_config_without_file() {
        // No menu-extract.toml in the test working directory: defaults apply
        let result = load_config();
        assert!(result.is_ok());
    }
}
