use thiserror::Error;

/// Errors raised by the I/O collaborators of the extraction pipeline.
///
/// None of these cross `MenuExtractor::try_extract_menu`; the orchestrator
/// treats every one of them as "advance to the next fallback".
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Transport-level failure (connect, timeout, body read)
    #[error("Failed to fetch URL: {0}")]
    Fetch(#[from] reqwest::Error),

    /// Server answered with a non-2xx status
    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// Payload exceeded the configured byte cap
    #[error("Response of {actual} bytes exceeds the {limit} byte limit")]
    TooLarge { limit: usize, actual: usize },

    /// Payload was empty
    #[error("Empty response body from {0}")]
    EmptyBody(String),

    /// URL could not be parsed or resolved
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Rendering service failure
    #[error("Render failed: {0}")]
    Render(String),

    /// PDF could not be read
    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    /// Builder configuration error
    #[error("Builder error: {0}")]
    Builder(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, ExtractError>;
