//! Multi-strategy restaurant menu extraction.
//!
//! Given a candidate URL, fetch the page and try an ordered chain of
//! strategies (JSON-LD, list/table heuristics, grid layouts, price pairing,
//! linked PDFs) until one yields a non-empty [`StructuredMenu`]. Failures
//! never surface: the caller gets an [`ExtractionResult`] with
//! `found == false` instead.

pub mod builder;
pub mod config;
pub mod dom;
pub mod error;
pub mod extractors;
pub mod fetchers;
pub mod model;
pub mod pipelines;
pub mod text;

use log::warn;

pub use builder::{MenuExtractor, MenuExtractorBuilder};
pub use self::config::{load_config, ExtractorConfig};
pub use error::ExtractError;
pub use fetchers::{ChromeFetcher, Fetcher, Renderer, RequestFetcher};
pub use model::{ExtractionResult, Item, Section, StructuredMenu};
pub use pipelines::{menu_from_text, scan_html};

/// Extract a menu from `url` with the default configuration.
///
/// # Example
/// ```no_run
/// # async fn run() {
/// let result = menu_extract::try_extract_menu("https://bistro.example").await;
/// println!("found: {}", result.found);
/// # }
/// ```
pub async fn try_extract_menu(url: &str) -> ExtractionResult {
    match MenuExtractor::builder().build() {
        Ok(extractor) => extractor.try_extract_menu(url).await,
        Err(e) => {
            warn!("Cannot build extractor: {}", e);
            ExtractionResult::not_found(url)
        }
    }
}
