use super::page::{scan_rendered, scan_static, StaticScan};
use super::pdf;
use crate::config::ExtractorConfig;
use crate::dom::{discover_links, Link};
use crate::error::{ExtractError, Result};
use crate::fetchers::{Fetcher, Renderer};
use crate::model::ExtractionResult;
use log::{debug, info};
use scraper::Html;
use url::Url;

/// The collaborators one extraction run needs, borrowed from the
/// long-lived `MenuExtractor`.
pub struct UrlPipeline<'a> {
    pub fetcher: &'a dyn Fetcher,
    pub renderer: Option<&'a dyn Renderer>,
    pub config: &'a ExtractorConfig,
}

impl UrlPipeline<'_> {
    /// Process a candidate URL
    ///
    /// This pipeline:
    /// 1. Fetches the page and runs the static strategies, then in-page PDF links
    /// 2. Renders the page and runs the rendered strategies (if enabled)
    /// 3. Crawls the site's homepage for menu links and repeats 1-2 on each (if enabled)
    ///
    /// Every failure along the way only moves on to the next step; the
    /// result is never an error.
    pub async fn process(&self, url: &str) -> ExtractionResult {
        if let Some(result) = self.extract_page(url).await {
            return result;
        }

        if self.config.homepage_crawl_enabled {
            if let Some(result) = self.crawl_homepage(url).await {
                return result;
            }
        }

        info!("No menu found for {}", url);
        ExtractionResult::not_found(url)
    }

    /// Runs [`process`](Self::process) over candidates in order; first found wins.
    pub async fn process_first(&self, candidates: &[String]) -> ExtractionResult {
        for candidate in candidates {
            let result = self.process(candidate).await;
            if result.found {
                return result;
            }
        }
        ExtractionResult::not_found(candidates.last().map(String::as_str).unwrap_or_default())
    }

    async fn extract_page(&self, url: &str) -> Option<ExtractionResult> {
        if let Some(result) = self.static_scan(url).await {
            return Some(result);
        }
        if self.config.render_enabled {
            return self.rendered_scan(url).await;
        }
        None
    }

    async fn static_scan(&self, url: &str) -> Option<ExtractionResult> {
        let html = match self.fetch_html(url).await {
            Ok(html) => html,
            Err(e) => {
                debug!("Static fetch failed for {}: {}", url, e);
                return None;
            }
        };

        match scan_static(&html, url) {
            StaticScan::Rejected => None,
            StaticScan::Found(menu) => Some(ExtractionResult::from_menu(menu, html)),
            StaticScan::PdfCandidates(links) => {
                for link in links {
                    if let Some(result) = self.pdf(&link).await {
                        return Some(result);
                    }
                }
                None
            }
        }
    }

    async fn rendered_scan(&self, url: &str) -> Option<ExtractionResult> {
        let renderer = self.renderer?;
        let html = match renderer.render(url, self.config.render_timeout()).await {
            Ok(html) => html,
            Err(e) => {
                debug!("Render failed for {}: {}", url, e);
                return None;
            }
        };
        if html.len() > self.config.max_html_bytes {
            debug!("Rendered HTML for {} exceeds the byte cap", url);
            return None;
        }

        scan_rendered(&html, url).map(|menu| ExtractionResult::from_menu(menu, html))
    }

    async fn pdf(&self, url: &str) -> Option<ExtractionResult> {
        match pdf::process(self.fetcher, url, self.config.max_pdf_bytes).await {
            Ok(result) if result.found => Some(result),
            Ok(_) => {
                debug!("No menu lines in PDF {}", url);
                None
            }
            Err(e) => {
                debug!("PDF extraction failed for {}: {}", url, e);
                None
            }
        }
    }

    async fn crawl_homepage(&self, url: &str) -> Option<ExtractionResult> {
        let homepage = match homepage_of(url) {
            Ok(homepage) => homepage,
            Err(e) => {
                debug!("Cannot derive homepage of {}: {}", url, e);
                return None;
            }
        };
        let html = match self.fetch_html(homepage.as_str()).await {
            Ok(html) => html,
            Err(e) => {
                debug!("Homepage fetch failed for {}: {}", homepage, e);
                return None;
            }
        };

        let links = menu_links(&html, &homepage, url, self.config.max_crawl_links);
        info!("Crawling {} menu links from {}", links.len(), homepage);

        for link in links {
            let result = if link.is_pdf() {
                self.pdf(&link.url).await
            } else {
                self.extract_page(&link.url).await
            };
            if result.is_some() {
                return result;
            }
        }
        None
    }

    /// Fetch with the HTML byte cap enforced regardless of the fetcher.
    async fn fetch_html(&self, url: &str) -> Result<String> {
        let html = self.fetcher.fetch(url).await?;
        if html.len() > self.config.max_html_bytes {
            return Err(ExtractError::TooLarge {
                limit: self.config.max_html_bytes,
                actual: html.len(),
            });
        }
        Ok(html)
    }
}

/// Root of the site hosting `url`.
fn homepage_of(url: &str) -> Result<Url> {
    Ok(Url::parse(url)?.join("/")?)
}

/// Homepage links that mention a menu or point at a PDF, in document order,
/// without the candidate that was already tried.
fn menu_links(html: &str, homepage: &Url, tried: &str, limit: usize) -> Vec<Link> {
    let document = Html::parse_document(html);
    let tried = Url::parse(tried).map(|u| u.to_string()).unwrap_or_default();
    discover_links(&document, homepage)
        .into_iter()
        .filter(|link| link.url != tried)
        .filter(|link| link.mentions_menu() || link.is_pdf())
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_homepage_of() {
        assert_eq!(
            homepage_of("https://bistro.example/en/menu?day=mon").unwrap().as_str(),
            "https://bistro.example/"
        );
        assert!(matches!(
            homepage_of("not a url"),
            Err(ExtractError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_menu_links_filters_and_dedupes() {
        let html = r#"<html><body>
            <a href="/about">About us</a>
            <a href="/food-and-drinks">Eat</a>
            <a href="/menu">See the menu</a>
            <a href="/menu#mains">Mains</a>
            <a href="/files/wine-list.pdf">Wine</a>
            <a href="https://example.com/contact">Contact</a>
        </body></html>"#;
        let homepage = Url::parse("https://example.com/").unwrap();

        let links: Vec<String> = menu_links(html, &homepage, "https://example.com/contact", 20)
            .into_iter()
            .map(|l| l.url)
            .collect();
        assert_eq!(
            links,
            vec![
                "https://example.com/food-and-drinks",
                "https://example.com/menu",
                "https://example.com/files/wine-list.pdf",
            ]
        );
    }

    #[test]
    fn test_menu_links_skips_tried_candidate_and_caps() {
        let html = r#"<a href="/menu">Menu</a><a href="/lunch">Lunch</a><a href="/dinner">Dinner</a>"#;
        let homepage = Url::parse("https://example.com/").unwrap();

        let links = menu_links(html, &homepage, "https://example.com/menu", 1);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://example.com/lunch");
    }
}
