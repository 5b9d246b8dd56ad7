//! Scans of a single HTML document. Everything here is synchronous so the
//! parsed DOM never lives across an await point.

use crate::dom::pdf_links;
use crate::extractors::{rendered_chain, run_chain, static_chain, ParsingContext};
use crate::model::{ExtractionResult, StructuredMenu};
use crate::text::contains_menu_keyword;
use log::debug;
use url::Url;

/// Outcome of scanning statically fetched HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaticScan {
    /// Nothing menu-like in the raw markup; the DOM was never built.
    Rejected,
    Found(StructuredMenu),
    /// No menu in the markup itself; these in-page PDF links are worth trying.
    PdfCandidates(Vec<String>),
}

/// Cheap substring test run before any parsing.
pub fn worth_parsing(html: &str) -> bool {
    let lower = html.to_lowercase();
    contains_menu_keyword(&lower) || lower.contains(".pdf") || lower.contains("application/ld+json")
}

pub fn scan_static(html: &str, url: &str) -> StaticScan {
    if !worth_parsing(html) {
        debug!("Fast-reject: no menu markers in {}", url);
        return StaticScan::Rejected;
    }

    let context = ParsingContext::new(url, html);
    if let Some(menu) = run_chain(&static_chain(), &context) {
        return StaticScan::Found(menu);
    }

    let links = match Url::parse(url) {
        Ok(base) => pdf_links(&context.document, &base),
        Err(e) => {
            debug!("Cannot resolve links against {}: {}", url, e);
            Vec::new()
        }
    };
    StaticScan::PdfCandidates(links)
}

/// Structural, grid and price-pair strategies over rendered HTML.
pub fn scan_rendered(html: &str, url: &str) -> Option<StructuredMenu> {
    let context = ParsingContext::new(url, html);
    run_chain(&rendered_chain(), &context)
}

/// Static strategies over HTML the caller already holds. In-page PDF links
/// are not followed.
pub fn scan_html(html: &str, url: &str) -> ExtractionResult {
    match scan_static(html, url) {
        StaticScan::Found(menu) => ExtractionResult::from_menu(menu, html),
        _ => ExtractionResult::not_found(url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fast_reject_without_markers() {
        let html = "<html><body><p>Opening hours 9-5. Call us today.</p></body></html>";
        assert!(!worth_parsing(html));
        assert_eq!(scan_static(html, "https://example.com"), StaticScan::Rejected);
    }

    #[test]
    fn test_markers_pass_fast_reject() {
        assert!(worth_parsing("<a href='/files/carte.PDF'>x</a>"));
        assert!(worth_parsing(r#"<script type="application/ld+json">{}</script>"#));
        assert!(worth_parsing("<h1>Our MENU</h1>"));
    }

    #[test]
    fn test_static_scan_finds_list_menu() {
        let html = r#"<html><body><ul class="menu"><li>Burger - Juicy beef - $12</li></ul></body></html>"#;
        let StaticScan::Found(menu) = scan_static(html, "https://example.com") else {
            panic!("expected a menu");
        };
        assert_eq!(menu.item_count(), 1);
    }

    #[test]
    fn test_static_scan_returns_pdf_candidates() {
        let html = r#"<html><body><p>Download below.</p>
            <a href="/docs/lunch-menu.pdf">Lunch menu</a></body></html>"#;
        assert_eq!(
            scan_static(html, "https://example.com/visit"),
            StaticScan::PdfCandidates(vec!["https://example.com/docs/lunch-menu.pdf".to_string()])
        );
    }

    #[test]
    fn test_scan_html_keeps_markup_as_raw_text() {
        let html = r#"<html><body><table id="menu"><tr><td>Pasta</td><td>$15</td></tr></table></body></html>"#;
        let result = scan_html(html, "https://example.com/menu");
        assert!(result.found);
        assert_eq!(result.source_url, "https://example.com/menu");
        assert_eq!(result.raw_text, html);
    }
}
