//! Helpers over the `scraper` node tree shared by the HTML strategies.

use crate::text::{contains_menu_keyword, normalize_whitespace};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main",
    "nav", "ol", "p", "pre", "section", "table", "tbody", "tfoot", "thead", "tr", "ul",
];

const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg", "head"];

const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// How far up the tree the preceding-heading lookup climbs.
const MAX_HEADING_ASCENT: usize = 6;

static HEADING_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3, h4, h5, h6").expect("valid selector"));

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid selector"));

static BODY_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("valid selector"));

pub fn tag_name<'a>(element: &ElementRef<'a>) -> &'a str {
    element.value().name()
}

pub fn is_heading(element: &ElementRef) -> bool {
    HEADING_TAGS.contains(&tag_name(element))
}

pub fn is_block(element: &ElementRef) -> bool {
    BLOCK_TAGS.contains(&tag_name(element))
}

/// Text of the subtree with block boundaries turned into line breaks and
/// table cells separated by spaces. Script/style contents are skipped.
pub fn block_text(element: ElementRef) -> String {
    let mut out = String::new();
    push_block_text(element, &mut out);
    out
}

fn push_block_text(element: ElementRef, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            continue;
        }
        let Some(child) = ElementRef::wrap(child) else {
            continue;
        };
        let name = tag_name(&child);
        if SKIPPED_TAGS.contains(&name) {
            continue;
        }
        let separator = if BLOCK_TAGS.contains(&name) { '\n' } else { ' ' };
        out.push(separator);
        push_block_text(child, out);
        out.push(separator);
    }
}

/// Whitespace-normalized text of the whole subtree on a single line.
pub fn inline_text(element: ElementRef) -> String {
    normalize_whitespace(&block_text(element).replace('\n', " "))
}

/// Trimmed text of the element's own text nodes, ignoring descendants.
pub fn own_text(element: ElementRef) -> String {
    let joined: Vec<&str> = element
        .children()
        .filter_map(|child| child.value().as_text().map(|t| &**t))
        .collect();
    normalize_whitespace(&joined.join(" "))
}

/// Lowercased class tokens.
pub fn class_tokens(element: &ElementRef) -> Vec<String> {
    element
        .value()
        .classes()
        .map(|c| c.to_lowercase())
        .collect()
}

/// First class token containing any of the given fragments.
pub fn matching_class(element: &ElementRef, fragments: &[&str]) -> Option<String> {
    class_tokens(element)
        .into_iter()
        .find(|class| fragments.iter().any(|f| class.contains(f)))
}

pub fn element_children<'a>(element: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    element.children().filter_map(ElementRef::wrap).collect()
}

pub fn has_ancestor_tag(element: &ElementRef, tags: &[&str]) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| tags.contains(&tag_name(&a)))
}

pub fn body(document: &Html) -> Option<ElementRef<'_>> {
    document.select(&BODY_SELECTOR).next()
}

/// Text of the nearest heading preceding the element in document order,
/// climbing a few levels through ancestors' previous siblings.
pub fn nearest_preceding_heading(element: ElementRef) -> Option<String> {
    let mut current = element;
    for _ in 0..MAX_HEADING_ASCENT {
        for sibling in current.prev_siblings().filter_map(ElementRef::wrap) {
            let heading = if is_heading(&sibling) {
                Some(sibling)
            } else {
                sibling.select(&HEADING_SELECTOR).last()
            };
            if let Some(text) = heading.map(inline_text).filter(|t| !t.is_empty()) {
                return Some(text);
            }
        }
        current = match current.parent().and_then(ElementRef::wrap) {
            Some(parent) if tag_name(&parent) != "body" => parent,
            _ => break,
        };
    }
    None
}

/// Nearest preceding heading, else the parent's class attribute, else "Menu".
pub fn guess_section_name(element: ElementRef) -> String {
    nearest_preceding_heading(element)
        .or_else(|| {
            element
                .parent()
                .and_then(ElementRef::wrap)
                .and_then(|p| p.value().attr("class"))
                .map(normalize_whitespace)
                .filter(|c| !c.is_empty())
        })
        .unwrap_or_else(|| "Menu".to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub url: String,
    pub text: String,
}

impl Link {
    pub fn is_pdf(&self) -> bool {
        Url::parse(&self.url)
            .map(|u| u.path().to_lowercase().ends_with(".pdf"))
            .unwrap_or(false)
    }

    pub fn mentions_menu(&self) -> bool {
        let path = Url::parse(&self.url)
            .map(|u| u.path().to_string())
            .unwrap_or_default();
        contains_menu_keyword(&path) || contains_menu_keyword(&self.text)
    }
}

/// All `a[href]` targets resolved against `base`, deduplicated in document
/// order. Fragments are stripped; non-http(s) schemes are dropped.
pub fn discover_links(document: &Html, base: &Url) -> Vec<Link> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in document.select(&ANCHOR_SELECTOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(mut resolved) = base.join(href.trim()) else {
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }
        resolved.set_fragment(None);
        let url = resolved.to_string();
        if seen.insert(url.clone()) {
            links.push(Link {
                url,
                text: inline_text(anchor),
            });
        }
    }

    links
}

/// Links pointing at PDFs, menu-named ones first (stable otherwise).
pub fn pdf_links(document: &Html, base: &Url) -> Vec<String> {
    let mut links: Vec<Link> = discover_links(document, base)
        .into_iter()
        .filter(Link::is_pdf)
        .collect();
    links.sort_by_key(|link| !link.mentions_menu());
    links.into_iter().map(|link| link.url).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_text_breaks_on_blocks() {
        let document = Html::parse_fragment(
            "<div><p>Soup <b>$5</b></p><p>Salad $6</p><script>var x = 1;</script></div>",
        );
        let root = document.root_element();
        let lines: Vec<String> = crate::text::meaningful_lines(&block_text(root));
        assert_eq!(lines, vec!["Soup $5", "Salad $6"]);
    }

    #[test]
    fn test_nearest_preceding_heading() {
        let document = Html::parse_document(
            "<body><section><h2>Starters</h2><div><ul id='target'><li>x</li></ul></div></section></body>",
        );
        let selector = Selector::parse("#target").unwrap();
        let target = document.select(&selector).next().unwrap();
        assert_eq!(nearest_preceding_heading(target).as_deref(), Some("Starters"));
    }

    #[test]
    fn test_guess_section_name_falls_back_to_parent_class() {
        let document = Html::parse_document(
            "<body><div class='drinks-list'><ul id='target'><li>x</li></ul></div></body>",
        );
        let selector = Selector::parse("#target").unwrap();
        let target = document.select(&selector).next().unwrap();
        assert_eq!(guess_section_name(target), "drinks-list");
    }

    #[test]
    fn test_pdf_links_rank_menu_first() {
        let document = Html::parse_document(
            r#"<body>
                <a href="/files/press-kit.pdf">Press</a>
                <a href="/files/dinner.pdf">Our dinner menu</a>
                <a href="/files/dinner.pdf#page=2">Duplicate</a>
                <a href="mailto:info@example.com">Mail</a>
            </body>"#,
        );
        let base = Url::parse("https://example.com/visit").unwrap();
        let links = pdf_links(&document, &base);
        assert_eq!(
            links,
            vec![
                "https://example.com/files/dinner.pdf",
                "https://example.com/files/press-kit.pdf"
            ]
        );
    }
}
