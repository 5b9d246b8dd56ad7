use super::{Extractor, ParsingContext};
use crate::dom::{inline_text, own_text, tag_name};
use crate::model::{Item, Section, StructuredMenu};
use crate::text::{dedupe_key, find_price, has_price, make_item, normalize_whitespace};
use log::debug;
use scraper::{ElementRef, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

pub const PRICE_PAIR_SECTION: &str = "Detected Menu (price-pair heuristic)";

const MAX_ASCENT: usize = 4;
const MIN_NAME_CHARS: usize = 3;
const IGNORED_TAGS: &[&str] = &["html", "head", "script", "style", "noscript", "template", "title"];

static ALL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("*").expect("valid selector"));

/// Last-resort pairing of each price on the page with nearby text.
pub struct PricePairExtractor;

impl Extractor for PricePairExtractor {
    fn name(&self) -> &'static str {
        "PricePairExtractor"
    }

    fn extract(&self, context: &ParsingContext) -> Option<StructuredMenu> {
        let mut seen = HashSet::new();
        let mut items = Vec::new();

        for node in context.document.select(&ALL_SELECTOR) {
            if IGNORED_TAGS.contains(&tag_name(&node)) {
                continue;
            }
            let own = own_text(node);
            let Some(own_price) = find_price(&own) else {
                continue;
            };
            let Some(item) = pair_price(node, own_price) else {
                continue;
            };
            if seen.insert(dedupe_key(&item)) {
                items.push(item);
            }
        }

        debug!("PricePairExtractor: {} pairs", items.len());
        let section = Section::with_items(Some(PRICE_PAIR_SECTION.to_string()), items);
        StructuredMenu::new(context.url.clone(), vec![section]).non_empty()
    }
}

fn pair_price(node: ElementRef, own_price: &str) -> Option<Item> {
    let container = grouping_container(node);
    let fragments = text_fragments(container);

    let price = fragments
        .iter()
        .find_map(|fragment| find_price(fragment))
        .unwrap_or(own_price)
        .to_string();

    let name = preceding_sibling_name(node).or_else(|| {
        fragments
            .iter()
            .filter(|fragment| !has_price(fragment) && fragment.chars().count() >= MIN_NAME_CHARS)
            .fold(None::<&String>, |best, fragment| match best {
                Some(b) if b.chars().count() >= fragment.chars().count() => Some(b),
                _ => Some(fragment),
            })
            .cloned()
    })?;

    Some(make_item(Some(name), None, Some(price)))
}

/// Closest ancestor (at most a few levels up) that holds text besides the
/// price itself.
fn grouping_container(node: ElementRef) -> ElementRef {
    let mut current = node;
    for _ in 0..MAX_ASCENT {
        let Some(parent) = current.parent().and_then(ElementRef::wrap) else {
            break;
        };
        if matches!(tag_name(&parent), "body" | "html") {
            break;
        }
        current = parent;
        let has_name_text = text_fragments(current)
            .iter()
            .any(|f| !has_price(f) && f.chars().count() >= MIN_NAME_CHARS);
        if has_name_text {
            break;
        }
    }
    current
}

/// Distinct normalized text nodes of the subtree, in document order.
fn text_fragments(element: ElementRef) -> Vec<String> {
    let mut seen = HashSet::new();
    element
        .descendants()
        .filter(|node| {
            node.parent()
                .and_then(ElementRef::wrap)
                .map_or(true, |parent| !IGNORED_TAGS.contains(&tag_name(&parent)))
        })
        .filter_map(|node| node.value().as_text().map(|t| normalize_whitespace(t)))
        .filter(|text| !text.is_empty())
        .filter(|text| seen.insert(text.clone()))
        .collect()
}

fn preceding_sibling_name(node: ElementRef) -> Option<String> {
    node.prev_siblings()
        .filter_map(ElementRef::wrap)
        .map(inline_text)
        .find(|text| !text.is_empty())
        .filter(|text| !has_price(text) && text.chars().count() >= MIN_NAME_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> Option<StructuredMenu> {
        PricePairExtractor.extract(&ParsingContext::new("https://example.com", html))
    }

    #[test]
    fn test_pairs_price_with_previous_sibling() {
        let menu = extract(
            r#"<html><body>
            <article><p>Wood-fired Margherita</p><em>14.00</em></article>
            <article><p>Quattro Formaggi</p><em>16.50</em></article>
            </body></html>"#,
        )
        .unwrap();

        assert_eq!(menu.sections.len(), 1);
        assert_eq!(menu.sections[0].name.as_deref(), Some(PRICE_PAIR_SECTION));
        let items = &menu.sections[0].items;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name.as_deref(), Some("Wood-fired Margherita"));
        assert_eq!(items[0].price.as_deref(), Some("14.00"));
        assert_eq!(items[1].name.as_deref(), Some("Quattro Formaggi"));
        assert_eq!(items[1].price.as_deref(), Some("16.50"));
    }

    #[test]
    fn test_falls_back_to_longest_fragment_in_container() {
        let menu = extract(
            r#"<html><body>
            <section><div><span>Ribeye</span><span>Dry-aged ribeye steak</span></div>
            <div><i>$38</i></div></section>
            </body></html>"#,
        )
        .unwrap();

        let item = &menu.sections[0].items[0];
        assert_eq!(item.name.as_deref(), Some("Dry-aged ribeye steak"));
        assert_eq!(item.price.as_deref(), Some("$38"));
        assert_eq!(item.currency.as_deref(), Some("USD"));
    }

    #[test]
    fn test_duplicate_pairs_collapse() {
        let menu = extract(
            r#"<html><body>
            <div><b>Espresso</b><span>3.00</span></div>
            <div><b>ESPRESSO</b><span>3.00</span></div>
            </body></html>"#,
        )
        .unwrap();
        assert_eq!(menu.item_count(), 1);
    }

    #[test]
    fn test_no_prices_no_menu() {
        assert!(extract("<html><body><p>Opening hours and directions</p></body></html>").is_none());
    }

    #[test]
    fn test_script_numbers_ignored() {
        assert!(extract(
            "<html><head><script>var v = 1.25;</script></head><body><p>Hello there</p></body></html>"
        )
        .is_none());
    }
}
