use super::{Extractor, ParsingContext};
use crate::dom::{
    block_text, element_children, inline_text, is_block, matching_class, nearest_preceding_heading,
    tag_name,
};
use crate::model::{Item, Section, StructuredMenu};
use crate::text::{
    contains_menu_keyword, count_prices, dedupe_key, find_price, has_price, is_price_only,
    make_item, meaningful_lines, normalize_whitespace,
};
use log::debug;
use scraper::{ElementRef, Selector};
use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::LazyLock;

const CONTAINER_CLASS_TOKENS: &[&str] = &["grid", "flex", "menu", "items", "cards"];
const PRICE_CLASS_TOKENS: &[&str] = &["price", "amount", "cost", "rate"];
const NAME_CLASS_TOKENS: &[&str] = &["name", "title", "dish", "item"];
const DESCRIPTION_CLASS_TOKENS: &[&str] = &["desc"];
const SECTION_CLASS_TOKENS: &[&str] = &["section", "heading", "title", "group", "category", "tab-panel"];

const NEVER_CONTAINERS: &[&str] = &["html", "head", "body", "script", "style", "noscript"];

const MIN_BLOCK_CHILDREN: usize = 3;
const MIN_CONTAINER_TEXT: usize = 100;
const MIN_CONTAINER_CHILDREN: usize = 2;
const MIN_PRICE_MATCHES: usize = 2;
const MIN_ITEMS: usize = 3;

static CLASSED_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[class]").expect("valid selector"));

static ALL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("*").expect("valid selector"));

static EMPHASIS_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h1, h2, h3, h4, h5, h6, strong, b").expect("valid selector")
});

/// Repeating card layouts built from divs/spans rather than lists or tables.
pub struct GridExtractor;

/// Which pass produced the items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridMethod {
    RepeatingChildren,
    TraversalPairing,
}

impl GridExtractor {
    /// Like [`Extractor::extract`], also reporting which pass succeeded.
    pub fn extract_with_method(
        &self,
        context: &ParsingContext,
    ) -> Option<(StructuredMenu, GridMethod)> {
        let container = first_qualifying_container(context)?;
        let section_name = section_name(container);
        debug!(
            "GridExtractor: container <{}> section {:?}",
            tag_name(&container),
            section_name
        );

        let (items, method) = {
            let items = repeating_children(container);
            if items.len() >= MIN_ITEMS {
                (items, GridMethod::RepeatingChildren)
            } else {
                debug!(
                    "GridExtractor: repeating children gave {} items, trying traversal",
                    items.len()
                );
                (traversal_pairing(container), GridMethod::TraversalPairing)
            }
        };

        if items.len() < MIN_ITEMS {
            return None;
        }

        let section = Section::with_items(Some(section_name), items);
        let menu = StructuredMenu::new(context.url.clone(), vec![section]).non_empty()?;
        Some((menu, method))
    }
}

impl Extractor for GridExtractor {
    fn name(&self) -> &'static str {
        "GridExtractor"
    }

    fn extract(&self, context: &ParsingContext) -> Option<StructuredMenu> {
        self.extract_with_method(context).map(|(menu, _)| menu)
    }
}

/// Union of class-token containers and block elements with many children,
/// longest text first; the first one passing the evidence gate wins.
fn first_qualifying_container(context: &ParsingContext) -> Option<ElementRef<'_>> {
    let mut seen = HashSet::new();
    let mut candidates: Vec<(ElementRef, String)> = context
        .document
        .select(&ALL_SELECTOR)
        .filter(|el| !NEVER_CONTAINERS.contains(&tag_name(el)))
        .filter(|el| {
            matching_class(el, CONTAINER_CLASS_TOKENS).is_some()
                || (is_block(el) && element_children(*el).len() >= MIN_BLOCK_CHILDREN)
        })
        .filter(|el| seen.insert(el.id()))
        .map(|el| (el, block_text(el)))
        .collect();

    // stable: equal lengths keep document order
    candidates.sort_by_key(|(_, text)| Reverse(text.chars().count()));

    candidates
        .into_iter()
        .find(|(el, text)| {
            text.trim().chars().count() >= MIN_CONTAINER_TEXT
                && element_children(*el).len() >= MIN_CONTAINER_CHILDREN
                && count_prices(text) >= MIN_PRICE_MATCHES
        })
        .map(|(el, _)| el)
}

/// aria-label, else a section-like class token, else the preceding heading.
fn section_name(container: ElementRef) -> String {
    container
        .value()
        .attr("aria-label")
        .map(normalize_whitespace)
        .filter(|label| !label.is_empty())
        .or_else(|| matching_class(&container, SECTION_CLASS_TOKENS))
        .or_else(|| nearest_preceding_heading(container))
        .unwrap_or_else(|| "Menu".to_string())
}

fn repeating_children(container: ElementRef) -> Vec<Item> {
    let children = element_children(container);
    let mut items = Vec::new();
    let mut seen = HashSet::new();

    for (index, child) in children.iter().enumerate() {
        let mut price = text_by_class(*child, PRICE_CLASS_TOKENS, &[])
            .and_then(|t| find_price(&t).map(str::to_string))
            .or_else(|| find_price(&block_text(*child)).map(str::to_string));

        let mut name = text_by_class(
            *child,
            NAME_CLASS_TOKENS,
            &[PRICE_CLASS_TOKENS, DESCRIPTION_CLASS_TOKENS].concat(),
        )
        .or_else(|| best_text_candidate(*child));

        if price.is_some() && name.is_none() && index > 0 {
            name = best_text_candidate(children[index - 1]);
        }
        if name.is_some() && price.is_none() {
            price = price_in_parent_after(*child);
        }
        if name.is_none() && price.is_none() {
            continue;
        }

        let description = text_by_class(*child, DESCRIPTION_CLASS_TOKENS, PRICE_CLASS_TOKENS);
        let item = make_item(name, description, price);
        // a name child and its price child resolve to the same pair
        if seen.insert(dedupe_key(&item)) {
            items.push(item);
        }
    }

    items
}

/// First price in the parent's content following `child`: bare text nodes or
/// later siblings. Earlier cards never lend their price.
fn price_in_parent_after(child: ElementRef) -> Option<String> {
    child.next_siblings().find_map(|sibling| {
        let text = match sibling.value().as_text() {
            Some(text) => text.to_string(),
            None => block_text(ElementRef::wrap(sibling)?),
        };
        find_price(&text).map(str::to_string)
    })
}

/// First descendant whose class carries one of `tokens` and none of
/// `exclude`, as text.
fn text_by_class(element: ElementRef, tokens: &[&str], exclude: &[&str]) -> Option<String> {
    element
        .select(&CLASSED_SELECTOR)
        .filter(|el| matching_class(el, tokens).is_some() && matching_class(el, exclude).is_none())
        .map(inline_text)
        .find(|text| !text.is_empty())
}

/// Heading/bold text, else the longest line without a price.
fn best_text_candidate(element: ElementRef) -> Option<String> {
    element
        .select(&EMPHASIS_SELECTOR)
        .map(inline_text)
        .find(|text| text.chars().count() > 2 && !is_price_only(text))
        .or_else(|| {
            meaningful_lines(&block_text(element))
                .into_iter()
                .filter(|line| !has_price(line))
                .min_by_key(|line| Reverse(line.chars().count()))
        })
}

/// Rank of an element as a name holder: headings and bold outrank
/// paragraphs and spans.
fn name_rank(element: &ElementRef) -> Option<u8> {
    match tag_name(element) {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "strong" | "b" => Some(2),
        "p" | "span" => Some(1),
        _ => None,
    }
}

fn is_likely_section_heading(fragment: &str) -> bool {
    contains_menu_keyword(fragment) || fragment.chars().count() <= 2
}

/// Walks text fragments in document order and pairs each price with the
/// best name seen around it.
fn traversal_pairing(container: ElementRef) -> Vec<Item> {
    let mut items = Vec::new();
    let mut seen = HashSet::new();
    let mut pending: Option<(u8, String)> = None;

    for node in container.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let fragment = normalize_whitespace(text);
        if fragment.chars().count() <= 2 {
            continue;
        }
        let Some(element) = node.parent().and_then(ElementRef::wrap) else {
            continue;
        };
        if matches!(tag_name(&element), "script" | "style" | "noscript") {
            continue;
        }

        if let Some(price) = find_price(&fragment) {
            let pending_name = pending.take().map(|(_, name)| name);
            let name = name_for_price(element, container, &fragment, price, pending_name);
            if let Some(name) = name {
                let item = make_item(Some(name), None, Some(price.to_string()));
                if seen.insert(dedupe_key(&item)) {
                    items.push(item);
                }
            }
        } else if !is_likely_section_heading(&fragment) {
            if let Some(rank) = name_rank(&element) {
                let replace = match &pending {
                    None => true,
                    Some((current_rank, current)) => {
                        rank > *current_rank
                            || (rank == *current_rank
                                && fragment.chars().count() > current.chars().count())
                    }
                };
                if replace {
                    pending = Some((rank, fragment));
                }
            }
        }
    }

    items
}

fn name_for_price(
    element: ElementRef,
    container: ElementRef,
    fragment: &str,
    price: &str,
    pending: Option<String>,
) -> Option<String> {
    let name_exclude = [PRICE_CLASS_TOKENS, DESCRIPTION_CLASS_TOKENS].concat();
    let by_class = std::iter::once(element)
        .chain(element.parent().and_then(ElementRef::wrap))
        .find_map(|scope| text_by_class(scope, NAME_CLASS_TOKENS, &name_exclude))
        .filter(|name| !is_price_only(name));

    let leading = fragment
        .find(price)
        .map(|idx| fragment[..idx].trim().to_string())
        .filter(|lead| lead.chars().count() > 2);

    by_class
        .or(leading)
        .or(pending)
        .or_else(|| preceding_sibling_text(element))
        .or_else(|| ancestor_child_text(element, container))
}

fn preceding_sibling_text(element: ElementRef) -> Option<String> {
    element.prev_siblings().find_map(|sibling| {
        let text = match sibling.value().as_text() {
            Some(text) => normalize_whitespace(text),
            None => inline_text(ElementRef::wrap(sibling)?),
        };
        (!has_price(&text) && text.chars().count() > 2).then_some(text)
    })
}

fn ancestor_child_text(element: ElementRef, container: ElementRef) -> Option<String> {
    for ancestor in element.ancestors().filter_map(ElementRef::wrap) {
        let text = element_children(ancestor)
            .into_iter()
            .map(inline_text)
            .find(|text| !has_price(text) && text.chars().count() > 2);
        if text.is_some() {
            return text;
        }
        if ancestor.id() == container.id() {
            break;
        }
    }
    None
}
