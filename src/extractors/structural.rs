use super::{Extractor, JsonLdExtractor, ParsingContext};
use crate::dom::{
    block_text, body, element_children, guess_section_name, has_ancestor_tag, inline_text,
    tag_name,
};
use crate::model::{Item, Section, StructuredMenu};
use crate::text::{
    contains_menu_keyword, find_price, make_item, meaningful_lines, section_from_lines,
    split_list_entry,
};
use log::debug;
use scraper::{ElementRef, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

/// Fragments of `id`/`class` values marking a menu container.
const MENU_ATTR_FRAGMENTS: &[&str] = &["menu", "restaurant"];

/// Site chrome that reuses the word "menu" for navigation.
const CHROME_TAGS: &[&str] = &["nav", "header", "footer"];

const LIST_TAGS: &[&str] = &["ul", "ol", "table"];

const NEVER_MENU_NODES: &[&str] = &[
    "html", "head", "body", "script", "style", "noscript", "button", "input", "select", "option",
    "a", "img", "svg", "link", "meta",
];

const PAGE_CONTENT_SECTION: &str = "Page content";

static ATTR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[id], [class]").expect("valid selector"));

static MENU_HEADING_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3, h4").expect("valid selector"));

static LIST_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("ul, ol, table").expect("valid selector"));

static LIST_ITEM_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li").expect("valid selector"));

static ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("valid selector"));

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid selector"));

/// JSON-LD, then keyword/tag heuristics, then whole-body text.
pub struct StructuralExtractor;

/// Lists and tables found through menu-ish attributes, headings or prices.
pub struct HtmlListExtractor;

/// Line-based extraction over the whole body when it mentions a menu.
pub struct PageTextExtractor;

impl Extractor for StructuralExtractor {
    fn name(&self) -> &'static str {
        "StructuralExtractor"
    }

    fn extract(&self, context: &ParsingContext) -> Option<StructuredMenu> {
        let steps: [&dyn Extractor; 3] = [&JsonLdExtractor, &HtmlListExtractor, &PageTextExtractor];
        steps.iter().find_map(|step| {
            let menu = step.extract(context).and_then(StructuredMenu::non_empty);
            if menu.is_some() {
                debug!("StructuralExtractor: {} succeeded", step.name());
            }
            menu
        })
    }
}

impl Extractor for HtmlListExtractor {
    fn name(&self) -> &'static str {
        "HtmlListExtractor"
    }

    fn extract(&self, context: &ParsingContext) -> Option<StructuredMenu> {
        let base = Url::parse(&context.url).ok();
        let nodes = find_menu_nodes(context);
        debug!("HtmlListExtractor: {} candidate menu nodes", nodes.len());

        let sections: Vec<Section> = nodes
            .into_iter()
            .flat_map(|node| sections_for_node(node, base.as_ref()))
            .collect();

        StructuredMenu::new(context.url.clone(), sections).non_empty()
    }
}

impl Extractor for PageTextExtractor {
    fn name(&self) -> &'static str {
        "PageTextExtractor"
    }

    fn extract(&self, context: &ParsingContext) -> Option<StructuredMenu> {
        let text = block_text(body(&context.document)?);
        if !contains_menu_keyword(&text) {
            return None;
        }
        let section = section_from_lines(PAGE_CONTENT_SECTION, &text)?;
        Some(StructuredMenu::new(context.url.clone(), vec![section]))
    }
}

/// Menu nodes in document order, from the first selector tier that matches.
fn find_menu_nodes(context: &ParsingContext) -> Vec<ElementRef<'_>> {
    let by_attribute = outermost(
        context
            .document
            .select(&ATTR_SELECTOR)
            .filter(has_menu_attribute)
            .filter(|el| !NEVER_MENU_NODES.contains(&tag_name(el)))
            .filter(|el| !is_site_chrome(el))
            .collect(),
    );
    if !by_attribute.is_empty() {
        return by_attribute;
    }

    let after_headings: Vec<ElementRef> = context
        .document
        .select(&MENU_HEADING_SELECTOR)
        .filter(|heading| contains_menu_keyword(&inline_text(*heading)))
        .filter_map(|heading| heading.next_siblings().find_map(ElementRef::wrap))
        .filter(|sibling| {
            LIST_TAGS.contains(&tag_name(sibling)) || sibling.select(&LIST_ITEM_SELECTOR).next().is_some()
        })
        .collect();
    if !after_headings.is_empty() {
        return outermost(after_headings);
    }

    outermost(
        context
            .document
            .select(&LIST_SELECTOR)
            .filter(|list| {
                let text = block_text(*list);
                find_price(&text).is_some() && meaningful_lines(&text).len() > 1
            })
            .collect(),
    )
}

fn has_menu_attribute(element: &ElementRef) -> bool {
    ["id", "class"].iter().any(|attr| {
        element
            .value()
            .attr(attr)
            .map(|value| {
                let value = value.to_lowercase();
                MENU_ATTR_FRAGMENTS.iter().any(|f| value.contains(f))
            })
            .unwrap_or(false)
    })
}

fn is_site_chrome(element: &ElementRef) -> bool {
    if CHROME_TAGS.contains(&tag_name(element)) || has_ancestor_tag(element, CHROME_TAGS) {
        return true;
    }
    ["id", "class"].iter().any(|attr| {
        element
            .value()
            .attr(attr)
            .is_some_and(|value| value.to_lowercase().contains("nav"))
    })
}

/// Drops nodes that sit inside another selected node.
fn outermost(nodes: Vec<ElementRef<'_>>) -> Vec<ElementRef<'_>> {
    let ids: HashSet<_> = nodes.iter().map(|n| n.id()).collect();
    nodes
        .into_iter()
        .filter(|node| !node.ancestors().any(|a| ids.contains(&a.id())))
        .collect()
}

fn sections_for_node(node: ElementRef, base: Option<&Url>) -> Vec<Section> {
    match tag_name(&node) {
        "ul" | "ol" => vec![section_from_list(node, base)],
        "table" => vec![section_from_table(node)],
        _ => {
            let lists: Vec<ElementRef> = node
                .select(&LIST_SELECTOR)
                .filter(|list| !nested_in_list_within(list, &node))
                .filter(|list| !is_site_chrome(list))
                .collect();
            if lists.is_empty() {
                section_from_lines(&guess_section_name(node), &block_text(node))
                    .into_iter()
                    .collect()
            } else {
                lists
                    .into_iter()
                    .map(|list| match tag_name(&list) {
                        "table" => section_from_table(list),
                        _ => section_from_list(list, base),
                    })
                    .collect()
            }
        }
    }
}

/// True when a list/table ancestor sits between `element` and `root`.
fn nested_in_list_within(element: &ElementRef, root: &ElementRef) -> bool {
    element
        .ancestors()
        .take_while(|a| a.id() != root.id())
        .filter_map(ElementRef::wrap)
        .any(|a| matches!(tag_name(&a), "ul" | "ol" | "table" | "li"))
}

fn section_from_list(list: ElementRef, base: Option<&Url>) -> Section {
    let items = element_children(list)
        .into_iter()
        .filter(|child| tag_name(child) == "li")
        .map(|li| item_from_list_entry(li, base));
    Section::with_items(Some(guess_section_name(list)), items.collect())
}

fn item_from_list_entry(li: ElementRef, base: Option<&Url>) -> Item {
    let mut item = split_list_entry(&inline_text(li));
    item.url = li
        .select(&ANCHOR_SELECTOR)
        .next()
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| match base {
            Some(base) => base.join(href).ok().map(|u| u.to_string()),
            None => Some(href.to_string()),
        });
    item
}

fn section_from_table(table: ElementRef) -> Section {
    let items: Vec<Item> = table
        .select(&ROW_SELECTOR)
        .filter(|row| {
            row.ancestors()
                .filter_map(ElementRef::wrap)
                .find(|a| tag_name(a) == "table")
                .is_some_and(|t| t.id() == table.id())
        })
        .filter_map(item_from_row)
        .collect();
    Section::with_items(Some(guess_section_name(table)), items)
}

/// cell0 = name, cell1 = price, remaining cells = description.
fn item_from_row(row: ElementRef) -> Option<Item> {
    let cells: Vec<ElementRef> = element_children(row)
        .into_iter()
        .filter(|c| matches!(tag_name(c), "td" | "th"))
        .collect();
    if cells.is_empty() || cells.iter().all(|c| tag_name(c) == "th") {
        return None;
    }

    let name = Some(inline_text(cells[0]));
    let price = cells
        .get(1)
        .and_then(|cell| find_price(&inline_text(*cell)).map(str::to_string));
    let description = cells
        .get(2..)
        .map(|rest| {
            rest.iter()
                .map(|c| inline_text(*c))
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|d| !d.is_empty());

    Some(make_item(name, description, price))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(html: &str) -> ParsingContext {
        ParsingContext::new("https://example.com/menu", html)
    }

    #[test]
    fn test_list_item_split() {
        let ctx = context(r#"<html><body><ul class="menu"><li>Burger - Juicy beef - $12</li></ul></body></html>"#);
        let menu = HtmlListExtractor.extract(&ctx).unwrap();
        let item = &menu.sections[0].items[0];
        assert_eq!(item.name.as_deref(), Some("Burger"));
        assert_eq!(item.description.as_deref(), Some("Juicy beef"));
        assert_eq!(item.price.as_deref(), Some("$12"));
    }

    #[test]
    fn test_table_rows_positional() {
        let ctx = context(r#"<html><body><table id="menu"><tr><td>Pasta</td><td>$15</td></tr></table></body></html>"#);
        let menu = HtmlListExtractor.extract(&ctx).unwrap();
        let item = &menu.sections[0].items[0];
        assert_eq!(item.name.as_deref(), Some("Pasta"));
        assert_eq!(item.price.as_deref(), Some("$15"));
        assert_eq!(item.description, None);
    }

    #[test]
    fn test_table_header_row_and_description() {
        let ctx = context(
            r#"<html><body><table class="restaurant-prices">
                <tr><th>Dish</th><th>Price</th></tr>
                <tr><td>Risotto</td><td>€ 14,50</td><td>saffron</td><td>parmesan</td></tr>
            </table></body></html>"#,
        );
        let menu = HtmlListExtractor.extract(&ctx).unwrap();
        let items = &menu.sections[0].items;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].price.as_deref(), Some("€ 14,50"));
        assert_eq!(items[0].currency.as_deref(), Some("EUR"));
        assert_eq!(items[0].description.as_deref(), Some("saffron parmesan"));
    }

    #[test]
    fn test_navigation_menus_ignored() {
        let ctx = context(
            r#"<html><body>
                <nav><ul class="menu"><li>Home</li><li>About</li></ul></nav>
                <div class="mobile-nav-menu"><ul><li>Contact</li></ul></div>
                <p>Welcome</p>
            </body></html>"#,
        );
        assert!(HtmlListExtractor.extract(&ctx).is_none());
    }

    #[test]
    fn test_heading_followed_by_list() {
        let ctx = context(
            r#"<html><body>
                <h3>Lunch Specials</h3>
                <ul><li>Club sandwich – 11</li><li>Tomato soup – 7</li></ul>
            </body></html>"#,
        );
        let menu = HtmlListExtractor.extract(&ctx).unwrap();
        assert_eq!(menu.sections[0].name.as_deref(), Some("Lunch Specials"));
        assert_eq!(menu.sections[0].items.len(), 2);
        assert_eq!(menu.sections[0].items[1].name.as_deref(), Some("Tomato soup"));
    }

    #[test]
    fn test_priced_list_fallback() {
        let ctx = context(
            r#"<html><body><h2>Today</h2><ol><li>Espresso $3</li><li>Latte $4.50</li></ol></body></html>"#,
        );
        let menu = HtmlListExtractor.extract(&ctx).unwrap();
        assert_eq!(menu.sections[0].name.as_deref(), Some("Today"));
        assert_eq!(menu.sections[0].items[1].price.as_deref(), Some("$4.50"));
    }

    #[test]
    fn test_container_with_several_lists() {
        let ctx = context(
            r#"<html><body><div id="our-menu">
                <h2>Starters</h2><ul><li>Olives - 4</li></ul>
                <h2>Mains</h2><ul><li>Fish - 18</li><li>Steak - 25</li></ul>
            </div></body></html>"#,
        );
        let menu = HtmlListExtractor.extract(&ctx).unwrap();
        let names: Vec<_> = menu.sections.iter().map(|s| s.name.as_deref()).collect();
        assert_eq!(names, vec![Some("Starters"), Some("Mains")]);
        assert_eq!(menu.sections[1].items.len(), 2);
    }

    #[test]
    fn test_whole_body_fallback() {
        let ctx = context(
            r#"<html><body><div><p>Our food</p><p>Fish tacos 12</p><p>Nachos - 9</p></div></body></html>"#,
        );
        assert!(HtmlListExtractor.extract(&ctx).is_none());
        let menu = StructuralExtractor.extract(&ctx).unwrap();
        assert_eq!(menu.sections[0].name.as_deref(), Some("Page content"));
        assert_eq!(menu.sections[0].items.len(), 2);
    }

    #[test]
    fn test_json_ld_takes_priority() {
        let ctx = context(
            r#"<html><head><script type="application/ld+json">
                {"@type": "MenuItem", "name": "Caesar Salad", "offers": {"price": "12.50"}}
            </script></head><body><ul class="menu"><li>Other - $1</li></ul></body></html>"#,
        );
        let menu = StructuralExtractor.extract(&ctx).unwrap();
        assert_eq!(menu.sections[0].items[0].name.as_deref(), Some("Caesar Salad"));
    }
}
