use super::{Extractor, ParsingContext};
use crate::model::{Item, Section, StructuredMenu};
use crate::text::currency_for;
use html_escape::decode_html_entities;
use log::debug;
use regex::Regex;
use scraper::Selector;
use serde_json::Value;
use std::sync::LazyLock;

/// schema.org graphs are trees in practice, but the input is untrusted.
const MAX_DEPTH: usize = 32;

const LOOSE_ITEMS_SECTION: &str = "Menu";

const RESTAURANT_TYPES: &[&str] = &[
    "restaurant",
    "foodestablishment",
    "cafeorcoffeeshop",
    "barorpub",
    "bakery",
    "fastfoodrestaurant",
];

static SCRIPT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("script[type='application/ld+json']").expect("valid selector")
});

static TRAILING_COMMA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").expect("valid trailing comma pattern"));

pub struct JsonLdExtractor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    MenuItem,
    Menu,
    Restaurant,
}

#[derive(Default)]
struct Collected {
    sections: Vec<Section>,
    loose_index: Option<usize>,
}

impl Collected {
    fn push_loose(&mut self, item: Item) {
        let index = *self.loose_index.get_or_insert_with(|| {
            self.sections.push(Section::new(LOOSE_ITEMS_SECTION));
            self.sections.len() - 1
        });
        self.sections[index].push(item);
    }
}

impl JsonLdExtractor {
    /// Menu sections found in one parsed JSON-LD document.
    pub fn sections_from_value(&self, value: &Value) -> Vec<Section> {
        let mut collected = Collected::default();
        walk(value, 0, &mut collected);
        collected
            .sections
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl Extractor for JsonLdExtractor {
    fn name(&self) -> &'static str {
        "JsonLdExtractor"
    }

    fn extract(&self, context: &ParsingContext) -> Option<StructuredMenu> {
        let scripts: Vec<_> = context.document.select(&SCRIPT_SELECTOR).collect();
        debug!("JsonLdExtractor: Found {} JSON-LD script tags", scripts.len());

        for (index, script) in scripts.iter().enumerate() {
            let cleaned_json = sanitize_json(&script.inner_html());
            let json_ld = match serde_json::from_str::<Value>(&cleaned_json) {
                Ok(value) => value,
                Err(e) => {
                    debug!("JsonLdExtractor: Failed to parse JSON-LD {}: {}", index, e);
                    continue;
                }
            };

            let sections = self.sections_from_value(&json_ld);
            if !sections.is_empty() {
                debug!(
                    "JsonLdExtractor: Script {} yielded {} sections",
                    index,
                    sections.len()
                );
                return Some(StructuredMenu::new(context.url.clone(), sections));
            }
        }

        None
    }
}

fn walk(value: &Value, depth: usize, out: &mut Collected) {
    if depth > MAX_DEPTH {
        return;
    }
    match value {
        Value::Array(values) => {
            for v in values {
                walk(v, depth + 1, out);
            }
        }
        Value::Object(map) => match classify(value) {
            Some(NodeKind::MenuItem) => {
                if let Some(item) = parse_item(value) {
                    out.push_loose(item);
                }
            }
            Some(NodeKind::Menu) => {
                let mut items = Vec::new();
                collect_section_items(value, depth + 1, &mut items);
                out.sections
                    .push(Section::with_items(string_field(value, &["name"]), items));
            }
            Some(NodeKind::Restaurant) => {
                if let Some(menu) = value.get("hasMenu") {
                    walk(menu, depth + 1, out);
                }
            }
            None => {
                for v in map.values() {
                    walk(v, depth + 1, out);
                }
            }
        },
        _ => {}
    }
}

/// Items of a Menu/MenuSection node, with nested sections flattened in.
fn collect_section_items(node: &Value, depth: usize, items: &mut Vec<Item>) {
    if depth > MAX_DEPTH {
        return;
    }
    for key in ["hasMenuItem", "hasMenu", "hasMenuSection"] {
        if let Some(child) = node.get(key) {
            collect_menu_entries(child, depth + 1, items);
        }
    }
}

fn collect_menu_entries(value: &Value, depth: usize, items: &mut Vec<Item>) {
    if depth > MAX_DEPTH {
        return;
    }
    match value {
        Value::Array(values) => {
            for v in values {
                collect_menu_entries(v, depth + 1, items);
            }
        }
        Value::Object(_) => match classify(value) {
            Some(NodeKind::Menu) => collect_section_items(value, depth + 1, items),
            Some(NodeKind::MenuItem) => items.extend(parse_item(value)),
            // untyped entries listed under hasMenuItem
            None if value.get("name").is_some() => items.extend(parse_item(value)),
            _ => {}
        },
        _ => {}
    }
}

fn classify(node: &Value) -> Option<NodeKind> {
    let tag = node.get("@type").or_else(|| node.get("type"))?;
    let tags: Vec<&str> = match tag {
        Value::String(s) => vec![s.as_str()],
        Value::Array(values) => values.iter().filter_map(Value::as_str).collect(),
        _ => return None,
    };

    tags.into_iter().find_map(|tag| {
        // "https://schema.org/MenuItem", "schema:MenuItem"
        let local = tag.rsplit(['/', ':']).next().unwrap_or(tag).to_lowercase();
        match local.as_str() {
            "menuitem" => Some(NodeKind::MenuItem),
            "menusection" | "menu" => Some(NodeKind::Menu),
            t if RESTAURANT_TYPES.contains(&t) => Some(NodeKind::Restaurant),
            _ => None,
        }
    })
}

fn parse_item(node: &Value) -> Option<Item> {
    let offer = node.get("offers").and_then(priced_offer);
    let price = offer.and_then(|o| {
        o.get("price")
            .and_then(scalar_to_string)
            .or_else(|| {
                first_object(o.get("priceSpecification")?)
                    .and_then(|spec| spec.get("price"))
                    .and_then(scalar_to_string)
            })
    });
    let currency = offer
        .and_then(|o| {
            string_field(o, &["priceCurrency"]).or_else(|| {
                first_object(o.get("priceSpecification")?)
                    .and_then(|spec| string_field(spec, &["priceCurrency"]))
            })
        })
        .or_else(|| price.as_deref().and_then(currency_for));

    let mut item = Item::new(
        string_field(node, &["name", "headline"]),
        string_field(node, &["description"]),
        price,
    );
    item.currency = currency;
    item.url = string_field(node, &["url"]);
    item.is_meaningful().then_some(item)
}

/// The offer carrying a price: the object itself, or the first array
/// element exposing `price` or `priceSpecification`.
fn priced_offer(offers: &Value) -> Option<&Value> {
    match offers {
        Value::Object(_) => Some(offers),
        Value::Array(values) => values
            .iter()
            .find(|o| o.get("price").is_some() || o.get("priceSpecification").is_some()),
        _ => None,
    }
}

fn first_object(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(values) => values.first(),
        Value::Object(_) => Some(value),
        _ => None,
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_field(node: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| node.get(*key).and_then(Value::as_str))
        .map(decode_html_symbols)
        .find(|s| !s.is_empty())
}

fn decode_html_symbols(text: &str) -> String {
    // for some reason need to decode twice to get the correct string
    decode_html_entities(&decode_html_entities(text))
        .trim()
        .to_string()
}

fn sanitize_json(json_str: &str) -> String {
    let mut cleaned = json_str.trim().to_string();

    // Skip anything before the first object/array (stray CDATA markers, text)
    if !cleaned.starts_with('{') && !cleaned.starts_with('[') {
        if let Some(start) = cleaned.find(['{', '[']) {
            cleaned = cleaned[start..].to_string();
        }
    }

    // Remove any HTML comments that might be present
    cleaned = cleaned.replace("<!--", "").replace("-->", "");

    // Remove any trailing comma followed by closing brace/bracket
    TRAILING_COMMA_RE.replace_all(&cleaned, "$1").into_owned()
}
