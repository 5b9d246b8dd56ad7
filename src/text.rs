//! Price pattern, keyword tables and the line-based extraction shared by
//! every strategy.

use crate::model::{Item, Section};
use regex::Regex;
use std::sync::LazyLock;

/// Optional leading currency symbol, digits (optionally grouped in
/// thousands), optional 1-2 digit fraction, optional trailing symbol.
/// Locale-invariant: `.` or `,` as group or decimal mark.
const PRICE_PATTERN: &str =
    r"(?:[$€£¥₹]\s*)?(?:\d{1,3}(?:[.,]\d{3})+(?:[.,]\d{1,2})?|\d+(?:[.,]\d{1,2})?)(?:\s?[€£])?";

static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PRICE_PATTERN).expect("valid price pattern"));

static PRICE_ONLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{PRICE_PATTERN}$")).expect("valid price pattern"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Words that signal menu content, matched case-insensitively as substrings.
pub const MENU_KEYWORDS: &[&str] = &[
    "menu",
    "carte",
    "speisekarte",
    "food",
    "drinks",
    "dining",
    "breakfast",
    "brunch",
    "lunch",
    "dinner",
    "restaurant",
];

/// Separators between name, description and price inside one line.
pub const SEPARATORS: &[&str] = &[" - ", " — ", "–"];

const CURRENCY_SYMBOLS: &[(&str, &str)] = &[
    ("$", "USD"),
    ("€", "EUR"),
    ("£", "GBP"),
    ("¥", "JPY"),
    ("₹", "INR"),
];

const NAME_FALLBACK_CHARS: usize = 60;

pub fn find_price(text: &str) -> Option<&str> {
    PRICE_RE.find(text).map(|m| m.as_str().trim())
}

pub fn has_price(text: &str) -> bool {
    PRICE_RE.is_match(text)
}

pub fn count_prices(text: &str) -> usize {
    PRICE_RE.find_iter(text).count()
}

/// True when the whole (trimmed) text is a price and nothing else.
pub fn is_price_only(text: &str) -> bool {
    PRICE_ONLY_RE.is_match(text.trim())
}

pub fn contains_menu_keyword(text: &str) -> bool {
    let lower = text.to_lowercase();
    MENU_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// ISO code for the currency symbol used in a matched price, if any.
pub fn currency_for(price: &str) -> Option<String> {
    CURRENCY_SYMBOLS
        .iter()
        .find(|(symbol, _)| price.contains(symbol))
        .map(|(_, code)| code.to_string())
}

/// Collapses runs of whitespace into single spaces and trims.
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}

/// Non-empty trimmed lines longer than two characters.
pub fn meaningful_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(normalize_whitespace)
        .filter(|line| line.chars().count() > 2)
        .collect()
}

pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Splits a line on every separator, returning trimmed non-empty segments.
pub fn split_segments(line: &str) -> Vec<String> {
    let mut segments = vec![line.to_string()];
    for separator in SEPARATORS {
        segments = segments
            .iter()
            .flat_map(|s| s.split(separator).map(str::to_string).collect::<Vec<_>>())
            .collect();
    }
    segments
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn has_separator(line: &str) -> bool {
    SEPARATORS.iter().any(|s| line.contains(s))
}

/// Builds an item, inferring the currency from the price symbol.
pub fn make_item(name: Option<String>, description: Option<String>, price: Option<String>) -> Item {
    let mut item = Item::new(name, description, price);
    item.currency = item.price.as_deref().and_then(currency_for);
    item
}

/// Splits a list entry such as `"Burger - Juicy beef - $12"` into an item.
///
/// With three or more segments the last one is the price when it matches,
/// the middle ones the description. With two segments the second is either
/// the price or a description possibly ending in a price.
pub fn split_list_entry(text: &str) -> Item {
    let text = normalize_whitespace(text);
    let segments = split_segments(&text);

    match segments.as_slice() {
        [] => Item::default(),
        [single] => {
            let price = find_price(single).map(str::to_string);
            let name = match &price {
                Some(p) => single
                    .find(p.as_str())
                    .map(|idx| single[..idx].trim().to_string())
                    .filter(|n| !n.is_empty())
                    .or_else(|| Some(single.clone()).filter(|s| !is_price_only(s))),
                None => Some(single.clone()),
            };
            make_item(name, None, price)
        }
        [name, second] => {
            if is_price_only(second) {
                make_item(Some(name.clone()), None, Some(second.clone()))
            } else {
                let price = find_price(second).map(str::to_string);
                let description = match &price {
                    Some(p) => second
                        .rfind(p.as_str())
                        .map(|idx| second[..idx].trim().to_string()),
                    None => Some(second.clone()),
                };
                make_item(Some(name.clone()), description, price)
            }
        }
        [name, middle @ .., last] => {
            if let Some(price) = find_price(last).filter(|_| is_price_only(last)) {
                make_item(
                    Some(name.clone()),
                    Some(middle.join(" - ")),
                    Some(price.to_string()),
                )
            } else {
                let mut rest = middle.to_vec();
                rest.push(last.clone());
                let price = find_price(last).map(str::to_string);
                make_item(Some(name.clone()), Some(rest.join(" - ")), price)
            }
        }
    }
}

/// Line-based extraction over free text (PDF text, body text, unstructured
/// menu nodes).
///
/// Lines that contain a menu keyword and are shorter than 40 characters are
/// treated as heading noise. Remaining lines are kept when they carry a
/// price or a hyphen/en-dash.
pub fn extract_items_from_lines(text: &str) -> Vec<Item> {
    meaningful_lines(text)
        .into_iter()
        .filter(|line| !(contains_menu_keyword(line) && line.chars().count() < 40))
        .filter(|line| has_price(line) || line.contains('-') || line.contains('–'))
        .map(|line| item_from_line(&line))
        .filter(Item::is_meaningful)
        .collect()
}

fn item_from_line(line: &str) -> Item {
    let price = find_price(line).map(str::to_string);

    let leading = if has_separator(line) {
        split_segments(line).into_iter().next()
    } else {
        price
            .as_deref()
            .and_then(|p| line.find(p))
            .map(|idx| line[..idx].trim().to_string())
            .filter(|n| !n.is_empty())
    };
    let name = leading.unwrap_or_else(|| truncate_chars(line, NAME_FALLBACK_CHARS));

    let segments = split_segments(line);
    let description = match segments.as_slice() {
        [_, middle @ .., last] if !middle.is_empty() && is_price_only(last) => {
            Some(middle.join(" - "))
        }
        [_, rest @ ..] if !rest.is_empty() => {
            let rest: Vec<&String> = rest.iter().filter(|s| !is_price_only(s)).collect();
            if rest.is_empty() {
                None
            } else {
                Some(
                    rest.into_iter()
                        .map(String::as_str)
                        .collect::<Vec<_>>()
                        .join(" - "),
                )
            }
        }
        _ => None,
    };

    let name = if price.as_deref() == Some(name.as_str()) {
        None
    } else {
        Some(name)
    };

    make_item(name, description, price)
}

/// One section built with line-based extraction, or `None` when nothing
/// survives the filters.
pub fn section_from_lines(name: &str, text: &str) -> Option<Section> {
    let section = Section::with_items(Some(name.to_string()), extract_items_from_lines(text));
    if section.is_empty() {
        None
    } else {
        Some(section)
    }
}

/// Case-insensitive `(name, price)` key used to drop duplicate items.
pub fn dedupe_key(item: &Item) -> (String, String) {
    (
        item.name.as_deref().unwrap_or_default().to_lowercase(),
        item.price.as_deref().unwrap_or_default().to_lowercase(),
    )
}
