use serde::{Deserialize, Serialize};

/// A single dish or drink.
///
/// `price` is the matched substring verbatim ("$12", "12.50", "€ 9,50"),
/// never parsed into a number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub currency: Option<String>,
    pub url: Option<String>,
}

impl Item {
    pub fn new(name: Option<String>, description: Option<String>, price: Option<String>) -> Self {
        Item {
            name: non_empty(name),
            description: non_empty(description),
            price: non_empty(price),
            currency: None,
            url: None,
        }
    }

    /// An item needs at least a name or a price to be worth keeping.
    pub fn is_meaningful(&self) -> bool {
        self.name.is_some() || self.price.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub name: Option<String>,
    pub items: Vec<Item>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Section {
            name: non_empty(Some(name.into())),
            items: Vec::new(),
        }
    }

    pub fn with_items(name: Option<String>, items: Vec<Item>) -> Self {
        let mut section = Section {
            name: non_empty(name),
            items: Vec::new(),
        };
        section.extend(items);
        section
    }

    /// Appends an item, dropping it when it carries neither name nor price.
    pub fn push(&mut self, item: Item) {
        if item.is_meaningful() {
            self.items.push(item);
        }
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = Item>) {
        for item in items {
            self.push(item);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredMenu {
    /// URL that actually yielded the match (may be a discovered link or PDF)
    pub source_url: Option<String>,
    pub sections: Vec<Section>,
}

impl StructuredMenu {
    /// Builds a menu keeping only non-empty sections, in the given order.
    pub fn new(source_url: impl Into<String>, sections: Vec<Section>) -> Self {
        StructuredMenu {
            source_url: Some(source_url.into()),
            sections: sections.into_iter().filter(|s| !s.is_empty()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(Section::is_empty)
    }

    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }

    /// `Some(self)` when at least one section has items.
    pub fn non_empty(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub found: bool,
    pub source_url: String,
    pub raw_text: String,
    pub menu: StructuredMenu,
}

impl ExtractionResult {
    pub fn not_found(url: impl Into<String>) -> Self {
        ExtractionResult {
            found: false,
            source_url: url.into(),
            raw_text: String::new(),
            menu: StructuredMenu::default(),
        }
    }

    /// Wraps a menu; an empty menu degrades to not-found so that
    /// `found == true` always implies at least one populated section.
    pub fn from_menu(menu: StructuredMenu, raw_text: impl Into<String>) -> Self {
        let source_url = menu.source_url.clone().unwrap_or_default();
        if menu.is_empty() {
            return ExtractionResult::not_found(source_url);
        }
        ExtractionResult {
            found: true,
            source_url,
            raw_text: raw_text.into(),
            menu,
        }
    }

    /// Serialized menu in the `{sourceUrl, sections: [...]}` schema.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.menu)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
