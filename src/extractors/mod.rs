use crate::model::StructuredMenu;
use log::debug;
use scraper::Html;

mod grid;
mod json_ld;
mod price_pair;
mod structural;

pub use grid::{GridExtractor, GridMethod};
pub use json_ld::JsonLdExtractor;
pub use price_pair::{PricePairExtractor, PRICE_PAIR_SECTION};
pub use structural::{HtmlListExtractor, PageTextExtractor, StructuralExtractor};

pub struct ParsingContext {
    pub url: String,
    pub document: Html,
}

impl ParsingContext {
    pub fn new(url: impl Into<String>, html: &str) -> Self {
        ParsingContext {
            url: url.into(),
            document: Html::parse_document(html),
        }
    }
}

/// One extraction strategy. Pure: the same document always yields the same
/// menu, and `None` means "try the next strategy".
pub trait Extractor {
    fn name(&self) -> &'static str;
    fn extract(&self, context: &ParsingContext) -> Option<StructuredMenu>;
}

/// Strategies run against statically fetched HTML.
pub fn static_chain() -> Vec<Box<dyn Extractor>> {
    vec![Box::new(StructuralExtractor), Box::new(GridExtractor)]
}

/// Strategies run against rendered HTML.
pub fn rendered_chain() -> Vec<Box<dyn Extractor>> {
    vec![
        Box::new(StructuralExtractor),
        Box::new(GridExtractor),
        Box::new(PricePairExtractor),
    ]
}

/// First-success fold over a strategy chain.
pub fn run_chain(chain: &[Box<dyn Extractor>], context: &ParsingContext) -> Option<StructuredMenu> {
    chain.iter().find_map(|extractor| {
        let menu = extractor.extract(context).and_then(StructuredMenu::non_empty);
        match &menu {
            Some(menu) => debug!(
                "{} matched {} items at {}",
                extractor.name(),
                menu.item_count(),
                context.url
            ),
            None => debug!("{} found nothing at {}", extractor.name(), context.url),
        }
        menu
    })
}
