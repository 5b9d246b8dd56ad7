pub mod page;
pub mod pdf;
pub mod url;

pub use page::{scan_html, StaticScan};
pub use pdf::menu_from_text;
pub use self::url::UrlPipeline;
