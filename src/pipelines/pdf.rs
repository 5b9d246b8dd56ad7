use crate::error::{ExtractError, Result};
use crate::fetchers::Fetcher;
use crate::model::{ExtractionResult, StructuredMenu};
use crate::text::{section_from_lines, truncate_chars};
use log::debug;

pub const PDF_SECTION: &str = "PDF Menu";

/// Characters of extracted text handed back as `raw_text`.
pub const RAW_TEXT_LIMIT: usize = 2000;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Downloads a PDF and runs line-based extraction over its text. Empty or
/// oversized downloads are rejected whatever the fetcher did with the cap.
pub async fn process(fetcher: &dyn Fetcher, url: &str, max_bytes: usize) -> Result<ExtractionResult> {
    let bytes = fetcher.fetch_bytes(url, max_bytes).await?;
    if bytes.is_empty() {
        return Err(ExtractError::EmptyBody(url.to_string()));
    }
    if bytes.len() > max_bytes {
        return Err(ExtractError::TooLarge {
            limit: max_bytes,
            actual: bytes.len(),
        });
    }
    debug!("Downloaded {} PDF bytes from {}", bytes.len(), url);
    let text = pdf_to_text(bytes).await?;
    Ok(menu_from_text(&text, url))
}

/// Page texts joined with line breaks. The parser runs on the blocking pool
/// so a panic inside it only fails this document.
pub async fn pdf_to_text(bytes: Vec<u8>) -> Result<String> {
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(ExtractError::Pdf("missing %PDF- header".to_string()));
    }

    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| ExtractError::Pdf(e.to_string()))?
        .map_err(|e| ExtractError::Pdf(e.to_string()))?;

    // pages come back separated by form feeds
    Ok(text.replace('\u{c}', "\n"))
}

/// Line-based extraction over text the caller already holds (e.g. a PDF
/// converted elsewhere).
pub fn menu_from_text(text: &str, url: &str) -> ExtractionResult {
    let sections = section_from_lines(PDF_SECTION, text).into_iter().collect();
    let menu = StructuredMenu::new(url, sections);
    ExtractionResult::from_menu(menu, truncate_chars(text, RAW_TEXT_LIMIT))
}
