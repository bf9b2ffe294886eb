//! PDF extractor
//!
//! MuPDF supplies positioned text runs; everything after that works on plain
//! `RawPage`s so the layout logic never touches the PDF library.
//!
//! # Flow
//!
//! 1. Load every page's runs through a `PageSource`; a page that fails to
//!    load is logged and skipped
//! 2. Detect recurring headers/footers and page numbers across all pages,
//!    then strip them
//! 3. Per page: detect columns, sort runs into reading order, merge runs
//!    into paragraphs
//! 4. Drop pages without paragraphs; no surviving pages is an error

pub mod headers;
pub mod layout;
pub mod mupdf;

pub use layout::{ColumnLayout, LayoutConfig};

use async_trait::async_trait;

use crate::document::{
    DocumentError, DocumentExtractor, DocumentResult, Extraction, FileType, PageSource, Paragraph,
    PdfPage, RawContent, RawPage,
};
use self::mupdf::MuPdfPageSource;

/// Extractor for `.pdf` files
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor {
    config: LayoutConfig,
}

impl PdfExtractor {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl DocumentExtractor for PdfExtractor {
    fn file_type(&self) -> FileType {
        FileType::Pdf
    }

    async fn extract(&self, data: Vec<u8>) -> DocumentResult<Extraction> {
        let config = self.config;
        tokio::task::spawn_blocking(move || {
            let mut source = MuPdfPageSource::open(&data)?;
            extract_from_source(&mut source, &config)
        })
        .await?
    }
}

/// Run the layout pipeline over any page source
pub fn extract_from_source<S: PageSource>(
    source: &mut S,
    config: &LayoutConfig,
) -> DocumentResult<Extraction> {
    let info = source.info();
    let raw_pages = collect_pages(source);
    let pages = process_pages(raw_pages, config);

    if pages.is_empty() {
        return Err(DocumentError::NoContent);
    }

    tracing::debug!(
        "PDF yielded {} pages with text out of {}",
        pages.len(),
        source.page_count()
    );

    Ok(Extraction {
        info,
        content: RawContent::Pdf { pages },
    })
}

fn collect_pages<S: PageSource>(source: &mut S) -> Vec<RawPage> {
    let count = source.page_count();
    let mut pages = Vec::with_capacity(count);

    for index in 0..count {
        match source.load_page(index) {
            Ok(page) => pages.push(page),
            Err(e) => tracing::warn!("Skipping page {}: {}", index + 1, e),
        }
    }

    pages
}

/// Strip page furniture, then rebuild each page's paragraphs
pub fn process_pages(mut pages: Vec<RawPage>, config: &LayoutConfig) -> Vec<PdfPage> {
    let furniture = headers::detect_page_furniture(&pages, config);
    headers::strip_page_furniture(&mut pages, &furniture, config);

    pages
        .into_iter()
        .filter_map(|page| {
            let columns = layout::detect_column_layout(&page, config);
            let ordered = layout::order_runs(page.runs, &columns);
            let paragraphs = layout::merge_into_paragraphs(&ordered, config);

            if paragraphs.is_empty() {
                tracing::debug!("Page {} has no text, dropping it", page.page_number);
                return None;
            }

            Some(PdfPage {
                page_number: page.page_number,
                text_content: paragraphs.join("\n\n"),
                paragraphs: paragraphs.into_iter().map(Paragraph::new).collect(),
            })
        })
        .collect()
}
