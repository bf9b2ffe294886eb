//! Format-specific extractors
//!
//! Each format module implements `DocumentExtractor`, turning raw bytes into
//! paragraph blocks grouped the way the format groups them (a flat list for
//! plain text, chapters for EPUB, pages for PDF).
//!
//! # Architecture
//!
//! - `txt`: decoding fallback chain and blank-line paragraph splitting
//! - `epub`: container/OPF/TOC walk over a ZIP archive
//! - `pdf`: MuPDF text runs, column detection, header/footer stripping and
//!   paragraph merging

pub mod epub;
pub mod pdf;
pub mod txt;

pub use epub::EpubExtractor;
pub use pdf::PdfExtractor;
pub use txt::TxtExtractor;

use crate::document::{DocumentExtractor, FileType};

/// Extractor for a validated file type; `None` for pasted text, which needs
/// no decoding
pub fn extractor_for(
    file_type: FileType,
    layout: pdf::LayoutConfig,
) -> Option<Box<dyn DocumentExtractor>> {
    match file_type {
        FileType::Txt => Some(Box::new(TxtExtractor)),
        FileType::Epub => Some(Box::new(EpubExtractor)),
        FileType::Pdf => Some(Box::new(PdfExtractor::new(layout))),
        FileType::Paste => None,
    }
}
