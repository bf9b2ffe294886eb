//! Document traits
//!
//! Format-agnostic capability interfaces. Extractors only see these shapes,
//! never the object model of a particular EPUB/PDF library.

use async_trait::async_trait;

use super::error::DocumentResult;
use super::types::{Extraction, FileType, RawPage, SourceInfo};

/// Byte-bearing input handle (`name`, `size`, `mime`) with a read operation
#[async_trait]
pub trait ByteSource: Send + Sync {
    /// File name including extension
    fn name(&self) -> &str;

    /// Declared size in bytes
    fn size(&self) -> u64;

    /// Declared MIME type, if any
    fn mime_type(&self) -> Option<&str>;

    /// Read the full contents
    async fn read_bytes(&self) -> std::io::Result<Vec<u8>>;
}

/// Per-format text extractor
///
/// Implementations turn raw bytes into paragraph blocks grouped by
/// chapter/page. Tokenization happens afterwards, outside the extractor.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    /// Format handled by this extractor
    fn file_type(&self) -> FileType;

    /// Extract paragraph text and source metadata
    async fn extract(&self, data: Vec<u8>) -> DocumentResult<Extraction>;
}

/// Positioned text access for paginated sources
///
/// Pages are loaded one at a time so a backend can release per-page
/// resources before the next one is requested.
pub trait PageSource {
    /// Number of pages in the document
    fn page_count(&self) -> usize;

    /// Load text runs for the page at `index` (0-based)
    fn load_page(&mut self, index: usize) -> DocumentResult<RawPage>;

    /// Info dictionary values
    fn info(&self) -> SourceInfo;
}
