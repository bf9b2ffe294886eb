//! Unified document model
//!
//! This module holds the canonical word-stream model every input format is
//! reduced to, together with the interfaces extractors implement.
//!
//! # Architecture
//!
//! ```text
//!   ByteSource / pasted text
//!            │
//!            ▼
//!   ┌──────────────────┐
//!   │    Validator     │
//!   └──────────────────┘
//!            │
//!   ┌────────┼─────────┐
//!   ▼        ▼         ▼
//!  Txt      Epub      Pdf        (DocumentExtractor)
//!   │        │         │
//!   └────────┼─────────┘
//!            ▼
//!   ┌──────────────────┐
//!   │    Tokenizer     │  words + PositionMap
//!   └──────────────────┘
//!            │
//!            ▼
//!      DocumentModel  ──►  position lookups
//! ```

mod error;
pub mod position;
mod source;
mod traits;
mod types;

pub use error::{
    DocumentError, DocumentResult, ParseError, ParseErrorKind, ParseResult, PositionError,
};
pub use source::{file_stem, InMemoryFile, LocalFile};
pub use traits::{ByteSource, DocumentExtractor, PageSource};
pub use types::{
    Chapter, DocumentMetadata, DocumentModel, DocumentPosition, Extraction, FileType, Paragraph,
    ParsedWord, PdfPage, PositionMap, RawContent, RawPage, SourceInfo, TextRun, WordRange,
};
