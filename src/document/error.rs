//! Document error types
//!
//! `ParseError` is the structured, user-facing failure returned by every
//! public entry point. `DocumentError` carries the low-level cause inside the
//! extractors and is translated at the pipeline boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::FileType;

/// Failure category reported to consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorKind {
    FileTooLarge,
    CorruptedFile,
    DrmProtected,
    UnsupportedFormat,
    EncodingError,
    EmptyFile,
    Unknown,
}

/// Structured parse failure
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ParseError {
    #[serde(rename = "type")]
    pub kind: ParseErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Result of a full pipeline run
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Low-level extraction error
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Failed to read the ZIP container
    #[error("ZIP archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed XML/XHTML
    #[error("XML parse error: {0}")]
    Xml(String),

    /// Structurally invalid EPUB package
    #[error("Invalid EPUB: {0}")]
    InvalidEpub(String),

    /// MuPDF failure
    #[error("MuPDF error: {0}")]
    MuPdf(String),

    /// Blocking task failed to complete
    #[error("Task join error: {0}")]
    Join(String),

    /// DRM signal found in the package
    #[error("DRM protected: {0}")]
    DrmProtected(String),

    /// Document requires a password
    #[error("Document is password protected")]
    PasswordProtected,

    /// Bytes could not be decoded to text
    #[error("Unsupported text encoding: {0}")]
    Encoding(String),

    /// Extraction produced no usable sections/pages
    #[error("No readable content")]
    NoContent,

    /// Content decoded but contains no text
    #[error("Document is empty")]
    Empty,
}

/// Result type alias for extraction operations
pub type DocumentResult<T> = std::result::Result<T, DocumentError>;

impl From<mupdf::Error> for DocumentError {
    fn from(err: mupdf::Error) -> Self {
        let message = err.to_string();
        if message.to_lowercase().contains("password") {
            DocumentError::PasswordProtected
        } else {
            DocumentError::MuPdf(message)
        }
    }
}

impl From<roxmltree::Error> for DocumentError {
    fn from(err: roxmltree::Error) -> Self {
        DocumentError::Xml(err.to_string())
    }
}

impl From<tokio::task::JoinError> for DocumentError {
    fn from(err: tokio::task::JoinError) -> Self {
        DocumentError::Join(err.to_string())
    }
}

impl DocumentError {
    /// Translate into the user-facing error for a document of `file_type`
    pub fn into_parse_error(self, file_type: FileType) -> ParseError {
        use ParseErrorKind::*;

        match (self, file_type) {
            (DocumentError::DrmProtected(details), _) => ParseError::new(
                DrmProtected,
                "This EPUB file is DRM protected and cannot be opened.",
            )
            .with_details(details),
            (DocumentError::PasswordProtected, _) => {
                ParseError::new(DrmProtected, "This PDF is password protected.")
            }
            (DocumentError::Encoding(details), _) => ParseError::new(
                EncodingError,
                "This file uses a text encoding that cannot be read.",
            )
            .with_details(details),
            (DocumentError::NoContent, FileType::Epub) => ParseError::new(
                CorruptedFile,
                "This EPUB file contains no readable content.",
            ),
            (DocumentError::NoContent, FileType::Pdf) => ParseError::new(
                CorruptedFile,
                "This PDF contains no readable text. It may be image-based.",
            ),
            (DocumentError::Empty, FileType::Epub) => {
                ParseError::new(EmptyFile, "This EPUB file contains no readable text.")
            }
            (DocumentError::Empty, FileType::Pdf) => {
                ParseError::new(EmptyFile, "This PDF contains no readable text.")
            }
            (DocumentError::NoContent | DocumentError::Empty, FileType::Txt) => {
                ParseError::new(EmptyFile, "This file contains no readable text.")
            }
            (DocumentError::NoContent | DocumentError::Empty, FileType::Paste) => {
                ParseError::new(EmptyFile, "Please paste some text to read.")
            }
            (err, FileType::Epub) => ParseError::new(
                CorruptedFile,
                "Unable to parse this EPUB file. It may be corrupted.",
            )
            .with_details(err.to_string()),
            (err, FileType::Pdf) => ParseError::new(
                CorruptedFile,
                "Unable to parse this PDF file. It may be corrupted.",
            )
            .with_details(err.to_string()),
            (err, FileType::Txt | FileType::Paste) => {
                ParseError::new(CorruptedFile, "Unable to read this text file.")
                    .with_details(err.to_string())
            }
        }
    }
}

/// Index lookup failure in the position map
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("Word index {index} out of bounds (document has {len} words)")]
    WordOutOfRange { index: usize, len: usize },

    #[error("Paragraph index {index} out of bounds (document has {len} paragraphs)")]
    ParagraphOutOfRange { index: usize, len: usize },
}
