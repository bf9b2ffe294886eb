//! Core document types
//!
//! The canonical flat word-stream model shared by every input format.

use serde::{Deserialize, Serialize};

/// Input format of an opened document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Txt,
    Epub,
    Pdf,
    Paste,
}

impl FileType {
    /// Detect format from a file extension (with or without the leading dot)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "txt" | "text" => Some(Self::Txt),
            "epub" => Some(Self::Epub),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Detect format from MIME type, ignoring any parameters
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_lowercase().as_str() {
            "text/plain" => Some(Self::Txt),
            "application/epub+zip" => Some(Self::Epub),
            "application/pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Txt => "txt",
            FileType::Epub => "epub",
            FileType::Pdf => "pdf",
            FileType::Paste => "paste",
        }
    }
}

/// Location of a word inside the source document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPosition {
    /// Page (PDF) or chapter (EPUB) index; absent for plain text
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub page_index: Option<usize>,
    /// Paragraph index within the page/chapter
    pub paragraph_index: usize,
    pub word_index_in_paragraph: usize,
}

/// A single token of the word stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedWord {
    /// Raw token including trailing punctuation
    pub text: String,
    /// Optimal recognition point (character offset into the clean text)
    pub orp: usize,
    /// Trailing punctuation run, possibly empty
    pub punctuation: String,
    /// Display time multiplier: 1, 2 or 3
    pub delay_multiplier: u8,
    /// Global sequential position in the stream
    pub original_index: usize,
    pub document_position: DocumentPosition,
}

/// A paragraph and the inclusive range of words it contributed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    pub text: String,
    pub start_word_index: usize,
    /// Inclusive; equals `start_word_index` when no tokens were produced
    pub end_word_index: usize,
}

impl Paragraph {
    /// A paragraph whose word range has not been assigned yet
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            start_word_index: 0,
            end_word_index: 0,
        }
    }
}

/// Inclusive word index range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRange {
    pub start: usize,
    pub end: usize,
}

/// Bidirectional word <-> paragraph index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionMap {
    /// One global paragraph index per word, non-decreasing
    pub word_to_paragraph: Vec<usize>,
    /// One inclusive word range per paragraph
    pub paragraph_to_words: Vec<WordRange>,
}

/// EPUB chapter (one kept spine section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub index: usize,
    pub html_content: String,
    pub paragraphs: Vec<Paragraph>,
}

/// PDF page with reconstructed paragraphs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfPage {
    /// 1-based page number in the source document
    pub page_number: usize,
    pub text_content: String,
    pub paragraphs: Vec<Paragraph>,
}

/// Format-specific content kept for paginated reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RawContent {
    #[serde(rename_all = "camelCase")]
    Txt {
        plain_text: String,
        paragraphs: Vec<Paragraph>,
    },
    Epub { chapters: Vec<Chapter> },
    Pdf { pages: Vec<PdfPage> },
}

impl RawContent {
    /// Total number of paragraphs across all chapters/pages
    pub fn paragraph_count(&self) -> usize {
        match self {
            RawContent::Txt { paragraphs, .. } => paragraphs.len(),
            RawContent::Epub { chapters } => chapters.iter().map(|c| c.paragraphs.len()).sum(),
            RawContent::Pdf { pages } => pages.iter().map(|p| p.paragraphs.len()).sum(),
        }
    }

    /// Flattened paragraphs in reading order
    pub fn paragraphs(&self) -> Vec<&Paragraph> {
        match self {
            RawContent::Txt { paragraphs, .. } => paragraphs.iter().collect(),
            RawContent::Epub { chapters } => {
                chapters.iter().flat_map(|c| c.paragraphs.iter()).collect()
            }
            RawContent::Pdf { pages } => pages.iter().flat_map(|p| p.paragraphs.iter()).collect(),
        }
    }
}

/// Document metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub file_type: FileType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Size in bytes
    pub file_size: u64,
    pub total_words: usize,
    pub total_paragraphs: usize,
    /// Minutes at the configured reading speed
    pub estimated_reading_time: usize,
}

/// A fully parsed document. Built only on full pipeline success and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentModel {
    pub words: Vec<ParsedWord>,
    pub metadata: DocumentMetadata,
    pub raw_content: RawContent,
    pub position_map: PositionMap,
}

/// Title and author read from the source, before fallbacks are applied
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceInfo {
    pub title: Option<String>,
    pub author: Option<String>,
}

/// Output of a format extractor, before tokenization
#[derive(Debug, Clone)]
pub struct Extraction {
    pub info: SourceInfo,
    pub content: RawContent,
}

/// A positioned text run on a PDF page.
///
/// `y` is the baseline measured from the top of the page, so larger values
/// are further down.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f32,
    pub y: f32,
    /// Font-size proxy (glyph scale)
    pub font_size: f32,
}

impl TextRun {
    pub fn new(text: impl Into<String>, x: f32, y: f32, font_size: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            font_size,
        }
    }
}

/// All text runs of one PDF page
#[derive(Debug, Clone, PartialEq)]
pub struct RawPage {
    /// 1-based page number
    pub page_number: usize,
    pub width: f32,
    pub height: f32,
    pub runs: Vec<TextRun>,
}
