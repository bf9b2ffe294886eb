//! Plain text extractor
//!
//! Decodes bytes through a fixed fallback chain, normalizes line endings and
//! splits on blank-line runs.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::document::{
    DocumentError, DocumentExtractor, DocumentResult, Extraction, FileType, Paragraph, RawContent,
    SourceInfo,
};

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid paragraph break regex"));

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Windows-1252 mappings for 0x80..=0x9F; `None` marks the five undefined bytes
const CP1252_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'),
    None,
    Some('\u{201A}'),
    Some('\u{0192}'),
    Some('\u{201E}'),
    Some('\u{2026}'),
    Some('\u{2020}'),
    Some('\u{2021}'),
    Some('\u{02C6}'),
    Some('\u{2030}'),
    Some('\u{0160}'),
    Some('\u{2039}'),
    Some('\u{0152}'),
    None,
    Some('\u{017D}'),
    None,
    None,
    Some('\u{2018}'),
    Some('\u{2019}'),
    Some('\u{201C}'),
    Some('\u{201D}'),
    Some('\u{2022}'),
    Some('\u{2013}'),
    Some('\u{2014}'),
    Some('\u{02DC}'),
    Some('\u{2122}'),
    Some('\u{0161}'),
    Some('\u{203A}'),
    Some('\u{0153}'),
    None,
    Some('\u{017E}'),
    Some('\u{0178}'),
];

type Decoder = fn(&[u8]) -> Option<String>;

/// Strict decoders tried in order before the lossy fallback
const DECODERS: [(&str, Decoder); 3] = [
    ("utf-8", decode_utf8),
    ("windows-1252", decode_windows_1252),
    ("iso-8859-1", decode_latin1),
];

fn decode_utf8(bytes: &[u8]) -> Option<String> {
    std::str::from_utf8(bytes).ok().map(str::to_owned)
}

fn decode_windows_1252(bytes: &[u8]) -> Option<String> {
    bytes
        .iter()
        .map(|&b| match b {
            0x80..=0x9F => CP1252_HIGH[(b - 0x80) as usize],
            _ => Some(b as char),
        })
        .collect()
}

/// Every byte maps to the code point of the same value, C1 controls included
fn decode_latin1(bytes: &[u8]) -> Option<String> {
    Some(bytes.iter().map(|&b| b as char).collect())
}

fn decode_utf16(bytes: &[u8], big_endian: bool) -> DocumentResult<String> {
    if bytes.len() % 2 != 0 {
        return Err(DocumentError::Encoding(
            "UTF-16 text has an odd number of bytes".to_string(),
        ));
    }

    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| {
            if big_endian {
                u16::from_be_bytes([pair[0], pair[1]])
            } else {
                u16::from_le_bytes([pair[0], pair[1]])
            }
        })
        .collect();

    String::from_utf16(&units).map_err(|e| DocumentError::Encoding(e.to_string()))
}

/// Decode raw bytes to text
///
/// BOMs are honoured first. Without one the strict chain is UTF-8,
/// Windows-1252, ISO-8859-1, ending in lossy UTF-8. Decoded text containing
/// NUL characters is treated as binary and rejected.
pub fn decode(bytes: &[u8]) -> DocumentResult<String> {
    let text = if let Some(rest) = bytes.strip_prefix(UTF16_LE_BOM) {
        tracing::debug!("Decoding text as UTF-16LE");
        decode_utf16(rest, false)?
    } else if let Some(rest) = bytes.strip_prefix(UTF16_BE_BOM) {
        tracing::debug!("Decoding text as UTF-16BE");
        decode_utf16(rest, true)?
    } else {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        DECODERS
            .iter()
            .find_map(|(name, decoder)| {
                decoder(bytes).inspect(|_| tracing::debug!("Decoded text as {}", name))
            })
            // Unreachable while ISO-8859-1 accepts every byte
            .unwrap_or_else(|| {
                tracing::warn!("No strict decoder accepted the text, decoding lossily");
                String::from_utf8_lossy(bytes).into_owned()
            })
    };

    if text.contains('\0') {
        return Err(DocumentError::Encoding(
            "Text contains NUL characters (binary content)".to_string(),
        ));
    }

    Ok(text)
}

/// Convert `\r\n` and lone `\r` to `\n`
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Split normalized text on blank-line runs, dropping empty paragraphs
pub fn split_paragraphs(text: &str) -> Vec<Paragraph> {
    PARAGRAPH_BREAK
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(Paragraph::new)
        .collect()
}

/// Plain-text raw content for already decoded text (files and pastes)
pub fn text_content(text: &str) -> DocumentResult<RawContent> {
    let normalized = normalize_line_endings(text);
    let paragraphs = split_paragraphs(&normalized);

    if paragraphs.is_empty() {
        return Err(DocumentError::Empty);
    }

    Ok(RawContent::Txt {
        plain_text: normalized.trim().to_string(),
        paragraphs,
    })
}

/// Extractor for `.txt` files
#[derive(Debug, Clone, Copy, Default)]
pub struct TxtExtractor;

#[async_trait]
impl DocumentExtractor for TxtExtractor {
    fn file_type(&self) -> FileType {
        FileType::Txt
    }

    async fn extract(&self, data: Vec<u8>) -> DocumentResult<Extraction> {
        let text = decode(&data)?;
        let content = text_content(&text)?;

        tracing::debug!(
            "Split text into {} paragraphs",
            content.paragraph_count()
        );

        Ok(Extraction {
            info: SourceInfo::default(),
            content,
        })
    }
}
