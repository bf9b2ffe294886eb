//! EPUB extractor
//!
//! Reads the ZIP container directly: container.xml, the OPF package, the
//! navigation document and each spine section in turn.
//!
//! # Flow
//!
//! 1. Package metadata, manifest and spine
//! 2. DRM signals (rights metadata, `rights.xml`, `encryption.xml`); any
//!    signal stops extraction before a single section is read
//! 3. Navigation tree flattened to `href -> label`
//! 4. One section at a time: parse, extract paragraphs, drop the DOM
//!
//! A section that fails to parse is logged and skipped. Zero surviving
//! chapters is an error.

pub mod content;
pub mod package;
pub mod toc;

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};

use async_trait::async_trait;
use zip::ZipArchive;

use crate::document::{
    Chapter, DocumentError, DocumentExtractor, DocumentResult, Extraction, FileType, Paragraph,
    RawContent, SourceInfo,
};
use package::{read_entry, ManifestItem, Package, TocSource};

/// Parse XML/XHTML, accepting DOCTYPE declarations
pub(crate) fn parse_xml(text: &str) -> Result<roxmltree::Document<'_>, roxmltree::Error> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    roxmltree::Document::parse_with_options(text, options)
}

/// Extractor for `.epub` files
#[derive(Debug, Clone, Copy, Default)]
pub struct EpubExtractor;

#[async_trait]
impl DocumentExtractor for EpubExtractor {
    fn file_type(&self) -> FileType {
        FileType::Epub
    }

    async fn extract(&self, data: Vec<u8>) -> DocumentResult<Extraction> {
        tokio::task::spawn_blocking(move || extract_epub(data)).await?
    }
}

/// Synchronous extraction over raw EPUB bytes
pub fn extract_epub(data: Vec<u8>) -> DocumentResult<Extraction> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;
    let package = Package::read(&mut archive)?;

    if let Some(reason) = package::detect_drm(&mut archive, &package.metadata) {
        tracing::warn!("EPUB is DRM protected: {}", reason);
        return Err(DocumentError::DrmProtected(reason));
    }

    let titles = read_toc(&mut archive, &package);
    tracing::debug!(
        "EPUB has {} spine items and {} TOC targets",
        package.spine.len(),
        titles.len()
    );

    let mut chapters = Vec::new();
    for item in &package.spine {
        match read_chapter(&mut archive, item, &titles, chapters.len()) {
            Ok(Some(chapter)) => chapters.push(chapter),
            Ok(None) => tracing::debug!("Skipping '{}': no readable text", item.path),
            Err(e) => tracing::warn!("Skipping section '{}': {}", item.path, e),
        }
    }

    if chapters.is_empty() {
        return Err(DocumentError::NoContent);
    }

    Ok(Extraction {
        info: SourceInfo {
            title: package.metadata.title,
            author: package.metadata.author,
        },
        content: RawContent::Epub { chapters },
    })
}

/// Flattened TOC; an unreadable navigation document yields an empty map
fn read_toc<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    package: &Package,
) -> HashMap<String, String> {
    let Some(source) = package.toc_source() else {
        return HashMap::new();
    };

    let (path, parsed) = match &source {
        TocSource::Nav(path) => (
            path,
            read_entry(archive, path)
                .and_then(|text| toc::parse_nav(&text, package::parent_dir(path))),
        ),
        TocSource::Ncx(path) => (
            path,
            read_entry(archive, path)
                .and_then(|text| toc::parse_ncx(&text, package::parent_dir(path))),
        ),
    };

    match parsed {
        Ok(entries) => toc::flatten(&entries),
        Err(e) => {
            tracing::warn!("Ignoring unreadable table of contents '{}': {}", path, e);
            HashMap::new()
        }
    }
}

fn read_chapter<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    item: &ManifestItem,
    titles: &HashMap<String, String>,
    index: usize,
) -> DocumentResult<Option<Chapter>> {
    let xhtml = read_entry(archive, &item.path)?;
    let Some(section) = content::extract_section(&xhtml)? else {
        return Ok(None);
    };

    if section.paragraphs.is_empty() {
        return Ok(None);
    }

    Ok(Some(Chapter {
        title: titles.get(&item.path).cloned().or(section.heading),
        index,
        html_content: section.html_content,
        paragraphs: section.paragraphs.into_iter().map(Paragraph::new).collect(),
    }))
}
