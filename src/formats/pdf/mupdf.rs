//! MuPDF-backed page source
//!
//! Turns MuPDF structured text into `TextRun`s: one run per text line, with
//! the line's leftmost x, its bottom edge measured from the top of the page,
//! and the mean glyph size as the font-size proxy.

use mupdf::{Document, MetadataName, TextPageOptions};

use crate::document::{DocumentError, DocumentResult, PageSource, RawPage, SourceInfo, TextRun};

const PDF_MIME: &str = "application/pdf";

/// A PDF opened with MuPDF
pub struct MuPdfPageSource {
    doc: Document,
    page_count: usize,
}

impl MuPdfPageSource {
    /// Open a PDF from bytes, rejecting password-protected documents
    pub fn open(data: &[u8]) -> DocumentResult<Self> {
        let doc = Document::from_bytes(data, PDF_MIME)?;

        if doc.needs_password()? {
            return Err(DocumentError::PasswordProtected);
        }

        let page_count = doc.page_count()?.max(0) as usize;
        tracing::debug!("Opened PDF with {} pages", page_count);

        Ok(Self { doc, page_count })
    }

    fn metadata(&self, name: MetadataName) -> Option<String> {
        self.doc
            .metadata(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

impl PageSource for MuPdfPageSource {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn load_page(&mut self, index: usize) -> DocumentResult<RawPage> {
        let page = self.doc.load_page(index as i32)?;
        let bounds = page.bounds()?;
        let text_page = page.to_text_page(TextPageOptions::empty())?;

        let mut runs = Vec::new();
        for block in text_page.blocks() {
            for line in block.lines() {
                let mut text = String::new();
                let mut left = f32::MAX;
                let mut bottom = f32::MIN;
                let mut size_sum = 0.0;
                let mut glyphs = 0usize;

                for ch in line.chars() {
                    let Some(c) = ch.char() else {
                        continue;
                    };
                    let quad = ch.quad();

                    left = left.min(quad.ul.x.min(quad.ll.x));
                    bottom = bottom.max(quad.ll.y.max(quad.lr.y));
                    size_sum += ch.size();
                    glyphs += 1;
                    text.push(c);
                }

                if glyphs == 0 || text.trim().is_empty() {
                    continue;
                }

                runs.push(TextRun::new(
                    text,
                    left - bounds.x0,
                    bottom - bounds.y0,
                    size_sum / glyphs as f32,
                ));
            }
        }

        Ok(RawPage {
            page_number: index + 1,
            width: bounds.x1 - bounds.x0,
            height: bounds.y1 - bounds.y0,
            runs,
        })
    }

    fn info(&self) -> SourceInfo {
        SourceInfo {
            title: self.metadata(MetadataName::Title),
            author: self.metadata(MetadataName::Author),
        }
    }
}
