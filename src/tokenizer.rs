//! Word tokenizer
//!
//! Turns paragraph text into the flat word stream with reading-aid metadata
//! (ORP anchor, trailing punctuation, delay multiplier) and builds the
//! position map tying words to paragraphs.
//!
//! Plain text, EPUB chapters and PDF pages all go through the same
//! [`WordStreamBuilder`], so every format produces the same output shape.

use std::sync::LazyLock;

use regex::Regex;

use crate::document::{
    Chapter, DocumentPosition, Paragraph, ParsedWord, PdfPage, PositionMap, RawContent, WordRange,
};

/// Currency/number token, or a run of word characters, apostrophes and
/// hyphens; either may carry a trailing punctuation run.
static WORD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\$?[\d,]+(?:\.\d+)?%?|[\w'’\-]+)[.?!:;,]*").expect("word regex is valid")
});

/// Delay multiplier for words without pause punctuation
pub const DELAY_NONE: u8 = 1;
/// Delay multiplier after clause punctuation (`:;,`)
pub const DELAY_CLAUSE: u8 = 2;
/// Delay multiplier after sentence punctuation (`.?!`)
pub const DELAY_SENTENCE: u8 = 3;

/// A token before it is placed in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub orp: usize,
    pub punctuation: String,
    pub delay_multiplier: u8,
}

/// Optimal recognition point for a word of clean text
pub fn calculate_orp(clean_text: &str) -> usize {
    match clean_text.chars().count() {
        0..=2 => 0,
        3..=6 => 1,
        7..=10 => 2,
        11..=13 => 3,
        _ => 4,
    }
}

/// Delay multiplier from the last character of a punctuation suffix
pub fn calculate_delay_multiplier(punctuation: &str) -> u8 {
    match punctuation.chars().last() {
        Some('.' | '?' | '!') => DELAY_SENTENCE,
        Some(':' | ';' | ',') => DELAY_CLAUSE,
        _ => DELAY_NONE,
    }
}

/// Split a raw token into clean text and its trailing punctuation run
pub fn extract_punctuation(word: &str) -> (&str, &str) {
    let clean = word.trim_end_matches(['.', '?', '!', ':', ';', ',']);
    (clean, &word[clean.len()..])
}

/// Tokenize one paragraph of text
pub fn tokenize_text(text: &str) -> Vec<Token> {
    WORD_REGEX
        .find_iter(text)
        .filter_map(|m| {
            let raw = m.as_str();
            let (clean, punctuation) = extract_punctuation(raw);
            if clean.is_empty() {
                return None;
            }

            Some(Token {
                text: raw.to_string(),
                orp: calculate_orp(clean),
                punctuation: punctuation.to_string(),
                delay_multiplier: calculate_delay_multiplier(punctuation),
            })
        })
        .collect()
}

/// Word stream and position map produced by tokenization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tokenized {
    pub words: Vec<ParsedWord>,
    pub position_map: PositionMap,
}

/// Accumulates words across paragraphs, assigning global indices
#[derive(Debug, Default)]
pub struct WordStreamBuilder {
    words: Vec<ParsedWord>,
    position_map: PositionMap,
}

impl WordStreamBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokenize `paragraph` and record its word range in place
    ///
    /// `local_index` is the paragraph's index within its page/chapter.
    pub fn push_paragraph(
        &mut self,
        page_index: Option<usize>,
        local_index: usize,
        paragraph: &mut Paragraph,
    ) {
        let global_index = self.position_map.paragraph_to_words.len();
        let start = self.words.len();

        for (word_index, token) in tokenize_text(&paragraph.text).into_iter().enumerate() {
            self.words.push(ParsedWord {
                text: token.text,
                orp: token.orp,
                punctuation: token.punctuation,
                delay_multiplier: token.delay_multiplier,
                original_index: self.words.len(),
                document_position: DocumentPosition {
                    page_index,
                    paragraph_index: local_index,
                    word_index_in_paragraph: word_index,
                },
            });
            self.position_map.word_to_paragraph.push(global_index);
        }

        // Zero-token paragraphs keep a zero-width range at `start`
        let end = self.words.len().saturating_sub(1).max(start);
        paragraph.start_word_index = start;
        paragraph.end_word_index = end;
        self.position_map
            .paragraph_to_words
            .push(WordRange { start, end });
    }

    pub fn finish(self) -> Tokenized {
        Tokenized {
            words: self.words,
            position_map: self.position_map,
        }
    }
}

/// Tokenize a flat paragraph list
pub fn tokenize_paragraphs(paragraphs: &mut [Paragraph], page_index: Option<usize>) -> Tokenized {
    let mut builder = WordStreamBuilder::new();
    for (index, paragraph) in paragraphs.iter_mut().enumerate() {
        builder.push_paragraph(page_index, index, paragraph);
    }
    builder.finish()
}

/// Tokenize EPUB chapters; the page index of each word is its chapter index
pub fn tokenize_chapters(chapters: &mut [Chapter]) -> Tokenized {
    let mut builder = WordStreamBuilder::new();
    for chapter in chapters.iter_mut() {
        let page_index = Some(chapter.index);
        for (index, paragraph) in chapter.paragraphs.iter_mut().enumerate() {
            builder.push_paragraph(page_index, index, paragraph);
        }
    }
    builder.finish()
}

/// Tokenize PDF pages; the page index of each word is `page_number - 1`
pub fn tokenize_pages(pages: &mut [PdfPage]) -> Tokenized {
    let mut builder = WordStreamBuilder::new();
    for page in pages.iter_mut() {
        let page_index = Some(page.page_number.saturating_sub(1));
        for (index, paragraph) in page.paragraphs.iter_mut().enumerate() {
            builder.push_paragraph(page_index, index, paragraph);
        }
    }
    builder.finish()
}

/// Tokenize whichever content variant an extractor produced
pub fn tokenize_content(content: &mut RawContent) -> Tokenized {
    match content {
        RawContent::Txt { paragraphs, .. } => tokenize_paragraphs(paragraphs, None),
        RawContent::Epub { chapters } => tokenize_chapters(chapters),
        RawContent::Pdf { pages } => tokenize_pages(pages),
    }
}
