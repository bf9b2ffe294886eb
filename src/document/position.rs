//! Position mapping
//!
//! Pure lookups over a `PositionMap` and word list. Every out-of-bounds index
//! is reported as a `PositionError`.

use super::error::PositionError;
use super::types::{DocumentModel, DocumentPosition, ParsedWord, PositionMap, WordRange};

/// Global paragraph index containing the word
pub fn paragraph_for_word(word_index: usize, map: &PositionMap) -> Result<usize, PositionError> {
    map.word_to_paragraph
        .get(word_index)
        .copied()
        .ok_or(PositionError::WordOutOfRange {
            index: word_index,
            len: map.word_to_paragraph.len(),
        })
}

/// Inclusive word range of a paragraph
pub fn words_for_paragraph(
    paragraph_index: usize,
    map: &PositionMap,
) -> Result<WordRange, PositionError> {
    map.paragraph_to_words
        .get(paragraph_index)
        .copied()
        .ok_or(PositionError::ParagraphOutOfRange {
            index: paragraph_index,
            len: map.paragraph_to_words.len(),
        })
}

/// Source position of a word
pub fn word_position(
    word_index: usize,
    words: &[ParsedWord],
) -> Result<DocumentPosition, PositionError> {
    words
        .get(word_index)
        .map(|word| word.document_position)
        .ok_or(PositionError::WordOutOfRange {
            index: word_index,
            len: words.len(),
        })
}

/// Word index at an exact `(page, paragraph, word)` position
///
/// Linear scan; `None` when no word carries that position.
pub fn find_word_at_position(position: &DocumentPosition, words: &[ParsedWord]) -> Option<usize> {
    words
        .iter()
        .position(|word| word.document_position == *position)
}

/// Word closest to a character offset within a paragraph's reconstructed text
///
/// Each word accounts for its length plus one separator. Offsets past the
/// end of the paragraph resolve to its last word. A trailing paragraph with
/// no words resolves to the last word of the document.
pub fn find_word_near_offset(
    paragraph_index: usize,
    text_offset: usize,
    document: &DocumentModel,
) -> Result<usize, PositionError> {
    let range = words_for_paragraph(paragraph_index, &document.position_map)?;
    if range.start >= document.words.len() {
        return document
            .words
            .len()
            .checked_sub(1)
            .ok_or(PositionError::WordOutOfRange {
                index: range.start,
                len: 0,
            });
    }

    let mut current_offset = 0;
    for index in range.start..=range.end {
        let word = document
            .words
            .get(index)
            .ok_or(PositionError::WordOutOfRange {
                index,
                len: document.words.len(),
            })?;
        let word_end = current_offset + word.text.chars().count() + 1;

        if text_offset <= word_end {
            return Ok(index);
        }
        current_offset = word_end;
    }

    Ok(range.end)
}
