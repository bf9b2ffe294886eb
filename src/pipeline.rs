//! Ingestion pipeline
//!
//! `Pipeline` runs one input through validation, extraction and
//! tokenization and returns a complete `DocumentModel` or a `ParseError`.
//! Nothing is handed out before every stage has succeeded.
//!
//! `DocumentLoader` wraps a pipeline with single-flight semantics: loads run
//! one at a time, and a load overtaken by a newer request is discarded
//! instead of replacing the current document.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Deserialize;

use crate::document::{
    file_stem, ByteSource, DocumentError, DocumentMetadata, DocumentModel, FileType, ParseError,
    ParseErrorKind, ParseResult, RawContent,
};
use crate::formats::{self, pdf::LayoutConfig, txt};
use crate::tokenizer::{tokenize_content, Tokenized};
use crate::validator::{self, ValidationLimits};

/// Default reading speed for time estimates
pub const DEFAULT_WORDS_PER_MINUTE: usize = 300;

/// Title given to pasted text
pub const PASTE_TITLE: &str = "Pasted Text";

/// Explicit context for a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub limits: ValidationLimits,
    pub layout: LayoutConfig,
    /// Reading speed used for `estimated_reading_time`
    pub words_per_minute: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            limits: ValidationLimits::default(),
            layout: LayoutConfig::default(),
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
        }
    }
}

/// Something to parse
pub enum Input {
    File(Box<dyn ByteSource>),
    Paste(String),
}

impl Input {
    pub fn file<S: ByteSource + 'static>(source: S) -> Self {
        Input::File(Box::new(source))
    }

    pub fn paste(text: impl Into<String>) -> Self {
        Input::Paste(text.into())
    }
}

/// Source attributes carried into the metadata
struct Origin {
    title: String,
    author: Option<String>,
    file_type: FileType,
    file_path: Option<String>,
    file_size: u64,
}

/// Minutes needed at `words_per_minute`, rounded up
pub fn estimate_reading_time(total_words: usize, words_per_minute: usize) -> usize {
    total_words.div_ceil(words_per_minute.max(1))
}

/// Stateless document ingestion
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Parse one input into a document model
    pub async fn parse(
        &self,
        input: Input,
        file_path: Option<String>,
    ) -> ParseResult<DocumentModel> {
        let result = match input {
            Input::File(source) => self.parse_file(source.as_ref(), file_path).await,
            Input::Paste(text) => self.parse_paste(&text),
        };

        if let Err(e) = &result {
            tracing::warn!("Parse failed ({:?}): {}", e.kind, e.message);
        }
        result
    }

    async fn parse_file(
        &self,
        source: &dyn ByteSource,
        file_path: Option<String>,
    ) -> ParseResult<DocumentModel> {
        let validated = validator::validate_source(source, &self.config.limits)?;
        let file_type = validated.file_type;

        let data = source
            .read_bytes()
            .await
            .map_err(|e| DocumentError::from(e).into_parse_error(file_type))?;

        let extractor = formats::extractor_for(file_type, self.config.layout).ok_or_else(|| {
            ParseError::new(
                ParseErrorKind::UnsupportedFormat,
                "Unsupported file format. Please use TXT, EPUB, or PDF files.",
            )
        })?;

        tracing::debug!(
            "Extracting '{}' as {} ({} bytes)",
            source.name(),
            file_type.as_str(),
            data.len()
        );

        let extraction = extractor
            .extract(data)
            .await
            .map_err(|e| e.into_parse_error(file_type))?;

        let title = extraction
            .info
            .title
            .unwrap_or_else(|| file_stem(source.name()).to_string());

        self.build_model(
            extraction.content,
            Origin {
                title,
                author: extraction.info.author,
                file_type,
                file_path,
                file_size: validated.size,
            },
        )
    }

    fn parse_paste(&self, text: &str) -> ParseResult<DocumentModel> {
        validator::validate_paste(text, &self.config.limits)?;

        let content =
            txt::text_content(text).map_err(|e| e.into_parse_error(FileType::Paste))?;

        self.build_model(
            content,
            Origin {
                title: PASTE_TITLE.to_string(),
                author: None,
                file_type: FileType::Paste,
                file_path: None,
                file_size: text.len() as u64,
            },
        )
    }

    /// Tokenize and assemble; zero words is an empty-file error
    fn build_model(&self, mut content: RawContent, origin: Origin) -> ParseResult<DocumentModel> {
        let Tokenized {
            words,
            position_map,
        } = tokenize_content(&mut content);

        if words.is_empty() {
            return Err(DocumentError::Empty.into_parse_error(origin.file_type));
        }

        let metadata = DocumentMetadata {
            title: origin.title,
            author: origin.author,
            file_type: origin.file_type,
            file_path: origin.file_path,
            file_size: origin.file_size,
            total_words: words.len(),
            total_paragraphs: content.paragraph_count(),
            estimated_reading_time: estimate_reading_time(
                words.len(),
                self.config.words_per_minute,
            ),
        };

        tracing::info!(
            "Parsed '{}' ({}): {} words, {} paragraphs",
            metadata.title,
            metadata.file_type.as_str(),
            metadata.total_words,
            metadata.total_paragraphs
        );

        Ok(DocumentModel {
            words,
            metadata,
            raw_content: content,
            position_map,
        })
    }
}

/// Result of a loader request
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    /// Parsed and committed as the current document
    Ready(Arc<DocumentModel>),
    /// A newer request arrived first; nothing was committed
    Superseded,
}

/// Single-flight document loader holding the current document
pub struct DocumentLoader {
    pipeline: Pipeline,
    generation: AtomicU64,
    gate: tokio::sync::Mutex<()>,
    current: RwLock<Option<Arc<DocumentModel>>>,
}

impl DocumentLoader {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            generation: AtomicU64::new(0),
            gate: tokio::sync::Mutex::new(()),
            current: RwLock::new(None),
        }
    }

    /// Parse and commit, unless a newer load is requested meanwhile
    ///
    /// A failed load leaves the current document in place.
    pub async fn load(&self, input: Input, file_path: Option<String>) -> ParseResult<LoadOutcome> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = self.gate.lock().await;

        if self.is_stale(generation) {
            tracing::debug!("Load #{} superseded before it started", generation);
            return Ok(LoadOutcome::Superseded);
        }

        let result = self.pipeline.parse(input, file_path).await;

        if self.is_stale(generation) {
            tracing::debug!("Load #{} superseded, discarding result", generation);
            return Ok(LoadOutcome::Superseded);
        }

        let document = Arc::new(result?);
        *self.current.write() = Some(Arc::clone(&document));
        Ok(LoadOutcome::Ready(document))
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }

    /// The last committed document
    pub fn current(&self) -> Option<Arc<DocumentModel>> {
        self.current.read().clone()
    }

    /// Drop the current document
    pub fn clear(&self) {
        *self.current.write() = None;
    }
}
