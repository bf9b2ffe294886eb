//! Reading-session document endpoints
//!
//! One document is open at a time. Opening a file or pasted text replaces
//! it once parsing succeeds; the lookup endpoints resolve word and paragraph
//! indices against whatever is currently open.
//!
//! ```text
//! POST   /api/v1/documents                                  multipart upload
//! POST   /api/v1/documents/paste                            { "text": ... }
//! GET    /api/v1/documents/current                          full model
//! DELETE /api/v1/documents/current
//! GET    /api/v1/documents/current/words/:index
//! GET    /api/v1/documents/current/paragraphs/:index
//! GET    /api/v1/documents/current/paragraphs/:index/offset/:offset
//! POST   /api/v1/documents/current/locate                   DocumentPosition
//! ```

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::document::{
    position, DocumentMetadata, DocumentModel, DocumentPosition, InMemoryFile, ParsedWord,
    PositionError, RawContent,
};
use crate::error::{AppError, Result};
use crate::pipeline::{Input, LoadOutcome};
use crate::state::AppState;

/// Metadata returned when a document is opened
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    #[serde(flatten)]
    pub metadata: DocumentMetadata,
    /// Chapters (EPUB), pages with text (PDF) or 1 for plain text
    pub section_count: usize,
}

impl DocumentSummary {
    fn new(document: &DocumentModel) -> Self {
        let section_count = match &document.raw_content {
            RawContent::Txt { .. } => 1,
            RawContent::Epub { chapters } => chapters.len(),
            RawContent::Pdf { pages } => pages.len(),
        };
        Self {
            metadata: document.metadata.clone(),
            section_count,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PasteRequest {
    pub text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordResponse {
    pub index: usize,
    pub paragraph_index: usize,
    pub word: ParsedWord,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphResponse {
    pub index: usize,
    pub start_word_index: usize,
    pub end_word_index: usize,
    pub text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordIndexResponse {
    pub word_index: usize,
}

/// Create the documents router
pub fn router(body_limit: usize) -> Router<AppState> {
    Router::new()
        .route("/", post(upload_document))
        .route("/paste", post(paste_document))
        .route("/current", get(current_document).delete(close_document))
        .route("/current/words/:index", get(get_word))
        .route("/current/paragraphs/:index", get(get_paragraph))
        .route(
            "/current/paragraphs/:index/offset/:offset",
            get(word_near_offset),
        )
        .route("/current/locate", post(locate_word))
        .layer(DefaultBodyLimit::max(body_limit))
}

fn current(state: &AppState) -> Result<Arc<DocumentModel>> {
    state
        .loader()
        .current()
        .ok_or_else(|| AppError::NotFound("No document is open".to_string()))
}

async fn open(
    state: &AppState,
    input: Input,
    file_path: Option<String>,
) -> Result<Json<DocumentSummary>> {
    match state.loader().load(input, file_path).await? {
        LoadOutcome::Ready(document) => Ok(Json(DocumentSummary::new(&document))),
        LoadOutcome::Superseded => Err(AppError::Superseded),
    }
}

/// Open an uploaded file (multipart field `file` or `document`)
async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<DocumentSummary>> {
    let mut upload = None;
    let mut file_path = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read upload: {}", e))
    })? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" | "document" => {
                let filename = field.file_name().unwrap_or("unknown").to_string();
                let content_type = field.content_type().map(|s| s.to_string());
                let data = field.bytes().await.map_err(|e| {
                    tracing::error!("Failed to read file data: {}", e);
                    AppError::BadRequest(format!("Failed to read file data: {}", e))
                })?;

                tracing::debug!(
                    "Received '{}' ({:?}, {} bytes)",
                    filename,
                    content_type,
                    data.len()
                );
                upload = Some(InMemoryFile::new(filename, content_type, data.to_vec()));
            }
            "path" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid path field: {}", e)))?;
                file_path = Some(text).filter(|p| !p.is_empty());
            }
            other => tracing::debug!("Ignoring multipart field '{}'", other),
        }
    }

    let Some(file) = upload else {
        tracing::warn!("No file field found in multipart upload");
        return Err(AppError::BadRequest(
            "Expected a 'file' or 'document' field".to_string(),
        ));
    };

    open(&state, Input::file(file), file_path).await
}

/// Open pasted text
async fn paste_document(
    State(state): State<AppState>,
    Json(request): Json<PasteRequest>,
) -> Result<Json<DocumentSummary>> {
    open(&state, Input::Paste(request.text), None).await
}

/// The full model of the open document
async fn current_document(State(state): State<AppState>) -> Result<Response> {
    let document = current(&state)?;
    Ok(Json(document.as_ref()).into_response())
}

/// Close the open document
async fn close_document(State(state): State<AppState>) -> StatusCode {
    state.loader().clear();
    StatusCode::NO_CONTENT
}

async fn get_word(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<WordResponse>> {
    let document = current(&state)?;
    let paragraph_index = position::paragraph_for_word(index, &document.position_map)?;
    let word = document
        .words
        .get(index)
        .cloned()
        .ok_or(PositionError::WordOutOfRange {
            index,
            len: document.words.len(),
        })?;

    Ok(Json(WordResponse {
        index,
        paragraph_index,
        word,
    }))
}

async fn get_paragraph(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<ParagraphResponse>> {
    let document = current(&state)?;
    let range = position::words_for_paragraph(index, &document.position_map)?;
    let text = document
        .raw_content
        .paragraphs()
        .get(index)
        .map(|p| p.text.clone())
        .unwrap_or_default();

    Ok(Json(ParagraphResponse {
        index,
        start_word_index: range.start,
        end_word_index: range.end,
        text,
    }))
}

async fn word_near_offset(
    State(state): State<AppState>,
    Path((index, offset)): Path<(usize, usize)>,
) -> Result<Json<WordIndexResponse>> {
    let document = current(&state)?;
    let word_index = position::find_word_near_offset(index, offset, &document)?;
    Ok(Json(WordIndexResponse { word_index }))
}

async fn locate_word(
    State(state): State<AppState>,
    Json(target): Json<DocumentPosition>,
) -> Result<Json<WordIndexResponse>> {
    let document = current(&state)?;
    let word_index = position::find_word_at_position(&target, &document.words)
        .ok_or_else(|| AppError::NotFound("No word at that position".to_string()))?;
    Ok(Json(WordIndexResponse { word_index }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::formats::epub::tests::sample_epub;
    use crate::routes::app;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::{json, Value};

    const STORY: &str = "The quick fox jumps.\n\nIt was, indeed, quick.";

    fn server_with(config: Config) -> TestServer {
        TestServer::new(app(AppState::new(config))).unwrap()
    }

    fn server() -> TestServer {
        server_with(Config::default())
    }

    fn upload(name: &str, mime: &str, data: Vec<u8>) -> MultipartForm {
        MultipartForm::new().add_part("file", Part::bytes(data).file_name(name).mime_type(mime))
    }

    #[tokio::test]
    async fn test_health() {
        let response = server().get("/health").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_no_document_is_not_found() {
        let server = server();
        server
            .get("/api/v1/documents/current")
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .get("/api/v1/documents/current/words/0")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_paste_then_lookups() {
        let server = server();

        let response = server
            .post("/api/v1/documents/paste")
            .json(&json!({ "text": STORY }))
            .await;
        response.assert_status_ok();
        let summary: Value = response.json();
        assert_eq!(summary["title"], "Pasted Text");
        assert_eq!(summary["fileType"], "paste");
        assert_eq!(summary["totalWords"], 8);
        assert_eq!(summary["totalParagraphs"], 2);
        assert_eq!(summary["sectionCount"], 1);

        let word: Value = server.get("/api/v1/documents/current/words/5").await.json();
        assert_eq!(word["paragraphIndex"], 1);
        assert_eq!(word["word"]["text"], "was,");
        assert_eq!(word["word"]["delayMultiplier"], 2);
        assert_eq!(word["word"]["documentPosition"]["wordIndexInParagraph"], 1);

        server
            .get("/api/v1/documents/current/words/8")
            .await
            .assert_status(StatusCode::NOT_FOUND);

        let paragraph: Value = server
            .get("/api/v1/documents/current/paragraphs/1")
            .await
            .json();
        assert_eq!(paragraph["startWordIndex"], 4);
        assert_eq!(paragraph["endWordIndex"], 7);
        assert_eq!(paragraph["text"], "It was, indeed, quick.");

        let near: Value = server
            .get("/api/v1/documents/current/paragraphs/1/offset/5")
            .await
            .json();
        assert_eq!(near["wordIndex"], 5);

        let located: Value = server
            .post("/api/v1/documents/current/locate")
            .json(&json!({ "paragraphIndex": 1, "wordIndexInParagraph": 3 }))
            .await
            .json();
        assert_eq!(located["wordIndex"], 7);

        server
            .post("/api/v1/documents/current/locate")
            .json(&json!({ "paragraphIndex": 9, "wordIndexInParagraph": 0 }))
            .await
            .assert_status(StatusCode::NOT_FOUND);

        let model: Value = server.get("/api/v1/documents/current").await.json();
        assert_eq!(model["words"].as_array().unwrap().len(), 8);
        assert_eq!(model["positionMap"]["wordToParagraph"][4], 1);
        assert_eq!(model["rawContent"]["type"], "txt");
    }

    #[tokio::test]
    async fn test_upload_text_file() {
        let server = server();
        let response = server
            .post("/api/v1/documents")
            .multipart(
                upload("story.txt", "text/plain", STORY.as_bytes().to_vec())
                    .add_text("path", "/books/story.txt"),
            )
            .await;
        response.assert_status_ok();

        let summary: Value = response.json();
        assert_eq!(summary["title"], "story");
        assert_eq!(summary["filePath"], "/books/story.txt");
        assert_eq!(summary["fileSize"], STORY.len());
    }

    #[tokio::test]
    async fn test_upload_epub() {
        let response = server()
            .post("/api/v1/documents")
            .multipart(upload("book.epub", "application/epub+zip", sample_epub()))
            .await;
        response.assert_status_ok();

        let summary: Value = response.json();
        assert_eq!(summary["title"], "Sample Book");
        assert_eq!(summary["author"], "Jane Writer");
        assert_eq!(summary["sectionCount"], 2);
    }

    #[tokio::test]
    async fn test_parse_errors_map_to_statuses() {
        let server = server();

        let response = server
            .post("/api/v1/documents")
            .multipart(upload("photo.png", "image/png", vec![1, 2, 3]))
            .await;
        response.assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let body: Value = response.json();
        assert_eq!(body["type"], "unsupported_format");

        let response = server
            .post("/api/v1/documents/paste")
            .json(&json!({ "text": "   " }))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_eq!(body["type"], "empty_file");
        assert_eq!(body["message"], "Please paste some text to read.");

        let response = server
            .post("/api/v1/documents")
            .multipart(upload("broken.epub", "application/epub+zip", b"not a zip".to_vec()))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_eq!(body["type"], "corrupted_file");
    }

    #[tokio::test]
    async fn test_file_over_limit_is_rejected() {
        let mut config = Config::default();
        config.pipeline.limits.max_file_size = 16;
        let response = server_with(config)
            .post("/api/v1/documents")
            .multipart(upload("story.txt", "text/plain", STORY.as_bytes().to_vec()))
            .await;

        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        let body: Value = response.json();
        assert_eq!(body["type"], "file_too_large");
    }

    #[tokio::test]
    async fn test_failed_open_keeps_current_document() {
        let server = server();
        server
            .post("/api/v1/documents/paste")
            .json(&json!({ "text": STORY }))
            .await
            .assert_status_ok();

        server
            .post("/api/v1/documents/paste")
            .json(&json!({ "text": "" }))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let model: Value = server.get("/api/v1/documents/current").await.json();
        assert_eq!(model["metadata"]["totalWords"], 8);

        server
            .delete("/api/v1/documents/current")
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .get("/api/v1/documents/current")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
