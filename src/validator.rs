//! Input validation
//!
//! Classifies files and pasted text by size, extension and MIME type before
//! any extraction is attempted.

use serde::Deserialize;

use crate::document::{ByteSource, FileType, ParseError, ParseErrorKind};

/// 50 MiB
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;
/// 10 MiB
pub const DEFAULT_MAX_PASTE_LENGTH: usize = 10 * 1024 * 1024;

/// Size limits applied by the validator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ValidationLimits {
    /// Maximum file size in bytes
    pub max_file_size: u64,
    /// Maximum trimmed paste length in bytes
    pub max_paste_length: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_paste_length: DEFAULT_MAX_PASTE_LENGTH,
        }
    }
}

/// Accepted input, ready for extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validated {
    pub file_type: FileType,
    pub size: u64,
}

/// Lowercased extension including the dot (`.txt`), if any
pub fn extension(file_name: &str) -> Option<String> {
    let dot = file_name.rfind('.')?;
    let ext = &file_name[dot..];
    if ext.len() > 1 {
        Some(ext.to_lowercase())
    } else {
        None
    }
}

/// Extension first, then MIME type
pub fn detect_file_type(file_name: &str, mime_type: Option<&str>) -> Option<FileType> {
    extension(file_name)
        .and_then(|ext| FileType::from_extension(&ext))
        .or_else(|| mime_type.and_then(FileType::from_mime))
}

/// Human-readable byte count (`512 B`, `1.5 KB`, `60.0 MB`)
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}

/// Validate a file by name, declared size and MIME type
pub fn validate_file(
    file_name: &str,
    size: u64,
    mime_type: Option<&str>,
    limits: &ValidationLimits,
) -> Result<Validated, ParseError> {
    if size > limits.max_file_size {
        return Err(ParseError::new(
            ParseErrorKind::FileTooLarge,
            format!(
                "File exceeds {}MB limit. Please choose a smaller file.",
                limits.max_file_size / (1024 * 1024)
            ),
        )
        .with_details(format!("File size: {}", format_bytes(size))));
    }

    if size == 0 {
        return Err(ParseError::new(
            ParseErrorKind::EmptyFile,
            "This file is empty.",
        ));
    }

    let file_type = detect_file_type(file_name, mime_type).ok_or_else(|| {
        ParseError::new(
            ParseErrorKind::UnsupportedFormat,
            "Unsupported file format. Please use TXT, EPUB, or PDF files.",
        )
        .with_details(format!(
            "File: {}, MIME: {}",
            file_name,
            mime_type.unwrap_or_default()
        ))
    })?;

    tracing::debug!(
        "Validated '{}' as {} ({})",
        file_name,
        file_type.as_str(),
        format_bytes(size)
    );

    Ok(Validated { file_type, size })
}

/// Validate a byte source using its declared attributes
pub fn validate_source(
    source: &dyn ByteSource,
    limits: &ValidationLimits,
) -> Result<Validated, ParseError> {
    validate_file(source.name(), source.size(), source.mime_type(), limits)
}

/// Validate pasted text; length is measured on the trimmed text
pub fn validate_paste(text: &str, limits: &ValidationLimits) -> Result<Validated, ParseError> {
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return Err(ParseError::new(
            ParseErrorKind::EmptyFile,
            "Please paste some text to read.",
        ));
    }

    if trimmed.len() > limits.max_paste_length {
        return Err(ParseError::new(
            ParseErrorKind::FileTooLarge,
            format!(
                "Pasted text is too large. Maximum is {}MB.",
                limits.max_paste_length / (1024 * 1024)
            ),
        ));
    }

    Ok(Validated {
        file_type: FileType::Paste,
        size: trimmed.len() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    fn limits() -> ValidationLimits {
        ValidationLimits::default()
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("Book.EPUB"), Some(".epub".to_string()));
        assert_eq!(extension("a.b.txt"), Some(".txt".to_string()));
        assert_eq!(extension("noext"), None);
        assert_eq!(extension("dot."), None);
    }

    #[test]
    fn test_extension_takes_precedence_over_mime() {
        let result = validate_file("notes.txt", 10, Some("application/pdf"), &limits()).unwrap();
        assert_eq!(result.file_type, FileType::Txt);
    }

    #[test]
    fn test_mime_fallback() {
        let result = validate_file("download", 10, Some("application/epub+zip"), &limits()).unwrap();
        assert_eq!(result.file_type, FileType::Epub);
    }

    #[test]
    fn test_too_large() {
        let err = validate_file("huge.pdf", 60 * MIB, None, &limits()).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::FileTooLarge);
        assert_eq!(err.message, "File exceeds 50MB limit. Please choose a smaller file.");
        assert_eq!(err.details.as_deref(), Some("File size: 60.0 MB"));
    }

    #[test]
    fn test_exactly_at_limit_is_accepted() {
        assert!(validate_file("big.pdf", 50 * MIB, None, &limits()).is_ok());
    }

    #[test]
    fn test_zero_bytes_is_empty() {
        let err = validate_file("empty.txt", 0, Some("text/plain"), &limits()).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::EmptyFile);
    }

    #[test]
    fn test_unsupported() {
        let err = validate_file("photo.png", 100, Some("image/png"), &limits()).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnsupportedFormat);
        assert_eq!(err.details.as_deref(), Some("File: photo.png, MIME: image/png"));
    }

    #[test]
    fn test_paste_empty_and_whitespace() {
        for text in ["", "   ", "\n\t \r\n"] {
            let err = validate_paste(text, &limits()).unwrap_err();
            assert_eq!(err.kind, ParseErrorKind::EmptyFile);
        }
    }

    #[test]
    fn test_paste_too_large() {
        let small = ValidationLimits {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_paste_length: 8,
        };
        let err = validate_paste("  123456789  ", &small).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::FileTooLarge);
        assert!(validate_paste("  12345678  ", &small).is_ok());
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(50 * MIB), "50.0 MB");
    }
}
