//! Byte sources
//!
//! Concrete `ByteSource` implementations for uploaded bytes and local files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use super::traits::ByteSource;

/// File held in memory (uploads, tests)
#[derive(Clone)]
pub struct InMemoryFile {
    name: String,
    mime_type: Option<String>,
    data: Arc<Vec<u8>>,
}

impl InMemoryFile {
    pub fn new(name: impl Into<String>, mime_type: Option<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type,
            data: Arc::new(data),
        }
    }

    /// Create with a MIME type guessed from the file name
    pub fn guessed(name: impl Into<String>, data: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = guess_mime(Path::new(&name));
        Self::new(name, mime_type, data)
    }
}

#[async_trait]
impl ByteSource for InMemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    async fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        Ok(self.data.as_ref().clone())
    }
}

/// File on the local filesystem, read lazily
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
    name: String,
    size: u64,
    mime_type: Option<String>,
}

impl LocalFile {
    /// Stat the file; contents are only read by `read_bytes`
    pub async fn open<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = tokio::fs::metadata(&path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            mime_type: guess_mime(&path),
            path,
            name,
            size: metadata.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ByteSource for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    async fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }
}

fn guess_mime(path: &Path) -> Option<String> {
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string())
}

/// File name without its final extension, used as the fallback title
pub fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) if dot + 1 < name.len() => &name[..dot],
        _ => name,
    }
}
