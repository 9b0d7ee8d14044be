//! Input: the PDF the caller wants converted.
//!
//! A [`PdfFile`] is a name plus its content, which lives either on disk or
//! already in memory (an upload, a database blob). The name matters: the
//! output image is named after it.

use crate::error::Pdf2ImgError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
enum Content {
    Path(PathBuf),
    Bytes(Arc<[u8]>),
}

/// A PDF document supplied by the caller.
#[derive(Debug, Clone)]
pub struct PdfFile {
    name: String,
    content: Content,
}

impl PdfFile {
    /// A PDF on disk. Its name is the path's final component.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            content: Content::Path(path),
        }
    }

    /// A PDF already held in memory.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            content: Content::Bytes(bytes.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The backing path, for on-disk files.
    pub fn path(&self) -> Option<&Path> {
        match &self.content {
            Content::Path(p) => Some(p),
            Content::Bytes(_) => None,
        }
    }

    /// Read the whole document into memory.
    pub async fn read_bytes(&self) -> Result<Arc<[u8]>, Pdf2ImgError> {
        let bytes: Arc<[u8]> = match &self.content {
            Content::Path(path) => tokio::fs::read(path)
                .await
                .map_err(|e| Pdf2ImgError::from_io(path, e))?
                .into(),
            Content::Bytes(bytes) => Arc::clone(bytes),
        };
        debug!("File converted to byte buffer, size: {}", bytes.len());
        Ok(bytes)
    }
}
