//! Error types for the edgequake-pdf2img library.
//!
//! [`Pdf2ImgError`] is the internal error currency of the pipeline. It never
//! escapes [`crate::convert::Converter::convert`]: the converter folds every
//! variant into a failure [`crate::output::ConversionResult`] whose `error`
//! string embeds the variant's `Display` text. The loader and the rendering
//! capabilities return it directly so tests and advanced callers can match on
//! the failure mode.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// All errors raised while loading the renderer or converting a page.
#[derive(Debug, Error)]
pub enum Pdf2ImgError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// Any other I/O failure while reading the input.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// The renderer could not parse the document.
    #[error("PDF is corrupt: {detail}")]
    CorruptPdf { detail: String },

    /// PDF requires a password; this crate never supplies one.
    #[error("PDF is encrypted and requires a password")]
    PasswordRequired,

    /// Requested page does not exist (a zero-page document has no page 1).
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    // ── Renderer errors ───────────────────────────────────────────────────
    /// The rendering library itself could not be acquired.
    #[error("Failed to load PDF renderer: {0}")]
    LibraryImport(String),

    /// The worker source could not be assigned.
    #[error("Cannot use worker source '{location}': {reason}")]
    WorkerSource { location: String, reason: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy."
    )]
    PdfiumBindingFailed(String),

    /// A failed load observed by more than one concurrent caller.
    #[error(transparent)]
    SharedLoad(Arc<Pdf2ImgError>),

    // ── Render / encode errors ────────────────────────────────────────────
    /// The canvas refused to hand out a drawing context.
    #[error("Drawing context unavailable for a {width}x{height} canvas")]
    ContextUnavailable { width: u32, height: u32 },

    /// The renderer returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// The encoder failed outright (as opposed to producing no data).
    #[error("Image encoding failed: {0}")]
    EncodeFailed(String),

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output image file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2ImgError {
    /// Map an I/O error on `path` onto the matching input variant.
    pub fn from_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            std::io::ErrorKind::NotFound => Pdf2ImgError::FileNotFound { path },
            std::io::ErrorKind::PermissionDenied => Pdf2ImgError::PermissionDenied { path },
            _ => Pdf2ImgError::ReadFailed { path, source: err },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn corrupt_pdf_display_keeps_detail() {
        let e = Pdf2ImgError::CorruptPdf {
            detail: "bad xref".into(),
        };
        assert!(e.to_string().contains("bad xref"));
    }

    #[test]
    fn empty_document_display() {
        let e = Pdf2ImgError::PageOutOfRange { page: 1, total: 0 };
        let msg = e.to_string();
        assert!(msg.contains("Page 1"), "got: {msg}");
        assert!(msg.contains("0 pages"), "got: {msg}");
    }

    #[test]
    fn io_not_found_maps_to_file_not_found() {
        let e = Pdf2ImgError::from_io("/nope.pdf", IoError::from(ErrorKind::NotFound));
        assert!(matches!(e, Pdf2ImgError::FileNotFound { .. }));
    }

    #[test]
    fn io_permission_maps_to_permission_denied() {
        let e = Pdf2ImgError::from_io("/root.pdf", IoError::from(ErrorKind::PermissionDenied));
        assert!(matches!(e, Pdf2ImgError::PermissionDenied { .. }));
    }

    #[test]
    fn other_io_keeps_source() {
        let e = Pdf2ImgError::from_io("/x.pdf", IoError::new(ErrorKind::Other, "disk on fire"));
        assert!(e.to_string().contains("disk on fire"));
    }
}
