//! The production [`PdfLibrary`]: PDFium via `pdfium-render`.
//!
//! ## What is the "worker" here?
//!
//! PDFium does its work in a native shared library. That binary is the
//! worker: [`PdfiumLibrary::set_worker_source`] accepts either a local library
//! file (which must exist) or the URL of the matching `pdfium-binaries`
//! release archive. A remote source is only fetched the first time a document
//! is opened, and then lands in the local cache.
//!
//! ## Why is everything blocking?
//!
//! `pdfium-render` wraps a C++ library with thread-local state that is not safe
//! to drive from async code. [`PdfiumLibrary::with_page`] is called from
//! `spawn_blocking` by the converter.

use crate::error::Pdf2ImgError;
use crate::library::{PdfLibrary, PdfPage, Viewport, WorkerSource};
use crate::loader::LibraryImporter;
use crate::pipeline::render::{Canvas, SmoothingQuality};
use futures::future::BoxFuture;
use pdfium_render::prelude::{PdfRenderConfig, PdfiumError};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Imports the PDFium backend for the running platform.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfiumImporter;

impl LibraryImporter for PdfiumImporter {
    fn import(&self) -> BoxFuture<'static, Result<Arc<dyn PdfLibrary>, Pdf2ImgError>> {
        Box::pin(async {
            let platform = pdfium_source::platform()
                .map_err(|e| Pdf2ImgError::LibraryImport(e.to_string()))?;
            debug!("PDFium platform asset: {}", platform.archive_name);
            Ok(Arc::new(PdfiumLibrary::new(pdfium_source::PDFIUM_VERSION)) as Arc<dyn PdfLibrary>)
        })
    }
}

/// PDFium, bound on demand from the configured worker source.
#[derive(Debug)]
pub struct PdfiumLibrary {
    version: String,
    worker: RwLock<Option<WorkerSource>>,
}

impl PdfiumLibrary {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            worker: RwLock::new(None),
        }
    }

    /// Local path of the library binary, fetching a remote source if needed.
    fn library_path(&self) -> Result<PathBuf, Pdf2ImgError> {
        match self.worker_source() {
            Some(WorkerSource::Local(path)) => Ok(path),
            Some(WorkerSource::Remote(url)) => {
                let dest = pdfium_source::cached_library_path(&self.version)
                    .map_err(|e| Pdf2ImgError::PdfiumBindingFailed(e.to_string()))?;
                pdfium_source::fetch_library(&url, &dest)
                    .map_err(|e| Pdf2ImgError::PdfiumBindingFailed(e.to_string()))
            }
            None => Err(Pdf2ImgError::PdfiumBindingFailed(
                "no worker source configured".into(),
            )),
        }
    }
}

impl PdfLibrary for PdfiumLibrary {
    fn version(&self) -> &str {
        &self.version
    }

    fn set_worker_source(&self, source: WorkerSource) -> Result<(), Pdf2ImgError> {
        let reason = match &source {
            WorkerSource::Local(path) if !path.is_file() => Some("no such file"),
            WorkerSource::Remote(url) if url.is_empty() => Some("empty URL"),
            _ => None,
        };
        if let Some(reason) = reason {
            return Err(Pdf2ImgError::WorkerSource {
                location: source.to_string(),
                reason: reason.to_string(),
            });
        }

        *self.worker.write().unwrap_or_else(|e| e.into_inner()) = Some(source);
        Ok(())
    }

    fn worker_source(&self) -> Option<WorkerSource> {
        self.worker
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn with_page(
        &self,
        bytes: &[u8],
        index: usize,
        visit: &mut dyn FnMut(&dyn PdfPage) -> Result<(), Pdf2ImgError>,
    ) -> Result<(), Pdf2ImgError> {
        let lib_path = self.library_path()?;
        let pdfium = pdfium_source::bind(&lib_path)
            .map_err(|e| Pdf2ImgError::PdfiumBindingFailed(e.to_string()))?;

        let document = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(classify_load_error)?;

        let pages = document.pages();
        let total = pages.len() as usize;
        info!("PDF document loaded, pages: {}", total);

        if index >= total {
            return Err(Pdf2ImgError::PageOutOfRange {
                page: index + 1,
                total,
            });
        }

        let page = pages
            .get(index as u16)
            .map_err(|e| Pdf2ImgError::RasterisationFailed {
                page: index + 1,
                detail: format!("{:?}", e),
            })?;

        let page = PdfiumPage {
            page,
            number: index + 1,
        };
        visit(&page)
    }
}

/// Map a document-open failure onto the input error it stands for.
fn classify_load_error(e: PdfiumError) -> Pdf2ImgError {
    let detail = format!("{:?}", e);
    if detail.contains("Password") || detail.contains("password") {
        Pdf2ImgError::PasswordRequired
    } else {
        Pdf2ImgError::CorruptPdf { detail }
    }
}

struct PdfiumPage<'a> {
    page: pdfium_render::prelude::PdfPage<'a>,
    number: usize,
}

impl PdfPage for PdfiumPage<'_> {
    fn viewport(&self, scale: f32) -> Viewport {
        Viewport::from_points(self.page.width().value, self.page.height().value, scale)
    }

    fn render(&self, canvas: &mut Canvas, viewport: &Viewport) -> Result<(), Pdf2ImgError> {
        // Without a context the canvas cannot be drawn on; fail before the
        // (expensive) rasterisation rather than after it.
        let ctx = canvas
            .context()
            .copied()
            .ok_or(Pdf2ImgError::ContextUnavailable {
                width: canvas.width(),
                height: canvas.height(),
            })?;
        let smooth = ctx.image_smoothing_enabled;
        let smooth_images = smooth && ctx.image_smoothing_quality != SmoothingQuality::Low;

        let render_config = PdfRenderConfig::new()
            .set_target_width(canvas.width() as i32)
            .set_target_height(canvas.height() as i32)
            .set_text_smoothing(smooth)
            .set_path_smoothing(smooth)
            .set_image_smoothing(smooth_images);

        let bitmap = self
            .page
            .render_with_config(&render_config)
            .map_err(|e| Pdf2ImgError::RasterisationFailed {
                page: self.number,
                detail: format!("{:?}", e),
            })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} at {}× → {}x{} px",
            self.number,
            viewport.scale,
            image.width(),
            image.height()
        );

        canvas.draw_image(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_local_library_is_rejected() {
        let lib = PdfiumLibrary::new("7690");
        let err = lib
            .set_worker_source(WorkerSource::Local("/definitely/not/libpdfium.so".into()))
            .unwrap_err();
        assert!(matches!(err, Pdf2ImgError::WorkerSource { .. }), "got: {err}");
        assert!(lib.worker_source().is_none());
    }

    #[test]
    fn existing_local_library_is_accepted() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let lib = PdfiumLibrary::new("7690");
        lib.set_worker_source(WorkerSource::Local(tmp.path().to_path_buf()))
            .unwrap();
        assert_eq!(
            lib.worker_source(),
            Some(WorkerSource::Local(tmp.path().to_path_buf()))
        );
    }

    #[test]
    fn remote_source_is_stored_without_fetching() {
        let lib = PdfiumLibrary::new("7690");
        let url = "https://example.invalid/chromium%2F7690/pdfium.tgz".to_string();
        lib.set_worker_source(WorkerSource::Remote(url.clone())).unwrap();
        assert_eq!(lib.worker_source(), Some(WorkerSource::Remote(url)));
    }

    #[test]
    fn opening_without_worker_fails_cleanly() {
        let lib = PdfiumLibrary::new("7690");
        let err = lib
            .with_page(b"%PDF-1.4", 0, &mut |_: &dyn PdfPage| Ok(()))
            .unwrap_err();
        assert!(matches!(err, Pdf2ImgError::PdfiumBindingFailed(_)), "got: {err}");
    }

    #[tokio::test]
    async fn importer_reports_pinned_version() {
        let lib = PdfiumImporter.import().await.unwrap();
        assert_eq!(lib.version(), pdfium_source::PDFIUM_VERSION);
        assert!(lib.worker_source().is_none());
    }
}
