//! The rendering capability, seen from the converter's side.
//!
//! The converter never talks to PDFium directly. It only needs:
//!
//! ```text
//! PdfLibrary ── version / set_worker_source / worker_source
//!     │
//!     └─ with_page(bytes, index) ──▶ PdfPage ── viewport(scale)
//!                                           └─ render(&mut Canvas, &Viewport)
//! ```
//!
//! [`crate::backend::pdfium`] is the production implementation; tests swap in
//! doubles that fail at chosen points.

use crate::error::Pdf2ImgError;
use crate::pipeline::render::Canvas;
use std::fmt;
use std::path::PathBuf;

/// Where the library's worker is fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerSource {
    /// A file on the local machine.
    Local(PathBuf),
    /// A versioned remote URL.
    Remote(String),
}

impl fmt::Display for WorkerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerSource::Local(p) => write!(f, "{}", p.display()),
            WorkerSource::Remote(url) => f.write_str(url),
        }
    }
}

/// Page dimensions in pixels at a given scale.
///
/// At scale 1.0 one PDF point maps to one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub scale: f32,
}

impl Viewport {
    /// Viewport for a page of `width_pts` × `height_pts` rendered at `scale`.
    pub fn from_points(width_pts: f32, height_pts: f32, scale: f32) -> Self {
        Self {
            width: width_pts * scale,
            height: height_pts * scale,
            scale,
        }
    }

    /// Canvas width for this viewport; fractional pixels are dropped.
    pub fn pixel_width(&self) -> u32 {
        self.width as u32
    }

    /// Canvas height for this viewport; fractional pixels are dropped.
    pub fn pixel_height(&self) -> u32 {
        self.height as u32
    }
}

/// A loaded PDF rendering library.
///
/// Implementations are shared process-wide behind an `Arc`, hence
/// `Send + Sync`. Document work is blocking and runs inside
/// `spawn_blocking`.
pub trait PdfLibrary: Send + Sync {
    /// Version string the library reports about itself.
    fn version(&self) -> &str;

    /// Point the library at its worker. Fails if `source` is unusable.
    fn set_worker_source(&self, source: WorkerSource) -> Result<(), Pdf2ImgError>;

    /// The worker source currently assigned, if any.
    fn worker_source(&self) -> Option<WorkerSource>;

    /// Parse `bytes` as a PDF, load the page at 0-based `index`, and hand it to
    /// `visit`. The page only lives for the duration of the call.
    fn with_page(
        &self,
        bytes: &[u8],
        index: usize,
        visit: &mut dyn FnMut(&dyn PdfPage) -> Result<(), Pdf2ImgError>,
    ) -> Result<(), Pdf2ImgError>;
}

/// One page of an open document.
pub trait PdfPage {
    /// Page size at `scale`.
    fn viewport(&self, scale: f32) -> Viewport;

    /// Draw the page onto `canvas`, which is already sized to `viewport`.
    fn render(&self, canvas: &mut Canvas, viewport: &Viewport) -> Result<(), Pdf2ImgError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_scales_points() {
        // US Letter at 4×
        let vp = Viewport::from_points(612.0, 792.0, 4.0);
        assert_eq!(vp.pixel_width(), 2448);
        assert_eq!(vp.pixel_height(), 3168);
    }

    #[test]
    fn viewport_truncates_fractional_pixels() {
        let vp = Viewport::from_points(595.28, 841.89, 4.0);
        assert_eq!(vp.pixel_width(), 2381);
        assert_eq!(vp.pixel_height(), 3367);
    }

    #[test]
    fn worker_source_display() {
        assert_eq!(
            WorkerSource::Remote("https://cdn/x".into()).to_string(),
            "https://cdn/x"
        );
        assert_eq!(
            WorkerSource::Local(PathBuf::from("/opt/libpdfium.so")).to_string(),
            "/opt/libpdfium.so"
        );
    }
}
